//! 公共类型（对外暴露）
use serde::Serialize;

use crate::engine::Match;

/// 输出项结构（对应 result.json 的单个元素）
#[derive(Debug, Clone, Serialize)]
pub struct OutputItem<'a> {
    pub file: &'a str,
    pub extractor: &'a str,
    pub value: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> OutputItem<'a> {
    pub fn from_match(file: &'a str, m: &Match<'a, 'a>) -> Self {
        Self { file, extractor: m.extractor().id(), value: m.as_str(), start: m.start(), end: m.end() }
    }
}
