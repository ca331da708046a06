//! 命中项（跨线程传递用的自有副本）
use crate::engine::Match;
use crate::types::OutputItem;

/// 单条命中的内部表示，不再借用原文
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Finding {
    pub(crate) extractor: String,
    pub(crate) value: String,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Finding {
    pub(crate) fn from_match(m: &Match<'_, '_>) -> Self {
        Self {
            extractor: m.extractor().id().to_string(),
            value: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        }
    }

    pub(crate) fn output<'a>(&'a self, file: &'a str) -> OutputItem<'a> {
        OutputItem { file, extractor: &self.extractor, value: &self.value, start: self.start, end: self.end }
    }
}
