//! 抽取器表加载（TOML）
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::extractors::{Extractor, ExtractorSet};
use crate::matcher::Matcher;
use crate::validators::Validator;

/// 内置抽取器表
pub(crate) const DEFAULT_TABLE: &str = include_str!("../rules/default.toml");

/// 抽取器表加载/选择过程中的错误
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read extractor table {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid extractor table: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("extractor `{id}` has neither `pattern` nor `regex`")]
    MissingPattern { id: String },
    #[error("extractor `{id}`: invalid {field}: {source}")]
    InvalidRegex { id: String, field: &'static str, source: regex::Error },
    #[error("extractor `{id}`: unknown validator `{validator}`")]
    UnknownValidator { id: String, validator: String },
    #[error("duplicate extractor id `{0}`")]
    DuplicateId(String),
    #[error("unknown extractor `{0}`")]
    UnknownExtractor(String),
}

/// 单条抽取器配置（支持 pattern 或 regex 字段）
#[derive(Debug, Clone, Deserialize)]
struct ExtractorEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    regex: Option<String>,
    #[serde(default)]
    reject_before: Option<String>,
    #[serde(default)]
    reject_after: Option<String>,
    #[serde(default)]
    validator: Option<String>,
}

/// 顶层表结构（兼容旧的 `[[rules]]` 写法）
#[derive(Debug, Clone, Deserialize)]
struct ExtractorTable {
    #[serde(default, alias = "rules")]
    extractors: Vec<ExtractorEntry>,
}

/// 从 TOML 文件加载抽取器表
pub fn load_extractor_table(path: &Path) -> Result<ExtractorSet, RuleError> {
    let txt = std::fs::read_to_string(path)
        .map_err(|source| RuleError::Io { path: path.to_path_buf(), source })?;
    let set = parse_extractor_table(&txt)?;
    debug!(path = %path.display(), extractors = set.len(), "loaded extractor table");
    Ok(set)
}

/// 从 TOML 文本解析抽取器表，保持声明顺序
pub fn parse_extractor_table(txt: &str) -> Result<ExtractorSet, RuleError> {
    let parsed: ExtractorTable = toml::from_str(txt)?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(parsed.extractors.len());

    for e in parsed.extractors {
        if !seen.insert(e.id.clone()) {
            return Err(RuleError::DuplicateId(e.id));
        }
        out.push(build_extractor(e)?);
    }

    Ok(ExtractorSet::new(out))
}

fn build_extractor(e: ExtractorEntry) -> Result<Extractor, RuleError> {
    // 兼容两种字段名：pattern 或 regex
    let pat = match (e.pattern.as_deref(), e.regex.as_deref()) {
        (Some(p), _) => p,
        (None, Some(r)) => r,
        _ => return Err(RuleError::MissingPattern { id: e.id }),
    };
    let compile = |field: &'static str, pat: &str| {
        Regex::new(pat).map_err(|source| RuleError::InvalidRegex { id: e.id.clone(), field, source })
    };

    let mut matcher = Matcher::new(compile("pattern", pat)?);
    if let Some(g) = e.reject_before.as_deref() {
        matcher = matcher.reject_before(compile("reject_before", g)?);
    }
    if let Some(g) = e.reject_after.as_deref() {
        matcher = matcher.reject_after(compile("reject_after", g)?);
    }

    let validator = match e.validator.as_deref() {
        Some(name) => Some(Validator::builtin(name).ok_or_else(|| RuleError::UnknownValidator {
            id: e.id.clone(),
            validator: name.to_string(),
        })?),
        None => None,
    };

    let mut extractor = Extractor::new(e.id.clone(), matcher);
    if let Some(name) = e.name {
        extractor = extractor.with_name(name);
    }
    if let Some(v) = validator {
        extractor = extractor.with_validator(v);
    }
    Ok(extractor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses_in_order() {
        let set = parse_extractor_table(DEFAULT_TABLE).unwrap();
        let ids: Vec<_> = set.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["mixed_ordinals", "integers", "dates_iso8601", "dates_fmt2"]);
        assert_eq!(set.get("dates_iso8601").unwrap().validator().map(|v| v.name()), Some("iso8601"));
        assert!(set.get("integers").unwrap().validator().is_none());
    }

    #[test]
    fn accepts_legacy_rules_key_and_regex_field() {
        let set = parse_extractor_table(
            r#"
            [[rules]]
            id = "hex"
            regex = '0x[0-9a-f]+'
            "#,
        )
        .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("hex").unwrap().name(), "hex");
    }

    #[test]
    fn rejects_bad_entries() {
        let missing = parse_extractor_table("[[extractors]]\nid = \"a\"\n").unwrap_err();
        assert!(matches!(missing, RuleError::MissingPattern { .. }));

        let bad = parse_extractor_table("[[extractors]]\nid = \"a\"\npattern = '(['\n").unwrap_err();
        assert!(matches!(bad, RuleError::InvalidRegex { field: "pattern", .. }));

        let guard = parse_extractor_table(
            "[[extractors]]\nid = \"a\"\npattern = 'a'\nreject_after = ')'\n",
        )
        .unwrap_err();
        assert!(matches!(guard, RuleError::InvalidRegex { field: "reject_after", .. }));

        let unknown = parse_extractor_table(
            "[[extractors]]\nid = \"a\"\npattern = 'a'\nvalidator = \"roman\"\n",
        )
        .unwrap_err();
        assert!(matches!(unknown, RuleError::UnknownValidator { .. }));

        let dup = parse_extractor_table(
            "[[extractors]]\nid = \"a\"\npattern = 'a'\n[[extractors]]\nid = \"a\"\npattern = 'b'\n",
        )
        .unwrap_err();
        assert!(matches!(dup, RuleError::DuplicateId(ref id) if id == "a"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_extractor_table(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, RuleError::Io { .. }));
    }
}
