//! 抽取器定义与抽取器表
use crate::engine::{scan, Scan};
use crate::matcher::{Matcher, RawHit};
use crate::rules::{parse_extractor_table, RuleError, DEFAULT_TABLE};
use crate::validators::Validator;

/// 具名抽取器：词法匹配器 + 可选语义校验器。构建后不可变，可跨线程共享。
#[derive(Debug, Clone)]
pub struct Extractor {
    id: String,
    name: Option<String>,
    matcher: Matcher,
    validator: Option<Validator>,
}

impl Extractor {
    pub fn new(id: impl Into<String>, matcher: Matcher) -> Self {
        Self { id: id.into(), name: None, matcher, validator: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn id(&self) -> &str { &self.id }

    /// 展示名称，未配置时退回 id
    pub fn name(&self) -> &str { self.name.as_deref().unwrap_or(&self.id) }

    pub fn matcher(&self) -> &Matcher { &self.matcher }

    pub fn validator(&self) -> Option<&Validator> { self.validator.as_ref() }

    /// 无校验器时全部接受
    pub fn accepts(&self, hit: &RawHit<'_>) -> bool {
        self.validator.as_ref().map_or(true, |v| v.is_valid(hit.candidate))
    }
}

/// 有序抽取器表（声明顺序即并列时的输出顺序）
#[derive(Debug, Clone, Default)]
pub struct ExtractorSet {
    extractors: Vec<Extractor>,
}

impl ExtractorSet {
    pub fn new(extractors: Vec<Extractor>) -> Self {
        Self { extractors }
    }

    /// 内置的四类抽取器：mixed_ordinals、integers、dates_iso8601、dates_fmt2
    pub fn builtin() -> Result<Self, RuleError> {
        parse_extractor_table(DEFAULT_TABLE)
    }

    pub fn get(&self, id: &str) -> Option<&Extractor> {
        self.extractors.iter().find(|e| e.id == id)
    }

    /// 抽取器在表中的下标
    pub fn position(&self, id: &str) -> Option<usize> {
        self.extractors.iter().position(|e| e.id == id)
    }

    /// 按调用方给定的顺序挑选抽取器
    pub fn select<'a, I, S>(&'a self, ids: I) -> Result<Vec<&'a Extractor>, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .map(|id| {
                let id = id.as_ref();
                self.get(id).ok_or_else(|| RuleError::UnknownExtractor(id.to_string()))
            })
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Extractor> { self.extractors.iter() }

    pub fn as_slice(&self) -> &[Extractor] { &self.extractors }

    pub fn len(&self) -> usize { self.extractors.len() }

    pub fn is_empty(&self) -> bool { self.extractors.is_empty() }

    /// 使用表中全部抽取器扫描
    pub fn scan<'t, 'e>(&'e self, text: &'t str) -> Scan<'t, 'e> {
        scan(text, self)
    }
}

impl<'a> IntoIterator for &'a ExtractorSet {
    type Item = &'a Extractor;
    type IntoIter = std::slice::Iter<'a, Extractor>;

    fn into_iter(self) -> Self::IntoIter { self.extractors.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn accepts_without_validator() {
        let e = Extractor::new("digits", Matcher::new(Regex::new("[0-9]+").unwrap()));
        let hit = e.matcher().find_candidates("x 99").next().unwrap();
        assert!(e.accepts(&hit));
        assert_eq!(e.name(), "digits");
    }

    #[test]
    fn validator_decides_acceptance() {
        let e = Extractor::new("digits", Matcher::new(Regex::new("[0-9]+").unwrap()))
            .with_name("Digits")
            .with_validator(Validator::new("short", |s: &str| s.len() < 3));
        let hits: Vec<_> = e.matcher().find_candidates("12 345").collect();
        assert!(e.accepts(&hits[0]));
        assert!(!e.accepts(&hits[1]));
        assert_eq!(e.name(), "Digits");
    }

    #[test]
    fn select_keeps_caller_order() {
        let set = ExtractorSet::builtin().unwrap();
        let picked = set.select(["dates_fmt2", "integers"]).unwrap();
        let ids: Vec<_> = picked.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["dates_fmt2", "integers"]);

        let err = set.select(["integers", "roman_numerals"]).unwrap_err();
        assert!(matches!(err, RuleError::UnknownExtractor(ref id) if id == "roman_numerals"));
    }

    #[test]
    fn position_indexes_into_slice() {
        let set = ExtractorSet::builtin().unwrap();
        let idx = set.position("dates_iso8601").unwrap();
        assert_eq!(set.as_slice()[idx].id(), "dates_iso8601");
        assert_eq!(set.as_slice().len(), set.len());
        assert_eq!(set.position("roman_numerals"), None);
    }

    #[test]
    fn extractor_set_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ExtractorSet>();
        assert_send_sync::<Extractor>();
    }
}
