//! 词法匹配器：正则 + 上下文守卫
//!
//! regex crate 不支持环视断言，这里用“命中前/后的短窗口再跑一次锚定正则”来替代，
//! 整体仍保持与文本长度线性相关。
use regex::{CaptureMatches, Regex};

/// 上下文守卫检查的窗口大小（字节），会向内收缩到字符边界
pub(crate) const CONTEXT_WINDOW: usize = 16;

/// 未经校验的候选命中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHit<'t> {
    /// 上报区间起点（字节偏移）
    pub start: usize,
    /// 上报区间终点（不含）
    pub end: usize,
    /// 上报区间文本，等于 `text[start..end]`
    pub text: &'t str,
    /// 完整的词法匹配，交给校验器判断
    pub candidate: &'t str,
}

/// 单个抽取器的词法匹配器
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
    /// 上报用的捕获组下标（名为 value 的组，否则第 1 组）
    value_group: Option<usize>,
    reject_before: Option<Regex>,
    reject_after: Option<Regex>,
}

impl Matcher {
    pub fn new(regex: Regex) -> Self {
        // 优先使用 value 命名组；否则若存在捕获组则取第 1 组，与旧规则文件的约定一致
        let value_group = regex
            .capture_names()
            .position(|n| n == Some("value"))
            .or_else(|| (regex.captures_len() > 1).then_some(1));
        Self { regex, value_group, reject_before: None, reject_after: None }
    }

    /// 命中前的窗口（以命中起点结尾）匹配该正则时丢弃命中
    pub fn reject_before(mut self, guard: Regex) -> Self {
        self.reject_before = Some(guard);
        self
    }

    /// 命中后的窗口（以命中终点开头）匹配该正则时丢弃命中
    pub fn reject_after(mut self, guard: Regex) -> Self {
        self.reject_after = Some(guard);
        self
    }

    pub fn pattern(&self) -> &str { self.regex.as_str() }

    /// 左到右、互不重叠地产出候选命中（惰性）
    pub fn find_candidates<'m, 't>(&'m self, text: &'t str) -> Candidates<'m, 't> {
        Candidates { matcher: self, text, inner: self.regex.captures_iter(text) }
    }

    fn context_allows(&self, text: &str, start: usize, end: usize) -> bool {
        if let Some(guard) = &self.reject_before {
            let from = floor_char_boundary(text, start.saturating_sub(CONTEXT_WINDOW));
            if guard.is_match(&text[from..start]) { return false; }
        }
        if let Some(guard) = &self.reject_after {
            let to = ceil_char_boundary(text, (end + CONTEXT_WINDOW).min(text.len()));
            if guard.is_match(&text[end..to]) { return false; }
        }
        true
    }
}

/// `Matcher::find_candidates` 返回的惰性迭代器
pub struct Candidates<'m, 't> {
    matcher: &'m Matcher,
    text: &'t str,
    inner: CaptureMatches<'m, 't>,
}

impl<'m, 't> Iterator for Candidates<'m, 't> {
    type Item = RawHit<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        for caps in self.inner.by_ref() {
            let Some(whole) = caps.get(0) else { continue };
            // 选择上报片段（优先 value 组），未参与匹配时退回整个匹配
            let span = self.matcher.value_group.and_then(|g| caps.get(g)).unwrap_or(whole);
            // 空匹配没有意义，直接跳过
            if span.end() <= span.start() { continue; }
            if !self.matcher.context_allows(self.text, whole.start(), whole.end()) { continue; }
            return Some(RawHit {
                start: span.start(),
                end: span.end(),
                text: span.as_str(),
                candidate: whole.as_str(),
            });
        }
        None
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) { i -= 1; }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) { i += 1; }
    i
}
