//! 扫描引擎：多抽取器惰性归并
//!
//! 每个抽取器各自左到右产出（已校验的）命中流，引擎用小顶堆按
//! (起点偏移, 抽取器在输入中的位置) 做 k 路归并：
//! - 同一抽取器内命中互不重叠、起点严格递增（单次扫描保证）；
//! - 不同抽取器起点相同时，按输入顺序输出；
//! - 不做跨抽取器的重叠裁决，重叠命中全部保留。
//! 引擎不持有跨调用状态，重新调用 `scan` 即可从头再来。
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::ops::Range;

use crate::extractors::Extractor;
use crate::matcher::Candidates;

/// 通过校验的命中，借用被扫描文本与其抽取器
#[derive(Clone, Copy)]
pub struct Match<'t, 'e> {
    extractor: &'e Extractor,
    start: usize,
    end: usize,
    text: &'t str,
}

impl<'t, 'e> Match<'t, 'e> {
    pub fn extractor(&self) -> &'e Extractor { self.extractor }

    pub fn start(&self) -> usize { self.start }

    pub fn end(&self) -> usize { self.end }

    pub fn range(&self) -> Range<usize> { self.start..self.end }

    pub fn as_str(&self) -> &'t str { self.text }
}

impl fmt::Debug for Match<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("extractor", &self.extractor.id())
            .field("start", &self.start)
            .field("end", &self.end)
            .field("text", &self.text)
            .finish()
    }
}

impl PartialEq for Match<'_, '_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.extractor, other.extractor)
            && self.start == other.start
            && self.end == other.end
            && self.text == other.text
    }
}

impl Eq for Match<'_, '_> {}

/// 单个抽取器的“候选 → 校验”流
struct Accepted<'t, 'e> {
    extractor: &'e Extractor,
    candidates: Candidates<'e, 't>,
}

impl<'t, 'e> Iterator for Accepted<'t, 'e> {
    type Item = Match<'t, 'e>;

    fn next(&mut self) -> Option<Self::Item> {
        let extractor = self.extractor;
        self.candidates
            .by_ref()
            .find(|hit| extractor.accepts(hit))
            .map(|hit| Match { extractor, start: hit.start, end: hit.end, text: hit.text })
    }
}

/// `scan` 返回的惰性有序命中序列
pub struct Scan<'t, 'e> {
    streams: Vec<Accepted<'t, 'e>>,
    /// 每个流已取出但尚未输出的命中
    heads: Vec<Option<Match<'t, 'e>>>,
    /// (起点, 流下标) 小顶堆
    queue: BinaryHeap<Reverse<(usize, usize)>>,
    primed: bool,
}

/// 用给定的抽取器（有序）扫描文本
///
/// 不会失败：空抽取器列表或没有命中时得到空序列。
/// 在第一次 `next()` 之前不做任何匹配工作，调用方可随时提前停止消费。
pub fn scan<'t, 'e, I>(text: &'t str, extractors: I) -> Scan<'t, 'e>
where
    I: IntoIterator<Item = &'e Extractor>,
{
    let streams: Vec<_> = extractors
        .into_iter()
        .map(|extractor| Accepted { extractor, candidates: extractor.matcher().find_candidates(text) })
        .collect();
    let heads = vec![None; streams.len()];
    Scan { queue: BinaryHeap::with_capacity(streams.len()), streams, heads, primed: false }
}

impl<'t, 'e> Scan<'t, 'e> {
    /// 从第 idx 个流拉取下一条命中并入堆
    fn advance(&mut self, idx: usize) {
        if let Some(m) = self.streams[idx].next() {
            self.queue.push(Reverse((m.start, idx)));
            self.heads[idx] = Some(m);
        }
    }
}

impl<'t, 'e> Iterator for Scan<'t, 'e> {
    type Item = Match<'t, 'e>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            self.primed = true;
            for idx in 0..self.streams.len() {
                self.advance(idx);
            }
        }
        let Reverse((_, idx)) = self.queue.pop()?;
        let out = self.heads[idx].take();
        self.advance(idx);
        out
    }
}
