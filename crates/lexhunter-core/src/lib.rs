//! 词法记号抽取库
//!
//! 设计要点：
//! - 抽取器 = 词法模式 + 可选语义校验器，由抽取器表（TOML）描述，启动时构建一次，只读共享。
//! - 引擎 `scan` 对每个抽取器左到右扫描，校验通过的命中按起点归并为单一有序序列，惰性产出。
//! - 校验器只做接受/拒绝判断，拒绝即“不出现在结果中”，核心没有错误通道。
//! - 语料扫描（目录/文件 → JSON）只是调用 `scan` 的外层，与引擎解耦。

mod corpus;
mod engine;
mod extractors;
mod findings;
mod matcher;
mod options;
mod rules;
mod types;
mod validators;

pub use corpus::{load_extractors, scan_and_write};
pub use engine::{scan, Match, Scan};
pub use extractors::{Extractor, ExtractorSet};
pub use matcher::{Candidates, Matcher, RawHit};
pub use options::{ScanOptions, ScanStats};
pub use rules::{load_extractor_table, parse_extractor_table, RuleError};
pub use types::OutputItem;
pub use validators::{DayMonthYear, Iso8601Timestamp, Validate, Validator};
