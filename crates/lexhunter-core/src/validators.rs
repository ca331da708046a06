//! 语义校验器
//!
//! 词法模式只能保证“长得像”，校验器负责判断候选文本是否表示真实存在的值
//! （月份 ≤ 12、日期随月份/闰年变化、时钟字段范围、时区偏移幅度等）。
//! 约束：校验器必须是纯函数，确定且无副作用；字段解析失败一律视为拒绝，不 panic。
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::sync::Arc;

/// 候选文本校验能力
pub trait Validate: Send + Sync {
    /// 返回 true 表示接受该候选
    fn is_valid(&self, candidate: &str) -> bool;
}

/// 任意纯闭包都可直接作为校验器使用
impl<F> Validate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_valid(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// 共享的校验器句柄（抽取器之间可复用同一实例）
#[derive(Clone)]
pub struct Validator {
    name: String,
    inner: Arc<dyn Validate>,
}

impl Validator {
    pub fn new(name: impl Into<String>, inner: impl Validate + 'static) -> Self {
        Self { name: name.into(), inner: Arc::new(inner) }
    }

    /// 按名称查找内置校验器（抽取器表中的 `validator` 字段）
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            Iso8601Timestamp::NAME => Some(Self::new(name, Iso8601Timestamp)),
            DayMonthYear::NAME => Some(Self::new(name, DayMonthYear)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn is_valid(&self, candidate: &str) -> bool { self.inner.is_valid(candidate) }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

/// 已知的时区缩写
const KNOWN_ZONES: &[&str] = &[
    "UT", "UTC", "GMT", "EST", "EDT", "CST", "CDT", "MST", "MDT", "PST", "PDT",
    "AKST", "AKDT", "HST", "AST", "ADT", "NST", "NDT", "BST", "IST", "CET", "CEST",
    "EET", "EEST", "WET", "WEST", "MSK", "JST", "KST", "HKT", "SGT", "AEST", "AEDT",
    "ACST", "ACDT", "AWST", "NZST", "NZDT",
];

/// 数字偏移允许的最大幅度（HHMM 形式，即 ±12:00）
const MAX_OFFSET_HHMM: u32 = 1200;

static ISO_FIELDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{2})-(?P<day>[0-9]{2})",
        r"(?:(?P<sep>.)(?P<hour>[0-9]{2}):(?P<minute>[0-9]{2})",
        r"(?::(?P<second>[0-9]{2})(?:\.[0-9]+)?)?",
        r"(?P<zone>Z|[+-][0-9]+|[A-Za-z]+)?)?$",
    ))
    .expect("iso8601 field regex")
});

static DMY_FIELDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<day>[0-9]{1,2}) (?P<month>[A-Za-z]+),? (?P<year>[0-9]{4})$")
        .expect("day-month-year field regex")
});

/// ISO-8601 风格时间戳：`YYYY-MM-DD[( |T)HH:MM[:SS[.frac]][zone]]`
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso8601Timestamp;

impl Iso8601Timestamp {
    pub const NAME: &'static str = "iso8601";
}

impl Validate for Iso8601Timestamp {
    fn is_valid(&self, candidate: &str) -> bool {
        let Some(caps) = ISO_FIELDS.captures(candidate) else { return false };
        let (Some(year), Some(month), Some(day)) = (
            field::<i32>(&caps, "year"),
            field::<u32>(&caps, "month"),
            field::<u32>(&caps, "day"),
        ) else {
            return false;
        };
        if NaiveDate::from_ymd_opt(year, month, day).is_none() { return false; }

        // 仅日期部分
        let Some(sep) = caps.name("sep") else { return true };
        if !matches!(sep.as_str(), " " | "T") { return false; }

        let (Some(hour), Some(minute)) = (field::<u32>(&caps, "hour"), field::<u32>(&caps, "minute")) else {
            return false;
        };
        let second = match caps.name("second") {
            Some(m) => match m.as_str().parse::<u32>() { Ok(s) => s, Err(_) => return false },
            None => 0,
        };
        // from_hms_opt 不接受 60 秒
        if NaiveTime::from_hms_opt(hour, minute, second).is_none() { return false; }

        match caps.name("zone") {
            Some(zone) => is_valid_zone(zone.as_str()),
            None => true,
        }
    }
}

/// 时区标识：Z、四位数字偏移（≤ 1200）或已知缩写
fn is_valid_zone(zone: &str) -> bool {
    if zone == "Z" { return true; }
    if let Some(digits) = zone.strip_prefix(['+', '-']) {
        if digits.len() != 4 { return false; }
        let Ok(hhmm) = digits.parse::<u32>() else { return false };
        return hhmm <= MAX_OFFSET_HHMM && hhmm % 100 < 60;
    }
    KNOWN_ZONES.contains(&zone)
}

/// `D Mon[,] YYYY` 日期
#[derive(Debug, Clone, Copy, Default)]
pub struct DayMonthYear;

impl DayMonthYear {
    pub const NAME: &'static str = "day_month_year";
}

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

impl Validate for DayMonthYear {
    fn is_valid(&self, candidate: &str) -> bool {
        let Some(caps) = DMY_FIELDS.captures(candidate) else { return false };
        let Some(month) = caps.name("month").and_then(|m| month_number(m.as_str())) else {
            return false;
        };
        let (Some(day), Some(year)) = (field::<u32>(&caps, "day"), field::<i32>(&caps, "year")) else {
            return false;
        };
        NaiveDate::from_ymd_opt(year, month, day).is_some()
    }
}

/// 三字母月份缩写 → 1..=12（大小写不敏感）
fn month_number(abbr: &str) -> Option<u32> {
    if abbr.len() != 3 { return None; }
    let lower = abbr.to_ascii_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

fn field<T: std::str::FromStr>(caps: &Captures<'_>, name: &str) -> Option<T> {
    caps.name(name)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iso(s: &str) -> bool { Iso8601Timestamp.is_valid(s) }
    fn dmy(s: &str) -> bool { DayMonthYear.is_valid(s) }

    #[test]
    fn iso_accepts_date_only_and_full_timestamps() {
        assert!(iso("2015-07-25"));
        assert!(iso("2018-06-22 18:22"));
        assert!(iso("2018-06-22 18:22:19"));
        assert!(iso("2018-06-22T18:22:19.123"));
        assert!(iso("2018-06-22T18:22:19.123-0800"));
        assert!(iso("2018-06-22T18:22:19.123+1200"));
        assert!(iso("2018-06-22T18:22:19.123Z"));
        assert!(iso("2018-06-22T18:22:19.123MDT"));
    }

    #[test]
    fn iso_rejects_calendar_errors() {
        assert!(!iso("2015-14-25"));
        assert!(!iso("2015-00-25"));
        assert!(!iso("2015-07-40"));
        assert!(!iso("2015-07-00"));
        assert!(!iso("2015-04-31"));
        assert!(!iso("2015-02-29"));
        assert!(iso("2016-02-29"));
        assert!(!iso("1900-02-29"));
        assert!(iso("2000-02-29"));
    }

    #[test]
    fn iso_rejects_clock_errors() {
        assert!(!iso("2015-07-25 43:20"));
        assert!(!iso("2015-07-25 11:90:10"));
        assert!(!iso("2015-07-25 11:10:90"));
        assert!(!iso("2015-07-25 11:10:60"));
        assert!(iso("2015-07-25 23:59:59"));
        assert!(iso("2015-07-25 00:00"));
    }

    #[test]
    fn iso_requires_space_or_t_separator() {
        assert!(!iso("2015-07-25A11:10:10"));
        assert!(!iso("2015-07-25/11:10"));
        assert!(!iso("2015-07-25t11:10"));
    }

    #[test]
    fn iso_checks_zone_designator() {
        assert!(!iso("2018-06-22T18:22:19.123-09000"));
        assert!(!iso("2018-06-22T18:22:19.123-080"));
        assert!(!iso("2018-06-22T18:22:19.123+1300"));
        assert!(!iso("2018-06-22T18:22:19.123+0575"));
        assert!(!iso("2018-06-22T18:22:19.123XYZ"));
        // 时区必须跟随时间部分
        assert!(!iso("2018-06-22Z"));
        assert!(!iso("2018-06-22-0800"));
    }

    #[test]
    fn iso_rejects_garbage_without_panicking() {
        assert!(!iso(""));
        assert!(!iso("not a date"));
        assert!(!iso("2015-07-2"));
        assert!(!iso("2015-07-25 1:10"));
    }

    #[test]
    fn day_month_year_cases() {
        assert!(dmy("25 Jul, 2015"));
        assert!(dmy("25 Jul 2015"));
        assert!(dmy("1 DEC 1999"));
        assert!(dmy("29 Feb 2016"));
        assert!(!dmy("29 Feb 2015"));
        assert!(!dmy("40 Jan 2017"));
        assert!(!dmy("0 Jan 2017"));
        assert!(!dmy("31 Apr 2017"));
        assert!(!dmy("25 Jaan 2017"));
        assert!(!dmy("25 July 2017"));
        assert!(!dmy("25 Foo 2017"));
    }

    #[test]
    fn builtin_lookup_and_closures() {
        assert_eq!(Validator::builtin("iso8601").map(|v| v.name().to_string()).as_deref(), Some("iso8601"));
        assert!(Validator::builtin("day_month_year").is_some());
        assert!(Validator::builtin("nope").is_none());

        let even = Validator::new("even_length", |s: &str| s.len() % 2 == 0);
        assert!(even.is_valid("ab"));
        assert!(!even.is_valid("abc"));
    }
}
