//! 扫描选项与统计信息（模块）
use std::path::PathBuf;

/// 语料扫描选项
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 启用的抽取器 id（按此顺序参与归并）；为空表示使用表中全部抽取器
    pub extractors: Vec<String>,
    /// 最大文件大小（字节）；超过则跳过
    pub max_file_size: Option<u64>,
    /// 抽取器表路径（TOML）；为空则使用内置表
    pub rules_path: Option<PathBuf>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub outputs_written: usize,
}
