//! 语料扫描主流程与并行调度
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::extractors::{Extractor, ExtractorSet};
use crate::findings::Finding;
use crate::options::{ScanOptions, ScanStats};
use crate::rules::{load_extractor_table, RuleError};

/// 按选项加载抽取器表：指定路径则读 TOML，否则使用内置表
pub fn load_extractors(opts: &ScanOptions) -> Result<ExtractorSet> {
    let set = match &opts.rules_path {
        Some(path) => load_extractor_table(path)?,
        None => ExtractorSet::builtin()?,
    };
    Ok(set)
}

/// 扫描文件或目录，并将结果以 JSON 数组流式写入 `out`
/// 稳定性保证：
/// - 文件级：按路径排序，确保输出顺序可复现
/// - 文件内：沿用引擎顺序（起点升序，并列时按抽取器顺序）
pub fn scan_and_write(input: &Path, out: &mut dyn Write, opts: &ScanOptions) -> Result<ScanStats> {
    let table = Arc::new(load_extractors(opts)?);
    // 校验抽取器选择，尽早报错
    let selected = selected_indices(&table, &opts.extractors)?;

    let files = collect_files(input)?;
    debug!(files = files.len(), extractors = selected.len(), "collected input files");

    let mut stats = ScanStats::default();
    let threads = opts.threads.unwrap_or_else(num_cpus::get);

    if threads > 1 && files.len() > 1 {
        scan_and_write_parallel(input, &files, out, opts, &table, &selected, &mut stats, threads)?;
        return Ok(stats);
    }

    // 串行路径
    write!(out, "[")?;
    let mut first = true;
    for path in &files {
        let label = file_label(input, path);
        match scan_file(path, opts.max_file_size, &table, &selected) {
            Some(findings) => {
                stats.files_scanned += 1;
                write_findings(out, &mut first, &label, &findings, &mut stats)?;
            }
            None => stats.files_skipped += 1,
        }
    }
    write!(out, "]")?;
    Ok(stats)
}

/// 将抽取器 id 解析为表内下标；为空表示全部
fn selected_indices(table: &ExtractorSet, ids: &[String]) -> Result<Vec<usize>> {
    if ids.is_empty() {
        return Ok((0..table.len()).collect());
    }
    let picked = ids
        .iter()
        .map(|id| table.position(id).ok_or_else(|| RuleError::UnknownExtractor(id.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(picked)
}

/// 遍历输入（单文件或目录），按路径排序
fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = vec![];
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) if err.depth() == 0 => {
                return Err(err).with_context(|| format!("read input {}", input.display()));
            }
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() { files.push(entry.into_path()); }
    }
    Ok(files)
}

/// 输出中的文件标识：相对输入目录的路径；输入本身是文件时为文件名
fn file_label(input: &Path, path: &Path) -> String {
    let rel = match path.strip_prefix(input) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => path.file_name().map(Path::new).unwrap_or(path),
    };
    rel.to_string_lossy().into_owned()
}

/// 扫描单个文件；超限、不可读或非 UTF-8 时返回 None
fn scan_file(path: &Path, max_file_size: Option<u64>, table: &ExtractorSet, selected: &[usize]) -> Option<Vec<Finding>> {
    if let Some(max) = max_file_size {
        if let Ok(md) = std::fs::metadata(path) {
            if md.len() > max {
                debug!(path = %path.display(), size = md.len(), "file exceeds max size");
                return None;
            }
        }
    }
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(err) => {
            warn!(path = %path.display(), %err, "skipping file");
            return None;
        }
    };
    let all = table.as_slice();
    let extractors: Vec<&Extractor> = selected.iter().map(|&i| &all[i]).collect();
    Some(crate::engine::scan(&text, extractors).map(|m| Finding::from_match(&m)).collect())
}

fn write_findings(out: &mut dyn Write, first: &mut bool, file: &str, findings: &[Finding], stats: &mut ScanStats) -> Result<()> {
    for f in findings {
        stats.outputs_written += 1;
        if !*first { write!(out, ",")?; } else { *first = false; }
        serde_json::to_writer(&mut *out, &f.output(file))?;
    }
    Ok(())
}

/// 并行调度：
/// - 使用 Rayon 线程池并行扫描，抽取器表只读共享
/// - 单线程 Writer 按 idx 重排并流式写 JSON，保证稳定顺序
#[allow(clippy::too_many_arguments)]
fn scan_and_write_parallel(
    input: &Path,
    files: &[PathBuf],
    out: &mut dyn Write,
    opts: &ScanOptions,
    table: &Arc<ExtractorSet>,
    selected: &[usize],
    stats: &mut ScanStats,
    threads: usize,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;
    use std::collections::BTreeMap;

    write!(out, "[")?;
    let mut first = true;

    // 通道用于 worker → writer 传递结果；None 表示该文件被跳过
    type Msg = (usize /*idx*/, Option<Vec<Finding>>);
    let (tx, rx) = channel::bounded::<Msg>(256);

    // Writer 保持在当前线程，扫描放到后台线程的 Rayon 池中
    let table = Arc::clone(table);
    let selected = selected.to_vec();
    let max_file_size = opts.max_file_size;
    let files_vec: Vec<(usize, PathBuf)> = files.iter().cloned().enumerate().collect();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build rayon pool")?;

    let scan_thread = std::thread::spawn(move || {
        pool.install(|| {
            files_vec.par_iter().for_each_with(tx, |tx, (idx, path)| {
                let _ = tx.send((*idx, scan_file(path, max_file_size, &table, &selected)));
            });
        });
        // 结束后 Sender 全部被丢弃，Receiver 将收到关闭信号
    });

    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, Option<Vec<Finding>>> = BTreeMap::new();

    let written = (|| -> Result<()> {
        while let Ok((idx, res)) = rx.recv() {
            buffer.insert(idx, res);
            // 从 next_idx 开始顺序冲刷
            while let Some(res) = buffer.remove(&next_idx) {
                match res {
                    Some(findings) => {
                        stats.files_scanned += 1;
                        let label = file_label(input, &files[next_idx]);
                        write_findings(out, &mut first, &label, &findings, stats)?;
                    }
                    None => stats.files_skipped += 1,
                }
                next_idx += 1;
            }
        }
        Ok(())
    })();

    // 写出失败时先关闭 Receiver，worker 的 send 随即失败并退出，再回收扫描线程
    drop(rx);
    let joined = scan_thread.join();
    written?;
    if joined.is_err() {
        anyhow::bail!("scan worker panicked");
    }

    write!(out, "]")?;
    Ok(())
}
