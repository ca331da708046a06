use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexhunter_core::{load_extractors, scan, scan_and_write, Extractor, ExtractorSet, OutputItem, ScanOptions};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "lexhunter", version, about = "序数、整数与日期记号抽取")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 扫描文件或目录并生成 result.json
    Scan {
        /// 输入文件或目录
        #[arg(long)]
        input: PathBuf,

        /// 输出文件（JSON 数组）
        #[arg(long, default_value = "./result.json")]
        output: PathBuf,

        /// 启用的抽取器（逗号分隔，按此顺序归并）；缺省为表中全部
        #[arg(long, value_delimiter = ',')]
        extractors: Vec<String>,

        /// 抽取器表路径（TOML），缺省使用内置表
        #[arg(long)]
        rules: Option<PathBuf>,

        /// 线程数（"auto"=CPU 核心数）
        #[arg(long, default_value = "auto")]
        threads: String,

        /// 最大扫描文件大小（单位字节，例如 5242880 代表 5MB）
        #[arg(long)]
        max_file_size: Option<u64>,
    },
    /// 扫描一段文本，每个命中输出一行 JSON
    Text {
        /// 待扫描文本
        text: String,

        /// 启用的抽取器（逗号分隔）
        #[arg(long, value_delimiter = ',')]
        extractors: Vec<String>,

        /// 抽取器表路径（TOML）
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// 列出抽取器表中的抽取器
    List {
        /// 抽取器表路径（TOML）
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { input, output, extractors, rules, threads, max_file_size } => {
            info!(?input, ?output, "starting scan");

            // 以缓冲方式打开输出文件，按 JSON 数组流式写入
            let mut out = BufWriter::new(File::create(&output).context("create output file")?);
            let opts = ScanOptions { extractors, max_file_size, rules_path: rules, threads: parse_threads(&threads) };
            let stats = scan_and_write(&input, &mut out, &opts).context("scan and write failed")?;
            out.flush().context("flush output file")?;

            info!(
                files_scanned = stats.files_scanned,
                files_skipped = stats.files_skipped,
                outputs_written = stats.outputs_written,
                "scan finished"
            );
        }
        Commands::Text { text, extractors, rules } => {
            let opts = ScanOptions { extractors, rules_path: rules, ..Default::default() };
            let table = load_extractors(&opts)?;
            let selected = if opts.extractors.is_empty() {
                table.iter().collect()
            } else {
                table.select(&opts.extractors)?
            };

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for m in scan(&text, selected) {
                serde_json::to_writer(&mut out, &OutputItem::from_match("-", &m))?;
                writeln!(out)?;
            }
        }
        Commands::List { rules } => {
            let table = load_extractors(&ScanOptions { rules_path: rules, ..Default::default() })?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for e in &table {
                writeln!(out, "{}", describe(e))?;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 日志写到 stderr，避免污染 text/list 子命令的标准输出
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// list 子命令的单行输出：id、名称、校验器（无则为 -）、模式
fn describe(e: &Extractor) -> String {
    let validator = e.validator().map_or("-", |v| v.name());
    format!("{}\t{}\t{}\t{}", e.id(), e.name(), validator, e.matcher().pattern())
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
