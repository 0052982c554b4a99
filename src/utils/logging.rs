//! 日志工具模块
//!
//! 初始化控制台 + 文件日志，并提供日志格式化的辅助函数

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// 初始化全局日志
///
/// `RUST_LOG` 优先于配置中的级别。重复初始化时静默忽略。
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer().with_target(false);

    let file_layer = match &config.log_file {
        Some(path) => {
            init_log_file(path)?;
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .with_context(|| format!("无法打开日志文件: {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    Ok(())
}

/// 初始化日志文件（追加本次运行的文件头，保留之前的日志）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
        }
    }
    let log_header = format!(
        "{}\n评分评估日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .and_then(|mut file| file.write_all(log_header.as_bytes()))
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 输出分隔横幅
pub fn log_banner(title: &str) {
    info!("{}", "=".repeat(50));
    info!("{}", title);
    info!("{}", "=".repeat(50));
}

/// 记录流水线步骤
///
/// # 参数
/// - `step`: 当前步骤（从 1 开始）
/// - `total`: 步骤总数
/// - `description`: 步骤描述
pub fn log_step(step: usize, total: usize, description: &str) {
    info!("[{}/{}] {}", step, total, description);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
