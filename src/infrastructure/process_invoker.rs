//! 评分进程调用器 - 基础设施层
//!
//! 只暴露"运行一次评分进程"的能力：
//! - 提示词先写入临时文件，再作为子进程的标准输入
//! - 等待不超过超时时间，超时后终止子进程
//! - 临时文件在任何退出路径上都会被删除
//!
//! 不做重试，重试策略属于流程层。

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ModelConfig;

/// 找不到可执行文件时的失败原因
pub const EXECUTABLE_NOT_FOUND: &str = "executable not found";

/// 单次调用结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// 进程正常退出，内容为去除首尾空白的标准输出
    Success(String),
    /// 调用失败，内容为失败原因
    Failure(String),
}

/// 评分进程调用接口
#[async_trait]
pub trait Invoker: Send + Sync {
    /// 以 `prompt` 为全部输入运行一次评分进程
    async fn invoke(&self, prompt: &str, model: &str, timeout_secs: u64) -> InvocationOutcome;
}

/// 基于命令行的调用器
///
/// 实际执行 `<program> <args..> <model>`，默认为 `ollama run <model>`。
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    program: String,
    args: Vec<String>,
    staging_dir: Option<PathBuf>,
}

impl CommandInvoker {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            staging_dir: None,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.command.clone(), config.command_args.clone())
    }

    /// 指定临时文件目录（默认为系统临时目录）
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// 将提示词写入唯一命名的临时文件
    fn stage_prompt(&self, prompt: &str) -> io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("grade-prompt-").suffix(".txt");
        let mut staged = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        staged.write_all(prompt.as_bytes())?;
        staged.flush()?;
        Ok(staged)
    }

    async fn run(&self, staged: &NamedTempFile, model: &str, timeout_secs: u64) -> InvocationOutcome {
        let stdin = match staged.reopen() {
            Ok(file) => file,
            Err(e) => return InvocationOutcome::Failure(e.to_string()),
        };

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(model)
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return InvocationOutcome::Failure(EXECUTABLE_NOT_FOUND.to_string())
            }
            Err(e) => return InvocationOutcome::Failure(e.to_string()),
        };

        // 超时时 future 被丢弃，kill_on_drop 负责终止子进程
        let waited =
            tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await;

        let output = match waited {
            Err(_) => return InvocationOutcome::Failure(format!("timeout after {}s", timeout_secs)),
            Ok(Err(e)) => return InvocationOutcome::Failure(e.to_string()),
            Ok(Ok(output)) => output,
        };

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            InvocationOutcome::Success(stdout.trim().to_string())
        } else {
            let status = match output.status.code() {
                Some(code) => code.to_string(),
                None => output.status.to_string(),
            };
            let stderr = String::from_utf8_lossy(&output.stderr);
            InvocationOutcome::Failure(format!("non-zero exit: {}: {}", status, stderr.trim()))
        }
    }
}

#[async_trait]
impl Invoker for CommandInvoker {
    async fn invoke(&self, prompt: &str, model: &str, timeout_secs: u64) -> InvocationOutcome {
        let staged = match self.stage_prompt(prompt) {
            Ok(staged) => staged,
            Err(e) => return InvocationOutcome::Failure(format!("无法写入临时文件: {}", e)),
        };
        debug!("调用 {}，模型: {}，临时文件: {}", self.program, model, staged.path().display());

        let outcome = self.run(&staged, model, timeout_secs).await;

        if let Err(e) = staged.close() {
            warn!("删除临时文件失败: {}", e);
        }
        outcome
    }
}
