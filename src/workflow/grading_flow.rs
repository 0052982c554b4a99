//! 单个提交的评分流程 - 流程层
//!
//! 流程顺序（每次尝试）：
//! 1. 调用评分进程
//! 2. 从输出中提取结构化记录
//!
//! 两步都成功即结束；否则固定暂停后重试，直到用完尝试次数。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::{InvocationOutcome, Invoker};
use crate::models::{ExtractedRecord, GradingItem, GradingResult, PromptTemplate};
use crate::services::extract_record;
use crate::utils::logging::truncate_text;
use crate::workflow::observer::GradingObserver;

/// 最后一次失败是提取失败时记录的原因
pub const NO_RECORD_REASON: &str = "response did not contain a parseable record";

/// 两次尝试之间的默认暂停
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(1);

/// 单次尝试失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// 调用失败（启动失败、非零退出、超时）
    Invocation(String),
    /// 输出中没有可解析的记录，保留原始输出便于排查
    ExtractionMiss { response: String },
}

impl AttemptFailure {
    pub fn reason(&self) -> &str {
        match self {
            AttemptFailure::Invocation(reason) => reason,
            AttemptFailure::ExtractionMiss { .. } => NO_RECORD_REASON,
        }
    }

    /// 提取失败时截断后的模型输出
    pub fn response_preview(&self, max_chars: usize) -> Option<String> {
        match self {
            AttemptFailure::ExtractionMiss { response } => Some(truncate_text(response, max_chars)),
            AttemptFailure::Invocation(_) => None,
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// 重试策略：共 `max_retries + 1` 次尝试，间隔固定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub pause: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            pause: DEFAULT_RETRY_PAUSE,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// 评分流程
///
/// - 决定何时重试、何时放弃
/// - 单个条目的故障全部在这里消化，只产出结果数据
pub struct GradingFlow {
    invoker: Arc<dyn Invoker>,
    observer: Arc<dyn GradingObserver>,
    model: String,
    timeout_secs: u64,
    policy: RetryPolicy,
}

impl GradingFlow {
    pub fn new(
        invoker: Arc<dyn Invoker>,
        observer: Arc<dyn GradingObserver>,
        model: impl Into<String>,
        timeout_secs: u64,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            invoker,
            observer,
            model: model.into(),
            timeout_secs,
            policy,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn observer(&self) -> &dyn GradingObserver {
        self.observer.as_ref()
    }

    /// 评分单个条目，总是返回一个结果
    pub async fn run(&self, item: &GradingItem, template: &PromptTemplate) -> GradingResult {
        let prompt = template.render(&item.payload);
        let mut last_failure = None;

        for attempt in 0..self.policy.total_attempts() {
            if attempt > 0 {
                tokio::time::sleep(self.policy.pause).await;
            }

            match self.attempt(&prompt).await {
                Ok(record) => return GradingResult::graded(&item.id, record, &self.model),
                Err(failure) => {
                    self.observer.on_attempt_failed(&item.id, attempt, &failure);
                    last_failure = Some(failure);
                }
            }
        }

        let reason = last_failure
            .as_ref()
            .map(AttemptFailure::reason)
            .unwrap_or(NO_RECORD_REASON);
        GradingResult::failed(&item.id, reason)
    }

    async fn attempt(&self, prompt: &str) -> Result<ExtractedRecord, AttemptFailure> {
        match self.invoker.invoke(prompt, &self.model, self.timeout_secs).await {
            InvocationOutcome::Failure(reason) => Err(AttemptFailure::Invocation(reason)),
            // 空对象视为没有评分
            InvocationOutcome::Success(text) => match extract_record(&text) {
                Some(record) if !record.is_empty() => Ok(record),
                _ => Err(AttemptFailure::ExtractionMiss { response: text }),
            },
        }
    }
}
