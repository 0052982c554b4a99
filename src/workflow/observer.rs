//! 评分进度观察者
//!
//! 进度上报是旁路：流程只通知观察者，不依赖其结果。

use tracing::{debug, info, warn};

use crate::models::GradingResult;
use crate::workflow::grading_flow::AttemptFailure;

/// 日志中模型输出的最大字符数
const RESPONSE_PREVIEW_CHARS: usize = 200;

/// 评分进度观察者
pub trait GradingObserver: Send + Sync {
    /// 批次开始
    fn on_batch_start(&self, _total: usize, _model: &str) {}

    /// 开始处理第 `index` 个条目（从 1 开始）
    fn on_item_start(&self, _index: usize, _total: usize, _id: &str) {}

    /// 某次尝试失败（`attempt` 从 0 开始）
    fn on_attempt_failed(&self, _id: &str, _attempt: u32, _failure: &AttemptFailure) {}

    /// 条目处理完成
    fn on_item_finished(&self, _result: &GradingResult) {}

    /// 批次结束
    fn on_batch_finished(&self, _successful: usize, _total: usize) {}
}

/// 输出到 tracing 的默认观察者
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GradingObserver for TracingObserver {
    fn on_batch_start(&self, total: usize, model: &str) {
        info!("使用 {} 评分 {} 份提交", model, total);
    }

    fn on_item_start(&self, index: usize, total: usize, id: &str) {
        info!("[{}/{}] 正在评分 {}...", index, total, id);
    }

    fn on_attempt_failed(&self, id: &str, attempt: u32, failure: &AttemptFailure) {
        debug!("[{}] 第 {} 次尝试失败: {}", id, attempt, failure);
        if let Some(preview) = failure.response_preview(RESPONSE_PREVIEW_CHARS) {
            debug!("[{}] 模型输出: {}", id, preview);
        }
    }

    fn on_item_finished(&self, result: &GradingResult) {
        if let GradingResult::Failed { id, error } = result {
            warn!("❌ 评分失败: {} ({})", id, error);
        }
    }

    fn on_batch_finished(&self, successful: usize, total: usize) {
        info!("评分完成: 成功 {}/{}", successful, total);
    }
}
