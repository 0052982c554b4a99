//! 批量评分驱动 - 编排层
//!
//! ## 职责
//!
//! 1. **顺序处理**：逐个条目调用 `GradingFlow`，不并发、不交错
//! 2. **结果收集**：每个输入条目恰好产生一个结果，顺序与输入一致
//! 3. **一次持久化**：全部条目完成后整体覆盖写入输出文件
//!
//! 单个条目的失败只是数据；只有写文件失败会向上传播。

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ModelConfig;
use crate::error::AppResult;
use crate::infrastructure::{CommandInvoker, Invoker};
use crate::models::{GradingBatch, GradingItem, PromptTemplate};
use crate::services::artifact_writer;
use crate::workflow::{GradingFlow, GradingObserver, RetryPolicy, TracingObserver};

/// 批量评分器
pub struct BatchGrader {
    flow: GradingFlow,
}

impl BatchGrader {
    pub fn new(flow: GradingFlow) -> Self {
        Self { flow }
    }

    /// 按模型配置创建命令行评分器
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::with_parts(
            Arc::new(CommandInvoker::from_config(config)),
            Arc::new(TracingObserver),
            config,
        )
    }

    pub fn with_parts(
        invoker: Arc<dyn Invoker>,
        observer: Arc<dyn GradingObserver>,
        config: &ModelConfig,
    ) -> Self {
        Self::new(GradingFlow::new(
            invoker,
            observer,
            config.name.clone(),
            config.timeout,
            RetryPolicy::new(config.retries),
        ))
    }

    /// 依次评分全部条目
    pub async fn grade_all(&self, items: &[GradingItem], template: &PromptTemplate) -> GradingBatch {
        let observer = self.flow.observer();
        let total = items.len();
        observer.on_batch_start(total, self.flow.model());

        let mut batch = GradingBatch::with_capacity(total);
        for (idx, item) in items.iter().enumerate() {
            observer.on_item_start(idx + 1, total, &item.id);
            let result = self.flow.run(item, template).await;
            observer.on_item_finished(&result);
            batch.push(result);
        }

        observer.on_batch_finished(batch.successful(), batch.len());
        batch
    }

    /// 评分全部条目并写入 `output_path`
    pub async fn grade_and_persist(
        &self,
        items: &[GradingItem],
        template: &PromptTemplate,
        output_path: &Path,
    ) -> AppResult<GradingBatch> {
        let batch = self.grade_all(items, template).await;
        persist_batch(&batch, output_path)?;
        Ok(batch)
    }
}

/// 整体写入评分结果
pub fn persist_batch(batch: &GradingBatch, output_path: &Path) -> AppResult<()> {
    artifact_writer::write_json(output_path, batch)?;
    info!(
        "评分结果: 成功 {}/{} -> {}",
        batch.successful(),
        batch.len(),
        output_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, FileError};
    use crate::infrastructure::InvocationOutcome;
    use crate::workflow::grading_flow::test_support::{RecordingObserver, ScriptedInvoker};
    use crate::workflow::NO_RECORD_REASON;
    use std::time::Duration;
    use tokio::time::Instant;

    fn model_config(retries: u32) -> ModelConfig {
        ModelConfig {
            name: "llama3".to_string(),
            timeout: 30,
            retries,
            ..ModelConfig::default()
        }
    }

    fn items(ids: &[&str]) -> Vec<GradingItem> {
        ids.iter()
            .map(|id| GradingItem::new(*id, format!("class S{} {{}}", id)))
            .collect()
    }

    fn template() -> PromptTemplate {
        PromptTemplate::new("Grade:\n{CODE}").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_success_keeps_order_without_pauses() {
        let invoker = Arc::new(ScriptedInvoker::always(InvocationOutcome::Success(
            r#"{"grades": {"Correctness": "A"}}"#.to_string(),
        )));
        let observer = Arc::new(RecordingObserver::default());
        let grader = BatchGrader::with_parts(invoker.clone(), observer.clone(), &model_config(2));

        let started = Instant::now();
        let batch = grader.grade_all(&items(&["3", "1", "2"]), &template()).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(invoker.calls(), 3);
        let ids: Vec<&str> = batch.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert!(batch.iter().all(|r| r.is_graded()));

        // 每个条目处理完才开始下一个
        assert_eq!(
            *observer.events.lock().unwrap(),
            vec!["start 1/3 3", "done 3", "start 2/3 1", "done 1", "start 3/3 2", "done 2"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failures_use_full_attempt_budget() {
        let invoker = Arc::new(ScriptedInvoker::always(InvocationOutcome::Failure(
            "executable not found".to_string(),
        )));
        let grader =
            BatchGrader::with_parts(invoker.clone(), Arc::new(RecordingObserver::default()), &model_config(2));

        let batch = grader.grade_all(&items(&["a", "b"]), &template()).await;

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.successful(), 0);
        assert_eq!(invoker.calls(), 2 * 3);
        assert!(batch.iter().all(|r| r.error() == Some("executable not found")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_results_in_one_batch() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            InvocationOutcome::Success("no json here".to_string()),
            InvocationOutcome::Success(r#"ok {"Readability": "C"}"#.to_string()),
        ]));
        let grader =
            BatchGrader::with_parts(invoker.clone(), Arc::new(RecordingObserver::default()), &model_config(0));

        let batch = grader.grade_all(&items(&["1", "2"]), &template()).await;

        assert_eq!(batch.results()[0].error(), Some(NO_RECORD_REASON));
        assert!(batch.results()[1].is_graded());
        assert_eq!(invoker.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_input_produces_empty_batch_file() {
        let invoker = Arc::new(ScriptedInvoker::always(InvocationOutcome::Failure("x".into())));
        let grader =
            BatchGrader::with_parts(invoker.clone(), Arc::new(RecordingObserver::default()), &model_config(1));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("predictions/run.json");

        let batch = grader.grade_and_persist(&[], &template(), &path).await.unwrap();

        assert!(batch.is_empty());
        assert_eq!(invoker.calls(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[tokio::test(start_paused = true)]
    async fn test_persisted_document_shape() {
        let invoker = Arc::new(ScriptedInvoker::new(vec![
            InvocationOutcome::Success(r#"{"grades": {"Correctness": "B"}}"#.to_string()),
            InvocationOutcome::Failure("timeout after 30s".to_string()),
        ]));
        let grader =
            BatchGrader::with_parts(invoker, Arc::new(RecordingObserver::default()), &model_config(0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        grader
            .grade_and_persist(&items(&["1", "2"]), &template(), &path)
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"id": "1", "grades": {"Correctness": "B"}, "model": "llama3"},
                {"id": "2", "error": "timeout after 30s"}
            ])
        );
    }

    #[test]
    fn test_persist_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file").unwrap();

        let err = persist_batch(&GradingBatch::new(), &blocker.join("out.json")).unwrap_err();
        assert!(matches!(err, AppError::File(FileError::WriteFailed { .. })));
    }
}
