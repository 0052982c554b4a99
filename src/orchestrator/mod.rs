//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_grader` - 批量评分驱动
//! - 逐个条目调用 `GradingFlow`（不并发）
//! - 收集 `GradingBatch` 并在结束时一次性写入
//!
//! ### `pipeline` - 评估流水线
//! - 管理运行编号和产物路径
//! - 依次执行：准备数据 → 评分 → 归一化 → 指标
//!
//! ## 层次关系
//!
//! ```text
//! pipeline (App)
//!     ↓
//! batch_grader (处理 Vec<GradingItem>)
//!     ↓
//! workflow::GradingFlow (处理单个条目，含重试)
//!     ↓
//! services (能力层：extract / prepare / normalize / metrics)
//!     ↓
//! infrastructure (基础设施：CommandInvoker)
//! ```

pub mod batch_grader;
pub mod pipeline;

pub use batch_grader::{persist_batch, BatchGrader};
pub use pipeline::{new_run_id, App, ArtifactPaths, RunSummary};
