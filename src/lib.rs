//! # Grade Eval
//!
//! 评估本地大模型（通过命令行调用）给学生代码打分的准确度，
//! 与人工字母评分对比并按评分维度统计误差。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有外部进程，只暴露"运行一次评分进程"的能力
//! - `CommandInvoker` - 临时文件输入、超时终止、失败原因归类
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `response_extractor` - 从自由文本中提取 JSON 记录
//! - `sample_loader` / `normalization` / `metrics_service` - 数据准备与统计
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一份提交"的评分流程（调用 → 提取 → 重试）
//! - `GradingObserver` - 进度旁路上报
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_grader` - 顺序批量评分，结束时一次性写入结果
//! - `orchestrator/pipeline` - 完整评估流水线

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{CommandInvoker, InvocationOutcome, Invoker};
pub use models::{GradingBatch, GradingItem, GradingResult, PromptTemplate};
pub use orchestrator::{App, BatchGrader, RunSummary};
pub use services::extract_record;
pub use workflow::{GradingFlow, GradingObserver, RetryPolicy, TracingObserver};
