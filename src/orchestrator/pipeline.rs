//! 评估流水线 - 编排层
//!
//! 准备数据 → 模型评分 → 人工评分归一化 → 计算指标

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::models::{GradingItem, Metrics, PromptTemplate};
use crate::orchestrator::batch_grader::BatchGrader;
use crate::services::{compute_metrics, normalize_human_grades, prepare_samples};
use crate::utils::logging::{log_banner, log_step};

const TOTAL_STEPS: usize = 4;

/// 本次运行的产物路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub samples: PathBuf,
    pub predictions: PathBuf,
    pub human_grades: PathBuf,
    pub metrics: PathBuf,
}

impl ArtifactPaths {
    pub fn for_run(config: &Config, run_id: &str) -> Self {
        let artifacts = &config.artifacts;
        Self {
            samples: artifacts.data_dir.join(format!("{}_samples.json", run_id)),
            predictions: artifacts
                .predictions_dir
                .join(format!("{}_predictions.json", run_id)),
            human_grades: artifacts
                .metrics_dir
                .join(format!("{}_human_grades.json", run_id)),
            metrics: artifacts.metrics_dir.join(format!("{}_metrics.json", run_id)),
        }
    }
}

/// 运行结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub metrics: Metrics,
}

/// 生成运行编号（UTC 时间戳）
pub fn new_run_id() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// 应用主结构
pub struct App {
    config: Config,
    run_id: String,
    paths: ArtifactPaths,
    grader: BatchGrader,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        Self::with_run_id(config, new_run_id())
    }

    pub fn with_run_id(config: Config, run_id: impl Into<String>) -> Result<Self> {
        config.validate().context("配置校验失败")?;
        let grader = BatchGrader::from_config(&config.model);
        Self::with_grader(config, run_id, grader)
    }

    /// 使用指定的评分器（便于替换调用器）
    pub fn with_grader(config: Config, run_id: impl Into<String>, grader: BatchGrader) -> Result<Self> {
        let run_id = run_id.into();
        let paths = ArtifactPaths::for_run(&config, &run_id);

        log_banner("AI 评分评估流水线");
        info!("运行编号: {} | 模型: {}", run_id, config.model.name);

        Ok(Self {
            config,
            run_id,
            paths,
            grader,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// 运行完整流水线
    pub async fn run(&self) -> Result<RunSummary> {
        let config = &self.config;

        // 模板先于耗时步骤校验
        let template = PromptTemplate::load(&config.paths.prompt_template)
            .context("无法加载提示词模板")?;

        log_step(1, TOTAL_STEPS, "准备数据...");
        let samples = prepare_samples(
            &config.paths.samples_csv,
            &config.paths.submissions_dir,
            &self.paths.samples,
        )
        .context("数据准备失败")?;

        log_step(2, TOTAL_STEPS, "模型评分...");
        let items: Vec<GradingItem> = samples.iter().map(|s| s.to_grading_item()).collect();
        let batch = self
            .grader
            .grade_and_persist(&items, &template, &self.paths.predictions)
            .await
            .context("无法保存评分结果")?;

        log_step(3, TOTAL_STEPS, "归一化人工评分...");
        let human = normalize_human_grades(
            &samples,
            &config.evaluation.grade_map,
            &self.paths.human_grades,
        )
        .context("人工评分归一化失败")?;

        log_step(4, TOTAL_STEPS, "计算指标...");
        let metrics = compute_metrics(
            &batch,
            &human,
            &config.evaluation.dimensions,
            &config.evaluation.grade_map,
            config.evaluation.accuracy_threshold,
            &self.paths.metrics,
        )
        .context("指标计算失败")?;

        print_final_stats(&metrics, &config.artifacts.base_dir);

        Ok(RunSummary {
            run_id: self.run_id.clone(),
            metrics,
        })
    }
}

fn print_final_stats(metrics: &Metrics, base_dir: &Path) {
    log_banner("流水线完成");
    info!(
        "✅ 成功评分: {}/{}",
        metrics.overall.successful, metrics.overall.total_predictions
    );
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("产物已保存至: {}", base_dir.display());
}
