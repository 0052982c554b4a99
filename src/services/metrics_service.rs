//! 评估指标服务
//!
//! 对比模型评分与人工评分，按维度统计 MAE / RMSE / 阈值准确率。

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value as JsonValue;
use tracing::info;

use crate::error::AppResult;
use crate::models::{
    DimensionMetrics, GradeMap, GradingBatch, GradingResult, HumanScores, Metrics, OverallMetrics,
};
use crate::services::artifact_writer;

#[derive(Default)]
struct Accumulator {
    abs_diffs: Vec<f64>,
    sq_diffs: Vec<f64>,
    within: usize,
}

impl Accumulator {
    fn finish(&self) -> DimensionMetrics {
        let count = self.abs_diffs.len();
        if count == 0 {
            return DimensionMetrics {
                count,
                mae: None,
                rmse: None,
                accuracy_pct: None,
            };
        }
        let n = count as f64;
        DimensionMetrics {
            count,
            mae: Some(round_to(self.abs_diffs.iter().sum::<f64>() / n, 2)),
            rmse: Some(round_to((self.sq_diffs.iter().sum::<f64>() / n).sqrt(), 2)),
            accuracy_pct: Some(round_to(self.within as f64 / n * 100.0, 1)),
        }
    }
}

/// 计算指标并写入 `output_path`
pub fn compute_metrics(
    batch: &GradingBatch,
    human: &HumanScores,
    dimensions: &[String],
    grade_map: &GradeMap,
    accuracy_threshold: f64,
    output_path: &Path,
) -> AppResult<Metrics> {
    let metrics = evaluate(batch, human, dimensions, grade_map, accuracy_threshold);
    artifact_writer::write_json(output_path, &metrics)?;

    info!("指标汇总:");
    for dim in dimensions {
        if let Some(m) = metrics.per_dimension.get(dim) {
            if let (Some(mae), Some(acc)) = (m.mae, m.accuracy_pct) {
                info!("  {}: MAE={}, 准确率={}%", dim, mae, acc);
            }
        }
    }
    info!("已保存 -> {}", output_path.display());
    Ok(metrics)
}

pub fn evaluate(
    batch: &GradingBatch,
    human: &HumanScores,
    dimensions: &[String],
    grade_map: &GradeMap,
    accuracy_threshold: f64,
) -> Metrics {
    let mut accumulators: BTreeMap<&str, Accumulator> = dimensions
        .iter()
        .map(|d| (d.as_str(), Accumulator::default()))
        .collect();

    for result in batch {
        let GradingResult::Graded { id, record, .. } = result else {
            continue;
        };
        let Some(human_scores) = human.get(id) else {
            continue;
        };
        // 优先读取 "grades" 子对象，否则直接读取顶层字段
        let letters = match record.get("grades") {
            Some(JsonValue::Object(grades)) => grades,
            _ => record,
        };

        for dim in dimensions {
            let human_score = human_scores.get(dim);
            let model_score = letters
                .get(dim)
                .and_then(JsonValue::as_str)
                .and_then(|letter| grade_map.score(letter));

            if let (Some(&h), Some(m)) = (human_score, model_score) {
                let acc = accumulators.entry(dim.as_str()).or_default();
                let diff = (m - h).abs();
                acc.abs_diffs.push(diff);
                acc.sq_diffs.push((m - h).powi(2));
                if diff <= accuracy_threshold {
                    acc.within += 1;
                }
            }
        }
    }

    Metrics {
        per_dimension: accumulators
            .iter()
            .map(|(dim, acc)| (dim.to_string(), acc.finish()))
            .collect(),
        overall: OverallMetrics {
            total_predictions: batch.len(),
            successful: batch.successful(),
            threshold_used: accuracy_threshold,
        },
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
