use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 人工评分：提交编号 → (维度 → 平均分)
pub type HumanScores = BTreeMap<String, BTreeMap<String, f64>>;

/// 单个维度的误差统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionMetrics {
    pub count: usize,
    #[serde(rename = "MAE")]
    pub mae: Option<f64>,
    #[serde(rename = "RMSE")]
    pub rmse: Option<f64>,
    pub accuracy_pct: Option<f64>,
}

/// 总体统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_predictions: usize,
    pub successful: usize,
    pub threshold_used: f64,
}

/// 评估指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub per_dimension: BTreeMap<String, DimensionMetrics>,
    pub overall: OverallMetrics,
}
