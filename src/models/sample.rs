use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::grading::GradingItem;

/// CSV 中的一行人工评分（列名 → 值）
pub type HumanRow = BTreeMap<String, String>;

/// 一份学生提交
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 提交编号（participant_id）
    pub submission_id: String,
    /// 拼接后的全部源码
    pub code: String,
    /// 该提交对应的全部人工评分行
    #[serde(default)]
    pub human_rows: Vec<HumanRow>,
}

impl Sample {
    /// 转换为评分条目
    pub fn to_grading_item(&self) -> GradingItem {
        GradingItem::new(self.submission_id.clone(), self.code.clone())
    }
}
