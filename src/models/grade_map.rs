//! 字母等级 → 分数映射

use std::collections::BTreeMap;

use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 默认等级表
static DEFAULT_GRADES: phf::Map<&'static str, f64> = phf_map! {
    "A" => 93.0,
    "A-" => 90.0,
    "B+" => 87.0,
    "B" => 83.0,
    "B-" => 80.0,
    "C+" => 77.0,
    "C" => 73.0,
    "C-" => 70.0,
    "D+" => 67.0,
    "D" => 63.0,
    "D-" => 60.0,
    "F" => 40.0,
};

/// 等级映射表
///
/// 人工评分和模型评分都通过同一张表换算成分数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeMap(BTreeMap<String, f64>);

impl GradeMap {
    pub fn new(entries: BTreeMap<String, f64>) -> Self {
        Self(entries)
    }

    /// 查询字母等级对应的分数（精确匹配，不做大小写转换）
    pub fn score(&self, letter: &str) -> Option<f64> {
        self.0.get(letter).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for GradeMap {
    fn default() -> Self {
        Self(
            DEFAULT_GRADES
                .entries()
                .map(|(letter, score)| (letter.to_string(), *score))
                .collect(),
        )
    }
}

impl FromIterator<(String, f64)> for GradeMap {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
