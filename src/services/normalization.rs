//! 人工评分归一化
//!
//! 字母等级换算为分数，并按 skill 求平均。

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::error::AppResult;
use crate::models::{GradeMap, HumanScores, Sample};
use crate::services::artifact_writer;

/// 归一化全部样本的人工评分并写入 `output_path`
///
/// 每个样本都会出现在结果中（没有可用评分时为空表）。
pub fn normalize_human_grades(
    samples: &[Sample],
    grade_map: &GradeMap,
    output_path: &Path,
) -> AppResult<HumanScores> {
    let scores = average_scores(samples, grade_map);
    artifact_writer::write_json(output_path, &scores)?;
    info!("已归一化 {} 个提交的人工评分 -> {}", scores.len(), output_path.display());
    Ok(scores)
}

pub fn average_scores(samples: &[Sample], grade_map: &GradeMap) -> HumanScores {
    let mut result = HumanScores::new();

    for sample in samples {
        let mut per_skill: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

        for row in &sample.human_rows {
            let skill = row.get("skill").map(String::as_str).unwrap_or_default();
            let grade = row.get("grade").map(|g| g.trim()).unwrap_or_default();
            if skill.is_empty() || grade.is_empty() {
                continue;
            }
            if let Some(score) = grade_map.score(grade) {
                per_skill.entry(skill).or_default().push(score);
            }
        }

        let averaged = per_skill
            .into_iter()
            .map(|(skill, values)| {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                (skill.to_string(), mean)
            })
            .collect();

        result.insert(sample.submission_id.clone(), averaged);
    }

    result
}
