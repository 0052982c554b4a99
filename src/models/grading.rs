//! 评分条目与评分结果

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 模型输出中提取出的结构化评分记录
pub type ExtractedRecord = Map<String, JsonValue>;

/// 结果信封占用的字段名，模型记录中的同名键会被丢弃
const RESERVED_KEYS: [&str; 3] = ["id", "model", "error"];

/// 待评分条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingItem {
    pub id: String,
    pub payload: String,
}

impl GradingItem {
    pub fn new(id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }
}

/// 单个条目的评分结果
///
/// 序列化格式：
/// - 成功：`{"id": .., <记录中的键>.., "model": ..}`
/// - 失败：`{"id": .., "error": ..}`
///
/// 反序列化同样经过 [`GradingResult::graded`]，记录中不会残留保留字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, from = "StoredResult")]
pub enum GradingResult {
    Graded {
        id: String,
        #[serde(flatten)]
        record: ExtractedRecord,
        model: String,
    },
    Failed {
        id: String,
        error: String,
    },
}

/// 磁盘上的结果格式
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredResult {
    Graded {
        id: String,
        #[serde(flatten)]
        record: ExtractedRecord,
        model: String,
    },
    Failed {
        id: String,
        error: String,
    },
}

impl From<StoredResult> for GradingResult {
    fn from(stored: StoredResult) -> Self {
        match stored {
            StoredResult::Graded { id, record, model } => GradingResult::graded(id, record, model),
            StoredResult::Failed { id, error } => GradingResult::failed(id, error),
        }
    }
}

impl GradingResult {
    /// 构造成功结果
    pub fn graded(id: impl Into<String>, mut record: ExtractedRecord, model: impl Into<String>) -> Self {
        for key in RESERVED_KEYS {
            record.remove(key);
        }
        GradingResult::Graded {
            id: id.into(),
            record,
            model: model.into(),
        }
    }

    /// 构造失败结果
    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        GradingResult::Failed {
            id: id.into(),
            error: reason.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            GradingResult::Graded { id, .. } | GradingResult::Failed { id, .. } => id,
        }
    }

    pub fn is_graded(&self) -> bool {
        matches!(self, GradingResult::Graded { .. })
    }

    pub fn record(&self) -> Option<&ExtractedRecord> {
        match self {
            GradingResult::Graded { record, .. } => Some(record),
            GradingResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GradingResult::Failed { error, .. } => Some(error),
            GradingResult::Graded { .. } => None,
        }
    }
}

/// 一次运行的全部评分结果，顺序与输入一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradingBatch {
    results: Vec<GradingResult>,
}

impl GradingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
        }
    }

    /// 追加结果（只追加，不修改已有结果）
    pub fn push(&mut self, result: GradingResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[GradingResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GradingResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// 成功评分的数量
    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.is_graded()).count()
    }
}

impl<'a> IntoIterator for &'a GradingBatch {
    type Item = &'a GradingResult;
    type IntoIter = std::slice::Iter<'a, GradingResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> ExtractedRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_graded_serializes_flat() {
        let result = GradingResult::graded(
            "7",
            record(json!({"grades": {"Correctness": "A"}})),
            "llama3",
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"id": "7", "grades": {"Correctness": "A"}, "model": "llama3"})
        );
    }

    #[test]
    fn test_failed_serializes_error_marker() {
        let result = GradingResult::failed("8", "timeout after 30s");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"id": "8", "error": "timeout after 30s"}));
    }

    #[test]
    fn test_reserved_keys_are_dropped_from_record() {
        let result = GradingResult::graded(
            "1",
            record(json!({"id": "99", "model": "other", "error": "x", "Readability": "B"})),
            "llama3",
        );
        assert_eq!(result.id(), "1");
        let rec = result.record().unwrap();
        assert_eq!(rec.len(), 1);
        assert_eq!(rec["Readability"], json!("B"));
    }

    #[test]
    fn test_loaded_result_drops_reserved_keys() {
        let result: GradingResult =
            serde_json::from_str(r#"{"id":"1","grades":{},"model":"m","error":"x"}"#).unwrap();
        assert!(result.is_graded());
        assert_eq!(result.error(), None);
        assert_eq!(result.record().unwrap(), &record(json!({"grades": {}})));
    }

    #[test]
    fn test_batch_deserializes_mixed_results() {
        let text = r#"[
            {"id": "1", "grades": {"Correctness": "B"}, "model": "m"},
            {"id": "2", "error": "executable not found"}
        ]"#;
        let batch: GradingBatch = serde_json::from_str(text).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.successful(), 1);
        assert!(batch.results()[0].is_graded());
        assert_eq!(batch.results()[1].error(), Some("executable not found"));
    }
}
