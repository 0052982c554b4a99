//! 响应解析服务 - 业务能力层
//!
//! 从模型的自由文本输出中找出内嵌的 JSON 对象。
//!
//! 取第一个 `{` 到最后一个 `}` 之间的最长片段，而不是最短匹配：
//! 模型常在 JSON 前后附带说明文字，而 JSON 本身可能嵌套。
//! 若说明文字里也出现花括号，这个启发式会失效，属于已知局限。

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::ExtractedRecord;

fn brace_span() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("静态正则必然合法"))
}

/// 提取结构化记录
///
/// 没有候选片段、或片段不是合法的 JSON 对象时返回 `None`，从不报错。
pub fn extract_record(text: &str) -> Option<ExtractedRecord> {
    let candidate = brace_span().find(text)?.as_str();

    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(serde_json::Value::Object(record)) => Some(record),
        Ok(_) => None,
        Err(e) => {
            debug!("响应中的 JSON 片段无法解析: {}", e);
            None
        }
    }
}
