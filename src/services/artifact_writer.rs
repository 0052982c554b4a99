//! 产物写入服务 - 业务能力层
//!
//! 只负责"把一个 JSON 产物完整写到磁盘"，不关心流程

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult, DataError};

/// 以格式化 JSON 覆盖写入 `path`，必要时创建父目录
///
/// 内容一次性写入，不追加、不分段。
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> AppResult<()> {
    let path_text = path.display().to_string();

    let text = serde_json::to_string_pretty(value).map_err(|source| DataError::JsonFailed {
        path: path_text.clone(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }
    }

    fs::write(path, text).map_err(|e| AppError::file_write_failed(path_text.clone(), e))?;
    debug!("已写入: {}", path_text);
    Ok(())
}
