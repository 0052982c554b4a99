use std::io;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只描述批次级别的故障。单个提交的评分失败属于数据
/// （`GradingResult::Failed`），不会出现在这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 数据解析错误
    #[error("数据错误: {0}")]
    Data(#[from] DataError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("无法读取配置文件 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// 数据解析错误
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV 读取失败
    #[error("CSV解析失败 ({path}): {source}")]
    CsvFailed {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// JSON 序列化/反序列化失败
    #[error("JSON处理失败 ({path}): {source}")]
    JsonFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return AppError::File(FileError::NotFound { path: path.into() });
        }
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建配置值错误
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
