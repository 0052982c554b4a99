use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::GradeMap;

/// 程序配置文件
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub model: ModelConfig,
    pub evaluation: EvaluationConfig,
    pub artifacts: ArtifactsConfig,
    pub logging: LoggingConfig,
}

/// 输入路径
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// 人工评分 CSV
    pub samples_csv: PathBuf,
    /// 学生提交目录
    pub submissions_dir: PathBuf,
    /// 提示词模板
    pub prompt_template: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            samples_csv: PathBuf::from("data/samples.csv"),
            submissions_dir: PathBuf::from("submissions"),
            prompt_template: PathBuf::from("prompts/grading_prompt.txt"),
        }
    }
}

/// 评分模型配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// 模型名称，作为最后一个参数传给评分进程
    pub name: String,
    /// 单次调用超时（秒）
    pub timeout: u64,
    /// 失败后的额外重试次数
    pub retries: u32,
    /// 评分进程可执行文件
    pub command: String,
    /// 模型名称之前的固定参数
    pub command_args: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "llama3".to_string(),
            timeout: 120,
            retries: 2,
            command: "ollama".to_string(),
            command_args: vec!["run".to_string()],
        }
    }
}

/// 评估配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// 参与统计的评分维度
    pub dimensions: Vec<String>,
    /// 字母等级 → 分数
    pub grade_map: GradeMap,
    /// 误差不超过该值视为准确
    pub accuracy_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            dimensions: vec!["Correctness".to_string(), "Readability".to_string()],
            grade_map: GradeMap::default(),
            accuracy_threshold: 5.0,
        }
    }
}

/// 产物目录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub predictions_dir: PathBuf,
    pub metrics_dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("artifacts"),
            data_dir: PathBuf::from("artifacts/data"),
            predictions_dir: PathBuf::from("artifacts/predictions"),
            metrics_dir: PathBuf::from("artifacts/metrics"),
        }
    }
}

/// 日志配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志文件，为空时只输出到控制台
    pub log_file: Option<PathBuf>,
    /// 默认日志级别（RUST_LOG 优先）
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: Some(PathBuf::from("artifacts/logs/pipeline.log")),
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从 TOML 文件加载配置
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            AppError::Config(ConfigError::ParseFailed {
                path: origin.to_string(),
                source,
            })
        })
    }

    /// 加载配置：文件（可选）→ 环境变量覆盖 → 校验
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// 用 `GRADE_EVAL_*` 变量覆盖配置项
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(v) = lookup("GRADE_EVAL_SAMPLES_CSV") {
            self.paths.samples_csv = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRADE_EVAL_SUBMISSIONS_DIR") {
            self.paths.submissions_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRADE_EVAL_PROMPT_TEMPLATE") {
            self.paths.prompt_template = PathBuf::from(v);
        }
        if let Some(v) = lookup("GRADE_EVAL_MODEL_NAME") {
            self.model.name = v;
        }
        if let Some(v) = lookup("GRADE_EVAL_MODEL_COMMAND") {
            self.model.command = v;
        }
        if let Some(v) = parse_var(&lookup, "GRADE_EVAL_MODEL_TIMEOUT", "u64")? {
            self.model.timeout = v;
        }
        if let Some(v) = parse_var(&lookup, "GRADE_EVAL_MODEL_RETRIES", "u32")? {
            self.model.retries = v;
        }
        if let Some(v) = parse_var(&lookup, "GRADE_EVAL_ACCURACY_THRESHOLD", "f64")? {
            self.evaluation.accuracy_threshold = v;
        }
        if let Some(v) = lookup("GRADE_EVAL_LOG_LEVEL") {
            self.logging.level = v;
        }
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.model.name.trim().is_empty() {
            return Err(AppError::invalid_config("model.name", "不能为空"));
        }
        if self.model.timeout == 0 {
            return Err(AppError::invalid_config("model.timeout", "必须大于 0"));
        }
        if self.model.command.trim().is_empty() {
            return Err(AppError::invalid_config("model.command", "不能为空"));
        }
        if self.evaluation.dimensions.is_empty() {
            return Err(AppError::invalid_config("evaluation.dimensions", "至少需要一个维度"));
        }
        if self.evaluation.grade_map.is_empty() {
            return Err(AppError::invalid_config("evaluation.grade_map", "不能为空"));
        }
        if self.evaluation.accuracy_threshold < 0.0 {
            return Err(AppError::invalid_config(
                "evaluation.accuracy_threshold",
                "不能为负数",
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var_name: &str,
    expected_type: &str,
) -> AppResult<Option<T>> {
    match lookup(var_name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
[model]
name = "codellama"
timeout = 30

[evaluation]
dimensions = ["Correctness"]
accuracy_threshold = 3

[evaluation.grade_map]
A = 95.0
B = 85.0
"#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.model.name, "codellama");
        assert_eq!(config.model.timeout, 30);
        assert_eq!(config.model.retries, 2);
        assert_eq!(config.model.command, "ollama");
        assert_eq!(config.evaluation.dimensions, vec!["Correctness"]);
        assert_eq!(config.evaluation.accuracy_threshold, 3.0);
        assert_eq!(config.evaluation.grade_map.score("A"), Some(95.0));
        assert_eq!(config.evaluation.grade_map.score("F"), None);
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config =
            Config::from_toml_str(include_str!("../config.example.toml"), "config.example.toml")
                .unwrap();
        config.validate().unwrap();
        assert_eq!(config.evaluation.dimensions.len(), 4);
        assert_eq!(config.evaluation.grade_map, GradeMap::default());
    }

    #[test]
    fn test_invalid_toml_reports_origin() {
        let err = Config::from_toml_str("[model\nname = 1", "broken.toml").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("GRADE_EVAL_MODEL_NAME", "qwen"),
            ("GRADE_EVAL_MODEL_TIMEOUT", "45"),
            ("GRADE_EVAL_MODEL_RETRIES", "0"),
            ("GRADE_EVAL_SAMPLES_CSV", "x/grades.csv"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.model.name, "qwen");
        assert_eq!(config.model.timeout, 45);
        assert_eq!(config.model.retries, 0);
        assert_eq!(config.paths.samples_csv, PathBuf::from("x/grades.csv"));
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|name| {
                (name == "GRADE_EVAL_MODEL_RETRIES").then(|| "many".to_string())
            })
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.model.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_dimensions() {
        let mut config = Config::default();
        config.evaluation.dimensions.clear();
        assert!(config.validate().is_err());
    }
}
