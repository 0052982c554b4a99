use std::fs;
use std::path::Path;

use crate::error::{AppError, AppResult};

/// 代码占位符
pub const CODE_PLACEHOLDER: &str = "{CODE}";

/// 评分提示词模板，必须恰好包含一个 `{CODE}` 占位符
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// 从文本创建模板
    pub fn new(text: impl Into<String>) -> AppResult<Self> {
        let text = text.into();
        let occurrences = text.matches(CODE_PLACEHOLDER).count();
        if occurrences != 1 {
            return Err(AppError::invalid_config(
                "paths.prompt_template",
                format!(
                    "模板必须恰好包含一个 {} 占位符，实际为 {} 个",
                    CODE_PLACEHOLDER, occurrences
                ),
            ));
        }
        Ok(Self { text })
    }

    /// 从文件加载模板
    pub fn load(path: &Path) -> AppResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::new(text)
    }

    /// 代入提交内容，生成单个条目的提示词
    pub fn render(&self, payload: &str) -> String {
        self.text.replacen(CODE_PLACEHOLDER, payload, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_payload() {
        let template = PromptTemplate::new("Grade:\n{CODE}").unwrap();
        assert_eq!(template.render("class A{}"), "Grade:\nclass A{}");
    }

    #[test]
    fn test_payload_containing_placeholder_is_not_expanded_twice() {
        let template = PromptTemplate::new("<{CODE}>").unwrap();
        assert_eq!(template.render("x {CODE} y"), "<x {CODE} y>");
    }

    #[test]
    fn test_template_requires_exactly_one_placeholder() {
        assert!(PromptTemplate::new("no placeholder").is_err());
        assert!(PromptTemplate::new("{CODE} and {CODE}").is_err());
    }

    #[test]
    fn test_load_missing_template() {
        let err = PromptTemplate::load(Path::new("/nonexistent/prompt.txt")).unwrap_err();
        assert!(err.to_string().contains("prompt.txt"));
    }
}
