//! Fluent prompt builder
//!
//! [`PromptBuilder`] assembles the market-data context block appended to
//! each analyst prompt. Labels are picked per language with [`PromptBuilder::label`].

use crate::Language;

/// A fluent builder for language-aware prompt text
///
/// ```
/// use analyst_prompt::{Language, PromptBuilder};
///
/// let prompt = PromptBuilder::new(Language::English)
///     .section_l("行情", "Quote")
///     .field_l("现价", "Price", "12.30")
///     .field_opt("PE", None::<f64>)
///     .build();
///
/// assert!(prompt.contains("## Quote"));
/// assert!(prompt.contains("- Price: 12.30"));
/// assert!(!prompt.contains("PE"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    parts: Vec<String>,
    language: Language,
}

impl PromptBuilder {
    pub fn new(language: Language) -> Self {
        Self {
            parts: Vec::new(),
            language,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Pick the label for the builder's language
    pub fn label<'a>(&self, zh: &'a str, en: &'a str) -> &'a str {
        match self.language {
            Language::Chinese => zh,
            Language::English => en,
        }
    }

    /// Add static text
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.parts.push(content.into());
        self
    }

    pub fn newline(self) -> Self {
        self.text("\n")
    }

    /// Add a blank line (two newlines)
    pub fn blank_line(self) -> Self {
        self.text("\n\n")
    }

    /// Add a markdown h2 header
    pub fn section(self, title: impl Into<String>) -> Self {
        self.text(format!("\n## {}\n", title.into()))
    }

    /// Section with a per-language title
    pub fn section_l(self, zh: &str, en: &str) -> Self {
        let title = self.label(zh, en).to_string();
        self.section(title)
    }

    /// Add content conditionally
    pub fn when(self, condition: bool, content: impl Into<String>) -> Self {
        if condition { self.text(content) } else { self }
    }

    pub fn bullet(self, content: impl Into<String>) -> Self {
        self.text(format!("- {}\n", content.into()))
    }

    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self = self.bullet(item);
        }
        self
    }

    /// Add a `- key: value` line
    pub fn field(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.text(format!("- {}: {}\n", key.into(), value.into()))
    }

    /// Field with a per-language key
    pub fn field_l(self, zh: &str, en: &str, value: impl Into<String>) -> Self {
        let key = self.label(zh, en).to_string();
        self.field(key, value)
    }

    /// Field that is skipped when the value is absent
    pub fn field_opt<V: std::fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.field(key, v.to_string()),
            None => self,
        }
    }

    pub fn build(self) -> String {
        self.parts.join("")
    }

    /// Build with surrounding whitespace removed
    pub fn build_trimmed(self) -> String {
        self.build().trim().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl From<PromptBuilder> for String {
    fn from(builder: PromptBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_text() {
        let prompt = PromptBuilder::default().text("你好").newline().text("世界").build();
        assert_eq!(prompt, "你好\n世界");
    }

    #[test]
    fn test_language_labels() {
        let zh = PromptBuilder::new(Language::Chinese);
        assert_eq!(zh.label("行情", "Quote"), "行情");
        let en = PromptBuilder::new(Language::English);
        assert_eq!(en.label("行情", "Quote"), "Quote");
    }

    #[test]
    fn test_sections_and_fields() {
        let prompt = PromptBuilder::new(Language::Chinese)
            .section_l("财务指标", "Financials")
            .field_l("净资产收益率", "ROE", "18.20%")
            .field_opt("PB", Some(3.1))
            .field_opt("PS", None::<f64>)
            .build();
        assert!(prompt.contains("## 财务指标"));
        assert!(prompt.contains("- 净资产收益率: 18.20%"));
        assert!(prompt.contains("- PB: 3.1"));
        assert!(!prompt.contains("PS"));
    }

    #[test]
    fn test_conditional_and_bullets() {
        let prompt = PromptBuilder::default()
            .when(false, "hidden")
            .bullets(["白酒", "消费"])
            .build();
        assert_eq!(prompt, "- 白酒\n- 消费\n");
    }

    #[test]
    fn test_build_trimmed_and_into() {
        let builder = PromptBuilder::default().blank_line().text("内容").newline();
        assert!(!builder.is_empty());
        assert_eq!(builder.clone().build_trimmed(), "内容");
        let s: String = builder.into();
        assert_eq!(s, "\n\n内容\n");
    }
}
