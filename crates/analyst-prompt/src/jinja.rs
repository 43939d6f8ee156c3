//! MiniJinja-backed templates

use crate::{Language, PromptError, PromptTemplate, Result};
use minijinja::Environment;
use std::collections::HashMap;

/// A bilingual template rendered with MiniJinja
///
/// ```
/// use analyst_prompt::{JinjaTemplate, Language, PromptTemplate};
/// use serde_json::json;
///
/// let template = JinjaTemplate::bilingual(
///     "greeting",
///     "你好，{{ name }}！",
///     "Hello, {{ name }}!",
/// ).unwrap();
///
/// let zh = template.render(Language::Chinese, &json!({ "name": "世界" })).unwrap();
/// assert_eq!(zh, "你好，世界！");
/// ```
pub struct JinjaTemplate {
    name: String,
    templates: HashMap<Language, String>,
}

impl JinjaTemplate {
    pub fn builder(name: impl Into<String>) -> JinjaTemplateBuilder {
        JinjaTemplateBuilder::new(name)
    }

    /// Chinese and English variants
    pub fn bilingual(
        name: impl Into<String>,
        chinese: impl Into<String>,
        english: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(name).chinese(chinese).english(english).build()
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn languages(&self) -> Vec<Language> {
        self.templates.keys().copied().collect()
    }

    fn render(&self, lang: Language, vars: &serde_json::Value) -> Result<String> {
        let source = self
            .templates
            .get(&lang)
            .ok_or_else(|| PromptError::TemplateNotFound {
                name: self.name.clone(),
                language: lang.code().to_string(),
            })?;

        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        let ctx = minijinja::Value::from_serialize(vars);
        env.render_str(source, ctx)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn raw_template(&self, lang: Language) -> Option<&str> {
        self.templates.get(&lang).map(String::as_str)
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("languages", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`JinjaTemplate`]
pub struct JinjaTemplateBuilder {
    name: String,
    templates: HashMap<Language, String>,
}

impl JinjaTemplateBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            templates: HashMap::new(),
        }
    }

    /// Add a variant for a language
    pub fn template(mut self, lang: Language, content: impl Into<String>) -> Self {
        self.templates.insert(lang, content.into());
        self
    }

    pub fn chinese(self, content: impl Into<String>) -> Self {
        self.template(Language::Chinese, content)
    }

    pub fn english(self, content: impl Into<String>) -> Self {
        self.template(Language::English, content)
    }

    /// Build, checking that every variant parses
    pub fn build(self) -> Result<JinjaTemplate> {
        if self.templates.is_empty() {
            return Err(PromptError::NoTemplatesProvided(self.name));
        }

        let env = Environment::new();
        for (lang, content) in &self.templates {
            env.template_from_str(content)
                .map_err(|e| PromptError::TemplateParseFailed {
                    name: self.name.clone(),
                    language: lang.code().to_string(),
                    detail: e.to_string(),
                })?;
        }
        Ok(JinjaTemplate {
            name: self.name,
            templates: self.templates,
        })
    }
}
