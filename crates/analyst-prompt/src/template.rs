//! Core prompt template trait

use crate::{Language, Result};

/// A named template with one variant per language
///
/// Dyn-compatible: variables are passed as `serde_json::Value`.
pub trait PromptTemplate: Send + Sync {
    /// Template identifier
    fn name(&self) -> &str;

    /// Languages this template has a variant for
    fn languages(&self) -> Vec<Language>;

    fn supports_language(&self, lang: Language) -> bool {
        self.languages().contains(&lang)
    }

    /// Render the variant for `lang`
    fn render(&self, lang: Language, vars: &serde_json::Value) -> Result<String>;

    /// Render `lang`, or the other language when that variant is missing
    fn render_with_fallback(&self, lang: Language, vars: &serde_json::Value) -> Result<String> {
        if self.supports_language(lang) {
            return self.render(lang, vars);
        }
        let other = match lang {
            Language::Chinese => Language::English,
            Language::English => Language::Chinese,
        };
        self.render(other, vars)
    }

    /// Raw template source, for inspection
    fn raw_template(&self, lang: Language) -> Option<&str>;
}
