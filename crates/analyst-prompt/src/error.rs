//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur while building or rendering prompts
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template has no variant for the requested language
    #[error("Template '{name}' not found for language '{language}'")]
    TemplateNotFound { name: String, language: String },

    /// Template source failed to parse
    #[error("Failed to parse template '{name}' for language '{language}': {detail}")]
    TemplateParseFailed {
        name: String,
        language: String,
        detail: String,
    },

    /// Template rendering failed
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// No language variants given when building
    #[error("No templates provided for '{0}'")]
    NoTemplatesProvided(String),

    /// No template registered for a role
    #[error("No prompt registered for role '{0}'")]
    UnknownRole(String),
}
