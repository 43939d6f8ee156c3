//! Prompt languages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language prompts are written in and model output is expected in
///
/// # Examples
///
/// ```
/// use analyst_prompt::Language;
///
/// assert_eq!(Language::from_code("en"), Some(Language::English));
/// assert_eq!(Language::from_code("中文"), Some(Language::Chinese));
/// assert_eq!(Language::from_code("ja"), None);
/// assert_eq!(Language::default().code(), "zh");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Simplified Chinese
    #[default]
    Chinese,
    English,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Chinese => "Chinese",
            Language::English => "English",
        }
    }

    /// Parse an ISO code or common name
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "zh" | "chinese" | "中文" | "zh-cn" | "zh-hans" | "cn" => Some(Language::Chinese),
            "en" | "english" | "en-us" => Some(Language::English),
            _ => None,
        }
    }

    /// Parse, falling back to the default with a warning
    pub fn from_code_or_default(s: &str) -> Self {
        Self::from_code(s).unwrap_or_else(|| {
            tracing::warn!("Unsupported analysis language '{}', using Chinese", s);
            Language::default()
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
