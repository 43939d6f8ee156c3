//! Configuration management utilities
//!
//! Settings are read from the process environment, optionally primed from a
//! `.env` file. Every reader goes through [`EnvSource`] so tests can feed a
//! fixed table instead of mutating the real environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Load variables from a `.env` file in the current directory or its parents
///
/// Variables already present in the environment win. Returns the path of the
/// loaded file, if one was found.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            tracing::warn!("Failed to read .env file: {}", e);
            None
        }
    }
}

/// A source of raw configuration values
pub trait EnvSource {
    /// Look up a raw value
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<const N: usize> EnvSource for [(&str, &str); N] {
    fn var(&self, key: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
    }
}

/// Typed accessors on top of [`EnvSource`]
pub trait EnvSourceExt: EnvSource {
    /// Trimmed value, `None` when unset or blank
    fn string(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed value or a default
    fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    /// Parsed value or a default; unparsable values are logged and ignored
    fn parse_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(key) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid value for {}={:?}: {}", key, raw, e);
                default
            }),
            None => default,
        }
    }

    /// Boolean flag: `1`, `true`, `yes`, `on` are true; `0`, `false`, `no`, `off` false
    fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.string(key).map(|v| v.to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            Some(other) => {
                tracing::warn!("Ignoring invalid flag {}={:?}", key, other);
                default
            }
            None => default,
        }
    }

    /// Comma separated list with blank items removed
    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.string(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
    }
}

impl<S: EnvSource + ?Sized> EnvSourceExt for S {}
