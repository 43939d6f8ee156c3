//! Analyst prompt catalog
//!
//! Builds the per-role prompts sent to the model gateway and turns the free-form
//! answers back into [`analyst_core::AnalystResult`]s.
//!
//! - [`PromptCatalog`]: bilingual MiniJinja templates for every analyst role
//! - [`PromptBuilder`]: fluent builder for the market-data context block
//! - [`parse_output`]: total, pattern-based extraction of score, confidence,
//!   recommendation and bullet lists
//!
//! ```
//! use analyst_core::AnalystRole;
//! use analyst_prompt::{Language, PromptCatalog, parse_output};
//!
//! let catalog = PromptCatalog::new(Language::Chinese).unwrap();
//! let prompt = catalog.build_prompt(AnalystRole::Value, "贵州茅台", "600519");
//! assert!(prompt.contains("600519"));
//!
//! let result = parse_output(AnalystRole::Value, "综合评分: 82\n操作建议: 买入");
//! assert_eq!(result.score, 82.0);
//! ```

mod builder;
mod catalog;
mod error;
mod jinja;
mod language;
mod parse;
mod template;

pub use builder::PromptBuilder;
pub use catalog::PromptCatalog;
pub use error::{PromptError, Result};
pub use jinja::{JinjaTemplate, JinjaTemplateBuilder};
pub use language::Language;
pub use parse::{DEFAULT_CONFIDENCE, DEFAULT_SCORE, MAX_LIST_ITEMS, parse_output};
pub use template::PromptTemplate;
