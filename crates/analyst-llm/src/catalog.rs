//! Supported model providers
//!
//! Every provider speaks the OpenAI chat completion format; they differ in
//! endpoint, credential variable and default model.

use serde::Serialize;

/// Static description of one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderSpec {
    /// Identifier used in configuration, e.g. "deepseek"
    pub id: &'static str,
    /// Human readable name
    pub display_name: &'static str,
    pub api_base: &'static str,
    pub completions_path: &'static str,
    /// Environment variable holding the API key
    pub env_key: &'static str,
    pub default_model: &'static str,
    pub models: &'static [&'static str],
    /// Value shipped in the example `.env`, never a real key
    pub placeholder: &'static str,
}

/// Providers in default failover order
pub static PROVIDERS: [ProviderSpec; 4] = [
    ProviderSpec {
        id: "deepseek",
        display_name: "DeepSeek",
        api_base: "https://api.deepseek.com/v1",
        completions_path: "/chat/completions",
        env_key: "DEEPSEEK_API_KEY",
        default_model: "deepseek-chat",
        models: &["deepseek-chat", "deepseek-reasoner"],
        placeholder: "sk-your_deepseek_api_key_here",
    },
    ProviderSpec {
        id: "minimax",
        display_name: "MiniMax",
        api_base: "https://api.minimax.chat/v1",
        completions_path: "/text/chatcompletion_v2",
        env_key: "MINIMAX_API_KEY",
        default_model: "minimax-m2",
        models: &["minimax-m2"],
        placeholder: "sk-your_minimax_api_key_here",
    },
    ProviderSpec {
        id: "zhipu",
        display_name: "智谱AI (ChatGLM)",
        api_base: "https://open.bigmodel.cn/api/paas/v4",
        completions_path: "/chat/completions",
        env_key: "ZHIPU_API_KEY",
        default_model: "glm-4",
        models: &["glm-4"],
        placeholder: "sk-your_zhipu_api_key_here",
    },
    ProviderSpec {
        id: "qwen",
        display_name: "阿里千问 (Qwen)",
        api_base: "https://dashscope.aliyuncs.com/compatible-mode/v1",
        completions_path: "/chat/completions",
        env_key: "QWEN_API_KEY",
        default_model: "qwen-max",
        models: &["qwen-turbo", "qwen-plus", "qwen-max"],
        placeholder: "sk-your_qwen_api_key_here",
    },
];

/// Look up a provider by id, case-insensitively
pub fn find_provider(id: &str) -> Option<&'static ProviderSpec> {
    let id = id.trim();
    PROVIDERS.iter().find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Whether a configured credential looks like a real key
///
/// Blank values and template placeholders are rejected.
pub fn is_viable_credential(key: Option<&str>) -> bool {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return false;
    };

    if PROVIDERS.iter().any(|p| p.placeholder == key) {
        return false;
    }

    let lowered = key.to_ascii_lowercase();
    !(lowered.contains("your_")
        || lowered.contains("your-")
        || lowered.contains("xxx")
        || lowered == "sk-"
        || lowered == "changeme")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_provider() {
        assert_eq!(find_provider("deepseek").map(|p| p.id), Some("deepseek"));
        assert_eq!(find_provider(" QWEN ").map(|p| p.id), Some("qwen"));
        assert!(find_provider("openai").is_none());
    }

    #[test]
    fn test_catalog_defaults() {
        let minimax = find_provider("minimax").unwrap();
        assert_eq!(minimax.completions_path, "/text/chatcompletion_v2");
        assert!(minimax.models.contains(&minimax.default_model));
        for spec in &PROVIDERS {
            assert!(spec.models.contains(&spec.default_model), "{}", spec.id);
        }
    }

    #[test]
    fn test_placeholders_are_not_viable() {
        for spec in &PROVIDERS {
            assert!(!is_viable_credential(Some(spec.placeholder)), "{}", spec.id);
        }
        assert!(!is_viable_credential(None));
        assert!(!is_viable_credential(Some("   ")));
        assert!(!is_viable_credential(Some("sk-xxxxxxxx")));
        assert!(!is_viable_credential(Some("your-key")));
    }

    #[test]
    fn test_real_looking_key_is_viable() {
        assert!(is_viable_credential(Some("sk-3f9a2c1b7e")));
        assert!(is_viable_credential(Some("  abc.def  ")));
    }
}
