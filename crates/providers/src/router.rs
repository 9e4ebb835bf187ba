//! Provider selection — builds the configured LLM provider.

use std::sync::Arc;
use mathwise_config::AppConfig;
use mathwise_core::error::ProviderError;
use mathwise_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `config.provider`.
///
/// Hosted providers need an API key; local servers (ollama, vllm, llama.cpp)
/// accept any.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let base_url = config
        .api_url
        .clone()
        .or_else(|| default_base_url(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}'; set api_url to use a custom endpoint"
            ))
        })?;

    let api_key = match (config.require_api_key().ok(), config.needs_api_key()) {
        (Some(key), _) => key.to_string(),
        (None, false) => name.to_string(),
        (None, true) => {
            return Err(ProviderError::NotConfigured(format!("no API key for provider '{name}'")));
        }
    };

    tracing::debug!(provider = name, base_url = %base_url, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)?))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> Option<&'static str> {
    let url = match provider_name {
        "groq" => "https://api.groq.com/openai/v1",
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "together" => "https://api.together.xyz/v1",
        "fireworks" => "https://api.fireworks.ai/inference/v1",
        "ollama" => "http://localhost:11434/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(provider: &str, key: Option<&str>) -> AppConfig {
        AppConfig {
            provider: provider.into(),
            api_key: key.map(String::from),
            ..AppConfig::default()
        }
    }

    #[test]
    fn builds_groq_by_default() {
        let provider = build_from_config(&config_with("groq", Some("gsk-test"))).unwrap();
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn hosted_provider_needs_key() {
        let err = build_from_config(&config_with("groq", None)).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn blank_key_is_no_key() {
        let err = build_from_config(&config_with("groq", Some("  "))).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn local_provider_needs_no_key() {
        let provider = build_from_config(&config_with("ollama", None)).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn unknown_provider_needs_url() {
        assert!(build_from_config(&config_with("acme", Some("k"))).is_err());

        let mut config = config_with("acme", Some("k"));
        config.api_url = Some("https://llm.acme.test/v1".into());
        assert_eq!(build_from_config(&config).unwrap().name(), "acme");
    }

    #[test]
    fn known_base_urls() {
        assert_eq!(default_base_url("groq"), Some("https://api.groq.com/openai/v1"));
        assert!(default_base_url("ollama").unwrap().contains("11434"));
        assert!(default_base_url("nope").is_none());
    }
}
