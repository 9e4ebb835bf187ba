//! Configuration loading, validation, and management for Mathwise.
//!
//! Loads configuration from `~/.mathwise/config.toml`, then a `.env` file in
//! the working directory, then environment variable overrides. Validates all
//! settings at startup.

use mathwise_core::AgentConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.mathwise/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM provider. Usually supplied as `GROQ_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM provider name ("groq", "openai", "openrouter", "ollama", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Kept low so arithmetic stays precise
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token cap per LLM response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub wikipedia: WikipediaConfig,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "gemma2-9b-it".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("memory", &self.memory)
            .field("gateway", &self.gateway)
            .field("ui", &self.ui)
            .field("wikipedia", &self.wikipedia)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Reasoning steps allowed per question before the turn fails
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Log each thought, action and observation
    #[serde(default)]
    pub verbose: bool,

    /// Replace the built-in tutor persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

fn default_max_iterations() -> u32 {
    6
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            verbose: false,
            system_message: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of most recent turns (user and assistant messages each count
    /// as one) passed to the agent as context
    #[serde(default = "default_window_size")]
    pub window_size: usize,
}

fn default_window_size() -> usize {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { window_size: default_window_size() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Live sessions kept in memory; the least recently created is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_port() -> u16 {
    8501
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_sessions() -> usize {
    256
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Static text shown by the chat front ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_icon")]
    pub icon: String,

    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_clear_message")]
    pub clear_message: String,

    #[serde(default = "default_footer")]
    pub footer: String,

    #[serde(default = "default_domains")]
    pub domains: Vec<String>,

    #[serde(default = "default_example_problems")]
    pub example_problems: Vec<String>,

    #[serde(default = "default_cheat_sheet")]
    pub cheat_sheet: Vec<Formula>,
}

/// One entry of the formula cheat sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    /// LaTeX source
    pub latex: String,
}

fn default_title() -> String {
    "Advanced Math Problem Solver".into()
}
fn default_icon() -> String {
    "🧮".into()
}
fn default_welcome_message() -> String {
    concat!(
        "Hi, I'm an Advanced Math Problem Solver that can help with everything from basic ",
        "arithmetic to calculus, linear algebra, statistics, and more.\n\n",
        "I can:\n",
        "- Solve step-by-step math problems\n",
        "- Remember our previous work and refer back to it\n",
        "- Handle complex, multi-step problems\n",
        "- Explain mathematical concepts\n\n",
        "What math problem can I help you with today?",
    )
    .into()
}
fn default_clear_message() -> String {
    "Chat history cleared. What math problem can I help you with today?".into()
}
fn default_footer() -> String {
    "Mathwise | Advanced Math Edition".into()
}
fn default_domains() -> Vec<String> {
    [
        "Arithmetic",
        "Algebra",
        "Geometry",
        "Trigonometry",
        "Calculus",
        "Linear Algebra",
        "Differential Equations",
        "Statistics",
        "Probability",
        "Number Theory",
        "Graph Theory",
        "Optimization",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_example_problems() -> Vec<String> {
    [
        "Solve the quadratic equation: 2x² + 5x - 3 = 0",
        "Find the derivative of f(x) = x³ - 4x² + 7x - 9",
        "Calculate the eigenvalues of matrix [[4, 2], [1, 3]]",
        "What's the probability of getting at least 2 heads in 5 coin flips?",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_cheat_sheet() -> Vec<Formula> {
    vec![
        Formula {
            name: "Quadratic Formula".into(),
            latex: r"x = \frac{-b \pm \sqrt{b^2 - 4ac}}{2a}".into(),
        },
        Formula {
            name: "Derivative Rules".into(),
            latex: r"\frac{d}{dx}(x^n) = nx^{n-1}".into(),
        },
        Formula {
            name: "Integration Rules".into(),
            latex: r"\int x^n dx = \frac{x^{n+1}}{n+1} + C, n \neq -1".into(),
        },
    ]
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            icon: default_icon(),
            welcome_message: default_welcome_message(),
            clear_message: default_clear_message(),
            footer: default_footer(),
            domains: default_domains(),
            example_problems: default_example_problems(),
            cheat_sheet: default_cheat_sheet(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikipediaConfig {
    /// MediaWiki action API endpoint
    #[serde(default = "default_wikipedia_url")]
    pub api_url: String,

    /// Pages summarized per lookup
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on the characters returned to the agent
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_wikipedia_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_top_k() -> usize {
    3
}
fn default_max_chars() -> usize {
    4000
}
fn default_timeout_secs() -> u64 {
    20
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            api_url: default_wikipedia_url(),
            top_k: default_top_k(),
            max_chars: default_max_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.mathwise/config.toml).
    ///
    /// A `.env` file in the working directory is read first, so its values
    /// take part in the environment overrides:
    /// - `GROQ_API_KEY` or `MATHWISE_API_KEY` (when the file sets no key)
    /// - `MATHWISE_PROVIDER`, `MATHWISE_MODEL`, `MATHWISE_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
        }

        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.drop_blank_api_key();

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        self.drop_blank_api_key();
        if self.api_key.is_none() {
            self.api_key = non_empty("GROQ_API_KEY").or_else(|| non_empty("MATHWISE_API_KEY"));
        }
        if let Some(provider) = non_empty("MATHWISE_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = non_empty("MATHWISE_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty("MATHWISE_API_URL") {
            self.api_url = Some(url);
        }
    }

    /// An empty `api_key = ""` means no key at all.
    fn drop_blank_api_key(&mut self) {
        self.api_key = self.api_key.take().filter(|key| !key.trim().is_empty());
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mathwise")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0".into(),
            ));
        }
        if self.memory.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "memory.window_size must be > 0".into(),
            ));
        }
        if self.gateway.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_sessions must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }

    /// The API key, or the fatal startup error when none is configured.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Hosted providers need a key; local model servers accept any.
    pub fn needs_api_key(&self) -> bool {
        !matches!(self.provider.as_str(), "ollama" | "vllm" | "llamacpp" | "llama.cpp")
    }

    /// Startup check: fails when the provider needs a key and none is set.
    pub fn check_api_key(&self) -> Result<(), ConfigError> {
        if self.needs_api_key() {
            self.require_api_key()?;
        }
        Ok(())
    }

    /// The agent settings derived from this config.
    pub fn agent_config(&self) -> AgentConfig {
        let mut agent = AgentConfig::new(&self.model);
        agent.temperature = self.temperature;
        agent.max_tokens = Some(self.max_tokens);
        agent.max_iterations = self.agent.max_iterations;
        agent.verbose = self.agent.verbose;
        if let Some(message) = &self.agent.system_message {
            agent.system_message = message.clone();
        }
        agent
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            agent: AgentSection::default(),
            memory: MemoryConfig::default(),
            gateway: GatewayConfig::default(),
            ui: UiConfig::default(),
            wikipedia: WikipediaConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("GROQ_API_KEY is not set in the .env file or environment")]
    MissingApiKey,
}
