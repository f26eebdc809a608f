use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ParleyError, Result};

/// Top-level configuration for the Parley application.
///
/// Loaded from `~/.parley/config.toml` by default. Each section corresponds
/// to one component: the HTTP host, the chat controller and its speech
/// collaborators, and the upstream completion provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

impl ParleyConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ParleyConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ParleyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// "development" turns on per-request debug logging.
    pub environment: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            environment: "production".to_string(),
        }
    }
}

impl GeneralConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// HTTP host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Directory holding the built single-page bundle (index.html, scripts, resources.json).
    pub static_dir: String,
    /// Maximum accepted request body in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 22700,
            static_dir: "dist".to_string(),
            body_limit_bytes: 64 * 1024,
        }
    }
}

/// Conversational controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of most recent turns sent as context with each request.
    pub history_capacity: usize,
    /// Longest accepted message, in characters, after trimming.
    pub max_input_chars: usize,
    /// Upper bound on a pending dispatch before it fails as a transport error.
    pub request_timeout_secs: u64,
    /// URL of the completion endpoint the controller posts to.
    pub endpoint: String,
    /// Language used when the requested one has no resource table.
    pub default_language: String,
    /// Prefix for dictionary lookups of selected words.
    pub dictionary_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            max_input_chars: 1000,
            request_timeout_secs: 30,
            endpoint: "http://127.0.0.1:22700/chat".to_string(),
            default_language: "vi".to_string(),
            dictionary_url: "https://dictionary.cambridge.org/dictionary/english/".to_string(),
        }
    }
}

/// Voice capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Recognition language tag.
    pub language: String,
    /// Whether the recognizer should emit partial transcripts.
    pub interim_results: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            interim_results: true,
        }
    }
}

/// Read-aloud configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Substring of the preferred voice name. Empty means the platform default.
    pub preferred_voice: String,
    /// Speech rate multiplier.
    pub rate: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            preferred_voice: "Microsoft David".to_string(),
            rate: 0.9,
        }
    }
}

impl PlaybackConfig {
    pub fn voice(&self) -> Option<&str> {
        let voice = self.preferred_voice.trim();
        (!voice.is_empty()).then_some(voice)
    }
}

/// Upstream chat-completions provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Primary model.
    pub model: String,
    /// Models the provider may fall back to.
    pub fallback_models: Vec<String>,
    pub allow_fallbacks: bool,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub repetition_penalty: f32,
    /// System messages prepended to every request.
    pub system_prompts: Vec<String>,
    /// Timeout for one upstream call in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "deepseek/deepseek-chat-v3-0324:free".to_string(),
            fallback_models: vec![
                "deepseek/deepseek-r1:free".to_string(),
                "deepseek/deepseek-prover-v2:free".to_string(),
            ],
            allow_fallbacks: true,
            temperature: 0.2,
            frequency_penalty: 1.0,
            presence_penalty: 1.0,
            repetition_penalty: 1.0,
            system_prompts: vec![
                "You are an intelligent English tutor.".to_string(),
                "Always respond in English and help improve the user's language skills."
                    .to_string(),
                "Get to the point and act professionally. Do not use thought or note sentences."
                    .to_string(),
            ],
            timeout_secs: 60,
        }
    }
}
