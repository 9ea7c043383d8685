use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TxError};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TractatusConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub generation: GenerationConfig,
    pub chat: ChatConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum accepted request body for `/api/upload`, in bytes.
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on continuation steps after a `length` finish.
    pub max_steps: usize,
    /// Pause between smoothed word chunks. Zero disables the pause.
    pub smooth_delay_ms: u64,
    /// Maximum accepted request body for `/api/tractatus` and `/api/chat`, in bytes.
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub google: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Connect timeout. Streaming bodies are not bounded.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_steps: 4,
            smooth_delay_ms: 10,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig {
                base_url: "https://api.openai.com/v1".into(),
                api_key: None,
                connect_timeout_secs: default_connect_timeout_secs(),
            },
            google: ProviderConfig {
                base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
                api_key: None,
                connect_timeout_secs: default_connect_timeout_secs(),
            },
        }
    }
}

impl TractatusConfig {
    /// Default location: `$XDG_CONFIG_HOME/tractatus/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tractatus").join("config.toml"))
    }

    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| TxError::Config(e.to_string()))
    }

    /// Load from `path`, or from the default location when it exists, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        };

        let mut config = match resolved {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading config");
                let raw = std::fs::read_to_string(&p)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay environment values through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(OPENAI_API_KEY_ENV) {
            self.providers.openai.api_key = Some(key);
        }
        if let Some(key) = non_empty(GOOGLE_API_KEY_ENV) {
            self.providers.google.api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.providers.openai.base_url = url;
        }
        if let Some(url) = non_empty("GOOGLE_GENERATIVE_AI_BASE_URL") {
            self.providers.google.base_url = url;
        }
        if let Some(host) = non_empty("TRACTATUS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty("TRACTATUS_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(%port, "ignoring invalid TRACTATUS_PORT"),
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
