//! Configuration loading and validation.
//!
//! Settings come from an optional JSON5 file with `${ENV_VAR}` substitution,
//! overlaid with a handful of environment variables. The result is built
//! once at start-up and never mutated.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapecastError};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai";
pub const DEFAULT_LLM_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TTS_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";
pub const DEFAULT_TTS_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3_44100_128";

const LLM_KEY_ENV: &[&str] = &["GROQ_API_KEY"];
const TTS_KEY_ENV: &[&str] = &["ELEVEN_LABS_API_KEY", "ELEVENLABS_API_KEY"];

/// Top-level shapecast configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// Serve the browser page at `/`.
    #[serde(default = "default_true")]
    pub ui: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: None,
            ui: true,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

/// Language-model (chat completions) configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// OpenAI-compatible base URL (default: Groq).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env).or_else(|| first_env(LLM_KEY_ENV))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_LLM_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_LLM_MODEL)
    }
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,

    /// Model ID (e.g. "eleven_multilingual_v2").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    /// Output format (default: "mp3_44100_128").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl TtsConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret_field(&self.api_key, &self.api_key_env).or_else(|| first_env(TTS_KEY_ENV))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_TTS_BASE_URL)
    }

    pub fn voice_id(&self) -> &str {
        self.voice_id.as_deref().unwrap_or(DEFAULT_VOICE_ID)
    }

    pub fn model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or(DEFAULT_TTS_MODEL)
    }

    pub fn output_format(&self) -> &str {
        self.output_format.as_deref().unwrap_or(DEFAULT_OUTPUT_FORMAT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "shapecast_gateway=debug").
    #[serde(default)]
    pub filters: Vec<String>,
}

fn default_log_format() -> String {
    "plain".into()
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    env_var.as_deref().and_then(read_env)
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| read_env(n))
}

static ENV_REF: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> String {
    ENV_REF
        .replace_all(input, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

impl Config {
    /// Load config from a JSON5 file, then apply environment overrides.
    ///
    /// A missing file is not an error; defaults plus environment are used.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            Self::parse(&raw)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse JSON5 text, substituting `${ENV_VAR}` references first.
    pub fn parse(raw: &str) -> Result<Self> {
        let substituted = substitute_env_vars(raw);
        json5::from_str(&substituted).map_err(|e| ShapecastError::Config(e.to_string()))
    }

    /// `SHAPECAST_PORT` and `SHAPECAST_BIND` take priority over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = read_env("SHAPECAST_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.get_or_insert_with(ServerConfig::default).port = port;
        }
        if let Some(bind) = read_env("SHAPECAST_BIND") {
            self.server.get_or_insert_with(ServerConfig::default).bind = Some(bind);
        }
    }

    /// Default config file location: `./shapecast.json5`.
    pub fn default_path() -> PathBuf {
        PathBuf::from("shapecast.json5")
    }

    pub fn port(&self) -> u16 {
        self.server.as_ref().map(|s| s.port).unwrap_or(DEFAULT_PORT)
    }

    pub fn bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn ui_enabled(&self) -> bool {
        self.server.as_ref().map(|s| s.ui).unwrap_or(true)
    }

    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    pub fn tts(&self) -> TtsConfig {
        self.tts.clone().unwrap_or_default()
    }

    /// Check for problems that would surface only at request time.
    ///
    /// Returns `(warnings, errors)`.
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.llm().resolve_api_key().is_none() {
            warnings.push(
                "No language-model API key configured (llm.api_key or GROQ_API_KEY)".to_string(),
            );
        }
        if self.tts().resolve_api_key().is_none() {
            warnings.push(
                "No speech API key configured (tts.api_key or ELEVEN_LABS_API_KEY)".to_string(),
            );
        }

        let tts = self.tts();
        if !tts.output_format().starts_with("mp3") {
            errors.push(format!(
                "tts.output_format '{}' is not an MP3 profile",
                tts.output_format()
            ));
        }
        let llm = self.llm();
        for (name, url) in [("llm.base_url", llm.base_url()), ("tts.base_url", tts.base_url())] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("{name} must be an http(s) URL, got '{url}'"));
            }
        }

        (warnings, errors)
    }
}
