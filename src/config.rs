use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::voice::{VoiceLanguage, VoiceTurnConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub history: HistoryConfig,
    pub reply: ReplyConfig,
    pub voice: VoiceConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct HistoryConfig {
    /// Pause that separates two conversation sessions
    pub session_gap_minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReplyConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct VoiceConfig {
    /// UI locale, mapped to recognition/synthesis languages
    pub language: String,
    pub restart_delay_ms: u64,
    pub auto_submit: bool,
}

impl Config {
    /// Load `path` (any format the config crate understands, extension optional)
    /// with `TRIAGE_` environment overrides, e.g. `TRIAGE_SERVICE__HTTP__PORT`
    pub fn load(path: &str) -> Result<Self> {
        Self::builder()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TRIAGE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path))?
            .try_deserialize()
            .context("Invalid configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("service.name", "triage-assist")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080_i64)?
            .set_default("history.session_gap_minutes", crate::history::DEFAULT_SESSION_GAP_MINUTES)?
            .set_default("reply.url", "http://localhost:8000/chat")?
            .set_default("reply.timeout_secs", 20_i64)?
            .set_default("voice.language", "en-US")?
            .set_default("voice.restart_delay_ms", 300_i64)?
            .set_default("voice.auto_submit", true)?)
    }

    pub fn session_gap(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.history.session_gap_minutes)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply.timeout_secs)
    }

    pub fn voice_turn(&self) -> VoiceTurnConfig {
        VoiceTurnConfig {
            language: VoiceLanguage::from_locale(&self.voice.language),
            restart_delay: Duration::from_millis(self.voice.restart_delay_ms),
            reply_timeout: self.reply_timeout(),
            auto_submit: self.voice.auto_submit,
        }
    }
}
