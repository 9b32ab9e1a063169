use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tokio::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "chord_lights.json";
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub home_assistant_url: String,
    pub token: String,
    pub light_entity_id: String,
    /// Substring of the MIDI input port name; the first port when unset.
    pub midi_port: Option<String>,
    pub sweep_interval_ms: u64,
    /// How long a note may go untouched before a sweep drops it. Defaults
    /// to the sweep interval.
    pub max_note_age_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_assistant_url: String::new(),
            token: String::new(),
            light_entity_id: String::new(),
            midi_port: None,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            max_note_age_ms: None,
        }
    }
}

impl Config {
    /// Reads the optional JSON file, then lets the environment override it.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            env::var("CHORD_LIGHTS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_json(&fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("HOME_ASSISTANT_URL") {
            self.home_assistant_url = url;
        }
        if let Some(token) = lookup("TOKEN") {
            self.token = token;
        }
        if let Some(entity) = lookup("LIGHT_ENTITY_ID") {
            self.light_entity_id = entity;
        }
        if let Some(port) = lookup("MIDI_PORT") {
            self.midi_port = Some(port);
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        self.home_assistant_url = self.home_assistant_url.trim_end_matches('/').to_string();
        if self.home_assistant_url.is_empty() {
            return Err(ConfigError::Missing("HOME_ASSISTANT_URL"));
        }
        if self.token.is_empty() {
            return Err(ConfigError::Missing("TOKEN"));
        }
        if self.light_entity_id.is_empty() {
            return Err(ConfigError::Missing("LIGHT_ENTITY_ID"));
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid("sweep_interval_ms"));
        }
        if self.max_note_age_ms == Some(0) {
            return Err(ConfigError::Invalid("max_note_age_ms"));
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn max_note_age(&self) -> Duration {
        Duration::from_millis(self.max_note_age_ms.unwrap_or(self.sweep_interval_ms))
    }
}
