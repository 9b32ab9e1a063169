use thiserror::Error;

/// A single light call that did not go through. Never fatal.
#[derive(Debug, Error)]
pub enum LightError {
    #[error("light request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("light request returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid JSON format: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("{0} must be greater than zero")]
    Invalid(&'static str),
}

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("couldn't create MIDI input: {0}")]
    Init(#[from] midir::InitError),
    #[error("no MIDI input ports found")]
    NoPorts,
    #[error("no MIDI port matching '{0}'")]
    PortNotFound(String),
    #[error("couldn't connect to {0}")]
    Connect(String),
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("MIDI event stream ended")]
    SourceExhausted,
}
