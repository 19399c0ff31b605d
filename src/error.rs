//! Error types for the sandbox

use std::path::PathBuf;

use thiserror::Error;

/// Raised at the configuration boundary. The simulation core assumes
/// every value it reads has already passed through here.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field}: minimum {min} is greater than maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{channel} channel: minimum {min} is greater than maximum {max}")]
    InvertedColor {
        channel: &'static str,
        min: u8,
        max: u8,
    },

    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("{field} must be a finite, non-negative number")]
    NotFinite { field: &'static str },

    #[error("unknown preset: {0}")]
    UnknownPreset(String),
}

/// The main error type for sandbox operations
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },

    #[error("redraw target disconnected")]
    RedrawDisconnected,
}

pub type Result<T> = std::result::Result<T, SandboxError>;
