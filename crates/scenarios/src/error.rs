use std::{io, path::PathBuf};

use thiserror::Error;

/// A scenario configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// A scenario could not be assembled.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Assembly(#[from] trellis_core::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bundled grid description is invalid: {0}")]
    BundledGrid(#[from] serde_json::Error),

    #[error("grid `{grid}` has no power node")]
    NoPowerNode { grid: String },

    #[error("node `{node}` has a non-text `{key}` entry")]
    InvalidData { node: String, key: &'static str },
}
