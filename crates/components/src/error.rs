use std::{io, path::PathBuf};

use thiserror::Error;

/// A factory argument is missing or has the wrong shape.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("missing argument `{key}`")]
    Missing { key: &'static str },

    #[error("argument `{key}` must be {expected}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
    },
}

/// A grid description could not be loaded.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("a grid requires either a `gridfile` or an inline `grid` argument")]
    NoDescription,

    #[error("failed to read grid file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid grid description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("grid element id `{id}` is used more than once")]
    DuplicateId { id: String },

    #[error("{element} `{id}` connects to unknown bus `{bus}`")]
    UnknownBus {
        element: &'static str,
        id: String,
        bus: String,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}
