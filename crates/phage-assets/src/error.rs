use std::path::PathBuf;

/// Errors that can occur while locating, loading or fetching assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to decode '{0}': {1}")]
    Decode(PathBuf, String),

    #[error("asset identifier must not be empty")]
    EmptyIdentifier,

    #[error("an asset is already loaded as '{0}'")]
    DuplicateIdentifier(String),

    #[error("a loader for {0} is already registered")]
    DuplicateLoader(&'static str),

    #[error("no loader registered for {0}")]
    NoLoader(&'static str),

    #[error("no asset loaded as '{0}'")]
    UnknownIdentifier(String),

    #[error("asset '{identifier}' is a {actual}, not a {expected}")]
    WrongType {
        identifier: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("missing load parameter {0}")]
    MissingParam(usize),
}

pub type Result<T, E = AssetError> = std::result::Result<T, E>;
