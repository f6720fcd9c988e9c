use phage_assets::AssetError;
use phage_ecs::{EcsError, ErrorKind};

/// Errors raised by the scene manager and the frame driver.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("failed to parse game config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("scene '{0}' already exists")]
    DuplicateScene(String),

    #[error("no scene named '{0}'")]
    UnknownScene(String),

    #[error("cannot remove the current scene '{0}'")]
    RemoveCurrent(String),

    #[error("no current scene")]
    NoCurrentScene,

    #[error("game is not running")]
    NotRunning,

    #[error("game is already running")]
    AlreadyRunning,

    #[error("system '{system}' failed: {source}")]
    System {
        system: String,
        #[source]
        source: EcsError,
    },
}

impl GameError {
    /// Wrap an error raised by the named system.
    pub fn system(system: impl Into<String>, source: EcsError) -> Self {
        GameError::System {
            system: system.into(),
            source,
        }
    }

    /// Where this error falls in the usage/lookup/state taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Ecs(e) | GameError::System { source: e, .. } => e.kind(),
            GameError::Config(_) => ErrorKind::Usage,
            GameError::Asset(_) | GameError::DuplicateScene(_) | GameError::UnknownScene(_) => {
                ErrorKind::Lookup
            }
            GameError::RemoveCurrent(_)
            | GameError::NoCurrentScene
            | GameError::NotRunning
            | GameError::AlreadyRunning => ErrorKind::State,
        }
    }
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
