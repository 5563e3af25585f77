use derive_more::From;
use foundation_sync::ConfigurationError;

use std::io;

pub type PoolResult<T> = std::result::Result<T, PoolError>;

#[derive(From, Debug)]
pub enum PoolError {
    Configuration(ConfigurationError),

    #[from(ignore)]
    ConfigRead(io::Error),

    ConfigParse(toml::de::Error),

    #[from(ignore)]
    Spawn(io::Error),

    #[from(ignore)]
    WorkerPanicked { workers: Vec<String> },
}

impl PoolError {
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PoolError::Configuration(_) | PoolError::ConfigRead(_) | PoolError::ConfigParse(_)
        )
    }
}

impl std::error::Error for PoolError {}

impl core::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::WorkerPanicked { workers } => {
                write!(f, "PoolError::WorkerPanicked({})", workers.join(", "))
            }
            _ => write!(f, "{self:?}"),
        }
    }
}
