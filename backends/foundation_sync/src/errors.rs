use derive_more::From;

use std::io;

pub type ConfigurationResult<T> = std::result::Result<T, ConfigurationError>;

/// Invalid construction parameters. Always fatal: nothing is built when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    ZeroCapacity,
    ZeroPermits,
    ZeroWorkers { role: &'static str },
    InvalidJitter { min_ms: u64, max_ms: u64 },
    InvalidItemRange { max_value: u32 },
}

impl std::error::Error for ConfigurationError {}

impl core::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ResourceResult<T> = std::result::Result<T, ResourceError>;

/// Failure reported by a [`crate::SharedResource`] read or write.
#[derive(From, Debug)]
pub enum ResourceError {
    #[from(ignore)]
    IO(io::Error),

    #[from(ignore)]
    Custom(String),
}

impl ResourceError {
    pub fn custom<T>(val: T) -> Self
    where
        T: std::fmt::Display,
    {
        Self::Custom(val.to_string())
    }
}

impl From<io::Error> for ResourceError {
    fn from(value: io::Error) -> Self {
        ResourceError::IO(value)
    }
}

impl std::error::Error for ResourceError {}

impl core::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
