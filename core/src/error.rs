//! Error types for configuration loading and runtime calls.

use thiserror::Error;

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate {kind} id \"{id}\"")]
    DuplicateId { kind: &'static str, id: String },
    #[error("window \"{window}\" references unknown observer \"{observer}\"")]
    UnknownObserver { window: String, observer: String },
    #[error("observer \"{observer}\" references unknown device \"{device}\"")]
    UnknownDevice { observer: String, device: String },
    #[error("device \"{device}\" is owned by process {process}, but only {count} processes are configured")]
    InvalidProcess {
        device: String,
        process: usize,
        count: usize,
    },
    #[error("window \"{window}\": invalid resolution factor {factor}")]
    InvalidResolutionFactor { window: String, factor: f32 },
    #[error("configuration has no process")]
    NoProcess,
}

/// Errors reported by a head-mounted display runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HmdError {
    #[error("operation not supported by this runtime: {0}")]
    Unsupported(&'static str),
    #[error("swap chain creation failed: {0}")]
    SwapChainCreation(String),
    #[error("unknown swap chain {0}")]
    UnknownSwapChain(u32),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
