use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] invsync_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured: {setting} is missing. Run `invsync config init` or set {env_var}."
    )]
    SyncNotConfigured {
        setting: &'static str,
        env_var: &'static str,
    },
}
