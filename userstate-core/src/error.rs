//! Error types for userstate-core
//!
//! The per-user record itself never fails. Errors come only from the
//! manager boundary (unknown or duplicate users) and from loading config.

use std::path::PathBuf;

use thiserror::Error;

use crate::user::{LifecycleState, UserId};

/// Top-level error type for userstate-core
#[derive(Error, Debug)]
pub enum UserStateError {
    #[error("User error: {0}")]
    User(#[from] UserError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the user state manager
#[derive(Error, Debug)]
pub enum UserError {
    #[error("User not started: {0}")]
    NotFound(UserId),

    #[error("User already started: {0}")]
    AlreadyStarted(UserId),

    #[error("User {user} cannot be removed in state {state} with {pending} pending stop callbacks")]
    NotRemovable {
        user: UserId,
        state: LifecycleState,
        pending: usize,
    },
}

/// Errors loading [`UserStateConfig`](crate::config::UserStateConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}
