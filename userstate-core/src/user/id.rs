//! User identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a logical user on the host
///
/// Opaque to this crate beyond equality and ordering; the orchestrator
/// assigns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// The system user, always present on the host
    pub const SYSTEM: UserId = UserId(0);

    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Raw numeric identifier
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
