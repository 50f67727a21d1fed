//! Point-in-time view of a user's lifecycle record, for diagnostics and export

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::state::LifecycleState;

/// Copy of a [`UserState`](super::state::UserState) taken under its lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStateSnapshot {
    pub user_id: UserId,
    pub state: LifecycleState,
    pub last_state: LifecycleState,
    pub switching: bool,
    pub initializing: bool,
    /// Stop callbacks registered and not yet drained
    pub pending_stop_callbacks: usize,
    /// Providers with a recorded foreground report
    pub tracked_providers: usize,
}

impl fmt::Display for UserStateSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state={} lastState={}", self.state, self.last_state)?;
        if self.switching {
            f.write_str(" SWITCHING")?;
        }
        if self.initializing {
            f.write_str(" INITIALIZING")?;
        }
        Ok(())
    }
}
