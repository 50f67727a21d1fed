//! Stop-completion callbacks
//!
//! Parties that want to hear when a user finishes stopping hand the user
//! state a [`StopCallbackHandle`]. The orchestrator drains the pending
//! handles once the stop sequence completes (or is abandoned) and notifies
//! each one exactly once.

use std::sync::{Arc, Mutex};

use super::id::UserId;

/// Receiver of stop notifications for a user
pub trait StopUserCallback: Send + Sync {
    /// The user has fully stopped
    fn user_stopped(&self, user_id: UserId);

    /// The stop sequence was abandoned before completing
    fn user_stop_aborted(&self, user_id: UserId);
}

/// Shared handle to a registered callback
pub type StopCallbackHandle = Arc<dyn StopUserCallback>;

/// Outcome delivered to a [`StopUserCallback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopNotification {
    Stopped(UserId),
    Aborted(UserId),
}

/// Callback that remembers every notification it receives, in order
///
/// Useful for embedders that poll for completion rather than react to it.
#[derive(Debug, Default)]
pub struct RecordingStopCallback {
    received: Mutex<Vec<StopNotification>>,
}

impl RecordingStopCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far
    pub fn received(&self) -> Vec<StopNotification> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StopNotification>> {
        // A poisoned list still holds valid entries.
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StopUserCallback for RecordingStopCallback {
    fn user_stopped(&self, user_id: UserId) {
        self.lock().push(StopNotification::Stopped(user_id));
    }

    fn user_stop_aborted(&self, user_id: UserId) {
        self.lock().push(StopNotification::Aborted(user_id));
    }
}
