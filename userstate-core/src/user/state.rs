//! Per-user lifecycle record
//!
//! [`UserState`] is a passive record: it stores whatever the orchestrator
//! tells it and never rejects a transition. Legal sequencing lives with the
//! caller, which must serialize read-then-write sequences on one user (see
//! [`UserStateManager::with_user`](super::manager::UserStateManager::with_user)).

use std::collections::HashMap;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use crate::config::UserStateConfig;

use super::callback::StopCallbackHandle;
use super::id::UserId;
use super::snapshot::UserStateSnapshot;

/// Lifecycle state of a user
///
/// Variants are ordered by conventional forward progress. The ordering is
/// informational only; [`UserState::set_state`] accepts any variant at any
/// time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    /// User is first coming up
    #[default]
    Booting,
    /// User is running but its credential-protected storage is still locked
    RunningLocked,
    /// User is fully running
    Running,
    /// User is in the initial phase of being stopped
    Stopping,
    /// Final phase of stopping; shutdown broadcast is being delivered
    Shutdown,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 5] = [
        Self::Booting,
        Self::RunningLocked,
        Self::Running,
        Self::Stopping,
        Self::Shutdown,
    ];

    /// Label used in traces and dumps
    pub fn label(self) -> &'static str {
        match self {
            Self::Booting => "BOOTING",
            Self::RunningLocked => "RUNNING_LOCKED",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Shutdown => "SHUTDOWN",
        }
    }

    /// Stable numeric code, as used by the host's wire interfaces
    pub fn code(self) -> i32 {
        match self {
            Self::Booting => 0,
            Self::RunningLocked => 1,
            Self::Running => 2,
            Self::Stopping => 3,
            Self::Shutdown => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.code() == code)
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::RunningLocked | Self::Running)
    }

    pub fn is_stopping_or_shutdown(self) -> bool {
        matches!(self, Self::Stopping | Self::Shutdown)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle record for one logical user
pub struct UserState {
    user_id: UserId,
    state: LifecycleState,
    last_state: LifecycleState,
    switching: bool,
    initializing: bool,
    stop_callbacks: Vec<StopCallbackHandle>,
    /// Last time (monotonic ms) each provider was reported to usage stats
    /// as brought to foreground importance
    provider_last_foreground_report: HashMap<String, u64>,
    trace_transitions: bool,
}

impl UserState {
    /// Create a record for a user that is just starting to boot
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            state: LifecycleState::Booting,
            last_state: LifecycleState::Booting,
            switching: false,
            initializing: false,
            stop_callbacks: Vec::new(),
            provider_last_foreground_report: HashMap::new(),
            trace_transitions: false,
        }
    }

    /// Create a record honoring the tracing settings in `config`
    pub fn with_config(user_id: UserId, config: &UserStateConfig) -> Self {
        Self {
            trace_transitions: config.trace_transitions,
            ..Self::new(user_id)
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// State held immediately before the most recent [`set_state`](Self::set_state)
    pub fn last_state(&self) -> LifecycleState {
        self.last_state
    }

    /// Record a transition. Every value is accepted.
    pub fn set_state(&mut self, new_state: LifecycleState) {
        if self.trace_transitions {
            tracing::debug!(
                user = %self.user_id,
                from = %self.state,
                to = %new_state,
                "User state changed"
            );
        }
        self.last_state = self.state;
        self.state = new_state;
    }

    pub fn is_switching(&self) -> bool {
        self.switching
    }

    pub fn set_switching(&mut self, switching: bool) {
        self.switching = switching;
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    pub fn set_initializing(&mut self, initializing: bool) {
        self.initializing = initializing;
    }

    /// Queue a callback to be told when this user finishes stopping
    pub fn register_stop_callback(&mut self, callback: StopCallbackHandle) {
        self.stop_callbacks.push(callback);
    }

    /// Take every pending callback, in registration order, leaving none behind
    ///
    /// The backing collection is swapped out whole, so a callback registered
    /// after this returns lands in the next drain.
    pub fn drain_stop_callbacks(&mut self) -> Vec<StopCallbackHandle> {
        std::mem::take(&mut self.stop_callbacks)
    }

    pub fn pending_stop_callbacks(&self) -> usize {
        self.stop_callbacks.len()
    }

    /// Remember that `provider_id` was reported in the foreground at `timestamp_ms`
    pub fn record_provider_foreground_report(
        &mut self,
        provider_id: impl Into<String>,
        timestamp_ms: u64,
    ) {
        self.provider_last_foreground_report
            .insert(provider_id.into(), timestamp_ms);
    }

    pub fn provider_last_foreground_report(&self, provider_id: &str) -> Option<u64> {
        self.provider_last_foreground_report
            .get(provider_id)
            .copied()
    }

    /// Record a foreground report for `provider_id` unless one was made
    /// within the last `interval_ms`
    ///
    /// Returns `true` when the caller should forward the report to usage
    /// accounting.
    pub fn maybe_report_provider_foreground(
        &mut self,
        provider_id: &str,
        now_ms: u64,
        interval_ms: u64,
    ) -> bool {
        let due = match self.provider_last_foreground_report(provider_id) {
            None => true,
            Some(last) => last < now_ms.saturating_sub(interval_ms),
        };
        if due {
            self.record_provider_foreground_report(provider_id, now_ms);
        }
        due
    }

    pub fn tracked_providers(&self) -> usize {
        self.provider_last_foreground_report.len()
    }

    pub fn snapshot(&self) -> UserStateSnapshot {
        UserStateSnapshot {
            user_id: self.user_id,
            state: self.state,
            last_state: self.last_state,
            switching: self.switching,
            initializing: self.initializing,
            pending_stop_callbacks: self.stop_callbacks.len(),
            tracked_providers: self.provider_last_foreground_report.len(),
        }
    }

    /// Write the one-line description, preceded by `prefix`
    pub fn dump(&self, prefix: &str, out: &mut impl io::Write) -> io::Result<()> {
        writeln!(out, "{prefix}{self}")
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.snapshot(), f)
    }
}

impl fmt::Debug for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserState")
            .field("user_id", &self.user_id)
            .field("state", &self.state)
            .field("last_state", &self.last_state)
            .field("switching", &self.switching)
            .field("initializing", &self.initializing)
            .field("stop_callbacks", &self.stop_callbacks.len())
            .field(
                "provider_last_foreground_report",
                &self.provider_last_foreground_report,
            )
            .finish()
    }
}
