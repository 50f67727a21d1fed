//! UserStateManager for tracking every started user
//!
//! The manager is the lock boundary for [`UserState`]. Each user's record
//! sits behind its own mutex; [`UserStateManager::with_user`] holds that
//! mutex for the whole closure, so a read-decide-write sequence on one user
//! cannot interleave with another caller's. The manager-wide map lock is
//! never held while waiting on a user's mutex.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::config::UserStateConfig;
use crate::error::UserError;

use super::callback::StopCallbackHandle;
use super::id::UserId;
use super::snapshot::UserStateSnapshot;
use super::state::{LifecycleState, UserState};

/// A tracked record plus whether it has been discarded
///
/// A caller may look up the slot, lose the race to `remove_user`, and only
/// then take the lock. `removed` is set under the lock so such a caller sees
/// the user as gone instead of writing into a detached record.
struct UserSlot {
    state: UserState,
    removed: bool,
}

type SharedSlot = Arc<Mutex<UserSlot>>;

/// Tracks the lifecycle record of every started user
///
/// UserStateManager provides:
/// - Creation of a BOOTING record when a user starts
/// - Scoped, per-user locked access for read-modify-write sequences
/// - Delivery of stop notifications exactly once per registration
/// - Provider foreground report suppression for usage accounting
pub struct UserStateManager {
    /// Started users indexed by ID
    users: RwLock<HashMap<UserId, SharedSlot>>,
    config: UserStateConfig,
}

impl UserStateManager {
    pub fn new(config: UserStateConfig) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &UserStateConfig {
        &self.config
    }

    /// Begin tracking a user in the BOOTING state
    pub async fn start_user(&self, user_id: UserId) -> Result<(), UserError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user_id) {
            return Err(UserError::AlreadyStarted(user_id));
        }
        let slot = UserSlot {
            state: UserState::with_config(user_id, &self.config),
            removed: false,
        };
        users.insert(user_id, Arc::new(Mutex::new(slot)));
        tracing::info!(user = %user_id, "User started");
        Ok(())
    }

    /// Run `f` with exclusive access to one user's record
    ///
    /// Uses the callback pattern so the per-user lock cannot outlive the
    /// operation. The manager-wide map lock is released before `f` runs, so
    /// work on other users proceeds in parallel.
    pub async fn with_user<F, R>(&self, user_id: UserId, f: F) -> Result<R, UserError>
    where
        F: FnOnce(&mut UserState) -> R,
    {
        let slot = self.get(user_id).await?;
        Self::with_slot(&slot, user_id, f).await
    }

    async fn with_slot<F, R>(slot: &SharedSlot, user_id: UserId, f: F) -> Result<R, UserError>
    where
        F: FnOnce(&mut UserState) -> R,
    {
        let mut guard = slot.lock().await;
        if guard.removed {
            return Err(UserError::NotFound(user_id));
        }
        Ok(f(&mut guard.state))
    }

    pub async fn user_state(&self, user_id: UserId) -> Result<LifecycleState, UserError> {
        self.with_user(user_id, |user| user.state()).await
    }

    pub async fn snapshot(&self, user_id: UserId) -> Result<UserStateSnapshot, UserError> {
        self.with_user(user_id, |user| user.snapshot()).await
    }

    /// IDs of every started user, ascending
    pub async fn started_users(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn register_stop_callback(
        &self,
        user_id: UserId,
        callback: StopCallbackHandle,
    ) -> Result<(), UserError> {
        self.with_user(user_id, |user| user.register_stop_callback(callback))
            .await
    }

    /// Complete the stop sequence for a user
    ///
    /// Moves the user to SHUTDOWN (if not already there) and drains its
    /// callbacks under the user's lock, then notifies each callback in
    /// registration order with no lock held. Returns the number of callbacks
    /// notified.
    pub async fn finish_stop(&self, user_id: UserId) -> Result<usize, UserError> {
        let callbacks = self
            .with_user(user_id, |user| {
                if user.state() != LifecycleState::Shutdown {
                    user.set_state(LifecycleState::Shutdown);
                }
                user.drain_stop_callbacks()
            })
            .await?;

        tracing::info!(user = %user_id, callbacks = callbacks.len(), "User stopped");
        for callback in &callbacks {
            callback.user_stopped(user_id);
        }
        Ok(callbacks.len())
    }

    /// Abandon a pending stop, telling every waiting callback
    ///
    /// The user's lifecycle state is left for the caller to set.
    pub async fn abort_stop(&self, user_id: UserId) -> Result<usize, UserError> {
        let callbacks = self
            .with_user(user_id, |user| user.drain_stop_callbacks())
            .await?;

        tracing::info!(user = %user_id, callbacks = callbacks.len(), "User stop aborted");
        for callback in &callbacks {
            callback.user_stop_aborted(user_id);
        }
        Ok(callbacks.len())
    }

    /// Stop tracking a user
    ///
    /// Only a user in SHUTDOWN with no pending stop callbacks may be removed.
    /// Removability is decided under the user's own lock; the map write lock
    /// is taken only afterwards, to drop the entry.
    pub async fn remove_user(&self, user_id: UserId) -> Result<UserStateSnapshot, UserError> {
        let slot = self.get(user_id).await?;

        let snapshot = {
            let mut guard = slot.lock().await;
            if guard.removed {
                return Err(UserError::NotFound(user_id));
            }
            let snapshot = guard.state.snapshot();
            if snapshot.state != LifecycleState::Shutdown || snapshot.pending_stop_callbacks > 0 {
                return Err(UserError::NotRemovable {
                    user: user_id,
                    state: snapshot.state,
                    pending: snapshot.pending_stop_callbacks,
                });
            }
            guard.removed = true;
            snapshot
        };

        let mut users = self.users.write().await;
        if users
            .get(&user_id)
            .is_some_and(|current| Arc::ptr_eq(current, &slot))
        {
            users.remove(&user_id);
        }
        tracing::debug!(user = %user_id, "User removed");
        Ok(snapshot)
    }

    /// Note that a provider was brought to foreground importance for a user
    ///
    /// Returns `true` when the report should be forwarded to usage
    /// accounting, i.e. no report for this provider was made within the
    /// configured interval.
    pub async fn report_provider_foreground(
        &self,
        user_id: UserId,
        provider_id: &str,
        now_ms: u64,
    ) -> Result<bool, UserError> {
        let interval = self.config.provider_report_interval_ms;
        self.with_user(user_id, |user| {
            user.maybe_report_provider_foreground(provider_id, now_ms, interval)
        })
        .await
    }

    /// Render every started user, one line each, ordered by ID
    pub async fn dump(&self, prefix: &str) -> String {
        let users: Vec<(UserId, SharedSlot)> = {
            let map = self.users.read().await;
            let mut users: Vec<_> = map.iter().map(|(id, u)| (*id, u.clone())).collect();
            users.sort_by_key(|(id, _)| *id);
            users
        };

        let mut out = String::new();
        for (id, slot) in users {
            let guard = slot.lock().await;
            if guard.removed {
                continue;
            }
            out.push_str(&format!("{prefix}User #{id}: {}\n", guard.state));
        }
        out
    }

    async fn get(&self, user_id: UserId) -> Result<SharedSlot, UserError> {
        self.users
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or(UserError::NotFound(user_id))
    }
}

impl Default for UserStateManager {
    fn default() -> Self {
        Self::new(UserStateConfig::default())
    }
}
