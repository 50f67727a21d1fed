//! userstate-core: per-user lifecycle tracking for a multi-user host
//!
//! This crate records where each logical user is in its lifecycle and the
//! bookkeeping that hangs off it:
//!
//! - **Lifecycle record** - [`UserState`] holds the current and previous
//!   [`LifecycleState`] plus the orthogonal switching/initializing flags
//! - **Stop callbacks** - parties implementing [`StopUserCallback`] queue up
//!   to hear when a user finishes stopping; each is notified exactly once
//! - **Provider foreground reports** - last report time per provider, so
//!   usage accounting can suppress duplicate reports
//! - **Lock boundary** - [`UserStateManager`] serializes access per user
//!
//! Deciding *when* a user moves between states is the caller's job; the
//! record accepts every transition it is given.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use userstate_core::{LifecycleState, RecordingStopCallback, UserId, UserStateManager};
//!
//! # tokio_test::block_on(async {
//! let manager = UserStateManager::default();
//! let user = UserId::new(10);
//! manager.start_user(user).await?;
//!
//! manager
//!     .with_user(user, |u| u.set_state(LifecycleState::Stopping))
//!     .await?;
//!
//! let waiter = Arc::new(RecordingStopCallback::new());
//! manager.register_stop_callback(user, waiter.clone()).await?;
//! assert_eq!(manager.finish_stop(user).await?, 1);
//! # Ok::<(), userstate_core::UserError>(())
//! # }).unwrap();
//! ```
//!
//! # Locking
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              UserStateManager                │
//! │   RwLock<HashMap<UserId, ...>>               │
//! │  ┌────────────────────┐ ┌──────────────────┐ │
//! │  │ Mutex<UserState>   │ │ Mutex<UserState> │ │
//! │  │   user 0           │ │   user 10        │ │
//! │  └────────────────────┘ └──────────────────┘ │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod user;

// Re-export key types for convenience
pub use config::UserStateConfig;
pub use error::{ConfigError, UserError, UserStateError};
pub use user::{
    LifecycleState, RecordingStopCallback, StopCallbackHandle, StopNotification,
    StopUserCallback, UserId, UserState, UserStateManager, UserStateSnapshot,
};
