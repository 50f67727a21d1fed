//! Per-user lifecycle tracking

pub mod callback;
pub mod id;
pub mod manager;
pub mod snapshot;
pub mod state;

// Re-export key types for convenience
pub use callback::{RecordingStopCallback, StopCallbackHandle, StopNotification, StopUserCallback};
pub use id::UserId;
pub use manager::UserStateManager;
pub use snapshot::UserStateSnapshot;
pub use state::{LifecycleState, UserState};
