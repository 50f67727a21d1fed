//! Concurrency tests for UserStateManager
//!
//! These tests validate that per-user locking works correctly:
//! - Stop callbacks registered while a stop completes are never lost
//! - Read-modify-write sequences through `with_user` do not lose updates
//! - A user held by a slow operation, or awaiting removal, does not block other users

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use userstate_core::{LifecycleState, StopUserCallback, UserId, UserStateManager};

/// Counts notifications across every callback that shares it
struct CountingCallback {
    stopped: Arc<AtomicUsize>,
}

impl StopUserCallback for CountingCallback {
    fn user_stopped(&self, _user_id: UserId) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }

    fn user_stop_aborted(&self, _user_id: UserId) {}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registrations_racing_with_finish_stop_are_each_notified_once() {
    let manager = Arc::new(UserStateManager::default());
    let user = UserId::new(10);
    manager.start_user(user).await.unwrap();

    let stopped = Arc::new(AtomicUsize::new(0));
    let registrations = 200;

    let mut handles = Vec::new();
    for _ in 0..registrations {
        let manager = manager.clone();
        let stopped = stopped.clone();
        handles.push(tokio::spawn(async move {
            manager
                .register_stop_callback(user, Arc::new(CountingCallback { stopped }))
                .await
                .unwrap();
        }));
    }

    let mut notified = 0;
    for _ in 0..10 {
        notified += manager.finish_stop(user).await.unwrap();
        tokio::task::yield_now().await;
    }

    for handle in handles {
        handle.await.unwrap();
    }
    notified += manager.finish_stop(user).await.unwrap();

    assert_eq!(notified, registrations);
    assert_eq!(stopped.load(Ordering::SeqCst), registrations);
    assert_eq!(manager.snapshot(user).await.unwrap().pending_stop_callbacks, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn with_user_serializes_read_modify_write() {
    let manager = Arc::new(UserStateManager::default());
    let user = UserId::new(10);
    manager.start_user(user).await.unwrap();

    // Each task reads the provider's last report and writes back one more.
    let mut handles = Vec::new();
    for _ in 0..100 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .with_user(user, |u| {
                    let last = u.provider_last_foreground_report("counter").unwrap_or(0);
                    u.record_provider_foreground_report("counter", last + 1);
                })
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let last = manager
        .with_user(user, |u| u.provider_last_foreground_report("counter"))
        .await
        .unwrap();
    assert_eq!(last, Some(100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn busy_user_does_not_block_other_users() {
    let manager = Arc::new(UserStateManager::default());
    let slow = UserId::new(10);
    let fast = UserId::new(11);
    manager.start_user(slow).await.unwrap();
    manager.start_user(fast).await.unwrap();

    let held = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .with_user(slow, |u| {
                    std::thread::sleep(Duration::from_millis(300));
                    u.set_state(LifecycleState::Running);
                })
                .await
                .unwrap();
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let result = tokio::time::timeout(
        Duration::from_millis(200),
        manager.with_user(fast, |u| u.set_state(LifecycleState::RunningLocked)),
    )
    .await;

    assert!(result.is_ok(), "fast user was blocked by slow user");
    held.await.unwrap();
    assert_eq!(manager.user_state(slow).await.unwrap(), LifecycleState::Running);
    assert_eq!(
        manager.user_state(fast).await.unwrap(),
        LifecycleState::RunningLocked
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pending_removal_does_not_block_other_users() {
    let manager = Arc::new(UserStateManager::default());
    let held = UserId::new(10);
    let other = UserId::new(11);
    manager.start_user(held).await.unwrap();
    manager.start_user(other).await.unwrap();
    manager.finish_stop(held).await.unwrap();

    let holder = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .with_user(held, |_| std::thread::sleep(Duration::from_millis(500)))
                .await
                .unwrap();
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let remover = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.remove_user(held).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let result = tokio::time::timeout(
        Duration::from_millis(200),
        manager.with_user(other, |u| u.set_state(LifecycleState::Running)),
    )
    .await;

    assert!(result.is_ok(), "other user was blocked by a pending removal");
    holder.await.unwrap();
    let removed = remover.await.unwrap().unwrap();
    assert_eq!(removed.state, LifecycleState::Shutdown);
    assert_eq!(manager.started_users().await, vec![other]);
}
