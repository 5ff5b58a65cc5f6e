use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle, time};

use crate::{
    error::StorageError,
    storage::{KeyValueStore, NOTIFICATION_PERMISSION_KEY, get_json, set_json},
};

pub const BANNER_MESSAGE: &str = "good morning! let's check today's weather";
pub const BANNER_DELAY: Duration = Duration::from_secs(3);
pub const BANNER_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
}

/// Asks the user whether notifications are allowed.
pub trait PermissionPrompt: Send + Sync {
    /// `None` when the user dismissed the question without answering.
    fn request(&self) -> Option<bool>;
}

/// Ask for notification permission unless a decision is already stored.
/// Without a prompt the stored state is returned untouched.
pub fn ensure_permission(
    store: &dyn KeyValueStore,
    prompt: Option<&dyn PermissionPrompt>,
) -> Result<NotificationPermission, StorageError> {
    let current: NotificationPermission =
        get_json(store, NOTIFICATION_PERMISSION_KEY)?.unwrap_or_default();

    if current != NotificationPermission::Default {
        return Ok(current);
    }
    let Some(prompt) = prompt else {
        return Ok(current);
    };

    let decided = match prompt.request() {
        Some(true) => NotificationPermission::Granted,
        Some(false) => NotificationPermission::Denied,
        None => return Ok(current),
    };

    set_json(store, NOTIFICATION_PERMISSION_KEY, &decided)?;
    tracing::info!(permission = ?decided, "notification permission recorded");
    Ok(decided)
}

/// A message revealed once after `delay` and hidden again `duration` later.
#[derive(Debug, Clone)]
pub struct NotificationBanner {
    pub message: String,
    pub delay: Duration,
    pub duration: Duration,
}

impl Default for NotificationBanner {
    fn default() -> Self {
        Self {
            message: BANNER_MESSAGE.to_string(),
            delay: BANNER_DELAY,
            duration: BANNER_DURATION,
        }
    }
}

impl NotificationBanner {
    /// Start the timers. The receiver holds the current visibility.
    pub fn spawn(&self) -> (watch::Receiver<bool>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(false);
        let delay = self.delay;
        let duration = self.duration;

        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            if tx.send(true).is_err() {
                return;
            }
            time::sleep(duration).await;
            let _ = tx.send(false);
        });

        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    struct Answer {
        reply: Option<bool>,
        asked: AtomicUsize,
    }

    impl Answer {
        fn new(reply: Option<bool>) -> Self {
            Self { reply, asked: AtomicUsize::new(0) }
        }
    }

    impl PermissionPrompt for Answer {
        fn request(&self) -> Option<bool> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.reply
        }
    }

    #[test]
    fn asks_once_and_remembers() {
        let store = MemoryStore::new();
        let prompt = Answer::new(Some(true));

        let first = ensure_permission(&store, Some(&prompt)).unwrap();
        let second = ensure_permission(&store, Some(&prompt)).unwrap();

        assert_eq!(first, NotificationPermission::Granted);
        assert_eq!(second, NotificationPermission::Granted);
        assert_eq!(prompt.asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dismissed_prompt_stays_default() {
        let store = MemoryStore::new();
        let prompt = Answer::new(None);

        let state = ensure_permission(&store, Some(&prompt)).unwrap();
        assert_eq!(state, NotificationPermission::Default);
        assert_eq!(store.get(NOTIFICATION_PERMISSION_KEY).unwrap(), None);
    }

    #[test]
    fn no_prompt_is_a_no_op() {
        let store = MemoryStore::new();
        let state = ensure_permission(&store, None).unwrap();
        assert_eq!(state, NotificationPermission::Default);
    }

    #[tokio::test(start_paused = true)]
    async fn banner_shows_after_delay_then_hides() {
        let start = Instant::now();
        let (mut rx, handle) = NotificationBanner::default().spawn();
        assert!(!*rx.borrow());

        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());
        let shown_at = start.elapsed();
        assert!(shown_at >= BANNER_DELAY && shown_at < BANNER_DELAY + Duration::from_secs(1));

        rx.changed().await.unwrap();
        assert!(!*rx.borrow_and_update());
        assert!(start.elapsed() >= BANNER_DELAY + BANNER_DURATION);

        handle.await.unwrap();
    }
}
