use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::notification::{Notification, NotificationKind};

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(5000);

#[derive(Default)]
struct QueueState {
    items: Vec<Notification>,
    timers: HashMap<String, JoinHandle<()>>,
    sequence: u64,
}

struct Shared {
    state: Mutex<QueueState>,
    sender: watch::Sender<Vec<Notification>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, items: &[Notification]) {
        self.sender.send_replace(items.to_vec());
    }

    fn expire(&self, id: &str) {
        let mut state = self.lock();
        state.timers.remove(id);
        state.items.retain(|item| item.id != id);
        self.publish(&state.items);
    }
}

/// Short-lived user-facing messages. Each one removes itself after the TTL;
/// pending removal timers are aborted when the queue is shut down or dropped.
pub struct NotificationQueue {
    shared: Arc<Shared>,
    ttl: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(NOTIFICATION_TTL)
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState::default()),
                sender,
            }),
            ttl,
        }
    }

    pub fn push(&self, message: impl Into<String>, kind: NotificationKind) -> String {
        let message = message.into();
        let mut state = self.shared.lock();
        state.sequence += 1;
        let now = Utc::now();
        let id = format!("{}-{}", now.timestamp_millis(), state.sequence);

        tracing::debug!(%id, %kind, %message, "notification pushed");
        state.items.push(Notification {
            id: id.clone(),
            message,
            kind,
            created_at: now,
        });

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = Arc::clone(&self.shared);
                let ttl = self.ttl;
                let timer_id = id.clone();
                let timer = handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    shared.expire(&timer_id);
                });
                state.timers.insert(id.clone(), timer);
            }
            Err(_) => {
                tracing::warn!(%id, "no async runtime; notification will not expire");
            }
        }

        self.shared.publish(&state.items);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.push(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.push(message, NotificationKind::Error)
    }

    /// Removing an unknown id is a no-op.
    pub fn remove(&self, id: &str) {
        let mut state = self.shared.lock();
        if let Some(timer) = state.timers.remove(id) {
            timer.abort();
        }
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() != before {
            self.shared.publish(&state.items);
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.shared.lock().items.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.shared.sender.subscribe()
    }

    /// Stops every pending expiry timer. Visible notifications stay until removed.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        for (_, timer) in state.timers.drain() {
            timer.abort();
        }
    }
}

impl Drop for NotificationQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}
