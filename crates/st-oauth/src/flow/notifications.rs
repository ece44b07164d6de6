//! Cross-context resolution broadcast
//!
//! One-directional, fire-and-forget fan-out from the background flow core
//! to whatever panel is currently subscribed. Missed notifications are not
//! queued; a panel that mounts late recovers from flow-state presence
//! instead, so correctness never depends on delivery succeeding.

use tokio::sync::broadcast;
use tracing::debug;

use st_types::AuthNotification;

/// Bounded backlog per subscriber; resolutions are rare, so lagging only
/// happens if a panel stops polling its receiver entirely.
const CHANNEL_CAPACITY: usize = 16;

/// Broadcast handle for flow resolutions
#[derive(Clone)]
pub struct AuthNotifier {
    sender: broadcast::Sender<AuthNotification>,
}

impl AuthNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to future resolutions
    pub fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        self.sender.subscribe()
    }

    /// Broadcast a resolution to all current subscribers
    ///
    /// Sending with no subscriber is not an error.
    pub fn notify(&self, notification: AuthNotification) {
        if self.sender.send(notification).is_err() {
            debug!("No panel subscribed for auth notification");
        }
    }
}

impl Default for AuthNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let notifier = AuthNotifier::new();
        let mut rx = notifier.subscribe();

        notifier.notify(AuthNotification::Complete {
            api_key: "sk-or-v1-abc".to_string(),
        });

        let received = rx.recv().await.unwrap();
        assert_eq!(
            received,
            AuthNotification::Complete {
                api_key: "sk-or-v1-abc".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_notify_without_subscriber_is_silent() {
        let notifier = AuthNotifier::new();
        notifier.notify(AuthNotification::Error {
            error: "nobody listening".to_string(),
        });
    }

    #[tokio::test]
    async fn test_all_subscribers_receive() {
        let notifier = AuthNotifier::new();
        let mut rx1 = notifier.subscribe();
        let mut rx2 = notifier.subscribe();

        notifier.notify(AuthNotification::Error {
            error: "boom".to_string(),
        });

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }
}
