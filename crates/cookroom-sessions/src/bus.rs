//! One-shot user notices for the hosting UI
//!
//! Components publish a [`Notice`] whenever something happened that the user
//! should be told about (an error, a limit, a rollback, a finished export).
//! The bus uses tokio's broadcast channel; each subscriber sees every notice
//! published after it subscribed.
//!
//! # Example
//!
//! ```rust
//! use cookroom_sessions::bus::{EventBus, Notice, NoticeTopic};
//!
//! # tokio_test::block_on(async {
//! let bus = EventBus::new();
//! let mut subscriber = bus.subscribe();
//!
//! bus.publish(Notice::error(NoticeTopic::Analysis, "Analysis failed"));
//!
//! let notice = subscriber.recv().await.unwrap();
//! assert_eq!(notice.message, "Analysis failed");
//! # });
//! ```

use tokio::sync::broadcast;

/// Channel capacity for broadcast notices
const CHANNEL_CAPACITY: usize = 1024;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Which part of the session a notice comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeTopic {
    Attachments,
    Dictation,
    Analysis,
    Favorites,
    Feed,
    Export,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub topic: NoticeTopic,
    pub message: String,
}

impl Notice {
    pub fn info(topic: NoticeTopic, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            topic,
            message: message.into(),
        }
    }

    pub fn warning(topic: NoticeTopic, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            topic,
            message: message.into(),
        }
    }

    pub fn error(topic: NoticeTopic, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            topic,
            message: message.into(),
        }
    }
}

/// Broadcast bus for notices
///
/// Clones share the same underlying channel.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Notice>,
}

impl EventBus {
    /// Create a new event bus with default capacity (1024 notices)
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a notice; having no subscribers is fine
    pub fn publish(&self, notice: Notice) {
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(Notice::warning(NoticeTopic::Attachments, "You can attach at most 3 images"));

        for rx in [&mut first, &mut second] {
            let notice = rx.recv().await.unwrap();
            assert_eq!(notice.level, NoticeLevel::Warning);
            assert_eq!(notice.topic, NoticeTopic::Attachments);
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::with_capacity(0);
        bus.publish(Notice::info(NoticeTopic::Export, "saved"));
        assert_eq!(bus.subscriber_count(), 0);
    }
}
