use crate::domain::ports::{Notification, NotificationLevel, Notifier};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Writes notifications to the log and, optionally, to stderr.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    echo_to_stderr: bool,
}

impl LogNotifier {
    pub fn new(echo_to_stderr: bool) -> Self {
        Self { echo_to_stderr }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::error!("❌ {}", notification.message),
            NotificationLevel::Success => tracing::info!("✅ {}", notification.message),
            NotificationLevel::Info => tracing::info!("{}", notification.message),
        }

        if self.echo_to_stderr && notification.level == NotificationLevel::Error {
            eprintln!("❌ {}", notification.message);
        }
    }
}

/// Forwards notifications to whoever holds the receiver.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification dropped, receiver closed");
        }
    }
}
