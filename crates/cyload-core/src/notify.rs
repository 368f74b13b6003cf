//! User-facing notifications

/// Receives short title + message notifications.
///
/// Implementations must not block: the engine calls this inline between
/// database round trips.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Sink that forwards notifications to the tracing log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::info!(title, message, "notification");
    }
}

impl<F> NotificationSink for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn notify(&self, title: &str, message: &str) {
        self(title, message)
    }
}
