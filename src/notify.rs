use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-facing notification emitted by the engine; the storefront renders
/// these however it likes (the original showed toasts).
#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Broadcast fan-out for notices. Sending without subscribers is fine; the
/// engine never blocks on whether anyone is listening.
#[derive(Debug, Clone)]
pub(crate) struct NoticeSink {
    tx: broadcast::Sender<Notice>,
}

impl NoticeSink {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub(crate) fn success(&self, message: impl Into<String>) {
        let _ = self.tx.send(Notice::success(message));
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        let _ = self.tx.send(Notice::error(message));
    }
}
