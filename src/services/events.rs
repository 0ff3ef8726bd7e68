use crate::models::classify_types::{ModelStatus, RenderEntry};
use crate::models::notification_types::Notification;
use crate::models::preview_types::PreviewEntry;
use crate::models::session_types::{ControlState, SessionStatus};
use tokio::sync::broadcast;

/// State changes the front end renders from.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    SelectionChanged { count: usize, revision: u64 },
    PreviewsRendered { revision: u64, previews: Vec<PreviewEntry> },
    SessionChanged { status: SessionStatus, control: ControlState },
    ResultsRendered { entries: Vec<RenderEntry> },
    ResultsCleared,
    ModelStatusChanged(ModelStatus),
    Notification(Notification),
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receives every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit, ignoring the case where nobody is listening.
    pub fn emit_lossy(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
