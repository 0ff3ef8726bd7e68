use crate::models::notification_types::{Notification, Severity};
use crate::services::events::{ClientEvent, EventBus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info};

pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);
const HISTORY_LEN: usize = 32;

struct SinkState {
    visible: Option<(Notification, Instant)>,
    history: VecDeque<Notification>,
}

/// Fire-and-forget user messages. At most one is visible; a new one replaces
/// it and each expires after `timeout`.
#[derive(Clone)]
pub struct NotificationSink {
    state: Arc<Mutex<SinkState>>,
    timeout: Duration,
    events: Option<EventBus>,
}

impl NotificationSink {
    pub fn new(timeout: Duration, events: EventBus) -> Self {
        Self::build(timeout, Some(events))
    }

    /// A sink with no event bus attached.
    pub fn detached(timeout: Duration) -> Self {
        Self::build(timeout, None)
    }

    fn build(timeout: Duration, events: Option<EventBus>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                visible: None,
                history: VecDeque::with_capacity(HISTORY_LEN),
            })),
            timeout,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn notify(&self, text: impl Into<String>, severity: Severity) {
        let notification = Notification::new(text, severity);

        match severity {
            Severity::Error => error!(text = %notification.text, "Notification"),
            Severity::Info | Severity::Success => {
                info!(text = %notification.text, %severity, "Notification")
            }
        }

        {
            let mut state = self.lock();
            state.visible = Some((notification.clone(), Instant::now() + self.timeout));
            if state.history.len() == HISTORY_LEN {
                state.history.pop_front();
            }
            state.history.push_back(notification.clone());
        }

        if let Some(events) = &self.events {
            events.emit_lossy(ClientEvent::Notification(notification));
        }
    }

    /// The visible notification, if it has not expired yet.
    pub fn current(&self) -> Option<Notification> {
        let mut state = self.lock();
        match &state.visible {
            Some((_, expires_at)) if Instant::now() >= *expires_at => {
                state.visible = None;
                None
            }
            Some((notification, _)) => Some(notification.clone()),
            None => None,
        }
    }

    /// Most recent notifications, oldest first.
    pub fn history(&self) -> Vec<Notification> {
        self.lock().history.iter().cloned().collect()
    }
}
