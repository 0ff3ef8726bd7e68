use serde::Serialize;

pub const PREDICT_LABEL: &str = "Predict";
pub const BUSY_LABEL: &str = "Analyzing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

/// Stamp attached to one submit. Responses carrying an older token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionToken(pub(crate) u64);

/// The predict affordance as the front end should show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub enabled: bool,
    pub label: &'static str,
}

impl ControlState {
    pub fn ready() -> Self {
        Self {
            enabled: true,
            label: PREDICT_LABEL,
        }
    }

    pub fn busy() -> Self {
        Self {
            enabled: false,
            label: BUSY_LABEL,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::ready()
    }
}

/// How a call to `submit` ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmitOutcome {
    /// Results were classified and published.
    Completed { results: usize },
    /// Another session was already running; nothing was sent.
    Ignored,
    /// The response arrived after the selection was cleared and was dropped.
    Discarded,
}
