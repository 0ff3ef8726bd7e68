use crate::models::session_types::{SessionStatus, SessionToken};
use tracing::debug;

/// Lifecycle of prediction requests. At most one is in flight; each is
/// stamped with a fresh token so a response that outlived its selection can
/// be told apart from the current one.
///
/// `in_flight` is the request occupying the session until it settles.
/// `current` is the request whose response may still be shown; `invalidate`
/// clears it without freeing the session.
#[derive(Debug)]
pub struct PredictionSession {
    status: SessionStatus,
    last_token: u64,
    in_flight: Option<SessionToken>,
    current: Option<SessionToken>,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            last_token: 0,
            in_flight: None,
            current: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Start a request. Returns `None` while another one is still in flight.
    pub fn begin(&mut self) -> Option<SessionToken> {
        if self.is_running() {
            return None;
        }
        self.last_token += 1;
        let token = SessionToken(self.last_token);
        self.in_flight = Some(token);
        self.current = Some(token);
        self.status = SessionStatus::Running;
        debug!(token = token.0, "Session running");
        Some(token)
    }

    pub fn is_current(&self, token: SessionToken) -> bool {
        self.current == Some(token)
    }

    /// Forget the selection the in-flight request was made for. Its response
    /// will be reported stale by `finish`. A settled session returns to Idle.
    pub fn invalidate(&mut self) {
        self.current = None;
        if !self.is_running() {
            self.status = SessionStatus::Idle;
        }
    }

    /// Settle the request stamped `token`. Returns false when the token is
    /// stale, in which case the caller drops the response. A stale response
    /// for the in-flight request leaves the session Idle.
    pub fn finish(&mut self, token: SessionToken, succeeded: bool) -> bool {
        if self.in_flight != Some(token) {
            debug!(token = token.0, "Ignoring response, request no longer holds the session");
            return false;
        }
        self.in_flight = None;

        if !self.is_current(token) {
            debug!(token = token.0, "Discarding stale session response");
            self.status = SessionStatus::Idle;
            return false;
        }

        self.current = None;
        self.status = if succeeded {
            SessionStatus::Completed
        } else {
            SessionStatus::Failed
        };
        debug!(token = token.0, status = ?self.status, "Session settled");
        true
    }

    /// The request stamped `token` will never report back (its future was
    /// dropped). Frees the session if that request still holds it; returns
    /// whether it did.
    pub fn abandon(&mut self, token: SessionToken) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;
        if self.is_current(token) {
            self.current = None;
        }
        debug!(token = token.0, "Session abandoned");
        self.status = SessionStatus::Idle;
        true
    }
}

impl Default for PredictionSession {
    fn default() -> Self {
        Self::new()
    }
}
