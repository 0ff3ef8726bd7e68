use crate::config::ClientConfig;
use crate::error::AppError;
use crate::models::classify_types::{DetailView, ModelInfo, ModelStatus, RenderEntry};
use crate::models::file_types::CandidateFile;
use crate::models::notification_types::{Notification, Severity};
use crate::models::preview_types::PreviewEntry;
use crate::models::session_types::{ControlState, SessionStatus, SessionToken, SubmitOutcome};
use crate::services::classifier::client::{model_status, PredictionService};
use crate::services::classifier::results as result_classifier;
use crate::services::events::{ClientEvent, EventBus};
use crate::services::notifier::NotificationSink;
use crate::services::preview::PreviewProjector;
use crate::services::selection::SelectionStore;
use crate::services::session::PredictionSession;
use crate::services::{fs_service, validator};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one image.";
const SUCCESS_MESSAGE: &str = "Prediction completed successfully!";

struct WorkbenchState {
    store: SelectionStore,
    previews: Vec<PreviewEntry>,
    session: PredictionSession,
    results: Vec<RenderEntry>,
    results_visible: bool,
    control: ControlState,
    model_status: Option<ModelStatus>,
}

/// Owner of the selection, its previews, the prediction session and the
/// results view. Each user action is one method here; the front end renders
/// from the events it publishes.
///
/// State sits behind a plain mutex that is never held across an await, so
/// clones of a `Workbench` can be driven from several tasks.
#[derive(Clone)]
pub struct Workbench {
    state: Arc<Mutex<WorkbenchState>>,
    service: Arc<dyn PredictionService>,
    projector: PreviewProjector,
    notifier: NotificationSink,
    events: EventBus,
}

impl Workbench {
    pub fn new(service: Arc<dyn PredictionService>, config: &ClientConfig) -> Self {
        let events = EventBus::new(config.event_capacity);
        let notifier = NotificationSink::new(config.notification_timeout(), events.clone());

        Self {
            state: Arc::new(Mutex::new(WorkbenchState {
                store: SelectionStore::new(),
                previews: Vec::new(),
                session: PredictionSession::new(),
                results: Vec::new(),
                results_visible: false,
                control: ControlState::ready(),
                model_status: None,
            })),
            service,
            projector: PreviewProjector::new(config.thumbnail_size),
            notifier,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkbenchState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn notifier(&self) -> &NotificationSink {
        &self.notifier
    }

    /// Validate `files` and append the accepted ones. Returns how many were
    /// accepted. Previews are rebuilt before this returns.
    pub async fn add_files(&self, files: Vec<CandidateFile>) -> usize {
        let accepted = validator::filter_batch(files, &self.notifier);
        let count = accepted.len();

        let changed = {
            let mut state = self.lock();
            let changed = state.store.append(accepted);
            if changed {
                self.emit_selection(&state);
            }
            changed
        };

        if changed {
            debug!(accepted = count, "Files added to selection");
            self.refresh_previews().await;
        }
        count
    }

    /// Load files from disk (directories expanded) and add them.
    pub async fn add_paths(&self, paths: &[PathBuf]) -> Result<usize, AppError> {
        let files = fs_service::load_candidates(paths).await?;
        Ok(self.add_files(files).await)
    }

    /// Remove the file at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a position of the current selection.
    pub async fn remove_at(&self, index: usize) -> CandidateFile {
        let removed = {
            let mut state = self.lock();
            let removed = state.store.remove_at(index);
            self.emit_selection(&state);
            removed
        };

        debug!(index, file = %removed.name(), "File removed from selection");
        self.refresh_previews().await;
        removed
    }

    /// Empty the selection, drop its previews and hide results. A request in
    /// flight keeps running but its response will be discarded.
    pub fn clear(&self) {
        let mut state = self.lock();
        let changed = state.store.clear();
        let had_results = state.results_visible || !state.results.is_empty();

        state.session.invalidate();
        state.previews.clear();
        state.results.clear();
        state.results_visible = false;

        if changed {
            self.emit_selection(&state);
            self.events.emit_lossy(ClientEvent::PreviewsRendered {
                revision: state.store.revision(),
                previews: Vec::new(),
            });
        }
        if had_results {
            self.events.emit_lossy(ClientEvent::ResultsCleared);
        }
        debug!(changed, "Selection cleared");
    }

    async fn refresh_previews(&self) {
        let (revision, snapshot) = {
            let state = self.lock();
            (state.store.revision(), state.store.snapshot())
        };

        let previews = self.projector.project(snapshot).await;
        self.install_previews(revision, previews);
    }

    /// Publish a rebuild made from the selection at `revision`. Returns false
    /// and keeps the current tiles if the selection has changed since.
    fn install_previews(&self, revision: u64, previews: Vec<PreviewEntry>) -> bool {
        let mut state = self.lock();
        if state.store.revision() != revision {
            debug!(revision, current = state.store.revision(), "Dropping stale preview rebuild");
            return false;
        }
        state.previews = previews.clone();
        self.events.emit_lossy(ClientEvent::PreviewsRendered { revision, previews });
        true
    }

    /// Send the current selection for prediction.
    ///
    /// Fails with `EmptySubmission` when nothing is selected, and with the
    /// service or transport error when the request fails. A call made while
    /// another request is in flight does nothing.
    pub async fn submit(&self) -> Result<SubmitOutcome, AppError> {
        let (token, files, previews) = {
            let mut state = self.lock();

            if state.session.is_running() {
                debug!("Submit ignored, a session is already running");
                return Ok(SubmitOutcome::Ignored);
            }

            if state.store.is_empty() {
                drop(state);
                self.notifier.notify(EMPTY_SELECTION_MESSAGE, Severity::Error);
                return Err(AppError::EmptySubmission);
            }

            let Some(token) = state.session.begin() else {
                return Ok(SubmitOutcome::Ignored);
            };
            state.control = ControlState::busy();
            self.emit_session(&state);

            let previews = aligned_previews(&state);
            (token, state.store.snapshot(), previews)
        };

        // Re-enables the control if this future is dropped mid-request.
        let mut guard = ControlGuard {
            workbench: self,
            token,
            armed: true,
        };

        info!(files = files.len(), "Submitting prediction request");
        let outcome = self.service.predict(&files).await;

        // Settling the session and re-enabling the control happen under one
        // lock, so no other submit can start in between.
        let mut state = self.lock();
        guard.armed = false;
        let current = state.session.finish(token, outcome.is_ok());

        if !current {
            state.control = ControlState::ready();
            self.emit_session(&state);
            info!("Prediction response arrived after the selection was cleared, discarding");
            return Ok(SubmitOutcome::Discarded);
        }

        match outcome {
            Ok(raws) => {
                let entries = result_classifier::classify_all(&raws, &previews);
                let count = entries.len();
                state.results = entries.clone();
                state.results_visible = true;
                state.control = ControlState::ready();
                self.events.emit_lossy(ClientEvent::ResultsRendered { entries });
                self.emit_session(&state);
                drop(state);

                self.notifier.notify(SUCCESS_MESSAGE, Severity::Success);
                info!(results = count, "Prediction session completed");
                Ok(SubmitOutcome::Completed { results: count })
            }
            Err(e) => {
                state.control = ControlState::ready();
                self.emit_session(&state);
                drop(state);

                error!("Prediction session failed: {}", e);
                self.notifier.notify(e.message(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Probe the service once and publish the resulting status.
    pub async fn check_health(&self) -> ModelStatus {
        let probe = self.service.health().await;
        if let Err(e) = &probe {
            warn!("Health check failed: {}", e);
        }
        let status = model_status(&probe);

        self.lock().model_status = Some(status);
        self.events.emit_lossy(ClientEvent::ModelStatusChanged(status));
        status
    }

    pub async fn model_info(&self) -> Result<ModelInfo, AppError> {
        self.service.model_info().await
    }

    /// Detail view for the result card at `index`; `None` for error cards
    /// and positions without a card.
    pub fn detail(&self, index: usize) -> Option<DetailView> {
        let state = self.lock();
        state
            .results
            .get(index)
            .and_then(RenderEntry::as_result)
            .map(result_classifier::detail_view)
    }

    pub fn selection(&self) -> Vec<CandidateFile> {
        self.lock().store.snapshot()
    }

    pub fn selection_len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn previews(&self) -> Vec<PreviewEntry> {
        self.lock().previews.clone()
    }

    /// Cards of the last completed session, empty while the view is hidden.
    pub fn results(&self) -> Vec<RenderEntry> {
        let state = self.lock();
        if state.results_visible {
            state.results.clone()
        } else {
            Vec::new()
        }
    }

    pub fn results_visible(&self) -> bool {
        self.lock().results_visible
    }

    pub fn session_status(&self) -> SessionStatus {
        self.lock().session.status()
    }

    pub fn control(&self) -> ControlState {
        self.lock().control.clone()
    }

    pub fn model_status(&self) -> Option<ModelStatus> {
        self.lock().model_status
    }

    pub fn current_notification(&self) -> Option<Notification> {
        self.notifier.current()
    }

    fn emit_selection(&self, state: &WorkbenchState) {
        self.events.emit_lossy(ClientEvent::SelectionChanged {
            count: state.store.len(),
            revision: state.store.revision(),
        });
    }

    fn emit_session(&self, state: &WorkbenchState) {
        self.events.emit_lossy(ClientEvent::SessionChanged {
            status: state.session.status(),
            control: state.control.clone(),
        });
    }
}

/// Preview data for each selected file, by position. Tiles from an older
/// rebuild are only used where they still belong to the same file.
fn aligned_previews(state: &WorkbenchState) -> Vec<Option<String>> {
    state
        .store
        .files()
        .iter()
        .enumerate()
        .map(|(i, file)| {
            state
                .previews
                .get(i)
                .filter(|p| p.file_id == file.id())
                .map(|p| p.data_uri.clone())
        })
        .collect()
}

struct ControlGuard<'a> {
    workbench: &'a Workbench,
    token: SessionToken,
    armed: bool,
}

impl Drop for ControlGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.workbench.lock();
        if state.session.abandon(self.token) {
            state.control = ControlState::ready();
            self.workbench.emit_session(&state);
        }
    }
}
