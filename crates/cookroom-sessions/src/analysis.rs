//! One analysis request/response cycle at a time.

use std::{fmt, sync::Arc};

use cookroom_api::{AnalysisOutcome, ApiError, ImageUpload, Recipe, RecipeBackend};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Why an analysis did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Submitted without any image
    NoInput,
    /// The server could not be reached
    Transport,
    /// The server answered with an error
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl AnalysisFailure {
    pub fn no_input() -> Self {
        Self {
            kind: FailureKind::NoInput,
            reason: "Attach at least one image".to_string(),
        }
    }

    fn from_api(err: &ApiError) -> Self {
        let kind = if err.is_transport() {
            FailureKind::Transport
        } else {
            FailureKind::Server
        };
        Self {
            kind,
            reason: err.user_message(),
        }
    }
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Exactly one state is current per session
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AnalysisState {
    #[default]
    Idle,
    Pending,
    Success(AnalysisOutcome),
    Failure(AnalysisFailure),
}

impl AnalysisState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AnalysisState::Pending)
    }

    pub fn failure(&self) -> Option<&AnalysisFailure> {
        match self {
            AnalysisState::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        match self {
            AnalysisState::Success(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Puts back the state held before a submit whose future was dropped mid-request
struct PendingAnalysis<'a> {
    state: &'a Mutex<AnalysisState>,
    previous: Option<AnalysisState>,
}

impl Drop for PendingAnalysis<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            debug!("analysis dropped before the server answered");
            *self.state.lock() = previous;
        }
    }
}

/// Submits attachments and prompt to the backend and tracks the result.
///
/// State changes are single swaps under a lock, so an observer sees either the
/// previous result, `Pending`, or the new result.
pub struct AnalysisSession {
    backend: Arc<dyn RecipeBackend>,
    state: Mutex<AnalysisState>,
}

impl fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl AnalysisSession {
    pub fn new(backend: Arc<dyn RecipeBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(AnalysisState::Idle),
        }
    }

    /// Run one analysis.
    ///
    /// With no images this returns a `NoInput` failure without touching the
    /// current state. While a request is pending it returns `Pending` and sends
    /// nothing. Dropping the future before the server answers puts the previous
    /// state back.
    pub async fn submit(&self, images: &[ImageUpload], prompt: &str) -> AnalysisState {
        if images.is_empty() {
            debug!("analysis submitted without images");
            return AnalysisState::Failure(AnalysisFailure::no_input());
        }

        let previous = {
            let mut state = self.state.lock();
            if state.is_pending() {
                debug!("analysis already pending");
                return AnalysisState::Pending;
            }
            std::mem::replace(&mut *state, AnalysisState::Pending)
        };
        let mut guard = PendingAnalysis {
            state: &self.state,
            previous: Some(previous),
        };

        info!(images = images.len(), prompt_len = prompt.len(), "submitting analysis");
        let next = match self.backend.analyze(images, prompt).await {
            Ok(outcome) => {
                info!(recipes = outcome.recipes.len(), "analysis succeeded");
                AnalysisState::Success(outcome)
            }
            Err(err) => {
                warn!(error = %err, "analysis failed");
                AnalysisState::Failure(AnalysisFailure::from_api(&err))
            }
        };

        guard.previous = None;
        *self.state.lock() = next.clone();
        next
    }

    pub fn current(&self) -> AnalysisState {
        self.state.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().is_pending()
    }

    /// Back to `Idle`. Refused while a request is pending.
    pub fn reset(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_pending() {
            return false;
        }
        *state = AnalysisState::Idle;
        true
    }

    /// Recipes of the current successful result
    pub fn recipes(&self) -> Vec<Recipe> {
        self.state
            .lock()
            .outcome()
            .map(|o| o.recipes.clone())
            .unwrap_or_default()
    }

    pub fn recipe(&self, name: &str) -> Option<Recipe> {
        self.state
            .lock()
            .outcome()
            .and_then(|o| o.recipes.iter().find(|r| r.name == name).cloned())
    }
}
