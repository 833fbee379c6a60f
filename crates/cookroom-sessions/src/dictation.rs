//! Voice dictation into the prompt buffer.
//!
//! The platform recognizer is injected as a [`SpeechRecognizer`] and reports
//! back through an mpsc channel created per listening session. The bridge is
//! an explicit state machine:
//!
//! ```text
//! Idle -> Listening -> Idle
//! Idle -> Listening -> Error -> Idle
//! ```
//!
//! `Error` is transient: it is published to subscribers and immediately
//! followed by `Idle`.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::{error::DictationError, prompt::PromptText};

/// Platform speech recognition
pub trait SpeechRecognizer: Send + Sync {
    /// Whether recognition is possible at all on this platform
    fn is_available(&self) -> bool;

    /// Begin a session, reporting through `events` until it ends.
    fn start(
        &self,
        language: &str,
        events: mpsc::UnboundedSender<RecognitionEvent>,
    ) -> Result<(), String>;

    /// Stop the current session
    fn stop(&self);
}

/// What the recognizer reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Interim hypothesis
    Partial(String),
    /// Final transcript
    Final(String),
    /// Recognition error
    Failed(String),
    /// Session ended
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationState {
    Idle,
    Listening,
    Error(String),
}

/// Result of pressing the dictation control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictationStart {
    Started,
    /// The control toggled an active session off
    Stopped,
}

/// What handling one recognition event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationOutcome {
    /// Final transcript appended to the prompt
    Appended(String),
    /// Interim text held back
    Buffered,
    /// Session ended without a final transcript
    Ended,
    /// Session failed; partial text discarded
    Failed(DictationError),
    /// Event from a session that is no longer listening
    Ignored,
}

/// Bridges a platform recognizer into the prompt buffer
pub struct DictationBridge {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    language: String,
    state: DictationState,
    partial: String,
    events: Option<mpsc::UnboundedReceiver<RecognitionEvent>>,
    state_tx: broadcast::Sender<DictationState>,
}

impl std::fmt::Debug for DictationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictationBridge")
            .field("supported", &self.recognizer.is_some())
            .field("language", &self.language)
            .field("state", &self.state)
            .finish()
    }
}

impl DictationBridge {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, language: impl Into<String>) -> Self {
        Self::build(Some(recognizer), language.into())
    }

    /// Bridge for platforms without speech recognition
    pub fn unsupported() -> Self {
        Self::build(None, String::new())
    }

    fn build(recognizer: Option<Arc<dyn SpeechRecognizer>>, language: String) -> Self {
        let (state_tx, _) = broadcast::channel(16);
        Self {
            recognizer,
            language,
            state: DictationState::Idle,
            partial: String::new(),
            events: None,
            state_tx,
        }
    }

    pub fn state(&self) -> &DictationState {
        &self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> broadcast::Receiver<DictationState> {
        self.state_tx.subscribe()
    }

    /// Interim text of the current session
    pub fn partial(&self) -> &str {
        &self.partial
    }

    /// Start listening, or stop if already listening.
    pub fn start(&mut self) -> Result<DictationStart, DictationError> {
        let recognizer = match &self.recognizer {
            Some(r) if r.is_available() => Arc::clone(r),
            _ => {
                debug!("dictation requested without recognizer");
                return Err(DictationError::Unsupported);
            }
        };

        if self.is_listening() {
            self.stop();
            return Ok(DictationStart::Stopped);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        match recognizer.start(&self.language, tx) {
            Ok(()) => {
                self.events = Some(rx);
                self.partial.clear();
                self.set_state(DictationState::Listening);
                info!(language = %self.language, "dictation started");
                Ok(DictationStart::Started)
            }
            Err(reason) => {
                warn!(%reason, "dictation failed to start");
                self.fail(reason.clone());
                Err(DictationError::Platform(reason))
            }
        }
    }

    /// Stop an active session; partial text is discarded.
    pub fn stop(&mut self) {
        if !self.is_listening() {
            return;
        }
        if let Some(recognizer) = &self.recognizer {
            recognizer.stop();
        }
        self.end_session();
        self.set_state(DictationState::Idle);
        debug!("dictation stopped");
    }

    /// Wait for the next event of the current session.
    ///
    /// Returns `None` when not listening. A recognizer that hangs up without
    /// reporting is treated as [`RecognitionEvent::Ended`].
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        let events = self.events.as_mut()?;
        Some(events.recv().await.unwrap_or(RecognitionEvent::Ended))
    }

    /// Apply one recognizer event.
    pub fn handle_event(&mut self, event: RecognitionEvent, prompt: &mut PromptText) -> DictationOutcome {
        if !self.is_listening() {
            debug!(?event, "ignoring event outside a listening session");
            return DictationOutcome::Ignored;
        }

        match event {
            RecognitionEvent::Partial(text) => {
                self.partial = text;
                DictationOutcome::Buffered
            }
            RecognitionEvent::Final(text) => {
                prompt.append_transcript(&text);
                self.end_session();
                self.set_state(DictationState::Idle);
                DictationOutcome::Appended(text)
            }
            RecognitionEvent::Failed(reason) => {
                warn!(%reason, "dictation failed");
                self.fail(reason.clone());
                DictationOutcome::Failed(DictationError::Platform(reason))
            }
            RecognitionEvent::Ended => {
                self.end_session();
                self.set_state(DictationState::Idle);
                DictationOutcome::Ended
            }
        }
    }

    /// Wait for the next event and apply it. `None` when not listening.
    pub async fn pump(&mut self, prompt: &mut PromptText) -> Option<DictationOutcome> {
        let event = self.next_event().await?;
        Some(self.handle_event(event, prompt))
    }

    fn fail(&mut self, reason: String) {
        self.end_session();
        self.set_state(DictationState::Error(reason));
        self.set_state(DictationState::Idle);
    }

    fn end_session(&mut self) {
        self.events = None;
        self.partial.clear();
    }

    fn set_state(&mut self, state: DictationState) {
        self.state = state.clone();
        let _ = self.state_tx.send(state);
    }
}
