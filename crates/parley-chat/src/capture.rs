//! Voice capture arbitration.
//!
//! At most one capture session exists per page. While it runs, every
//! transcript the recognizer emits replaces the target input's text (the
//! recognizer re-interprets the whole utterance each time, so appending
//! would duplicate words). The session is considered active until its
//! `End` or `Error` signal arrives, even after `stop` was requested.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_core::config::CaptureConfig;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Capability, ChatError};
use crate::surface::{
    ActionIcon, CaptureEvent, CaptureOptions, ErrorSink, InputControl, SpeechRecognizer,
};

/// Result of a [`CaptureArbiter::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStart {
    Started,
    /// A session was already running; nothing changed.
    AlreadyActive,
}

struct CaptureSession {
    generation: u64,
    target: Arc<dyn InputControl>,
    /// Cleared by `abandon`; later transcripts are dropped.
    writes_input: bool,
}

#[derive(Default)]
struct CaptureState {
    session: Option<CaptureSession>,
    generation: u64,
}

/// Enforces at most one active voice capture session.
#[derive(Clone)]
pub struct CaptureArbiter {
    state: Arc<Mutex<CaptureState>>,
    recognizer: Arc<dyn SpeechRecognizer>,
    errors: Arc<dyn ErrorSink>,
    options: CaptureOptions,
}

impl CaptureArbiter {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        errors: Arc<dyn ErrorSink>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::default())),
            recognizer,
            errors,
            options: CaptureOptions {
                language: config.language.clone(),
                interim_results: config.interim_results,
            },
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Start capturing into `target`.
    ///
    /// Unsupported environments and recognizer start failures are reported
    /// to the error sink and returned. Calling this while a session is
    /// active is a no-op.
    pub fn start(&self, target: Arc<dyn InputControl>) -> Result<CaptureStart, ChatError> {
        if !self.recognizer.is_supported() {
            let err = ChatError::UnsupportedCapability(Capability::VoiceCapture);
            self.errors.report(&err);
            return Err(err);
        }

        let generation = {
            let mut state = self.lock();
            if state.session.is_some() {
                debug!("Capture already active");
                return Ok(CaptureStart::AlreadyActive);
            }
            state.generation += 1;
            let generation = state.generation;
            state.session = Some(CaptureSession {
                generation,
                target: Arc::clone(&target),
                writes_input: true,
            });
            generation
        };

        let events = match self.recognizer.start(&self.options) {
            Ok(events) => events,
            Err(message) => {
                self.release(generation);
                warn!(error = %message, "Voice capture failed to start");
                let err = ChatError::Capture(message);
                self.errors.report(&err);
                return Err(err);
            }
        };

        target.set_action_icon(ActionIcon::Stop);
        info!(generation, language = %self.options.language, "Voice capture started");

        let arbiter = self.clone();
        tokio::spawn(async move {
            arbiter.observe(generation, target, events).await;
        });

        Ok(CaptureStart::Started)
    }

    /// Ask the active session to stop. Returns whether a stop was issued.
    pub fn stop(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.recognizer.stop();
        debug!("Voice capture stop requested");
        true
    }

    /// Stop the active session and drop whatever it still transcribes.
    ///
    /// Used when something else takes over the input, such as a dispatch
    /// of the text captured so far. Returns whether a session was live.
    pub fn abandon(&self) -> bool {
        let abandoned = match self.lock().session.as_mut() {
            Some(session) => {
                session.writes_input = false;
                true
            }
            None => false,
        };
        if abandoned {
            self.recognizer.stop();
            debug!("Voice capture abandoned");
        }
        abandoned
    }

    async fn observe(
        &self,
        generation: u64,
        target: Arc<dyn InputControl>,
        mut events: mpsc::UnboundedReceiver<CaptureEvent>,
    ) {
        loop {
            match events.recv().await {
                Some(CaptureEvent::Transcript(text)) => {
                    match self.writes_input(generation) {
                        Some(true) => target.set_text(&text),
                        Some(false) => {
                            debug!(generation, "Dropping transcript from abandoned session")
                        }
                        None => {
                            debug!(generation, "Dropping transcript from ended session");
                            break;
                        }
                    }
                }
                Some(CaptureEvent::Error(message)) => {
                    if self.end(generation) {
                        warn!(error = %message, "Voice capture error");
                        self.errors.report(&ChatError::Capture(message));
                    }
                    break;
                }
                Some(CaptureEvent::End) | None => {
                    if self.end(generation) {
                        info!(generation, "Voice capture ended");
                    }
                    break;
                }
            }
        }
    }

    /// Return to idle if `generation` is still the live session, restoring
    /// the action icon from whatever the input now holds.
    fn end(&self, generation: u64) -> bool {
        let Some(session) = self.release(generation) else {
            return false;
        };
        let icon = if session.target.text().trim().is_empty() {
            ActionIcon::Microphone
        } else {
            ActionIcon::Send
        };
        session.target.set_action_icon(icon);
        true
    }

    fn release(&self, generation: u64) -> Option<CaptureSession> {
        let mut state = self.lock();
        match &state.session {
            Some(session) if session.generation == generation => state.session.take(),
            _ => None,
        }
    }

    /// `None` once `generation` is no longer the live session.
    fn writes_input(&self, generation: u64) -> Option<bool> {
        self.lock()
            .session
            .as_ref()
            .filter(|s| s.generation == generation)
            .map(|s| s.writes_input)
    }

    fn lock(&self) -> MutexGuard<'_, CaptureState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Tests
// =============================================================================
