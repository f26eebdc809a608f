//! Read-aloud arbitration.
//!
//! Every assistant or user bubble carries a read-aloud affordance, but at
//! most one of them may be speaking at any instant. Starting one stops the
//! other; the utterance's own end (natural or cancelled) clears the state
//! only if it still belongs to the current session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_core::config::PlaybackConfig;
use tracing::{debug, warn};

use crate::error::{Capability, ChatError};
use crate::surface::{BubbleId, ErrorSink, SpeechEnd, SpeechSynthesizer, Transcript, Utterance};

/// Result of a [`PlaybackArbiter::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackChange {
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSpeech {
    bubble: BubbleId,
    generation: u64,
}

#[derive(Debug, Default)]
struct PlaybackState {
    active: Option<ActiveSpeech>,
    generation: u64,
}

/// Enforces at most one active read-aloud session across all bubbles.
///
/// Cloning yields another handle to the same state. `toggle` spawns the
/// utterance onto the current tokio runtime.
#[derive(Clone)]
pub struct PlaybackArbiter {
    state: Arc<Mutex<PlaybackState>>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcript: Arc<dyn Transcript>,
    errors: Arc<dyn ErrorSink>,
    voice: Option<String>,
    rate: f32,
}

impl PlaybackArbiter {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        transcript: Arc<dyn Transcript>,
        errors: Arc<dyn ErrorSink>,
        config: &PlaybackConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlaybackState::default())),
            synthesizer,
            transcript,
            errors,
            voice: config.voice().map(str::to_string),
            rate: config.rate,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().active.is_some()
    }

    /// The bubble currently being read aloud, if any.
    pub fn speaking_bubble(&self) -> Option<BubbleId> {
        self.lock().active.map(|a| a.bubble)
    }

    /// Stop `bubble` if it is speaking, otherwise make it the only speaker.
    pub fn toggle(&self, bubble: BubbleId, text: &str) -> Result<PlaybackChange, ChatError> {
        let mut state = self.lock();

        if state.active.map(|a| a.bubble) == Some(bubble) {
            state.active = None;
            drop(state);
            self.synthesizer.cancel_all();
            self.transcript.set_speaking(bubble, false);
            debug!(bubble, "Playback stopped");
            return Ok(PlaybackChange::Stopped);
        }

        if !self.synthesizer.is_supported() {
            drop(state);
            let err = ChatError::UnsupportedCapability(Capability::SpeechSynthesis);
            self.errors.report(&err);
            return Err(err);
        }

        let previous = state.active.take();
        state.generation += 1;
        let generation = state.generation;
        state.active = Some(ActiveSpeech { bubble, generation });
        drop(state);

        if let Some(previous) = previous {
            self.synthesizer.cancel_all();
            self.transcript.set_speaking(previous.bubble, false);
            debug!(bubble = previous.bubble, "Playback superseded");
        }
        self.transcript.set_speaking(bubble, true);
        debug!(bubble, generation, "Playback started");

        let utterance = Utterance {
            text: text.to_string(),
            voice: self.voice.clone(),
            rate: self.rate,
        };
        let arbiter = self.clone();
        tokio::spawn(async move {
            // A toggle may have landed before this task first ran; its
            // cancel could not reach an utterance that was never queued.
            if !arbiter.is_current(generation) {
                debug!(generation, "Utterance superseded before speaking");
                return;
            }
            let outcome = arbiter.synthesizer.speak(utterance).await;
            arbiter.finish(generation, outcome);
        });

        Ok(PlaybackChange::Started)
    }

    /// Stop whatever is speaking. No-op when idle.
    pub fn stop(&self) {
        let stopped = self.lock().active.take();
        if let Some(active) = stopped {
            self.synthesizer.cancel_all();
            self.transcript.set_speaking(active.bubble, false);
            debug!(bubble = active.bubble, "Playback stopped");
        }
    }

    fn finish(&self, generation: u64, outcome: Result<SpeechEnd, String>) {
        let ended = {
            let mut state = self.lock();
            match state.active {
                Some(active) if active.generation == generation => state.active.take(),
                _ => None,
            }
        };

        let Some(active) = ended else {
            debug!(generation, "Ignoring end of superseded utterance");
            return;
        };

        self.transcript.set_speaking(active.bubble, false);
        match outcome {
            Ok(end) => debug!(bubble = active.bubble, ?end, "Playback ended"),
            Err(message) => {
                warn!(bubble = active.bubble, error = %message, "Playback failed");
                self.errors.report(&ChatError::Playback(message));
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock()
            .active
            .is_some_and(|a| a.generation == generation)
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Tests
// =============================================================================
