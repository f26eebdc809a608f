//! Top-level routing of user actions.
//!
//! The send affordance doubles as the microphone button: with text in the
//! input it submits, with an empty input it toggles voice capture.

use std::sync::Arc;

use tracing::debug;

use crate::capture::{CaptureArbiter, CaptureStart};
use crate::dispatch::{DispatchPipeline, DispatchState};
use crate::error::ChatError;
use crate::playback::{PlaybackArbiter, PlaybackChange};
use crate::surface::{ActionIcon, BubbleId, InputControl};

/// What the user did to request the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Click,
    EnterKey,
}

/// What `handle_action` ended up doing.
#[derive(Debug, Clone)]
pub enum RoutedAction {
    Dispatched(DispatchState),
    /// The chosen component refused; reportable errors were already reported.
    Rejected(ChatError),
    CaptureStarted,
    CaptureStopped,
    /// Submission is disabled, or nothing changed.
    Ignored,
}

/// Wires the input, the dispatch pipeline and both arbiters together.
#[derive(Clone)]
pub struct ModeRouter {
    pipeline: DispatchPipeline,
    capture: CaptureArbiter,
    playback: PlaybackArbiter,
    input: Arc<dyn InputControl>,
}

impl ModeRouter {
    pub fn new(
        pipeline: DispatchPipeline,
        capture: CaptureArbiter,
        playback: PlaybackArbiter,
        input: Arc<dyn InputControl>,
    ) -> Self {
        Self {
            pipeline,
            capture,
            playback,
            input,
        }
    }

    pub fn pipeline(&self) -> &DispatchPipeline {
        &self.pipeline
    }

    pub fn capture(&self) -> &CaptureArbiter {
        &self.capture
    }

    pub fn playback(&self) -> &PlaybackArbiter {
        &self.playback
    }

    /// Entry point for the send affordance and the Enter key.
    pub async fn handle_action(&self, trigger: Trigger) -> RoutedAction {
        // A pending dispatch disables submission, which serializes sends.
        if !self.input.submit_enabled() {
            debug!(?trigger, "Submission disabled, ignoring action");
            return RoutedAction::Ignored;
        }

        let text = self.input.text();
        if !text.trim().is_empty() {
            // The dispatch owns the input from here; a live capture must not
            // keep overwriting it.
            if self.capture.abandon() {
                debug!("Capture abandoned in favour of dispatch");
            }
            return match self.pipeline.submit(&text).await {
                Ok(state) => RoutedAction::Dispatched(state),
                Err(err) => RoutedAction::Rejected(err),
            };
        }

        if self.capture.is_active() {
            self.capture.stop();
            return RoutedAction::CaptureStopped;
        }

        match self.capture.start(Arc::clone(&self.input)) {
            Ok(CaptureStart::Started) => RoutedAction::CaptureStarted,
            Ok(CaptureStart::AlreadyActive) => RoutedAction::Ignored,
            Err(err) => RoutedAction::Rejected(err),
        }
    }

    /// Keep the action icon in step with what the input holds.
    pub fn on_input_changed(&self) {
        let icon = if self.capture.is_active() {
            ActionIcon::Stop
        } else if self.input.text().trim().is_empty() {
            ActionIcon::Microphone
        } else {
            ActionIcon::Send
        };
        self.input.set_action_icon(icon);
    }

    /// Read-aloud affordance of a bubble was pressed.
    pub fn toggle_playback(&self, bubble: BubbleId, text: &str) -> Result<PlaybackChange, ChatError> {
        self.playback.toggle(bubble, text)
    }

    /// Silence any read-aloud and start a new conversation.
    pub fn clear_conversation(&self) {
        self.playback.stop();
        self.pipeline.clear_conversation();
    }
}

// =============================================================================
// Tests
// =============================================================================
