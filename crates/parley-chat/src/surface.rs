//! Collaborator interfaces consumed by the controller.
//!
//! The page, the speech engines and the completion endpoint are all
//! external. The controller only issues the commands and observes the
//! signals declared here, so any host (a browser binding, a terminal UI,
//! test fakes) can drive it.

use async_trait::async_trait;
use parley_core::{ChatReply, ChatRequest, Role};
use tokio::sync::mpsc;

use crate::error::{ChatError, ErrorKind};

/// Identifier of a rendered message bubble, assigned by the transcript.
pub type BubbleId = u64;

// =============================================================================
// Page
// =============================================================================

/// Icon shown on the combined send/record affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionIcon {
    Send,
    Microphone,
    Stop,
}

/// The single text input and its submit affordance.
pub trait InputControl: Send + Sync {
    fn text(&self) -> String;
    fn set_text(&self, text: &str);
    fn set_placeholder(&self, text: &str);
    fn submit_enabled(&self) -> bool;
    fn set_submit_enabled(&self, enabled: bool);
    fn set_action_icon(&self, icon: ActionIcon);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BubbleKind {
    /// A real turn. Gets a read-aloud affordance.
    Message,
    /// The transient "processing" placeholder. Never part of history.
    Pending,
}

/// Content of one transcript bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub text: String,
    pub kind: BubbleKind,
}

impl Bubble {
    pub fn message(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            kind: BubbleKind::Message,
        }
    }

    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            kind: BubbleKind::Pending,
        }
    }
}

/// The rendered conversation.
pub trait Transcript: Send + Sync {
    fn append(&self, bubble: Bubble) -> BubbleId;
    /// Removing an unknown id is a no-op.
    fn remove(&self, id: BubbleId);
    fn set_speaking(&self, id: BubbleId, speaking: bool);
    fn clear(&self);
}

/// `getString(key)`: user-facing text lookup.
pub trait Localizer: Send + Sync {
    fn get_string(&self, key: &str) -> String;
}

/// Fire-and-forget error notification sink.
pub trait ErrorSink: Send + Sync {
    fn report_error(&self, kind: ErrorKind, detail: Option<String>);

    /// Forward `err` unless it is one of the silently dropped kinds.
    fn report(&self, err: &ChatError) {
        if err.is_reported() {
            self.report_error(err.kind(), err.detail());
        }
    }
}

// =============================================================================
// Completion endpoint
// =============================================================================

/// One `{ text, history }` -> `{ reply }` exchange with the completion endpoint.
///
/// Implementations map transport failures to [`ChatError::Transport`] and
/// non-success responses to [`ChatError::Remote`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;
}

// =============================================================================
// Speech
// =============================================================================

/// What to say and how.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    pub rate: f32,
}

/// How an utterance stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEnd {
    Finished,
    Cancelled,
}

/// Text-to-speech engine.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Speak `utterance`, resolving once speech has ended.
    ///
    /// A `cancel_all` while speaking resolves the future with
    /// `Ok(SpeechEnd::Cancelled)`.
    async fn speak(&self, utterance: Utterance) -> Result<SpeechEnd, String>;

    fn cancel_all(&self);
}

/// Options passed to the recognizer when a capture session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    pub language: String,
    pub interim_results: bool,
}

/// Signals emitted by a running capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Current best transcript of the whole utterance so far.
    Transcript(String),
    Error(String),
    End,
}

/// Speech-to-text engine.
pub trait SpeechRecognizer: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Begin capturing. Events for this session arrive on the returned
    /// channel; a closed channel counts as [`CaptureEvent::End`].
    fn start(&self, options: &CaptureOptions)
        -> Result<mpsc::UnboundedReceiver<CaptureEvent>, String>;

    /// Request a graceful stop. The session still ends through its `End` event.
    fn stop(&self);
}
