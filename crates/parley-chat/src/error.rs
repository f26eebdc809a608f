//! Error types for the conversational controller.

use std::fmt;

/// A speech capability the page may or may not provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    VoiceCapture,
    SpeechSynthesis,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::VoiceCapture => write!(f, "voice capture"),
            Capability::SpeechSynthesis => write!(f, "speech synthesis"),
        }
    }
}

/// Errors from the chat controller.
///
/// None of these are fatal: each is caught at the boundary of the
/// operation that produced it and, unless [`ChatError::is_reported`] says
/// otherwise, handed to the error sink.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("message exceeds maximum length of {0} characters")]
    InputTooLong(usize),
    #[error("{0} is not supported in this environment")]
    UnsupportedCapability(Capability),
    #[error("voice capture error: {0}")]
    Capture(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote error ({status}): {detail}")]
    Remote { status: u16, detail: String },
    #[error("a message is already being sent")]
    DispatchPending,
}

/// Discriminant of [`ChatError`], as seen by the error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EmptyInput,
    InputTooLong,
    UnsupportedCapability(Capability),
    CaptureError,
    PlaybackError,
    TransportError,
    RemoteError,
    DispatchPending,
}

impl ErrorKind {
    /// Localization key for the user-facing message of this kind.
    ///
    /// Remote failures share the send-failure message; the server's own
    /// error text follows it as the detail.
    pub fn resource_key(&self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "errorEmptyMessage",
            ErrorKind::InputTooLong => "errorMessageLength",
            ErrorKind::UnsupportedCapability(Capability::VoiceCapture) => "errorVoiceNotSupported",
            ErrorKind::UnsupportedCapability(Capability::SpeechSynthesis) => "errorWebSpeech",
            ErrorKind::CaptureError => "errorVoiceRecording",
            ErrorKind::PlaybackError => "errorPlayAudio",
            ErrorKind::TransportError => "errorSendingMessage",
            ErrorKind::RemoteError => "errorSendingMessage",
            ErrorKind::DispatchPending => "errorSendPending",
        }
    }
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::EmptyInput => ErrorKind::EmptyInput,
            ChatError::InputTooLong(_) => ErrorKind::InputTooLong,
            ChatError::UnsupportedCapability(capability) => {
                ErrorKind::UnsupportedCapability(*capability)
            }
            ChatError::Capture(_) => ErrorKind::CaptureError,
            ChatError::Playback(_) => ErrorKind::PlaybackError,
            ChatError::Transport(_) => ErrorKind::TransportError,
            ChatError::Remote { .. } => ErrorKind::RemoteError,
            ChatError::DispatchPending => ErrorKind::DispatchPending,
        }
    }

    /// Extra text shown after the localized message, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ChatError::EmptyInput
            | ChatError::DispatchPending
            | ChatError::UnsupportedCapability(_) => None,
            ChatError::InputTooLong(limit) => Some(limit.to_string()),
            ChatError::Capture(msg)
            | ChatError::Playback(msg)
            | ChatError::Transport(msg)
            | ChatError::Remote { detail: msg, .. } => {
                (!msg.is_empty()).then(|| msg.clone())
            }
        }
    }

    /// Whether the user should see a notification for this error.
    ///
    /// Empty submissions and submissions while a send is pending are
    /// dropped silently.
    pub fn is_reported(&self) -> bool {
        !matches!(self, ChatError::EmptyInput | ChatError::DispatchPending)
    }
}
