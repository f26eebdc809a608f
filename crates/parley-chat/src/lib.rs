//! Conversational interaction controller for Parley.
//!
//! Arbitrates between typing and voice capture, keeps at most one reply
//! being read aloud, runs the send/reply lifecycle for each message, and
//! maintains the bounded history window sent as context with each request.
//! Everything the controller touches outside its own state (the page, the
//! speech engines, the completion endpoint) is reached through the traits
//! in [`surface`].

pub mod capture;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod locale;
pub mod lookup;
pub mod notify;
pub mod playback;
pub mod router;
pub mod surface;

#[cfg(test)]
pub(crate) mod test_support;

pub use capture::{CaptureArbiter, CaptureStart};
pub use client::HttpCompletionClient;
pub use dispatch::{DispatchOutcome, DispatchPipeline, DispatchState};
pub use error::{Capability, ChatError, ErrorKind};
pub use history::HistoryWindow;
pub use locale::ResourceTable;
pub use lookup::DictionaryLookup;
pub use notify::{NotificationSurface, ToastNotifier};
pub use playback::{PlaybackArbiter, PlaybackChange};
pub use router::{ModeRouter, RoutedAction, Trigger};
pub use surface::{
    ActionIcon, Bubble, BubbleId, BubbleKind, CaptureEvent, CaptureOptions, CompletionClient,
    ErrorSink, InputControl, Localizer, SpeechEnd, SpeechRecognizer, SpeechSynthesizer,
    Transcript, Utterance,
};
