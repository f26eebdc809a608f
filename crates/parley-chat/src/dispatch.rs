//! Message dispatch lifecycle.
//!
//! One `submit` is one full cycle: validate, render the user's turn and a
//! transient "processing" bubble, make exactly one completion call, then
//! reconcile. The input is restored on every exit path by a drop guard, so
//! a failed or timed-out call can never leave submission disabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use parley_core::config::ChatConfig;
use parley_core::{ChatRequest, Role, Turn};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::history::HistoryWindow;
use crate::surface::{
    ActionIcon, Bubble, BubbleId, CompletionClient, ErrorSink, InputControl, Localizer, Transcript,
};

/// Localization key of the placeholder shown while a message is in flight.
const PROCESSING_KEY: &str = "processingMessage";
/// Localization key of the idle input placeholder.
const PLACEHOLDER_KEY: &str = "inputPlaceholder";

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Initial value while `submit` builds the record. A state returned
    /// from `submit` always carries one of the final outcomes below.
    Pending,
    /// The reply was rendered and both turns entered the history window.
    Success,
    /// The reply arrived after the conversation was reset and was dropped.
    Discarded,
    /// The call failed; the error has already been reported.
    Failure(ChatError),
}

/// Record of one `submit` invocation.
#[derive(Debug, Clone)]
pub struct DispatchState {
    pub id: Uuid,
    pub input_text: String,
    pub validated: bool,
    pub optimistic_turns_appended: bool,
    pub outcome: DispatchOutcome,
    pub user_bubble: Option<BubbleId>,
    pub reply_bubble: Option<BubbleId>,
}

impl DispatchState {
    fn new(input_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_text,
            validated: false,
            optimistic_turns_appended: false,
            outcome: DispatchOutcome::Pending,
            user_bubble: None,
            reply_bubble: None,
        }
    }
}

/// Runs the send/reply cycle and owns the history window.
///
/// Cloning yields another handle to the same window and pending flag.
#[derive(Clone)]
pub struct DispatchPipeline {
    client: Arc<dyn CompletionClient>,
    history: Arc<Mutex<HistoryWindow>>,
    input: Arc<dyn InputControl>,
    transcript: Arc<dyn Transcript>,
    localizer: Arc<dyn Localizer>,
    errors: Arc<dyn ErrorSink>,
    pending: Arc<AtomicBool>,
    max_input_chars: usize,
    request_timeout: Duration,
}

impl DispatchPipeline {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        input: Arc<dyn InputControl>,
        transcript: Arc<dyn Transcript>,
        localizer: Arc<dyn Localizer>,
        errors: Arc<dyn ErrorSink>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            client,
            history: Arc::new(Mutex::new(HistoryWindow::new(config.history_capacity))),
            input,
            transcript,
            localizer,
            errors,
            pending: Arc::new(AtomicBool::new(false)),
            max_input_chars: config.max_input_chars,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Whether a dispatch is between its sending state and its cleanup.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Copy of the current history window.
    pub fn history(&self) -> Vec<Turn> {
        self.lock_history().snapshot()
    }

    /// Send `raw` and reconcile the reply.
    ///
    /// Validation failures and a dispatch already in flight return `Err`
    /// without touching the page. Once the sending state has been entered
    /// the call always returns `Ok`, with any failure recorded in the
    /// returned state's outcome.
    pub async fn submit(&self, raw: &str) -> Result<DispatchState, ChatError> {
        let text = raw.trim();
        let mut state = DispatchState::new(text.to_string());

        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if text.chars().count() > self.max_input_chars {
            let err = ChatError::InputTooLong(self.max_input_chars);
            self.errors.report(&err);
            return Err(err);
        }
        state.validated = true;

        if self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Dispatch already pending, ignoring submit");
            return Err(ChatError::DispatchPending);
        }

        let (history, epoch) = {
            let window = self.lock_history();
            (window.snapshot(), window.epoch())
        };

        // Sending state. From here on the guard restores the input.
        let mut guard = SendingGuard::new(self);
        self.input.set_submit_enabled(false);
        self.input
            .set_placeholder(&self.localizer.get_string(PROCESSING_KEY));
        self.input.set_text("");
        self.input.set_action_icon(ActionIcon::Microphone);
        state.user_bubble = Some(
            self.transcript
                .append(Bubble::message(Role::User, text)),
        );
        guard.placeholder = Some(
            self.transcript
                .append(Bubble::pending(self.localizer.get_string(PROCESSING_KEY))),
        );
        state.optimistic_turns_appended = true;

        info!(
            dispatch_id = %state.id,
            chars = text.chars().count(),
            context_turns = history.len(),
            "Dispatching message"
        );

        let request = ChatRequest {
            text: text.to_string(),
            history,
        };
        let result = match tokio::time::timeout(
            self.request_timeout,
            self.client.complete(&request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ChatError::Transport(format!(
                "no reply within {} seconds",
                self.request_timeout.as_secs()
            ))),
        };

        match result {
            Ok(reply) => {
                guard.remove_placeholder();
                let current = {
                    let mut window = self.lock_history();
                    if window.epoch() == epoch {
                        window.append(Turn::user(text));
                        window.append(Turn::assistant(reply.reply.as_str()));
                        true
                    } else {
                        false
                    }
                };
                if current {
                    state.reply_bubble = Some(
                        self.transcript
                            .append(Bubble::message(Role::Assistant, reply.reply)),
                    );
                    state.outcome = DispatchOutcome::Success;
                    info!(dispatch_id = %state.id, "Reply received");
                } else {
                    state.outcome = DispatchOutcome::Discarded;
                    debug!(dispatch_id = %state.id, "Conversation reset while pending, reply dropped");
                }
                drop(guard);
            }
            Err(err) => {
                drop(guard);
                warn!(dispatch_id = %state.id, error = %err, "Dispatch failed");
                self.errors.report(&err);
                state.outcome = DispatchOutcome::Failure(err);
            }
        }

        Ok(state)
    }

    /// Start a new conversation: empty the window and the transcript.
    ///
    /// A dispatch still in flight keeps its cleanup but will neither record
    /// nor render its reply.
    pub fn clear_conversation(&self) {
        self.lock_history().clear();
        self.transcript.clear();
        info!("Conversation cleared");
    }

    fn lock_history(&self) -> MutexGuard<'_, HistoryWindow> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Restores the idle input state when a dispatch leaves its sending state,
/// whichever way it leaves.
struct SendingGuard<'a> {
    pipeline: &'a DispatchPipeline,
    placeholder: Option<BubbleId>,
}

impl<'a> SendingGuard<'a> {
    fn new(pipeline: &'a DispatchPipeline) -> Self {
        Self {
            pipeline,
            placeholder: None,
        }
    }

    fn remove_placeholder(&mut self) {
        if let Some(id) = self.placeholder.take() {
            self.pipeline.transcript.remove(id);
        }
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.remove_placeholder();
        let pipeline = self.pipeline;
        pipeline
            .input
            .set_placeholder(&pipeline.localizer.get_string(PLACEHOLDER_KEY));
        pipeline.input.set_submit_enabled(true);
        pipeline.pending.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Tests
// =============================================================================
