//! In-memory fakes for the collaborator traits, shared by unit tests.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_core::{ChatReply, ChatRequest, Role};
use tokio::sync::{mpsc, oneshot, Notify};

use crate::error::{ChatError, ErrorKind};
use crate::surface::{
    ActionIcon, Bubble, BubbleId, BubbleKind, CaptureEvent, CaptureOptions, CompletionClient,
    ErrorSink, InputControl, Localizer, SpeechEnd, SpeechRecognizer, SpeechSynthesizer,
    Transcript, Utterance,
};

/// Let spawned tasks run until they block again.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Page
// =============================================================================

struct InputState {
    text: String,
    placeholder: String,
    submit_enabled: bool,
    icon: ActionIcon,
}

pub(crate) struct FakeInput {
    state: Mutex<InputState>,
}

impl Default for FakeInput {
    fn default() -> Self {
        Self {
            state: Mutex::new(InputState {
                text: String::new(),
                placeholder: "inputPlaceholder".to_string(),
                submit_enabled: true,
                icon: ActionIcon::Microphone,
            }),
        }
    }
}

impl FakeInput {
    pub(crate) fn placeholder(&self) -> String {
        self.state.lock().unwrap().placeholder.clone()
    }

    pub(crate) fn icon(&self) -> ActionIcon {
        self.state.lock().unwrap().icon
    }
}

impl InputControl for FakeInput {
    fn text(&self) -> String {
        self.state.lock().unwrap().text.clone()
    }

    fn set_text(&self, text: &str) {
        self.state.lock().unwrap().text = text.to_string();
    }

    fn set_placeholder(&self, text: &str) {
        self.state.lock().unwrap().placeholder = text.to_string();
    }

    fn submit_enabled(&self) -> bool {
        self.state.lock().unwrap().submit_enabled
    }

    fn set_submit_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().submit_enabled = enabled;
    }

    fn set_action_icon(&self, icon: ActionIcon) {
        self.state.lock().unwrap().icon = icon;
    }
}

#[derive(Default)]
struct TranscriptState {
    next_id: BubbleId,
    bubbles: Vec<(BubbleId, Bubble)>,
    speaking: BTreeSet<BubbleId>,
}

#[derive(Default)]
pub(crate) struct FakeTranscript {
    state: Mutex<TranscriptState>,
}

impl FakeTranscript {
    pub(crate) fn bubbles(&self) -> Vec<Bubble> {
        let state = self.state.lock().unwrap();
        state.bubbles.iter().map(|(_, b)| b.clone()).collect()
    }

    /// Rendered real turns, in order.
    pub(crate) fn messages(&self) -> Vec<(Role, String)> {
        self.bubbles()
            .into_iter()
            .filter(|b| b.kind == BubbleKind::Message)
            .map(|b| (b.role, b.text))
            .collect()
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.bubbles()
            .iter()
            .filter(|b| b.kind == BubbleKind::Pending)
            .count()
    }

    pub(crate) fn speaking(&self) -> Vec<BubbleId> {
        self.state.lock().unwrap().speaking.iter().copied().collect()
    }
}

impl Transcript for FakeTranscript {
    fn append(&self, bubble: Bubble) -> BubbleId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.bubbles.push((id, bubble));
        id
    }

    fn remove(&self, id: BubbleId) {
        let mut state = self.state.lock().unwrap();
        state.bubbles.retain(|(bid, _)| *bid != id);
        state.speaking.remove(&id);
    }

    fn set_speaking(&self, id: BubbleId, speaking: bool) {
        let mut state = self.state.lock().unwrap();
        if speaking {
            state.speaking.insert(id);
        } else {
            state.speaking.remove(&id);
        }
    }

    fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.bubbles.clear();
        state.speaking.clear();
    }
}

/// Returns every key unchanged.
pub(crate) struct KeyLocalizer;

impl Localizer for KeyLocalizer {
    fn get_string(&self, key: &str) -> String {
        key.to_string()
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    reports: Mutex<Vec<(ErrorKind, Option<String>)>>,
}

impl RecordingSink {
    pub(crate) fn reports(&self) -> Vec<(ErrorKind, Option<String>)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorSink for RecordingSink {
    fn report_error(&self, kind: ErrorKind, detail: Option<String>) {
        self.reports.lock().unwrap().push((kind, detail));
    }
}

// =============================================================================
// Completion endpoint
// =============================================================================

/// Answers from a queue of scripted results, optionally holding each call
/// until the test releases it.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    requests: Mutex<Vec<ChatRequest>>,
    responses: Mutex<VecDeque<Result<ChatReply, ChatError>>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub(crate) fn replying(replies: &[&str]) -> Self {
        let client = Self::default();
        for reply in replies {
            client.push(Ok(ChatReply {
                reply: reply.to_string(),
            }));
        }
        client
    }

    pub(crate) fn failing(err: ChatError) -> Self {
        let client = Self::default();
        client.push(Err(err));
        client
    }

    /// Hold every call until `gate.notify_one()`.
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn push(&self, response: Result<ChatReply, ChatError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Transport("no scripted response".to_string())))
    }
}

/// Never answers.
pub(crate) struct HangingClient;

#[async_trait]
impl CompletionClient for HangingClient {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatReply, ChatError> {
        std::future::pending().await
    }
}

// =============================================================================
// Speech
// =============================================================================

type SpeechResult = Result<SpeechEnd, String>;

pub(crate) struct FakeSynthesizer {
    supported: bool,
    pending: Mutex<Vec<oneshot::Sender<SpeechResult>>>,
    spoken: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
}

impl FakeSynthesizer {
    pub(crate) fn supported() -> Self {
        Self {
            supported: true,
            pending: Mutex::new(Vec::new()),
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::supported()
        }
    }

    pub(crate) fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().unwrap().clone()
    }

    pub(crate) fn spoken_texts(&self) -> Vec<String> {
        self.spoken().into_iter().map(|u| u.text).collect()
    }

    /// Utterances queued and not yet ended.
    pub(crate) fn live_utterances(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub(crate) fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Let the most recent utterance finish naturally.
    pub(crate) fn finish_current(&self) {
        if let Some(tx) = self.pending.lock().unwrap().pop() {
            let _ = tx.send(Ok(SpeechEnd::Finished));
        }
    }

    pub(crate) fn fail_current(&self, message: &str) {
        if let Some(tx) = self.pending.lock().unwrap().pop() {
            let _ = tx.send(Err(message.to_string()));
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn speak(&self, utterance: Utterance) -> Result<SpeechEnd, String> {
        let (tx, rx) = oneshot::channel();
        self.spoken.lock().unwrap().push(utterance);
        self.pending.lock().unwrap().push(tx);
        rx.await.unwrap_or(Ok(SpeechEnd::Cancelled))
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        for tx in self.pending.lock().unwrap().drain(..) {
            let _ = tx.send(Ok(SpeechEnd::Cancelled));
        }
    }
}

pub(crate) struct FakeRecognizer {
    supported: bool,
    end_on_stop: bool,
    start_error: Option<String>,
    sessions: Mutex<Vec<mpsc::UnboundedSender<CaptureEvent>>>,
    last_options: Mutex<Option<CaptureOptions>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeRecognizer {
    pub(crate) fn supported() -> Self {
        Self {
            supported: true,
            end_on_stop: true,
            start_error: None,
            sessions: Mutex::new(Vec::new()),
            last_options: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::supported()
        }
    }

    /// `stop` no longer emits `End`; the test sends it explicitly.
    pub(crate) fn with_deferred_end(mut self) -> Self {
        self.end_on_stop = false;
        self
    }

    pub(crate) fn failing_start(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    /// Deliver an event to the most recent session.
    pub(crate) fn emit(&self, event: CaptureEvent) {
        if let Some(tx) = self.sessions.lock().unwrap().last() {
            let _ = tx.send(event);
        }
    }

    /// Drop the most recent session's sender without an `End`.
    pub(crate) fn hang_up(&self) {
        self.sessions.lock().unwrap().pop();
    }

    /// Sessions whose observer is still listening.
    pub(crate) fn live_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub(crate) fn last_options(&self) -> Option<CaptureOptions> {
        self.last_options.lock().unwrap().clone()
    }

    pub(crate) fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn start(
        &self,
        options: &CaptureOptions,
    ) -> Result<mpsc::UnboundedReceiver<CaptureEvent>, String> {
        if let Some(message) = &self.start_error {
            return Err(message.clone());
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.lock().unwrap().push(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.end_on_stop {
            self.emit(CaptureEvent::End);
        }
    }
}
