//! Recognition reconciler — the STT half of the engine.
//!
//! Owns a single live recognition session and rebuilds a stable transcript
//! from a platform API that re-delivers overlapping result sets and silently
//! terminates sessions:
//!
//! ```text
//!   Idle ─► Listening ─► (Idle | Listening)
//!              ▲                │
//!              └── auto-restart ┘  (unless the stop was intentional)
//! ```
//!
//! The transcript is **rebuilt from the complete result snapshot on every
//! notification** — never patched incrementally. The platform may revise the
//! `final` flag on earlier entries or re-segment results between
//! notifications, so appending deltas would duplicate or corrupt the text.
//! This is a correctness requirement, not an optimization target.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::backend::{
    RecognitionFault, RecognitionResult, RecognitionSession, RecognizerBackend, SessionConfig,
    SessionEvent,
};
use crate::error::SpeechError;
use crate::event::{self, VoiceEvent, VoiceEventSender};

/// Configuration for the recognition reconciler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerConfig {
    /// Session parameters used for every session this listener opens.
    pub session: SessionConfig,
}

/// The recognition reconciler.
///
/// All operations return immediately; session events are pumped on a
/// spawned task. Create inside a tokio runtime.
pub struct Listener {
    backend: Option<Arc<dyn RecognizerBackend>>,
    config: ListenerConfig,
    shared: Arc<ListenerShared>,
    session: std::sync::Mutex<Option<Arc<dyn RecognitionSession>>>,
    event_tx: VoiceEventSender,
}

#[derive(Debug, Default)]
struct TranscriptState {
    /// Confirmed speech, extended as results finalize.
    finalized: String,
    /// `finalized` plus the current unconfirmed tail, trimmed.
    display: String,
}

struct ListenerShared {
    is_listening: AtomicBool,
    intentional_stop: AtomicBool,
    generation: AtomicU64,
    transcript: std::sync::Mutex<TranscriptState>,
    error: std::sync::Mutex<Option<String>>,
}

impl ListenerShared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn set_listening(&self, listening: bool, event_tx: &VoiceEventSender) {
        if self.is_listening.swap(listening, Ordering::SeqCst) != listening {
            event::emit(event_tx, VoiceEvent::ListeningChanged(listening));
        }
    }

    fn record_error(&self, error: &SpeechError) {
        *self.error.lock().unwrap() = Some(error.to_string());
    }

    /// Discard and fully rebuild the transcript from the complete current
    /// result list. Returns the new display text and whether it has no
    /// unconfirmed tail.
    fn rebuild(&self, results: &[RecognitionResult]) -> (String, bool) {
        let mut finalized = String::new();
        let mut interim = String::new();
        for result in results {
            if result.is_final {
                finalized.push_str(&result.transcript);
            } else {
                interim.push_str(&result.transcript);
            }
        }
        let display = format!("{finalized}{interim}").trim().to_string();
        let is_final = interim.is_empty() && !display.is_empty();

        let mut state = self.transcript.lock().unwrap();
        state.finalized = finalized;
        state.display.clone_from(&display);
        (display, is_final)
    }
}

impl Listener {
    /// Create a reconciler over the platform recognition capability.
    ///
    /// `backend: None` models a platform without recognition support:
    /// [`is_supported`] reports `false` and [`start_listening`] records an
    /// error instead of starting.
    ///
    /// [`is_supported`]: Listener::is_supported
    /// [`start_listening`]: Listener::start_listening
    pub fn new(
        backend: Option<Arc<dyn RecognizerBackend>>,
        config: ListenerConfig,
        event_tx: VoiceEventSender,
    ) -> Self {
        Self {
            backend,
            config,
            shared: Arc::new(ListenerShared {
                is_listening: AtomicBool::new(false),
                intentional_stop: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                transcript: std::sync::Mutex::new(TranscriptState::default()),
                error: std::sync::Mutex::new(None),
            }),
            session: std::sync::Mutex::new(None),
            event_tx,
        }
    }

    /// Whether the platform exposes speech recognition at all.
    pub fn is_supported(&self) -> bool {
        self.backend.is_some()
    }

    /// Whether a recognition session is live.
    pub fn is_listening(&self) -> bool {
        self.shared.is_listening.load(Ordering::SeqCst)
    }

    /// Current display transcript.
    pub fn transcript(&self) -> String {
        self.shared.transcript.lock().unwrap().display.clone()
    }

    /// Last non-benign recognition error, if any.
    pub fn error(&self) -> Option<String> {
        self.shared.error.lock().unwrap().clone()
    }

    /// Start a continuous recognition session, superseding any existing one.
    pub fn start_listening(&self) {
        let Some(backend) = &self.backend else {
            let error = SpeechError::Unsupported;
            tracing::warn!(error = %error, "start_listening ignored");
            self.shared.record_error(&error);
            return;
        };

        // Tear down any existing session; its pump sees a stale generation
        // and exits without touching state.
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(old) = self.session.lock().unwrap().take() {
            old.abort();
        }

        self.shared.intentional_stop.store(false, Ordering::SeqCst);
        *self.shared.error.lock().unwrap() = None;
        *self.shared.transcript.lock().unwrap() = TranscriptState::default();

        let (session, events) = match backend.open_session(&self.config.session) {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(error = %error, "failed to open recognition session");
                self.shared.record_error(&error);
                return;
            }
        };
        let session: Arc<dyn RecognitionSession> = Arc::from(session);
        if let Err(error) = session.start() {
            tracing::warn!(error = %error, "failed to start recognition session");
            self.shared.record_error(&error);
            return;
        }

        *self.session.lock().unwrap() = Some(Arc::clone(&session));
        self.shared.set_listening(true, &self.event_tx);
        tracing::debug!(locale = %self.config.session.locale, "recognition session started");
        self.spawn_pump(generation, session, events);
    }

    /// Intentionally stop the live session.
    ///
    /// The intentional-stop flag is set *before* the platform stop so the
    /// resulting end event does not trigger an auto-restart.
    pub fn stop_listening(&self) {
        self.shared.intentional_stop.store(true, Ordering::SeqCst);
        if let Some(session) = self.session.lock().unwrap().as_ref() {
            session.stop();
        }
        // Defensive: the platform end event also clears this.
        self.shared.set_listening(false, &self.event_tx);
    }

    /// Reset the transcript without affecting the listening state.
    pub fn clear_transcript(&self) {
        *self.shared.transcript.lock().unwrap() = TranscriptState::default();
    }

    fn spawn_pump(
        &self,
        generation: u64,
        session: Arc<dyn RecognitionSession>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            while let Some(session_event) = events.recv().await {
                if !shared.is_current(generation) {
                    // Stale callback from an already-replaced session.
                    break;
                }
                match session_event {
                    SessionEvent::Results(results) => {
                        let (text, is_final) = shared.rebuild(&results);
                        event::emit(&event_tx, VoiceEvent::Transcript { text, is_final });
                    }
                    SessionEvent::Fault(
                        RecognitionFault::Aborted | RecognitionFault::NoSpeech,
                    ) => {
                        tracing::debug!("benign recognizer fault ignored");
                    }
                    SessionEvent::Fault(RecognitionFault::Other(message)) => {
                        let error = SpeechError::Recognition(message);
                        tracing::warn!(error = %error, "recognizer error");
                        shared.record_error(&error);
                        shared.set_listening(false, &event_tx);
                    }
                    SessionEvent::Ended => {
                        shared.set_listening(false, &event_tx);
                        let intentional = shared.intentional_stop.load(Ordering::SeqCst);
                        if !intentional && shared.is_current(generation) {
                            // Spurious termination (network hiccup, platform
                            // silence timeout): one restart attempt of the
                            // same session object.
                            match session.start() {
                                Ok(()) => {
                                    tracing::debug!("recognition restarted after unexpected end");
                                    shared.set_listening(true, &event_tx);
                                }
                                Err(error) => {
                                    tracing::debug!(error = %error, "restart failed; session stays stopped");
                                }
                            }
                        }
                    }
                }
            }
        });
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.shared.intentional_stop.store(true, Ordering::SeqCst);
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(session) = self.session.lock().unwrap().take() {
            session.abort();
        }
    }
}
