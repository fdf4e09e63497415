//! Playback queue controller — the TTS half of the engine.
//!
//! Owns an ordered queue of prosody chunks and drives one-at-a-time
//! sequential playback:
//!
//! ```text
//!   speak ─► cancel in-flight ─► segment ─► drain (chunk, pause, chunk, …)
//!                                              │
//!   cancel ───────────────────────────────────►┘ (queue emptied, state reset)
//! ```
//!
//! `speak` calls are linearizable: a new call fully supersedes any prior
//! one. Supersession uses a generation counter — every await point in the
//! drain task re-checks that its generation is still current, so a stale
//! task's late callbacks mutate nothing after a newer `speak` or `cancel`
//! has taken over.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::backend::{SynthBackend, Utterance, UtteranceOutcome};
use crate::error::SpeechError;
use crate::event::{self, VoiceEvent, VoiceEventSender};
use crate::gate::InteractionGate;
use crate::prosody;
use crate::voices::{RetryPolicy, VoiceResolver};

/// Configuration for the playback queue controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerConfig {
    /// Whether voice mode starts enabled.
    pub voice_mode_enabled: bool,

    /// Voice-catalog resolution retry policy.
    pub retry: RetryPolicy,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            voice_mode_enabled: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// The playback queue controller.
///
/// All operations return immediately; draining happens on a spawned task.
/// Create inside a tokio runtime.
pub struct Speaker {
    backend: Option<Arc<dyn SynthBackend>>,
    resolver: Option<VoiceResolver>,
    gate: InteractionGate,
    shared: Arc<SpeakerShared>,
    event_tx: VoiceEventSender,
}

struct SpeakerShared {
    is_speaking: AtomicBool,
    voice_mode: AtomicBool,
    generation: AtomicU64,
    played_intros: std::sync::Mutex<HashSet<String>>,
}

impl SpeakerShared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Reset the speaking flag and announce the end of playback.
    fn finish(&self, event_tx: &VoiceEventSender) {
        if self.is_speaking.swap(false, Ordering::SeqCst) {
            event::emit(event_tx, VoiceEvent::SpeakingFinished);
        }
    }
}

impl Speaker {
    /// Create a controller over the platform synthesis capability.
    ///
    /// `backend: None` models a platform without synthesis support: every
    /// operation becomes a permanent no-op and [`has_voice_support`] reports
    /// `false`.
    ///
    /// [`has_voice_support`]: Speaker::has_voice_support
    pub fn new(
        backend: Option<Arc<dyn SynthBackend>>,
        gate: InteractionGate,
        config: SpeakerConfig,
        event_tx: VoiceEventSender,
    ) -> Self {
        let resolver = backend
            .as_ref()
            .map(|b| VoiceResolver::spawn(Arc::clone(b), config.retry.clone()));
        Self {
            backend,
            resolver,
            gate,
            shared: Arc::new(SpeakerShared {
                is_speaking: AtomicBool::new(false),
                voice_mode: AtomicBool::new(config.voice_mode_enabled),
                generation: AtomicU64::new(0),
                played_intros: std::sync::Mutex::new(HashSet::new()),
            }),
            event_tx,
        }
    }

    /// Whether the platform exposes speech synthesis at all.
    pub fn has_voice_support(&self) -> bool {
        self.backend.is_some()
    }

    /// Whether a playback queue is currently draining.
    pub fn is_speaking(&self) -> bool {
        self.shared.is_speaking.load(Ordering::SeqCst)
    }

    /// Whether voice mode is enabled.
    pub fn voice_mode(&self) -> bool {
        self.shared.voice_mode.load(Ordering::SeqCst)
    }

    /// Enable or disable voice mode. Disabling silences any queue in flight.
    pub fn set_voice_mode(&self, enabled: bool) {
        self.shared.voice_mode.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.cancel();
        }
    }

    /// The synthesis voice playback will use, if one has been resolved.
    pub fn selected_voice(&self) -> Option<crate::backend::VoiceDescriptor> {
        self.resolver.as_ref().and_then(VoiceResolver::selected)
    }

    /// Queue text for spoken playback, superseding any queue in flight.
    ///
    /// No-op (leaving any current playback untouched) when the platform has
    /// no synthesis support, voice mode is disabled, the user has not yet
    /// interacted with the page, or normalization yields empty text.
    pub fn speak(&self, text: &str) {
        let Some(backend) = &self.backend else {
            tracing::debug!("speak ignored: no synthesis support");
            return;
        };
        if !self.voice_mode() {
            tracing::debug!("speak ignored: voice mode disabled");
            return;
        }
        if !self.gate.has_interaction() {
            tracing::debug!("speak ignored: no user interaction yet");
            return;
        }
        let chunks = prosody::segment(text);
        if chunks.is_empty() {
            return;
        }

        // Supersede whatever is in flight before installing the new queue.
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        backend.cancel();

        tracing::debug!(chunks = chunks.len(), "starting playback queue");
        self.spawn_drain(Arc::clone(backend), generation, chunks);
    }

    /// Speak a one-time introduction at most once per session.
    pub fn play_intro(&self, key: &str, text: &str) {
        {
            let mut played = self.shared.played_intros.lock().unwrap();
            // Marked before speaking so a failure mid-speech cannot replay it.
            if !played.insert(key.to_string()) {
                tracing::debug!(key, "intro already played this session");
                return;
            }
        }
        self.speak(text);
    }

    /// Stop any in-progress playback and empty the queue. Idempotent.
    pub fn cancel(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(backend) = &self.backend {
            backend.cancel();
        }
        self.shared.finish(&self.event_tx);
    }

    fn spawn_drain(
        &self,
        backend: Arc<dyn SynthBackend>,
        generation: u64,
        chunks: Vec<prosody::SpeechChunk>,
    ) {
        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();
        let voice = self.selected_voice();

        tokio::spawn(async move {
            let total = chunks.len();
            for (index, chunk) in chunks.into_iter().enumerate() {
                if !shared.is_current(generation) {
                    return;
                }
                if index == 0 {
                    shared.is_speaking.store(true, Ordering::SeqCst);
                    event::emit(&event_tx, VoiceEvent::SpeakingStarted);
                }

                let prosody::SpeechChunk {
                    text,
                    pause,
                    pitch,
                    rate,
                } = chunk;
                let outcome = backend
                    .speak(Utterance {
                        text,
                        pitch,
                        rate,
                        voice: voice.clone(),
                    })
                    .await;
                if !shared.is_current(generation) {
                    // Superseded mid-utterance; the new owner resets state.
                    return;
                }

                match outcome {
                    UtteranceOutcome::Completed => {}
                    UtteranceOutcome::Canceled => {
                        // Normal early termination.
                        shared.finish(&event_tx);
                        return;
                    }
                    UtteranceOutcome::NotAllowed => {
                        tracing::debug!("platform refused playback (autoplay policy); dropping queue");
                        shared.finish(&event_tx);
                        return;
                    }
                    UtteranceOutcome::Failed(message) => {
                        let error = SpeechError::Synthesis(message);
                        tracing::warn!(error = %error, chunk = index + 1, total, "utterance failed");
                        event::emit(&event_tx, VoiceEvent::Error(error.to_string()));
                        shared.finish(&event_tx);
                        return;
                    }
                }

                let more_remain = index + 1 < total;
                if more_remain && !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
            }

            if shared.is_current(generation) {
                shared.finish(&event_tx);
            }
        });
    }
}
