//! Platform backend seam — engine-agnostic traits for synthesis and recognition.
//!
//! The engine never talks to a concrete platform API. The
//! [`Speaker`](crate::speaker::Speaker) drives a [`SynthBackend`] and the
//! [`Listener`](crate::listener::Listener) drives a [`RecognizerBackend`];
//! hosts supply adapters over whatever the platform provides (a browser
//! bridge in the original application), and test suites supply
//! channel-driven mocks.
//!
//! The platform's callback-based handles are modeled as owned objects whose
//! terminal signals arrive on tokio channels. Callbacks for a given
//! utterance or session are delivered in platform order, but nothing is
//! assumed across *different* utterances/sessions — the controllers guard
//! every mutation with a generation check so a stale callback from a
//! superseded handle is a no-op.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::error::SpeechError;

// ── Synthesis ──────────────────────────────────────────────────────

/// One entry of the platform's synthesis voice catalog.
///
/// Read-only and owned by the platform; the engine holds at most one
/// *selected* entry as a cached copy, re-resolved whenever the catalog
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    /// Display name as reported by the platform (e.g. `"Samantha"`).
    pub name: String,

    /// BCP 47 locale tag (e.g. `"en-US"`).
    pub lang: String,
}

impl VoiceDescriptor {
    /// Convenience constructor used throughout the test suites.
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// A single synthesis request: one chunk of text with its prosody applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    /// Non-empty, trimmed text.
    pub text: String,

    /// Pitch multiplier (1.0 = neutral).
    pub pitch: f32,

    /// Rate multiplier (1.0 = neutral).
    pub rate: f32,

    /// Resolved voice, or `None` to use the platform default.
    pub voice: Option<VoiceDescriptor>,
}

/// Terminal signal for one utterance, mapping the platform's
/// end/error callbacks onto the engine's error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// Playback ran to completion.
    Completed,

    /// Playback was cancelled or interrupted — a normal early termination.
    Canceled,

    /// The platform refused playback (autoplay policy).
    NotAllowed,

    /// Any other platform failure.
    Failed(String),
}

/// Platform speech-synthesis capability.
///
/// The engine keeps exactly one utterance in flight at a time: `speak`
/// resolves when the platform reports the utterance finished, in any of the
/// [`UtteranceOutcome`] ways. `cancel` must resolve an in-flight `speak` as
/// [`UtteranceOutcome::Canceled`] and drop anything the platform has queued.
#[async_trait::async_trait]
pub trait SynthBackend: Send + Sync {
    /// Snapshot of the current voice catalog.
    ///
    /// May be empty: some platforms populate the catalog asynchronously
    /// after reporting ready. Subscribe to [`catalog_changes`] to learn when
    /// it does.
    ///
    /// [`catalog_changes`]: SynthBackend::catalog_changes
    fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Watch channel bumped whenever the voice catalog changes.
    fn catalog_changes(&self) -> watch::Receiver<u64>;

    /// Synthesize and play one utterance, resolving on its terminal signal.
    async fn speak(&self, utterance: Utterance) -> UtteranceOutcome;

    /// Stop the current utterance and drop anything the platform has queued.
    fn cancel(&self);
}

// ── Recognition ────────────────────────────────────────────────────

/// Session parameters for continuous dictation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Recognition locale. Fixed per listener; the engine does not support
    /// switching grammars mid-session.
    pub locale: String,

    /// Keep the session open across utterances.
    pub continuous: bool,

    /// Deliver unconfirmed (interim) results.
    pub interim_results: bool,

    /// Alternatives per result; the engine only ever reads the best one.
    pub max_alternatives: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

/// One entry of a recognition result snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionResult {
    /// Best-guess transcript for this segment.
    pub transcript: String,

    /// Whether the platform will no longer revise this segment.
    ///
    /// Not trustworthy across deliveries: a later snapshot may re-segment or
    /// re-flag earlier entries, which is why consumers rebuild instead of
    /// appending.
    pub is_final: bool,
}

impl RecognitionResult {
    /// An entry the platform has committed to.
    pub fn finalized(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }

    /// An entry still subject to revision.
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }
}

/// Recognizer error signals, split by severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionFault {
    /// The session was aborted — expected during teardown or replacement.
    Aborted,

    /// The recognizer heard nothing — a normal operating condition.
    NoSpeech,

    /// Anything else; the message is surfaced through the error slot.
    Other(String),
}

/// Events delivered by a live recognition session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The complete current result list — a snapshot, never a delta.
    ///
    /// Earlier entries may differ from what a previous delivery carried.
    Results(Vec<RecognitionResult>),

    /// A recognizer error signal.
    Fault(RecognitionFault),

    /// The session terminated, intentionally or not.
    Ended,
}

/// A live handle to one platform recognition session.
pub trait RecognitionSession: Send + Sync {
    /// Start (or restart) recognition on this session.
    fn start(&self) -> Result<(), SpeechError>;

    /// Request a graceful stop; the platform still emits [`SessionEvent::Ended`].
    fn stop(&self);

    /// Tear the session down immediately.
    fn abort(&self);
}

/// Platform speech-recognition capability.
pub trait RecognizerBackend: Send + Sync {
    /// Open a new, not-yet-started session and its event stream.
    fn open_session(
        &self,
        config: &SessionConfig,
    ) -> Result<(Box<dyn RecognitionSession>, mpsc::UnboundedReceiver<SessionEvent>), SpeechError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_session_config_is_continuous_interim_single_best() {
        let config = SessionConfig::default();
        assert_eq!(config.locale, "en-US");
        assert!(config.continuous);
        assert!(config.interim_results);
        assert_eq!(config.max_alternatives, 1);
    }

    #[test]
    fn result_constructors_set_finality() {
        assert!(RecognitionResult::finalized("done").is_final);
        assert!(!RecognitionResult::interim("stil").is_final);
    }
}
