//! Speech interaction engine for viva.
//!
//! Two controllers with real state-machine complexity live here:
//!
//! - [`Speaker`] — a chunked, prosody-aware text-to-speech playback queue
//!   with cancellation, intro-once semantics, and autoplay gating.
//! - [`Listener`] — a continuous speech-recognition reconciler that rebuilds
//!   a stable transcript from a platform API that re-delivers overlapping
//!   result sets, and auto-recovers from spurious session termination.
//!
//! Both are written against the trait seam in [`backend`], so the engine is
//! testable without a browser-like host: the original application binds the
//! traits to the platform's synthesis/recognition bridges, test suites bind
//! them to channel-driven mocks.
//!
//! All public operations return immediately; platform work completes later
//! on the tokio scheduler and is reported through [`VoiceEvent`]s. Every
//! controller must therefore be created inside a tokio runtime.

pub mod backend;
pub mod error;
pub mod event;
pub mod gate;
pub mod listener;
pub mod prosody;
pub mod service;
pub mod speaker;
pub mod voices;

// Re-export key types for convenience
pub use backend::{
    RecognitionFault, RecognitionResult, RecognitionSession, RecognizerBackend, SessionConfig,
    SessionEvent, SynthBackend, Utterance, UtteranceOutcome, VoiceDescriptor,
};
pub use error::SpeechError;
pub use event::VoiceEvent;
pub use gate::InteractionGate;
pub use listener::{Listener, ListenerConfig};
pub use prosody::{SpeechChunk, segment};
pub use service::{VoiceConfig, VoiceService};
pub use speaker::{Speaker, SpeakerConfig};
pub use voices::{RetryPolicy, VoiceResolver};
