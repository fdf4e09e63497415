//! Port definitions — trait boundaries between the engine and its adapters.

mod event_emitter;
mod voice;

pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use voice::{VoicePort, VoiceStatusDto};
