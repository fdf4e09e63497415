//! `VoiceService` — the adapter that implements [`VoicePort`].
//!
//! This module is the single place where engine-native types are converted
//! to the transport-agnostic DTOs defined in `viva-core`. Nothing outside
//! this file should need to import `Speaker` or `Listener` to drive the
//! engine from a UI adapter.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use viva_core::events::AppEvent;
use viva_core::ports::{AppEventEmitter, VoicePort, VoiceStatusDto};

use crate::backend::{RecognizerBackend, SynthBackend};
use crate::event::VoiceEvent;
use crate::gate::InteractionGate;
use crate::listener::{Listener, ListenerConfig};
use crate::speaker::{Speaker, SpeakerConfig};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Playback queue controller settings.
    pub speaker: SpeakerConfig,

    /// Recognition reconciler settings.
    pub listener: ListenerConfig,
}

/// Implements [`VoicePort`] over one [`Speaker`] and one [`Listener`].
pub struct VoiceService {
    speaker: Speaker,
    listener: Listener,
    gate: InteractionGate,
}

impl VoiceService {
    /// Assemble the engine over the platform capabilities the host managed
    /// to bind (`None` models an unsupported capability) and bridge engine
    /// events onto the application bus.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        synth: Option<Arc<dyn SynthBackend>>,
        recognizer: Option<Arc<dyn RecognizerBackend>>,
        config: VoiceConfig,
        emitter: Arc<dyn AppEventEmitter>,
    ) -> Self {
        let (event_tx, event_rx) = crate::event::channel();
        let gate = InteractionGate::new();
        let speaker = Speaker::new(synth, gate.clone(), config.speaker, event_tx.clone());
        let listener = Listener::new(recognizer, config.listener, event_tx);
        spawn_event_bridge(event_rx, emitter);
        Self {
            speaker,
            listener,
            gate,
        }
    }
}

impl VoicePort for VoiceService {
    fn status(&self) -> VoiceStatusDto {
        VoiceStatusDto {
            has_voice_support: self.speaker.has_voice_support(),
            is_speaking: self.speaker.is_speaking(),
            voice_mode_enabled: self.speaker.voice_mode(),
            has_user_interaction: self.gate.has_interaction(),
            recognition_supported: self.listener.is_supported(),
            is_listening: self.listener.is_listening(),
            transcript: self.listener.transcript(),
            error: self.listener.error(),
        }
    }

    fn speak(&self, text: &str) {
        self.speaker.speak(text);
    }

    fn play_intro(&self, key: &str, text: &str) {
        self.speaker.play_intro(key, text);
    }

    fn cancel_speech(&self) {
        self.speaker.cancel();
    }

    fn set_voice_mode(&self, enabled: bool) {
        self.speaker.set_voice_mode(enabled);
    }

    fn mark_interaction(&self) {
        self.gate.mark_interaction();
    }

    fn start_listening(&self) {
        self.listener.start_listening();
    }

    fn stop_listening(&self) {
        self.listener.stop_listening();
    }

    fn clear_transcript(&self) {
        self.listener.clear_transcript();
    }
}

/// Bridge [`VoiceEvent`] → [`AppEvent`], forwarding each event to `emitter`.
///
/// The spawned task self-terminates when both engine halves are dropped:
/// `recv()` returns `None` and the loop exits.
fn spawn_event_bridge(
    mut event_rx: mpsc::UnboundedReceiver<VoiceEvent>,
    emitter: Arc<dyn AppEventEmitter>,
) {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            emitter.emit(to_app_event(event));
        }
        // event_rx returned None: engine senders dropped — task exits.
    });
}

fn to_app_event(event: VoiceEvent) -> AppEvent {
    match event {
        VoiceEvent::SpeakingStarted => AppEvent::VoiceSpeakingStarted,
        VoiceEvent::SpeakingFinished => AppEvent::VoiceSpeakingFinished,
        VoiceEvent::ListeningChanged(listening) => AppEvent::VoiceListeningChanged { listening },
        VoiceEvent::Transcript { text, is_final } => AppEvent::VoiceTranscript { text, is_final },
        VoiceEvent::Error(message) => AppEvent::VoiceError { message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use viva_core::ports::NoopEmitter;

    /// Emitter that records everything it is handed.
    #[derive(Default)]
    struct RecordingEmitter {
        events: Arc<Mutex<Vec<AppEvent>>>,
    }

    impl AppEventEmitter for RecordingEmitter {
        fn emit(&self, event: AppEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn clone_box(&self) -> Box<dyn AppEventEmitter> {
            Box::new(Self {
                events: Arc::clone(&self.events),
            })
        }
    }

    #[test]
    fn voice_events_map_onto_app_events() {
        assert_eq!(
            to_app_event(VoiceEvent::SpeakingStarted),
            AppEvent::VoiceSpeakingStarted
        );
        assert_eq!(
            to_app_event(VoiceEvent::ListeningChanged(true)),
            AppEvent::VoiceListeningChanged { listening: true }
        );
        assert_eq!(
            to_app_event(VoiceEvent::Transcript {
                text: "hi".to_string(),
                is_final: true
            }),
            AppEvent::VoiceTranscript {
                text: "hi".to_string(),
                is_final: true
            }
        );
    }

    #[test]
    fn unsupported_platform_status_is_all_noops() {
        tokio_test::block_on(async {
            let service = VoiceService::new(None, None, VoiceConfig::default(), Arc::new(NoopEmitter::new()));

            let status = service.status();
            assert!(!status.has_voice_support);
            assert!(!status.recognition_supported);
            assert!(!status.is_speaking);
            assert!(!status.is_listening);
            assert!(status.transcript.is_empty());

            // Every operation is a safe no-op.
            service.speak("hello");
            service.play_intro("welcome", "hello");
            service.cancel_speech();
            service.stop_listening();
            service.clear_transcript();
            assert!(!service.status().is_speaking);

            // start_listening records the unsupported error.
            service.start_listening();
            let error = service.status().error.expect("error should be recorded");
            assert!(error.contains("not supported"));
        });
    }

    #[test]
    fn bridge_forwards_engine_events() {
        tokio_test::block_on(async {
            let emitter = RecordingEmitter::default();
            let events = Arc::clone(&emitter.events);
            let (event_tx, event_rx) = crate::event::channel();
            spawn_event_bridge(event_rx, Arc::new(emitter));

            event_tx.send(VoiceEvent::SpeakingStarted).unwrap();
            event_tx.send(VoiceEvent::SpeakingFinished).unwrap();
            drop(event_tx);

            // Let the bridge task drain before asserting.
            for _ in 0..100 {
                if events.lock().unwrap().len() == 2 {
                    break;
                }
                tokio::task::yield_now().await;
            }
            let seen = events.lock().unwrap().clone();
            assert_eq!(
                seen,
                vec![AppEvent::VoiceSpeakingStarted, AppEvent::VoiceSpeakingFinished]
            );
        });
    }

    #[test]
    fn interaction_latch_shows_up_in_status() {
        tokio_test::block_on(async {
            let service = VoiceService::new(None, None, VoiceConfig::default(), Arc::new(NoopEmitter::new()));
            assert!(!service.status().has_user_interaction);
            service.mark_interaction();
            assert!(service.status().has_user_interaction);
        });
    }
}
