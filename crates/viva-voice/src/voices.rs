//! Voice resolver — selects one "best" synthesis voice from the catalog.
//!
//! The catalog may be empty at load and populate asynchronously afterwards
//! (a known quirk of one mobile browser engine), so resolution re-attempts:
//! once at spawn, once per catalog-changed notification, and on a bounded
//! fixed-interval retry until a voice is found or the attempt cap is hit.
//! After the cap, the timer stops for good and playback falls back to the
//! platform default voice; catalog-changed notifications still re-resolve,
//! which also clears the selection if the catalog ever empties out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::{SynthBackend, VoiceDescriptor};

/// Known high-quality US-English voices, tried by exact name.
const PREFERRED_NAMES: &[&str] = &[
    "Samantha",
    "Google US English",
    "Microsoft Zira - English (United States)",
    "Victoria",
];

/// Name tokens that mark a female-sounding voice.
const FEMALE_TOKENS: &[&str] = &[
    "female", "woman", "samantha", "zira", "aria", "jenny", "victoria", "karen", "moira", "tessa",
];

/// Bounded retry policy for late-arriving voice catalogs.
///
/// Injected rather than hidden inside a timer so tests can simulate
/// "catalog never arrives" deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Timer-driven attempts before resolution is abandoned for the session.
    pub max_attempts: u32,

    /// Fixed interval between timer-driven attempts.
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_millis(250),
        }
    }
}

type SharedSelection = Arc<Mutex<Option<VoiceDescriptor>>>;

/// Holds the currently selected synthesis voice, kept fresh by a background
/// task watching the backend's catalog.
pub struct VoiceResolver {
    selected: SharedSelection,
}

impl VoiceResolver {
    /// Attempt an immediate selection, then keep watching the catalog.
    ///
    /// Must be called inside a tokio runtime.
    pub fn spawn(backend: Arc<dyn SynthBackend>, policy: RetryPolicy) -> Self {
        let selected: SharedSelection = Arc::new(Mutex::new(None));
        resolve_once(backend.as_ref(), &selected);
        // Subscribe before the task is scheduled so a catalog change landing
        // between now and its first poll is not missed.
        let changes = backend.catalog_changes();
        tokio::spawn(watch_catalog(backend, changes, Arc::clone(&selected), policy));
        Self { selected }
    }

    /// The currently selected voice, if resolution has succeeded.
    pub fn selected(&self) -> Option<VoiceDescriptor> {
        self.selected.lock().unwrap().clone()
    }
}

async fn watch_catalog(
    backend: Arc<dyn SynthBackend>,
    mut changes: tokio::sync::watch::Receiver<u64>,
    selected: SharedSelection,
    policy: RetryPolicy,
) {
    let mut attempts = 0u32;
    loop {
        let timer_live =
            attempts < policy.max_attempts && selected.lock().unwrap().is_none();
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    // Backend dropped; nothing left to resolve against.
                    break;
                }
                resolve_once(backend.as_ref(), &selected);
            }
            () = tokio::time::sleep(policy.interval), if timer_live => {
                attempts += 1;
                let found = resolve_once(backend.as_ref(), &selected);
                if !found && attempts >= policy.max_attempts {
                    tracing::warn!(
                        attempts,
                        "voice resolution abandoned for this session; platform default voice will be used"
                    );
                }
            }
        }
    }
}

/// Re-run selection against the current catalog. An empty catalog clears the
/// selection so callers see "no voice yet" instead of a stale entry.
fn resolve_once(backend: &dyn SynthBackend, selected: &Mutex<Option<VoiceDescriptor>>) -> bool {
    let catalog = backend.voices();
    let choice = select_voice(&catalog).cloned();
    let found = choice.is_some();
    let mut slot = selected.lock().unwrap();
    if *slot != choice {
        match &choice {
            Some(voice) => tracing::debug!(name = %voice.name, lang = %voice.lang, "synthesis voice selected"),
            None => tracing::debug!("voice catalog empty; selection cleared"),
        }
    }
    *slot = choice;
    found
}

/// Selection priority, first match wins:
/// 1. natural-sounding US female voice (by descriptive name tokens)
/// 2. known high-quality US-English voice by name
/// 3. any female-sounding `en` voice
/// 4. any `en` voice
/// 5. the first catalog entry
fn select_voice(catalog: &[VoiceDescriptor]) -> Option<&VoiceDescriptor> {
    catalog
        .iter()
        .find(|v| is_us(v) && has_token(v, "natural") && is_female_sounding(v))
        .or_else(|| {
            catalog
                .iter()
                .find(|v| PREFERRED_NAMES.iter().any(|name| v.name == *name))
        })
        .or_else(|| catalog.iter().find(|v| is_english(v) && is_female_sounding(v)))
        .or_else(|| catalog.iter().find(|v| is_english(v)))
        .or_else(|| catalog.first())
}

fn is_us(voice: &VoiceDescriptor) -> bool {
    voice.lang.starts_with("en-US")
}

fn is_english(voice: &VoiceDescriptor) -> bool {
    voice.lang.starts_with("en")
}

fn has_token(voice: &VoiceDescriptor, token: &str) -> bool {
    voice.name.to_ascii_lowercase().contains(token)
}

fn is_female_sounding(voice: &VoiceDescriptor) -> bool {
    FEMALE_TOKENS.iter().any(|token| has_token(voice, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::watch;

    use crate::backend::{Utterance, UtteranceOutcome};

    #[test]
    fn natural_us_female_wins_over_everything() {
        let catalog = vec![
            VoiceDescriptor::new("Daniel", "en-GB"),
            VoiceDescriptor::new("Samantha", "en-US"),
            VoiceDescriptor::new("Aria Natural Female", "en-US"),
        ];
        assert_eq!(select_voice(&catalog).unwrap().name, "Aria Natural Female");
    }

    #[test]
    fn known_name_beats_generic_english() {
        let catalog = vec![
            VoiceDescriptor::new("Daniel", "en-GB"),
            VoiceDescriptor::new("Google US English", "en-US"),
        ];
        assert_eq!(select_voice(&catalog).unwrap().name, "Google US English");
    }

    #[test]
    fn female_english_beats_plain_english() {
        let catalog = vec![
            VoiceDescriptor::new("Daniel", "en-GB"),
            VoiceDescriptor::new("Karen", "en-AU"),
        ];
        assert_eq!(select_voice(&catalog).unwrap().name, "Karen");
    }

    #[test]
    fn any_english_beats_other_locales() {
        let catalog = vec![
            VoiceDescriptor::new("Thomas", "fr-FR"),
            VoiceDescriptor::new("Daniel", "en-GB"),
        ];
        assert_eq!(select_voice(&catalog).unwrap().name, "Daniel");
    }

    #[test]
    fn first_entry_is_the_last_resort() {
        let catalog = vec![
            VoiceDescriptor::new("Thomas", "fr-FR"),
            VoiceDescriptor::new("Anna", "de-DE"),
        ];
        assert_eq!(select_voice(&catalog).unwrap().name, "Thomas");
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        assert!(select_voice(&[]).is_none());
    }

    // ── Catalog-watching behavior ──────────────────────────────────

    /// A synthesis backend whose catalog tests mutate directly.
    struct ScriptedCatalog {
        voices: StdMutex<Vec<VoiceDescriptor>>,
        changes: watch::Sender<u64>,
    }

    impl ScriptedCatalog {
        fn new() -> Self {
            Self {
                voices: StdMutex::new(Vec::new()),
                changes: watch::channel(0).0,
            }
        }

        fn install(&self, voices: Vec<VoiceDescriptor>) {
            *self.voices.lock().unwrap() = voices;
            self.changes.send_modify(|version| *version += 1);
        }
    }

    #[async_trait::async_trait]
    impl SynthBackend for ScriptedCatalog {
        fn voices(&self) -> Vec<VoiceDescriptor> {
            self.voices.lock().unwrap().clone()
        }

        fn catalog_changes(&self) -> watch::Receiver<u64> {
            self.changes.subscribe()
        }

        async fn speak(&self, _utterance: Utterance) -> UtteranceOutcome {
            UtteranceOutcome::Completed
        }

        fn cancel(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn late_catalog_is_picked_up_on_change_notification() {
        let backend = Arc::new(ScriptedCatalog::new());
        let resolver = VoiceResolver::spawn(backend.clone(), RetryPolicy::default());
        assert!(resolver.selected().is_none());

        // First notification still has nothing.
        backend.install(Vec::new());
        tokio::task::yield_now().await;
        assert!(resolver.selected().is_none());

        // Second notification carries a single en-GB voice with no female
        // marker — the best available "en" fallback.
        backend.install(vec![VoiceDescriptor::new("Daniel", "en-GB")]);
        tokio::time::sleep(Duration::from_millis(1)).await;
        let selected = resolver.selected().expect("voice should be selected");
        assert_eq!(selected.lang, "en-GB");
    }

    #[tokio::test(start_paused = true)]
    async fn retries_give_up_after_the_cap() {
        let backend = Arc::new(ScriptedCatalog::new());
        let policy = RetryPolicy {
            max_attempts: 3,
            interval: Duration::from_millis(100),
        };
        let resolver = VoiceResolver::spawn(backend.clone(), policy);

        // Let the timer run far past the cap; the catalog never arrives.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(resolver.selected().is_none());

        // A voice installed *after* the cap is still picked up via the
        // catalog-changed notification.
        backend.install(vec![VoiceDescriptor::new("Samantha", "en-US")]);
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(resolver.selected().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn emptied_catalog_clears_the_selection() {
        let backend = Arc::new(ScriptedCatalog::new());
        backend.install(vec![VoiceDescriptor::new("Samantha", "en-US")]);
        let resolver = VoiceResolver::spawn(backend.clone(), RetryPolicy::default());
        assert!(resolver.selected().is_some());

        backend.install(Vec::new());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(resolver.selected().is_none());
    }
}
