//! Prosody segmenter — splits normalized text into speakable chunks.
//!
//! Pure and side-effect-free so it is independently testable. The
//! [`Speaker`](crate::speaker::Speaker) calls [`segment`] once per speak
//! request and consumes the resulting chunks exactly once, in order.
//!
//! Pacing rides on the prosody signal, not on artificial silence: only a
//! trailing chunk with no terminal punctuation carries a (small) pause.

use std::time::Duration;

const BASE_PITCH: f32 = 1.0;
const BASE_RATE: f32 = 1.0;

/// Declarative sentences trail off slightly.
const LOWERED_PITCH: f32 = 0.95;

/// Questions rise.
const RAISED_PITCH: f32 = 1.15;

/// Exclamations rise and speed up.
const EXCLAIM_PITCH: f32 = 1.1;
const EXCLAIM_RATE: f32 = 1.08;

/// Pause after a trailing chunk with no terminal punctuation.
const TRAILING_PAUSE: Duration = Duration::from_millis(120);

/// One sentence-or-clause sized unit of queued playback.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechChunk {
    /// Non-empty, trimmed text.
    pub text: String,

    /// Pause inserted after this chunk before the next one begins.
    pub pause: Duration,

    /// Pitch multiplier assigned from the terminal character.
    pub pitch: f32,

    /// Rate multiplier assigned from the terminal character.
    pub rate: f32,
}

/// Normalize text for synthesis: strip pictographic symbols and invisible
/// joiner/selector characters, collapse whitespace, trim.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for c in text.chars() {
        if is_pictographic(c) || is_invisible_modifier(c) {
            continue;
        }
        if c.is_whitespace() {
            if !prev_space && !out.is_empty() {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out.trim_end().to_string()
}

/// Split text into prosody-tagged chunks.
///
/// Chunks break after each run of sentence terminators (`.` `?` `!`); a
/// final run with no terminator becomes a trailing chunk. Clause commas and
/// semicolons stay inside their chunk — they shape prosody only when they
/// happen to terminate a trailing chunk.
pub fn segment(text: &str) -> Vec<SpeechChunk> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut chars = normalized.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        // Break only once a terminator run is exhausted, so "?!" stays together.
        if is_terminator(c) && chars.peek().is_none_or(|&next| !is_terminator(next)) {
            push_chunk(&mut chunks, &mut current);
        }
    }
    push_chunk(&mut chunks, &mut current);
    chunks
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '?' | '!')
}

fn push_chunk(chunks: &mut Vec<SpeechChunk>, current: &mut String) {
    let text = std::mem::take(current);
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    let (pitch, rate, pause) = match text.chars().next_back() {
        Some('.') => (LOWERED_PITCH, BASE_RATE, Duration::ZERO),
        Some('?') => (RAISED_PITCH, BASE_RATE, Duration::ZERO),
        Some('!') => (EXCLAIM_PITCH, EXCLAIM_RATE, Duration::ZERO),
        Some(',' | ';') => (BASE_PITCH, BASE_RATE, Duration::ZERO),
        _ => (BASE_PITCH, BASE_RATE, TRAILING_PAUSE),
    };

    chunks.push(SpeechChunk {
        text: text.to_string(),
        pause,
        pitch,
        rate,
    });
}

/// Emoji and pictograph blocks that synthesis engines read out literally
/// ("face with tears of joy") unless stripped.
fn is_pictographic(c: char) -> bool {
    matches!(
        u32::from(c),
        0x1F000..=0x1FAFF   // emoticons, pictographs, transport, flags, extended-A
        | 0x2600..=0x27BF   // misc symbols and dingbats
        | 0x2B00..=0x2BFF   // stars and geometric shapes used by emoji
        | 0x2190..=0x21FF   // arrows
        | 0xFE0E..=0xFE0F   // text/emoji presentation selectors
        | 0x20E3            // combining enclosing keycap
    )
}

/// Zero-width characters that glue emoji sequences together.
fn is_invisible_modifier(c: char) -> bool {
    matches!(u32::from(c), 0x200B..=0x200D | 0xFE00..=0xFE0F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_sentence_kinds_get_three_chunks() {
        let chunks = segment("Hello! Is this working? Yes, it is.");
        assert_eq!(chunks.len(), 3);

        assert_eq!(chunks[0].text, "Hello!");
        assert!(chunks[0].pitch > BASE_PITCH);
        assert!(chunks[0].rate > BASE_RATE);
        assert_eq!(chunks[0].pause, Duration::ZERO);

        assert_eq!(chunks[1].text, "Is this working?");
        assert!(chunks[1].pitch > BASE_PITCH);
        assert!((chunks[1].rate - BASE_RATE).abs() < f32::EPSILON);
        assert_eq!(chunks[1].pause, Duration::ZERO);

        assert_eq!(chunks[2].text, "Yes, it is.");
        assert!(chunks[2].pitch < BASE_PITCH);
        assert_eq!(chunks[2].pause, Duration::ZERO);
    }

    #[test]
    fn empty_and_symbol_only_input_yields_no_chunks() {
        assert!(segment("").is_empty());
        assert!(segment("   \t\n ").is_empty());
        assert!(segment("🎉🎉 ✨").is_empty());
    }

    #[test]
    fn emoji_and_joiners_are_stripped() {
        // Family emoji is four pictographs glued with zero-width joiners.
        let chunks = segment("Great job 👨‍👩‍👧‍👦 you did it!");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Great job you did it!");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize("  hello \n\t world  "), "hello world");
    }

    #[test]
    fn terminator_runs_stay_in_one_chunk() {
        let chunks = segment("Wait... what?!");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "Wait...");
        assert_eq!(chunks[1].text, "what?!");
        // "?!" ends in '!' so the exclamation profile wins.
        assert!(chunks[1].rate > BASE_RATE);
    }

    #[test]
    fn trailing_unpunctuated_chunk_gets_a_pause() {
        let chunks = segment("First sentence. and then some");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "and then some");
        assert_eq!(chunks[1].pause, TRAILING_PAUSE);
        assert!((chunks[1].pitch - BASE_PITCH).abs() < f32::EPSILON);
    }

    #[test]
    fn trailing_comma_chunk_is_neutral_with_no_pause() {
        let chunks = segment("Sure. well,");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].text, "well,");
        assert_eq!(chunks[1].pause, Duration::ZERO);
        assert!((chunks[1].pitch - BASE_PITCH).abs() < f32::EPSILON);
    }

    #[test]
    fn segmentation_is_deterministic() {
        let a = segment("One. Two? Three!");
        let b = segment("One. Two? Three!");
        assert_eq!(a, b);
    }
}
