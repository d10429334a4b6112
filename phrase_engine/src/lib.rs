//! # phrase_engine
//!
//! The accumulation engine behind the ASL reader: a deterministic mapping
//! from a stream of recognizer tokens (one per line off the device) plus
//! user edit commands to the two fields the window shows, the *current
//! token* (drawn big) and the *accumulated phrase* (the text being
//! composed).
//!
//! ## Token policy
//!
//! | Token                         | Current token | Phrase              |
//! |-------------------------------|---------------|---------------------|
//! | empty line or `No match found`| unchanged     | unchanged           |
//! | `_`                           | `_`           | one space appended  |
//! | any single character          | that token    | character appended  |
//! | anything longer               | that token    | unchanged           |
//!
//! Multi-character tokens exist so the device can push diagnostic text
//! ("CAL OK", "LOW BATTERY") onto the big display without corrupting the
//! phrase. Length is measured in characters, not bytes.
//!
//! The engine is purely synchronous and has no I/O; transport lives in
//! `line_feed` and presentation in `asl_reader`. One engine exists per
//! connected session, with exactly one writer.
//!
//! ## Quick start
//!
//! ```rust
//! use phrase_engine::PhraseEngine;
//!
//! let mut engine = PhraseEngine::new();
//! for token in ["H", "I", "_", "T", "H", "E", "R", "E"] {
//!     engine.ingest(token);
//! }
//! assert_eq!(engine.phrase(), "HI THERE");
//! ```

// ════════════════════════════════════════════════════════════════════════════
// Token classification
// ════════════════════════════════════════════════════════════════════════════

/// Sentinel the recognizer emits when no gesture matched. Dropped whole,
/// never shown, never accumulated.
pub const NO_MATCH: &str = "No match found";

/// Marker the recognizer emits for a word break.
pub const SPACE_MARKER: &str = "_";

/// How [`PhraseEngine::ingest`] will treat a token, before any state is
/// touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Empty line or the no-match sentinel: ignored entirely.
    Rejected,
    /// The `_` marker: shown, and one space joins the phrase.
    Space,
    /// A single character: shown, and it joins the phrase.
    Letter(char),
    /// A longer string: shown big, never accumulated.
    DisplayOnly,
}

/// Classify a stripped token line.
pub fn classify(token: &str) -> TokenKind {
    if token.is_empty() || token == NO_MATCH {
        return TokenKind::Rejected;
    }
    if token == SPACE_MARKER {
        return TokenKind::Space;
    }
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => TokenKind::Letter(c),
        _ => TokenKind::DisplayOnly,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Display events and snapshots
// ════════════════════════════════════════════════════════════════════════════

/// Emitted by [`PhraseEngine::ingest`] for every accepted token.
///
/// `phrase` is `Some` only when the accumulated phrase changed, so the
/// presentation layer can skip redrawing the phrase area for
/// display-only tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayEvent {
    /// The token now occupying the big display.
    pub token: String,
    /// The full phrase, when this token extended it.
    pub phrase: Option<String>,
}

/// Owned copy of both observable fields, for rendering and clipboard
/// copy.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub token: String,
    pub phrase: String,
}

// ════════════════════════════════════════════════════════════════════════════
// PhraseEngine
// ════════════════════════════════════════════════════════════════════════════

/// Accumulates recognizer tokens into a phrase.
///
/// State is two strings; every operation is total and none of them
/// fails. Created when a session opens and dropped when it ends, so a
/// reconnect always starts blank.
#[derive(Clone, Debug, Default)]
pub struct PhraseEngine {
    current: String,
    phrase: String,
}

impl PhraseEngine {
    pub fn new() -> PhraseEngine {
        PhraseEngine::default()
    }

    /// Apply one device token.
    ///
    /// Returns `None` for rejected tokens (empty line or the no-match
    /// sentinel), otherwise the event describing the new display state.
    pub fn ingest(&mut self, token: &str) -> Option<DisplayEvent> {
        let appended = match classify(token) {
            TokenKind::Rejected => return None,
            TokenKind::Space => {
                self.phrase.push(' ');
                true
            }
            TokenKind::Letter(c) => {
                self.phrase.push(c);
                true
            }
            TokenKind::DisplayOnly => false,
        };
        self.current.clear();
        self.current.push_str(token);
        Some(DisplayEvent {
            token: self.current.clone(),
            phrase: appended.then(|| self.phrase.clone()),
        })
    }

    /// Empty the phrase. The current token stays on the big display.
    pub fn clear(&mut self) {
        self.phrase.clear();
    }

    /// Append one space, independent of the token stream.
    pub fn add_space(&mut self) {
        self.phrase.push(' ');
    }

    /// Remove the last character of the phrase; no-op when empty.
    pub fn backspace(&mut self) {
        self.phrase.pop();
    }

    /// Last accepted token, empty before the first one arrives.
    pub fn current_token(&self) -> &str {
        &self.current
    }

    /// The accumulated phrase.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Owned copy of both fields.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            token: self.current.clone(),
            phrase: self.phrase.clone(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Display sizing
// ════════════════════════════════════════════════════════════════════════════

/// Recommended point size for the big display.
///
/// A single character gets the full `base` size; longer tokens shrink
/// inversely with their length so diagnostics still fit, floored at
/// `min`. Division is integer division.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizePolicy {
    pub base: u32,
    pub min: u32,
}

impl Default for SizePolicy {
    fn default() -> SizePolicy {
        SizePolicy { base: 120, min: 30 }
    }
}

impl SizePolicy {
    /// Size for `token`; the empty token counts as a single character.
    pub fn size_for(&self, token: &str) -> u32 {
        let len = token.chars().count() as u32;
        if len <= 1 {
            self.base
        } else {
            (self.base / len).max(self.min)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ── token policy ─────────────────────────────────────────────────────

    #[test]
    fn single_letter_appends_and_takes_the_display() {
        let mut e = PhraseEngine::new();
        let ev = e.ingest("H").unwrap();
        assert_eq!(e.current_token(), "H");
        assert_eq!(e.phrase(), "H");
        assert_eq!(ev.token, "H");
        assert_eq!(ev.phrase.as_deref(), Some("H"));
    }

    #[test]
    fn underscore_appends_a_space() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        let ev = e.ingest("_").unwrap();
        assert_eq!(e.current_token(), "_");
        assert_eq!(e.phrase(), "A ");
        assert_eq!(ev.phrase.as_deref(), Some("A "));
    }

    #[test]
    fn empty_token_changes_nothing() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        assert!(e.ingest("").is_none());
        assert_eq!(e.current_token(), "A");
        assert_eq!(e.phrase(), "A");
    }

    #[test]
    fn no_match_sentinel_changes_nothing() {
        let mut e = PhraseEngine::new();
        assert!(e.ingest(NO_MATCH).is_none());
        assert_eq!(e.current_token(), "");
        assert_eq!(e.phrase(), "");
    }

    #[test]
    fn long_token_is_display_only() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        e.ingest("B");
        let ev = e.ingest("LOW BATTERY").unwrap();
        assert_eq!(e.current_token(), "LOW BATTERY");
        assert_eq!(e.phrase(), "AB");
        assert!(ev.phrase.is_none());
    }

    #[test]
    fn classify_covers_every_arm() {
        assert_eq!(classify(""), TokenKind::Rejected);
        assert_eq!(classify(NO_MATCH), TokenKind::Rejected);
        assert_eq!(classify("_"), TokenKind::Space);
        assert_eq!(classify("Q"), TokenKind::Letter('Q'));
        assert_eq!(classify("CAL OK"), TokenKind::DisplayOnly);
    }

    #[test]
    fn multibyte_single_char_is_a_letter() {
        // Byte length would misclassify this; the policy counts chars.
        let mut e = PhraseEngine::new();
        e.ingest("Ñ");
        assert_eq!(e.phrase(), "Ñ");
        e.backspace();
        assert_eq!(e.phrase(), "");
    }

    // ── edit commands ────────────────────────────────────────────────────

    #[test]
    fn clear_leaves_the_current_token() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        e.clear();
        assert_eq!(e.phrase(), "");
        assert_eq!(e.current_token(), "A");
    }

    #[test]
    fn add_space_appends() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        e.ingest("B");
        e.add_space();
        assert_eq!(e.phrase(), "AB ");
    }

    #[test]
    fn backspace_removes_last_char() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        e.ingest("B");
        e.backspace();
        assert_eq!(e.phrase(), "A");
    }

    #[test]
    fn backspace_on_empty_is_a_noop() {
        let mut e = PhraseEngine::new();
        e.backspace();
        assert_eq!(e.phrase(), "");
    }

    // ── sequences ────────────────────────────────────────────────────────

    #[test]
    fn hi_there() {
        let mut e = PhraseEngine::new();
        for t in ["H", "I", "_", "T", "H", "E", "R", "E"] {
            e.ingest(t);
        }
        assert_eq!(e.phrase(), "HI THERE");
        assert_eq!(e.current_token(), "E");
    }

    #[test]
    fn backspace_between_letters() {
        let mut e = PhraseEngine::new();
        e.ingest("A");
        e.backspace();
        e.ingest("B");
        assert_eq!(e.phrase(), "B");
    }

    #[test]
    fn snapshot_copies_both_fields() {
        let mut e = PhraseEngine::new();
        e.ingest("H");
        e.ingest("I");
        let snap = e.snapshot();
        assert_eq!(snap.token, "I");
        assert_eq!(snap.phrase, "HI");
        e.clear();
        assert_eq!(snap.phrase, "HI");
    }

    // ── size policy ──────────────────────────────────────────────────────

    #[test]
    fn single_char_gets_base_size() {
        let p = SizePolicy::default();
        assert_eq!(p.size_for("W"), 120);
        assert_eq!(p.size_for(""), 120);
    }

    #[test]
    fn size_shrinks_with_length() {
        let p = SizePolicy::default();
        assert_eq!(p.size_for("AB"), 60);
        assert_eq!(p.size_for("ABC"), 40);
        assert_eq!(p.size_for("ABCD"), 30);
    }

    #[test]
    fn size_floors_at_min() {
        let p = SizePolicy::default();
        assert_eq!(p.size_for("LOW BATTERY!"), 30);
    }

    // ── properties ───────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn any_letter_appends_itself(c in prop::char::range('A', 'Z')) {
            let mut e = PhraseEngine::new();
            e.ingest(&c.to_string());
            prop_assert_eq!(e.phrase(), c.to_string());
            prop_assert_eq!(e.current_token(), c.to_string());
        }

        #[test]
        fn long_tokens_never_touch_the_phrase(s in "[A-Z]{2,16}") {
            let mut e = PhraseEngine::new();
            e.ingest("A");
            e.ingest(&s);
            prop_assert_eq!(e.phrase(), "A");
            prop_assert_eq!(e.current_token(), s);
        }

        #[test]
        fn backspace_never_underflows(n in 0usize..8) {
            let mut e = PhraseEngine::new();
            e.ingest("A");
            for _ in 0..n {
                e.backspace();
            }
            prop_assert!(e.phrase().len() <= 1);
        }

        #[test]
        fn size_never_drops_below_min(s in "[ -~]{1,32}") {
            let p = SizePolicy::default();
            prop_assert!(p.size_for(&s) >= p.min);
        }
    }
}
