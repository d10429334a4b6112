//! Software-rendered window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Mr. Mitten - Adapted ASL to Text  CONNECTED /dev/… 9600 │
//! │ ┌──────────────────────────────────────────────────────┐ │
//! │ │  CURRENT LETTER                                      │ │
//! │ │                                                      │ │
//! │ │                        H                             │ │
//! │ │                                                      │ │
//! │ └──────────────────────────────────────────────────────┘ │
//! │ ┌──────────────────────────────────────────────────────┐ │
//! │ │  PHRASE                                              │ │
//! │ │  HI THERE                                            │ │
//! │ └──────────────────────────────────────────────────────┘ │
//! │  status bar                                              │
//! │  key legend                                              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Text is the same 3x5 bitmap font everywhere, scaled up in integer
//! steps; the big letter's scale comes from the engine's size policy.

use minifb::{Key, KeyRepeat, Window, WindowOptions};
use phrase_engine::{SizePolicy, Snapshot};

use crate::app::UiCommand;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 800;
pub const WIN_H: usize = 600;

const PANEL_X: usize = 16;
const PANEL_W: usize = WIN_W - 2 * PANEL_X;
const LETTER_PANEL_Y: usize = 56;
const LETTER_PANEL_H: usize = 300;
const PHRASE_PANEL_Y: usize = 368;
const PHRASE_PANEL_H: usize = 148;
const STATUS_Y: usize = WIN_H - 68;
const STATUS_H: usize = 24;

/// Phrase text scale; cell width is 4 px per char at scale 1.
const PHRASE_SCALE: usize = 3;
const PHRASE_ROW_PITCH: usize = 5 * PHRASE_SCALE + 6;
const PHRASE_COLS: usize = (PANEL_W - 24) / (4 * PHRASE_SCALE);
const PHRASE_ROWS: usize = 5;

/// Engine size units per font scale step. The default policy's base of
/// 120 lands on scale 40, a 120x200 px letter.
const SIZE_PER_SCALE: u32 = 3;

/// Short name for the OS title bar; the drawn header carries the full line.
const WINDOW_TITLE: &str = "ASL Reader";
const HEADER_BANNER: &str = "Mr. Mitten - Adapted ASL to Text";

const BG_COLOR: u32 = 0xFF1A1A2E;
const PANEL_BG: u32 = 0xFF16213E;
const TEXT_BG: u32 = 0xFF0F3460;
const BORDER_COLOR: u32 = 0xFF0F3460;
const TITLE_COLOR: u32 = 0xFFAADDFF;
const LETTER_COLOR: u32 = 0xFFEEEEEE;
const PHRASE_COLOR: u32 = 0xFFFFD700;
const CAPTION_COLOR: u32 = 0xFF888888;
const HINT_COLOR: u32 = 0xFF555577;
const OK_COLOR: u32 = 0xFF44CC66;
const PAUSE_COLOR: u32 = 0xFFFFC04D;
const DOWN_COLOR: u32 = 0xFFE05555;

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf: Vec<u32>,
}

impl Visualizer {
    pub fn new() -> Result<Visualizer, String> {
        let mut window = Window::new(
            WINDOW_TITLE,
            WIN_W,
            WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| e.to_string())?;

        window.limit_update_rate(Some(std::time::Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll the keyboard and translate presses into commands.
    pub fn poll_input(&mut self) -> Vec<UiCommand> {
        let mut out = Vec::new();
        if !self.window.is_open() {
            return out;
        }

        // Keys that trigger on first press only
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        // Keys that repeat while held
        let held = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) {
            out.push(UiCommand::Quit);
        }
        if one_shot(Key::C) {
            out.push(UiCommand::ToggleConnect);
        }
        if one_shot(Key::P) {
            out.push(UiCommand::TogglePause);
        }
        if one_shot(Key::X) {
            out.push(UiCommand::Clear);
        }
        if one_shot(Key::Y) {
            out.push(UiCommand::Copy);
        }
        if one_shot(Key::Space) {
            out.push(UiCommand::AddSpace);
        }
        if held(Key::Backspace) {
            out.push(UiCommand::Backspace);
        }

        out
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        snap: &Snapshot,
        sizes: &SizePolicy,
        connected: bool,
        paused: bool,
        link_desc: &str,
        status: &str,
    ) {
        // Clear
        self.buf.fill(BG_COLOR);

        // ── Header ────────────────────────────────────────────────────────
        self.draw_text(HEADER_BANNER, PANEL_X, 14, 2, TITLE_COLOR);
        let (label, color) = if !connected {
            ("DISCONNECTED".to_string(), DOWN_COLOR)
        } else if paused {
            (format!("PAUSED {}", link_desc), PAUSE_COLOR)
        } else {
            (format!("CONNECTED {}", link_desc), OK_COLOR)
        };
        let lx = WIN_W.saturating_sub(PANEL_X + text_width(&label, 2));
        self.draw_text(&label, lx, 14, 2, color);

        // ── Current letter panel ──────────────────────────────────────────
        self.fill_rect(PANEL_X, LETTER_PANEL_Y, PANEL_W, LETTER_PANEL_H, PANEL_BG);
        self.draw_border(PANEL_X, LETTER_PANEL_Y, PANEL_W, LETTER_PANEL_H, BORDER_COLOR);
        self.draw_text("CURRENT LETTER", PANEL_X + 12, LETTER_PANEL_Y + 10, 1, CAPTION_COLOR);

        if snap.token.is_empty() {
            if !connected {
                let hint = "press C to connect";
                let hx = PANEL_X + (PANEL_W.saturating_sub(text_width(hint, 2))) / 2;
                self.draw_text(hint, hx, LETTER_PANEL_Y + LETTER_PANEL_H / 2, 2, HINT_COLOR);
            }
        } else {
            let scale = letter_scale(sizes, &snap.token);
            let tw = text_width(&snap.token, scale);
            let tx = PANEL_X + PANEL_W.saturating_sub(tw) / 2;
            let ty = LETTER_PANEL_Y + LETTER_PANEL_H.saturating_sub(5 * scale) / 2;
            self.draw_text(&snap.token, tx, ty, scale, LETTER_COLOR);
        }

        // ── Phrase panel ──────────────────────────────────────────────────
        self.fill_rect(PANEL_X, PHRASE_PANEL_Y, PANEL_W, PHRASE_PANEL_H, PANEL_BG);
        self.draw_border(PANEL_X, PHRASE_PANEL_Y, PANEL_W, PHRASE_PANEL_H, BORDER_COLOR);
        self.draw_text("PHRASE", PANEL_X + 12, PHRASE_PANEL_Y + 10, 1, CAPTION_COLOR);

        let lines = wrap_phrase(&snap.phrase, PHRASE_COLS);
        let first = lines.len().saturating_sub(PHRASE_ROWS);
        let mut py = PHRASE_PANEL_Y + 26;
        for line in &lines[first..] {
            self.draw_text(line, PANEL_X + 12, py, PHRASE_SCALE, PHRASE_COLOR);
            py += PHRASE_ROW_PITCH;
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, TEXT_BG);
        self.draw_text(status, PANEL_X, STATUS_Y + 7, 2, LETTER_COLOR);

        // ── Key legend ────────────────────────────────────────────────────
        self.draw_text(
            "C=connect  P=pause  Space=space  Backspace=delete  X=clear  Y=copy  Q=quit",
            PANEL_X,
            WIN_H - 16,
            1,
            CAPTION_COLOR,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            if y < WIN_H {
                self.buf[y * WIN_W + col] = color;
            }
            if y + h - 1 < WIN_H {
                self.buf[(y + h - 1) * WIN_W + col] = color;
            }
        }
        for row in y..(y + h).min(WIN_H) {
            if x < WIN_W {
                self.buf[row * WIN_W + x] = color;
            }
            if x + w - 1 < WIN_W {
                self.buf[row * WIN_W + x + w - 1] = color;
            }
        }
    }

    /// Draw `text` with the 3x5 font, each font pixel a `scale` square.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W {
                break;
            }
        }
    }
}

/// Pixel width of `text` at `scale`, counting the trailing gap.
fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale
}

/// Font scale for the big letter: the engine's recommended size mapped
/// to font steps, shrunk further if the token would overflow the panel.
fn letter_scale(sizes: &SizePolicy, token: &str) -> usize {
    let mut scale = (sizes.size_for(token) / SIZE_PER_SCALE).max(1) as usize;
    while scale > 1 && text_width(token, scale) > PANEL_W - 24 {
        scale -= 1;
    }
    scale
}

// ════════════════════════════════════════════════════════════════════════════
// Phrase wrapping
// ════════════════════════════════════════════════════════════════════════════

/// Wrap `phrase` to `cols` columns, breaking at the last space on the
/// line when there is one and mid-word otherwise. Spaces are kept, so
/// joining the lines reproduces the phrase exactly.
pub(crate) fn wrap_phrase(phrase: &str, cols: usize) -> Vec<String> {
    if cols == 0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut cur = String::new();
    for ch in phrase.chars() {
        cur.push(ch);
        if cur.chars().count() == cols {
            match cur.rfind(' ') {
                Some(idx) if idx + 1 < cur.len() => {
                    let rest = cur.split_off(idx + 1);
                    lines.push(std::mem::replace(&mut cur, rest));
                }
                _ => lines.push(std::mem::take(&mut cur)),
            }
        }
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _ => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── wrapping ─────────────────────────────────────────────────────────

    #[test]
    fn short_phrase_stays_on_one_line() {
        assert_eq!(wrap_phrase("HI THERE", 20), ["HI THERE"]);
    }

    #[test]
    fn empty_phrase_has_no_lines() {
        assert!(wrap_phrase("", 20).is_empty());
    }

    #[test]
    fn breaks_at_the_last_space() {
        assert_eq!(wrap_phrase("HELLO WORLD", 8), ["HELLO ", "WORLD"]);
    }

    #[test]
    fn hard_breaks_spaceless_runs() {
        assert_eq!(wrap_phrase("ABCDEFGHIJ", 4), ["ABCD", "EFGH", "IJ"]);
    }

    #[test]
    fn exact_fit_adds_no_empty_line() {
        assert_eq!(wrap_phrase("ABCD", 4), ["ABCD"]);
    }

    #[test]
    fn trailing_spaces_survive_the_wrap() {
        assert_eq!(wrap_phrase("A  B", 3), ["A  ", "B"]);
        let rejoined: String = wrap_phrase("HELLO WORLD AGAIN", 8).concat();
        assert_eq!(rejoined, "HELLO WORLD AGAIN");
    }

    // ── font ─────────────────────────────────────────────────────────────

    #[test]
    fn every_letter_digit_and_marker_has_a_glyph() {
        let fallback = char_glyph('\u{7f}');
        for c in ('A'..='Z').chain('0'..='9').chain(['_']) {
            assert_ne!(char_glyph(c), fallback, "missing glyph for {:?}", c);
        }
    }

    #[test]
    fn q_is_distinct_from_o() {
        assert_ne!(char_glyph('Q'), char_glyph('O'));
    }

    // ── letter scaling ───────────────────────────────────────────────────

    #[test]
    fn single_letter_uses_the_full_base_scale() {
        let sizes = SizePolicy::default();
        assert_eq!(letter_scale(&sizes, "H"), 40);
    }

    #[test]
    fn diagnostic_string_shrinks_to_fit() {
        // 11 chars: size floor 30 maps to scale 10, well inside the panel.
        let sizes = SizePolicy::default();
        let scale = letter_scale(&sizes, "LOW BATTERY");
        assert_eq!(scale, 10);
        assert!(text_width("LOW BATTERY", scale) <= PANEL_W - 24);
    }

    #[test]
    fn absurdly_long_token_still_gets_scale_one() {
        let sizes = SizePolicy::default();
        let token = "X".repeat(400);
        assert_eq!(letter_scale(&sizes, &token), 1);
    }

    // ── window chrome ────────────────────────────────────────────────────

    #[test]
    fn title_bar_gets_the_short_app_name() {
        assert_eq!(WINDOW_TITLE, "ASL Reader");
    }

    #[test]
    fn header_banner_gets_the_full_product_line() {
        assert_eq!(HEADER_BANNER, "Mr. Mitten - Adapted ASL to Text");
    }

    #[test]
    fn header_banner_clears_the_widest_status_label() {
        let widest = "CONNECTED /dev/cu.usbmodem14201 9600";
        let status_x = WIN_W - PANEL_X - text_width(widest, 2);
        assert!(PANEL_X + text_width(HEADER_BANNER, 2) < status_x);
    }

    #[test]
    fn every_header_banner_char_has_a_real_glyph() {
        let fallback = char_glyph('\u{7f}');
        for c in HEADER_BANNER.chars() {
            assert_ne!(char_glyph(c), fallback, "missing glyph for {:?}", c);
        }
    }
}
