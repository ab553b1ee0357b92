//! Marquee text layout.
//!
//! The two panel lines scroll with independent offsets but must restart
//! together, so both strings are padded to the same length. A line much
//! shorter than the other repeats itself (separated by `spacer` blanks)
//! instead of trailing a long stretch of empty space.
//!
//! Lengths are counted in characters: every character is one glyph of the
//! fixed-width panel font.

pub const DEFAULT_SPACER: usize = 5;

/// Top and bottom marquee strings of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarqueePair {
    pub top: String,
    pub bottom: String,
}

impl MarqueePair {
    /// Length of either line, in characters.
    pub fn len(&self) -> usize {
        char_len(&self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.top.is_empty()
    }
}

/// Lay out `primary` (top) and `secondary` (bottom) for looping.
///
/// Guarantees `top` and `bottom` have the same length, at least `spacer`.
pub fn format(primary: &str, secondary: &str, spacer: usize) -> MarqueePair {
    let mut top = primary.to_string();
    let mut bottom = secondary.to_string();

    // Shorter line repeats itself towards the longer one's length.
    let bottom_len = char_len(&bottom);
    repeat_towards(&mut top, bottom_len, spacer);
    let top_len = char_len(&top);
    repeat_towards(&mut bottom, top_len, spacer);

    pad_to(&mut top, spacer);
    pad_to(&mut bottom, spacer);

    // Close lengths: add a second copy to each, the shorter one with a wider
    // gap so both copies start on the same column.
    let (top_len, bottom_len) = (char_len(&top), char_len(&bottom));
    let gap = top_len.abs_diff(bottom_len);
    // Any gap up to `spacer` qualifies, including the case where lengths
    // differ by only a character or two. The second copies must start on the
    // same column or the lines drift apart on every loop.
    if gap > 0 && gap <= spacer {
        if top_len > bottom_len {
            append_copy(&mut top, spacer);
            append_copy(&mut bottom, gap + spacer);
        } else {
            append_copy(&mut top, gap + spacer);
            append_copy(&mut bottom, spacer);
        }
    }

    let width = char_len(&top).max(char_len(&bottom));
    pad_to(&mut top, width);
    pad_to(&mut bottom, width);

    MarqueePair { top, bottom }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Append `blanks + s` as many whole times as fit in the gap to `target`.
fn repeat_towards(s: &mut String, target: usize, spacer: usize) {
    let len = char_len(s);
    if target <= len {
        return;
    }
    let times = (target - len) / (len + spacer).max(1);
    if times == 0 {
        return;
    }
    let unit = format!("{}{}", " ".repeat(spacer), s);
    s.push_str(&unit.repeat(times));
}

fn append_copy(s: &mut String, blanks: usize) {
    let copy = s.clone();
    s.push_str(&" ".repeat(blanks));
    s.push_str(&copy);
}

fn pad_to(s: &mut String, width: usize) {
    let len = char_len(s);
    if len < width {
        s.push_str(&" ".repeat(width - len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariant(pair: &MarqueePair, spacer: usize) {
        assert_eq!(
            char_len(&pair.top),
            char_len(&pair.bottom),
            "unequal: {:?}",
            pair
        );
        assert!(pair.len() >= spacer, "too short: {:?}", pair);
    }

    #[test]
    fn test_short_inputs_pad_to_spacer() {
        let pair = format("Hi", "Bob", 5);
        assert_eq!(pair.top, "Hi   ");
        assert_eq!(pair.bottom, "Bob  ");
    }

    #[test]
    fn test_wide_gap_pads_shorter() {
        let pair = format("Hello World", "Adele", 5);
        assert_eq!(pair.top, "Hello World");
        assert_eq!(pair.bottom, "Adele      ");
    }

    #[test]
    fn test_short_line_repeats_itself() {
        let title = "A much longer song title";
        let pair = format(title, "Me", 5);
        assert_eq!(pair.top, format!("{title}     {title}"));
        assert_eq!(pair.len(), 53);
        assert!(pair.bottom.starts_with("Me     Me     Me     Me      Me"));
        // Second copies start on the same column.
        assert_eq!(&pair.top[29..33], "A mu");
        assert_eq!(&pair.bottom[29..31], "Me");
    }

    #[test]
    fn test_close_lengths_get_aligned_second_copy() {
        let pair = format("Hello", "World!", 5);
        assert_eq!(pair.top, "Hello      Hello ");
        assert_eq!(pair.bottom, "World!     World!");
    }

    #[test]
    fn test_equal_lengths_unchanged() {
        let pair = format("Sunday", "Monday", 5);
        assert_eq!(pair.top, "Sunday");
        assert_eq!(pair.bottom, "Monday");
    }

    #[test]
    fn test_empty_secondary() {
        let pair = format("Interlude", "", 5);
        assert_invariant(&pair, 5);
        assert!(pair.bottom.trim().is_empty());
        assert!(pair.top.starts_with("Interlude"));
    }

    #[test]
    fn test_both_empty() {
        let pair = format("", "", 5);
        assert_eq!(pair.top, "     ");
        assert_eq!(pair.bottom, "     ");
    }

    #[test]
    fn test_invariant_over_samples() {
        let samples = [
            "",
            "X",
            "Yo",
            "Intro",
            "Beyoncé",
            "Song 2",
            "Tame Impala, Rihanna",
            "The Less I Know The Better",
            "Bohemian Rhapsody - Remastered 2011",
            "Sigur Rós, Jónsi, Alex Somers, and a few more collaborators",
        ];
        for spacer in [1, 3, 5, 8] {
            for a in samples {
                for b in samples {
                    assert_invariant(&format(a, b, spacer), spacer);
                }
            }
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let pair = format("Café", "Ünïcödé", 5);
        assert_invariant(&pair, 5);
        assert_eq!(pair.len(), char_len(&pair.bottom));
    }
}
