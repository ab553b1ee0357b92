//! Per-label horizontal scroll state.
//!
//! A label starts at offset 0 (its left edge on the right border of the text
//! region) and moves one pixel left per tick. Once it has travelled its own
//! rendered width plus the region width it is fully off-screen, the offset
//! snaps back to 0, and that tick reports [`Phase::LoopComplete`].

/// Advance of one glyph of the panel font, in pixels.
pub const GLYPH_WIDTH: i32 = 6;

/// Width of the text region the labels scroll across, in pixels.
pub const SCROLL_REGION_WIDTH: i32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scrolling,
    /// The label just wrapped back to offset 0.
    LoopComplete,
}

impl Phase {
    pub fn is_complete(self) -> bool {
        self == Phase::LoopComplete
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollState {
    offset: i32,
    text_pixel_width: i32,
    display_width: i32,
}

impl ScrollState {
    /// Scroll state for a label of `text_len` characters in the panel font.
    pub fn new(text_len: usize) -> Self {
        Self::with_geometry(text_len, GLYPH_WIDTH, SCROLL_REGION_WIDTH)
    }

    pub fn with_geometry(text_len: usize, glyph_width: i32, display_width: i32) -> Self {
        let chars = i32::try_from(text_len).unwrap_or(i32::MAX / glyph_width.max(1));
        Self {
            offset: 0,
            text_pixel_width: chars.saturating_mul(glyph_width),
            display_width,
        }
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn text_pixel_width(&self) -> i32 {
        self.text_pixel_width
    }

    /// Ticks in one full loop.
    pub fn loop_length(&self) -> i32 {
        self.text_pixel_width.saturating_add(self.display_width).max(1)
    }

    /// Move one pixel left.
    pub fn step(&mut self) -> Phase {
        self.offset -= 1;
        if self.offset <= -self.loop_length() {
            self.offset = 0;
            Phase::LoopComplete
        } else {
            Phase::Scrolling
        }
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_takes_width_plus_display_ticks() {
        let mut state = ScrollState::new(10);
        assert_eq!(state.text_pixel_width(), 60);

        let mut ticks = 0;
        loop {
            ticks += 1;
            if state.step().is_complete() {
                break;
            }
            assert!(ticks < 10_000, "never completed");
        }
        assert_eq!(ticks, 60 + 32);
        assert_eq!(state.offset(), 0);
    }

    #[test]
    fn test_offset_decrements_one_pixel_per_tick() {
        let mut state = ScrollState::with_geometry(3, 6, 32);
        assert_eq!(state.step(), Phase::Scrolling);
        assert_eq!(state.step(), Phase::Scrolling);
        assert_eq!(state.offset(), -2);
    }

    #[test]
    fn test_restarts_after_completion() {
        let mut state = ScrollState::with_geometry(1, 2, 3);
        let phases: Vec<Phase> = (0..10).map(|_| state.step()).collect();
        let completions: Vec<usize> = phases
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_complete())
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(completions, vec![5, 10]);
    }

    #[test]
    fn test_reset() {
        let mut state = ScrollState::new(4);
        state.step();
        state.reset();
        assert_eq!(state.offset(), 0);
    }
}
