use marquee_proto::marquee::MarqueePair;
use marquee_proto::scroll::ScrollState;

use crate::thumbnail::Thumbnail;

/// One scrolling line of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub scroll: ScrollState,
}

impl Label {
    pub fn new(text: String) -> Self {
        let scroll = ScrollState::new(text.chars().count());
        Self { text, scroll }
    }

    pub fn empty() -> Self {
        Self::new(String::new())
    }
}

/// Everything drawn on the panel for one status. Text and thumbnail are always
/// replaced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub top_label: Label,
    pub bottom_label: Label,
    pub thumbnail: Thumbnail,
    /// Draws the alert marker over the thumbnail.
    pub alert: bool,
}

impl DisplayFrame {
    pub fn new(text: MarqueePair, thumbnail: Thumbnail) -> Self {
        Self {
            top_label: Label::new(text.top),
            bottom_label: Label::new(text.bottom),
            thumbnail,
            alert: false,
        }
    }

    pub fn with_alert(mut self, alert: bool) -> Self {
        self.alert = alert;
        self
    }

    /// Blank text over the given thumbnail.
    pub fn idle(thumbnail: Thumbnail) -> Self {
        Self {
            top_label: Label::empty(),
            bottom_label: Label::empty(),
            thumbnail,
            alert: false,
        }
    }

    /// Advance both labels one tick. True when either wrapped around.
    pub fn advance(&mut self) -> bool {
        let top = self.top_label.scroll.step();
        let bottom = self.bottom_label.scroll.step();
        top.is_complete() || bottom.is_complete()
    }
}
