//! Panel drawing.
//!
//! The controller only needs three primitives (filled shape, text, image) and
//! a way to push the finished frame out. [`Framebuffer`] provides them on top
//! of `embedded-graphics`, keeping a 64x32 RGB565 buffer that is written to a
//! framebuffer device on [`DisplayBackend::present`].

use std::convert::Infallible;
use std::path::PathBuf;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use marquee_proto::platform::{PANEL_HEIGHT, PANEL_WIDTH, THUMBNAIL_REGION};

use crate::frame::DisplayFrame;
use crate::thumbnail::{rgb565, Bitmap};

/// Vertical centre of the two text lines.
const TOP_LINE_Y: i32 = 10;
const BOTTOM_LINE_Y: i32 = 22;

/// Service-alert marker, top left of the thumbnail region.
const ALERT_CENTER: Point = Point::new(5, 8);
const ALERT_DIAMETER: u32 = 5;
const ALERT_COLOR: u32 = 0xB22222;

pub trait DisplayBackend {
    fn draw_shape(&mut self, area: Rectangle, color: Rgb565);
    fn draw_text(&mut self, text: &str, origin: Point, color: Rgb565);
    fn draw_image(&mut self, bitmap: &Bitmap, top_left: Point);
    fn draw_dot(&mut self, center: Point, diameter: u32, color: Rgb565);
    fn present(&mut self) -> std::io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub text: Rgb565,
    pub background: Rgb565,
}

impl Palette {
    pub fn from_rgb888(text: u32, background: u32) -> Self {
        Self {
            text: color(text),
            background: color(background),
        }
    }
}

/// `0xRRGGBB` to the panel's colour type.
pub fn color(rgb: u32) -> Rgb565 {
    let [_, r, g, b] = rgb.to_be_bytes();
    Rgb565::from(RawU16::new(rgb565(r, g, b)))
}

fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
}

/// Draw `frame` in panel order: text, background borders, thumbnail,
/// thumbnail frame.
pub fn render<B: DisplayBackend>(backend: &mut B, frame: &DisplayFrame, palette: Palette) {
    let panel_w = PANEL_WIDTH as i32;
    let bg = palette.background;

    backend.draw_shape(rect(0, 0, PANEL_WIDTH, PANEL_HEIGHT), bg);

    backend.draw_text(
        &frame.top_label.text,
        Point::new(panel_w + frame.top_label.scroll.offset(), TOP_LINE_Y),
        palette.text,
    );
    backend.draw_text(
        &frame.bottom_label.text,
        Point::new(panel_w + frame.bottom_label.scroll.offset(), BOTTOM_LINE_Y),
        palette.text,
    );

    // Mask text that has scrolled past the text region.
    backend.draw_shape(rect(0, 0, THUMBNAIL_REGION, PANEL_HEIGHT), bg);
    backend.draw_shape(rect(panel_w - 2, 0, 2, PANEL_HEIGHT), bg);

    backend.draw_image(&frame.thumbnail.bitmap, Point::zero());

    backend.draw_shape(rect(0, 0, PANEL_WIDTH, 2), bg);
    backend.draw_shape(rect(0, PANEL_HEIGHT as i32 - 2, PANEL_WIDTH, 2), bg);
    backend.draw_shape(rect(0, 0, 2, PANEL_HEIGHT), bg);
    backend.draw_shape(rect(THUMBNAIL_REGION as i32 - 2, 0, 2, PANEL_HEIGHT), bg);

    if frame.alert {
        backend.draw_dot(ALERT_CENTER, ALERT_DIAMETER, color(ALERT_COLOR));
    }
}

pub fn blank<B: DisplayBackend>(backend: &mut B, palette: Palette) {
    backend.draw_shape(rect(0, 0, PANEL_WIDTH, PANEL_HEIGHT), palette.background);
}

// ── framebuffer backend ───────────────────────────────────────────────────────

/// In-memory panel image flushed as little-endian RGB565 to `path`.
pub struct Framebuffer {
    path: PathBuf,
    pixels: Vec<u16>,
}

impl Framebuffer {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            pixels: vec![0; (PANEL_WIDTH * PANEL_HEIGHT) as usize],
        }
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> u16 {
        self.pixels[(y * PANEL_WIDTH + x) as usize]
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        for Pixel(p, c) in pixels {
            if p.x < 0 || p.y < 0 {
                continue;
            }
            let (x, y) = (p.x as u32, p.y as u32);
            if x >= PANEL_WIDTH || y >= PANEL_HEIGHT {
                continue;
            }
            self.pixels[(y * PANEL_WIDTH + x) as usize] = c.into_storage();
        }
        Ok(())
    }
}

impl DisplayBackend for Framebuffer {
    fn draw_shape(&mut self, area: Rectangle, color: Rgb565) {
        area.into_styled(PrimitiveStyle::with_fill(color))
            .draw(self)
            .ok();
    }

    fn draw_text(&mut self, text: &str, origin: Point, color: Rgb565) {
        let style = MonoTextStyle::new(&FONT_6X10, color);
        Text::with_baseline(text, origin, style, Baseline::Middle)
            .draw(self)
            .ok();
    }

    fn draw_image(&mut self, bitmap: &Bitmap, top_left: Point) {
        let pixels = bitmap.iter().map(|(x, y, c)| {
            Pixel(
                top_left + Point::new(x as i32, y as i32),
                Rgb565::from(RawU16::new(c)),
            )
        });
        self.draw_iter(pixels).ok();
    }

    fn draw_dot(&mut self, center: Point, diameter: u32, color: Rgb565) {
        Circle::with_center(center, diameter)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(self)
            .ok();
    }

    fn present(&mut self) -> std::io::Result<()> {
        std::fs::write(&self.path, self.to_bytes())
    }
}
