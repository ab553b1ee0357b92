//! Album-art thumbnail: fetch, decode, downsample.
//!
//! The status payload points at a 64x64 JPEG. It is decoded to RGB565 and
//! decimated to the 32x32 thumbnail region by keeping one fixed sample of
//! every 2x2 block. No filtering is applied, so the output is a pure function
//! of the decoded pixels and the corner choice.

use std::path::Path;

use marquee_proto::error::{Error, Result};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::http::network;

pub const SOURCE_SIZE: u32 = 64;
pub const THUMBNAIL_SIZE: u32 = 32;

/// Row-major RGB565 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
}

impl Bitmap {
    pub fn filled(width: u32, height: u32, color: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: u16) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// `(x, y, rgb565)` for every pixel, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, u16)> + '_ {
        let w = self.width;
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, &c)| (i as u32 % w, i as u32 / w, c))
    }
}

/// The 32x32 image shown in the left region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bitmap: Bitmap,
    pub placeholder: bool,
}

impl Thumbnail {
    pub fn solid(color: u16) -> Self {
        Self {
            bitmap: Bitmap::filled(THUMBNAIL_SIZE, THUMBNAIL_SIZE, color),
            placeholder: true,
        }
    }

    /// Placeholder from an image file, or a solid fill when the file is
    /// missing, unreadable, or not 32x32.
    pub fn placeholder(path: Option<&Path>, fill: u16) -> Self {
        let Some(path) = path else {
            return Self::solid(fill);
        };
        match image::open(path) {
            Ok(img) if img.width() == THUMBNAIL_SIZE && img.height() == THUMBNAIL_SIZE => Self {
                bitmap: to_rgb565(&img.to_rgb8()),
                placeholder: true,
            },
            Ok(img) => {
                warn!(
                    "placeholder {:?} is {}x{}, expected {}x{}",
                    path,
                    img.width(),
                    img.height(),
                    THUMBNAIL_SIZE,
                    THUMBNAIL_SIZE
                );
                Self::solid(fill)
            }
            Err(e) => {
                warn!("placeholder {:?} unreadable: {}", path, e);
                Self::solid(fill)
            }
        }
    }
}

/// Which sample of each 2x2 block survives downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    x: u32,
    y: u32,
}

impl Corner {
    pub const TOP_LEFT: Corner = Corner { x: 0, y: 0 };

    pub fn new(x: u8, y: u8) -> Option<Self> {
        (x <= 1 && y <= 1).then_some(Self {
            x: u32::from(x),
            y: u32::from(y),
        })
    }
}

impl Default for Corner {
    fn default() -> Self {
        Self::TOP_LEFT
    }
}

pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r) & 0xF8) << 8 | (u16::from(g) & 0xFC) << 3 | u16::from(b) >> 3
}

fn to_rgb565(img: &image::RgbImage) -> Bitmap {
    let mut bitmap = Bitmap::filled(img.width(), img.height(), 0);
    for (x, y, px) in img.enumerate_pixels() {
        bitmap.set(x, y, rgb565(px[0], px[1], px[2]));
    }
    bitmap
}

/// Decode a 64x64 JPEG into RGB565.
pub fn decode(bytes: &[u8]) -> Result<Bitmap> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
        .map_err(|e| Error::Decode(format!("thumbnail: {}", e)))?;
    if img.width() != SOURCE_SIZE || img.height() != SOURCE_SIZE {
        return Err(Error::Decode(format!(
            "thumbnail is {}x{}, expected {}x{}",
            img.width(),
            img.height(),
            SOURCE_SIZE,
            SOURCE_SIZE
        )));
    }
    Ok(to_rgb565(&img.to_rgb8()))
}

/// Halve each axis, keeping the `corner` sample of every 2x2 block.
pub fn downsample(src: &Bitmap, corner: Corner) -> Bitmap {
    let mut dst = Bitmap::filled(src.width() / 2, src.height() / 2, 0);
    for y in (0..src.height() - 1).step_by(2) {
        for x in (0..src.width() - 1).step_by(2) {
            dst.set(x / 2, y / 2, src.get(x + corner.x, y + corner.y));
        }
    }
    dst
}

/// Fetches and prepares thumbnails by URL.
pub trait ThumbnailSource {
    async fn fetch_and_decode(&self, url: &str) -> Result<Thumbnail>;
}

pub struct ThumbnailPipeline {
    http: Client,
    corner: Corner,
}

impl ThumbnailPipeline {
    pub fn new(http: Client, corner: Corner) -> Self {
        Self { http, corner }
    }
}

impl ThumbnailSource for ThumbnailPipeline {
    async fn fetch_and_decode(&self, url: &str) -> Result<Thumbnail> {
        let response = self.http.get(url).send().await.map_err(network)?;
        if response.status() != StatusCode::OK {
            return Err(Error::UnexpectedStatus(response.status().as_u16()));
        }
        let bytes = response.bytes().await.map_err(network)?;
        debug!("thumbnail: {} bytes from {}", bytes.len(), url);

        let source = decode(&bytes)?;
        Ok(Thumbnail {
            bitmap: downsample(&source, self.corner),
            placeholder: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{jpeg, serve};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::Router;

    /// Every pixel encodes its own coordinates.
    fn coordinate_pattern() -> Bitmap {
        let mut src = Bitmap::filled(SOURCE_SIZE, SOURCE_SIZE, 0);
        for y in 0..SOURCE_SIZE {
            for x in 0..SOURCE_SIZE {
                src.set(x, y, (y * SOURCE_SIZE + x) as u16);
            }
        }
        src
    }

    #[test]
    fn test_downsample_top_left() {
        let src = coordinate_pattern();
        let dst = downsample(&src, Corner::TOP_LEFT);
        assert_eq!((dst.width(), dst.height()), (THUMBNAIL_SIZE, THUMBNAIL_SIZE));
        for (x, y, c) in dst.iter() {
            assert_eq!(c, src.get(2 * x, 2 * y));
        }
    }

    #[test]
    fn test_downsample_bottom_right_changes_every_pixel() {
        let src = coordinate_pattern();
        let tl = downsample(&src, Corner::TOP_LEFT);
        let br = downsample(&src, Corner::new(1, 1).unwrap());
        for (x, y, c) in br.iter() {
            assert_eq!(c, src.get(2 * x + 1, 2 * y + 1));
            assert_ne!(c, tl.get(x, y));
        }
    }

    #[test]
    fn test_downsample_checkerboard_corners() {
        // Each 2x2 block: TL red, TR green, BL blue, BR white.
        let (red, green, blue, white) = (0xF800, 0x07E0, 0x001F, 0xFFFF);
        let mut src = Bitmap::filled(SOURCE_SIZE, SOURCE_SIZE, 0);
        for y in 0..SOURCE_SIZE {
            for x in 0..SOURCE_SIZE {
                let c = match (x % 2, y % 2) {
                    (0, 0) => red,
                    (1, 0) => green,
                    (0, 1) => blue,
                    _ => white,
                };
                src.set(x, y, c);
            }
        }
        let pick = |cx, cy| downsample(&src, Corner::new(cx, cy).unwrap());
        assert!(pick(0, 0).iter().all(|(_, _, c)| c == red));
        assert!(pick(1, 0).iter().all(|(_, _, c)| c == green));
        assert!(pick(0, 1).iter().all(|(_, _, c)| c == blue));
        assert!(pick(1, 1).iter().all(|(_, _, c)| c == white));
    }

    #[test]
    fn test_corner_bounds() {
        assert!(Corner::new(1, 1).is_some());
        assert!(Corner::new(2, 0).is_none());
        assert_eq!(Corner::default(), Corner::TOP_LEFT);
    }

    #[test]
    fn test_rgb565_packing() {
        assert_eq!(rgb565(255, 0, 0), 0xF800);
        assert_eq!(rgb565(0, 255, 0), 0x07E0);
        assert_eq!(rgb565(0, 0, 255), 0x001F);
        assert_eq!(rgb565(0x91, 0x94, 0x92), 0x94B2);
    }

    #[test]
    fn test_decode_checks_dimensions() {
        let ok = decode(&jpeg(64, 64, [0, 0, 0])).unwrap();
        assert_eq!((ok.width(), ok.height()), (64, 64));

        assert!(matches!(decode(&jpeg(48, 48, [0, 0, 0])), Err(Error::Decode(_))));
        assert!(matches!(decode(b"not an image"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_placeholder_falls_back_to_fill() {
        let missing = Thumbnail::placeholder(Some(Path::new("/nonexistent/fill.bmp")), 0x1234);
        assert_eq!(missing, Thumbnail::solid(0x1234));
        assert!(missing.placeholder);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fill.png");
        image::RgbImage::from_pixel(32, 32, image::Rgb([0, 0, 255]))
            .save(&path)
            .unwrap();
        let loaded = Thumbnail::placeholder(Some(&path), 0);
        assert!(loaded.bitmap.iter().all(|(_, _, c)| c == 0x001F));
    }

    #[tokio::test]
    async fn test_fetch_and_decode() {
        let art = jpeg(64, 64, [0, 0, 0]);
        let app = Router::new()
            .route("/64.jpg", get(move || async move { art }))
            .route("/gone.jpg", get(|| async { AxumStatus::NOT_FOUND }));
        let base = serve(app).await;
        let pipeline = ThumbnailPipeline::new(Client::new(), Corner::TOP_LEFT);

        let thumb = pipeline
            .fetch_and_decode(&format!("{}/64.jpg", base))
            .await
            .unwrap();
        assert!(!thumb.placeholder);
        assert_eq!(thumb.bitmap.width(), THUMBNAIL_SIZE);
        assert!(thumb.bitmap.iter().all(|(_, _, c)| c == 0));

        let err = pipeline
            .fetch_and_decode(&format!("{}/gone.jpg", base))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus(404)));
    }
}
