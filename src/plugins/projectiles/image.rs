//! Image-silhouette patterns.
//!
//! A bitmap is sampled on a stride grid once, on first use, and the resulting
//! offsets are shared by every shot of that pattern afterwards. This is the
//! only up-front cost the engine accepts; sampling per shot would scale with
//! image size.

use std::sync::{Arc, OnceLock};

use bevy::image::Image;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::pattern::MIN_SAMPLE_STEP;

/// Channel value above which a pixel counts as background.
const BACKGROUND_LEVEL: f32 = 0.7;

/// Row-major RGBA pixels with row 0 at the bottom (y grows upwards, like world space).
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBitmap {
    width: u32,
    height: u32,
    pixels: Vec<Srgba>,
}

impl PatternBitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<Srgba>) -> Option<Self> {
        (pixels.len() == (width as usize) * (height as usize)).then_some(Self { width, height, pixels })
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Srgba) -> Self {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self { width, height, pixels }
    }

    /// Convert a loaded Bevy image. Images store their top row first, so rows are flipped.
    pub fn from_image(image: &Image) -> Option<Self> {
        let (w, h) = (image.width(), image.height());
        let mut pixels = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                let c = image.get_color_at(x, h - 1 - y).ok()?;
                pixels.push(c.to_srgba());
            }
        }
        Some(Self { width: w, height: h, pixels })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Srgba {
        self.pixels[(y * self.width + x) as usize]
    }
}

/// Dark, opaque pixels are the silhouette; light or transparent ones are background.
#[inline]
pub fn is_foreground(c: Srgba) -> bool {
    c.alpha > 0.5 && c.red <= BACKGROUND_LEVEL && c.green <= BACKGROUND_LEVEL && c.blue <= BACKGROUND_LEVEL
}

/// Offsets (relative to the footprint centre) of every foreground pixel on the stride grid.
///
/// Pixel coordinates are normalized by the bitmap width and scaled to `footprint`,
/// so the silhouette keeps its aspect ratio.
pub fn sample_silhouette(bitmap: &PatternBitmap, step_x: u32, step_y: u32, footprint: f32) -> Vec<Vec2> {
    let (w, h) = (bitmap.width(), bitmap.height());
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let step_x = step_x.max(MIN_SAMPLE_STEP) as usize;
    let step_y = step_y.max(MIN_SAMPLE_STEP) as usize;
    let centre = Vec2::new((w / 2) as f32, (h / 2) as f32);
    let scale = footprint / w as f32;

    let mut out = Vec::new();
    for y in (0..h).step_by(step_y) {
        for x in (0..w).step_by(step_x) {
            if is_foreground(bitmap.pixel(x, y)) {
                out.push((Vec2::new(x as f32, y as f32) - centre) * scale);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePattern {
    pub step_x: u32,
    pub step_y: u32,
    /// World-space width the bitmap is stretched over.
    pub footprint: f32,
    #[serde(skip)]
    bitmap: Option<Arc<PatternBitmap>>,
    #[serde(skip)]
    offsets: OnceLock<Arc<[Vec2]>>,
}

impl Default for ImagePattern {
    fn default() -> Self {
        Self {
            step_x: 15,
            step_y: 15,
            footprint: 100.0,
            bitmap: None,
            offsets: OnceLock::new(),
        }
    }
}

impl ImagePattern {
    pub fn new(bitmap: Arc<PatternBitmap>, step_x: u32, step_y: u32, footprint: f32) -> Self {
        Self {
            step_x,
            step_y,
            footprint,
            bitmap: Some(bitmap),
            offsets: OnceLock::new(),
        }
    }

    /// Replace the bitmap and drop any offsets sampled from the previous one.
    pub fn set_bitmap(&mut self, bitmap: Arc<PatternBitmap>) {
        self.bitmap = Some(bitmap);
        self.offsets = OnceLock::new();
    }

    #[inline]
    pub fn bitmap(&self) -> Option<&Arc<PatternBitmap>> {
        self.bitmap.as_ref()
    }

    /// Cached silhouette offsets, sampled on first call. `None` when no bitmap is attached.
    pub fn offsets(&self) -> Option<&Arc<[Vec2]>> {
        let bitmap = self.bitmap.as_ref()?;
        Some(self.offsets.get_or_init(|| {
            sample_silhouette(bitmap, self.step_x, self.step_y, self.footprint).into()
        }))
    }
}
