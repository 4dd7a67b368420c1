//! Skin assets: overlay backgrounds, meters and notification icon frames.
//!
//! `DirectorySkin` reads PNG files from a skin directory laid out as
//!
//! ```text
//! <skin>/<category>/background.png
//! <skin>/<category>/icons/*.png      (frames, sorted by file name)
//! ```
//!
//! and falls back to generated artwork for anything missing.

use crate::display::Rect;
use crate::platform::icons;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Skin category for the volume level overlay and icon set.
pub const VOLUME: &str = "volume";

/// Skin category for the mute overlay.
pub const MUTE: &str = "mute";

/// Number of frames in the generated volume icon set.
pub const GENERATED_ICON_FRAMES: usize = 5;

/// Skin loading error types.
#[derive(Debug, Error)]
pub enum SkinError {
    #[error("Failed to read skin directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image has invalid dimensions")]
    InvalidImage,
}

/// Straight-alpha RGBA bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SkinImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, SkinError> {
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return Err(SkinError::InvalidImage);
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Fully transparent image.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Decode a PNG from disk.
    pub fn load(path: &Path) -> Result<Self, SkinError> {
        let decoded = image::open(path).map_err(|source| SkinError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    /// Pixel data as premultiplied BGRA, the layout layered windows expect.
    pub fn premultiplied_bgra(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rgba.len());
        for px in self.rgba.chunks_exact(4) {
            let a = px[3] as u32;
            let mul = |c: u8| ((c as u32 * a + 127) / 255) as u8;
            out.extend_from_slice(&[mul(px[2]), mul(px[1]), mul(px[0]), px[3]]);
        }
        out
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let src_a = color[3] as u32;
        let dst_a = self.rgba[idx + 3] as u32;
        let out_a = src_a + dst_a * (255 - src_a) / 255;
        if out_a == 0 {
            return;
        }
        for c in 0..3 {
            let src = color[c] as u32 * src_a;
            let dst = self.rgba[idx + c] as u32 * dst_a * (255 - src_a) / 255;
            self.rgba[idx + c] = ((src + dst) / out_a) as u8;
        }
        self.rgba[idx + 3] = out_a as u8;
    }
}

/// Direction a meter fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterKind {
    HorizontalBar,
    VerticalBar,
}

/// A level indicator drawn on top of an overlay background.
#[derive(Debug, Clone, PartialEq)]
pub struct Meter {
    pub kind: MeterKind,

    /// Position relative to the overlay window
    pub rect: Rect,

    /// Number of discrete steps (0 for a continuous fill)
    pub units: u32,

    /// Fill color (RGBA)
    pub color: [u8; 4],
}

impl Meter {
    /// Length in pixels of the filled part at `level`.
    pub fn filled_extent(&self, level: f32) -> i32 {
        let length = match self.kind {
            MeterKind::HorizontalBar => self.rect.width(),
            MeterKind::VerticalBar => self.rect.height(),
        };
        let mut level = level.clamp(0.0, 1.0);
        if self.units > 0 {
            level = (level * self.units as f32).ceil() / self.units as f32;
        }
        (length as f32 * level).round() as i32
    }

    /// Default bar layout for a background of the given size.
    pub fn default_bar(width: u32, height: u32) -> Self {
        let width = width as i32;
        let height = height as i32;
        let margin = width / 10;
        let bar_height = (height / 8).max(4);
        let top = height * 3 / 4 - bar_height / 2;
        Self {
            kind: MeterKind::HorizontalBar,
            rect: Rect::new(margin, top, width - margin, top + bar_height),
            units: 20,
            color: [255, 255, 255, 230],
        }
    }
}

/// Paint an overlay frame: background plus each meter filled to `level`.
pub fn compose_frame(background: &SkinImage, meters: &[Meter], level: f32) -> SkinImage {
    let mut frame = background.clone();

    for meter in meters {
        let extent = meter.filled_extent(level);
        let r = meter.rect;
        let filled = match meter.kind {
            MeterKind::HorizontalBar => Rect::new(r.left, r.top, r.left + extent, r.bottom),
            MeterKind::VerticalBar => Rect::new(r.left, r.bottom - extent, r.right, r.bottom),
        };
        for y in filled.top.max(0)..filled.bottom.max(0) {
            for x in filled.left.max(0)..filled.right.max(0) {
                frame.blend_pixel(x as u32, y as u32, meter.color);
            }
        }
    }

    frame
}

/// Source of overlay and icon artwork.
pub trait Skin {
    fn background_image(&self, category: &str) -> Option<SkinImage>;
    fn meters(&self, category: &str) -> Vec<Meter>;

    /// Notification icon frames, lowest level first.
    fn icon_frames(&self, category: &str) -> Vec<SkinImage>;
}

/// Skin backed by a directory of PNG files.
#[derive(Debug, Clone, Default)]
pub struct DirectorySkin {
    root: Option<PathBuf>,
}

impl DirectorySkin {
    /// Use the given directory, or generated artwork when `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        if let Some(ref dir) = root {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "Skin directory missing, using generated skin");
                return Self { root: None };
            }
            debug!(dir = %dir.display(), "Using skin directory");
        }
        Self { root }
    }

    fn category_dir(&self, category: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(category))
    }

    fn load_frames(dir: &Path) -> Result<Vec<SkinImage>, SkinError> {
        let entries = std::fs::read_dir(dir).map_err(|source| SkinError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        paths.iter().map(|p| SkinImage::load(p)).collect()
    }
}

impl Skin for DirectorySkin {
    fn background_image(&self, category: &str) -> Option<SkinImage> {
        if let Some(dir) = self.category_dir(category) {
            let path = dir.join("background.png");
            if path.is_file() {
                match SkinImage::load(&path) {
                    Ok(image) => return Some(image),
                    Err(e) => warn!("{}", e),
                }
            }
        }
        Some(icons::generate_background(category == MUTE))
    }

    fn meters(&self, category: &str) -> Vec<Meter> {
        if category != VOLUME {
            return Vec::new();
        }
        match self.background_image(category) {
            Some(bg) => vec![Meter::default_bar(bg.width, bg.height)],
            None => Vec::new(),
        }
    }

    fn icon_frames(&self, category: &str) -> Vec<SkinImage> {
        if let Some(dir) = self.category_dir(category) {
            let icons_dir = dir.join("icons");
            if icons_dir.is_dir() {
                match Self::load_frames(&icons_dir) {
                    Ok(frames) if !frames.is_empty() => return frames,
                    Ok(_) => warn!(dir = %icons_dir.display(), "Icon directory is empty"),
                    Err(e) => warn!("{}", e),
                }
            }
        }
        (0..GENERATED_ICON_FRAMES)
            .map(|frame| icons::generate_volume_icon(frame, GENERATED_ICON_FRAMES))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
        RgbaImage::from_pixel(width, height, Rgba(color))
            .save(path)
            .unwrap();
    }

    #[test]
    fn missing_directory_uses_generated_skin() {
        let skin = DirectorySkin::new(Some(PathBuf::from("/definitely/not/a/skin")));

        assert_eq!(skin.icon_frames(VOLUME).len(), GENERATED_ICON_FRAMES);
        assert!(skin.background_image(VOLUME).is_some());
        assert_eq!(skin.meters(VOLUME).len(), 1);
        assert!(skin.meters(MUTE).is_empty());
    }

    #[test]
    fn directory_frames_load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let icons_dir = dir.path().join(VOLUME).join("icons");
        std::fs::create_dir_all(&icons_dir).unwrap();
        write_png(&icons_dir.join("02.png"), 16, 16, [0, 0, 255, 255]);
        write_png(&icons_dir.join("00.png"), 16, 16, [255, 0, 0, 255]);
        write_png(&icons_dir.join("01.png"), 16, 16, [0, 255, 0, 255]);
        std::fs::write(icons_dir.join("notes.txt"), "not an icon").unwrap();

        let skin = DirectorySkin::new(Some(dir.path().to_path_buf()));
        let frames = skin.icon_frames(VOLUME);

        assert_eq!(frames.len(), 3);
        assert_eq!(&frames[0].rgba[..4], &[255, 0, 0, 255]);
        assert_eq!(&frames[2].rgba[..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn directory_background_sets_meter_layout() {
        let dir = tempfile::tempdir().unwrap();
        let volume_dir = dir.path().join(VOLUME);
        std::fs::create_dir_all(&volume_dir).unwrap();
        write_png(&volume_dir.join("background.png"), 200, 80, [20, 20, 20, 200]);

        let skin = DirectorySkin::new(Some(dir.path().to_path_buf()));
        let bg = skin.background_image(VOLUME).unwrap();
        let meters = skin.meters(VOLUME);

        assert_eq!((bg.width, bg.height), (200, 80));
        assert_eq!(meters[0].rect.left, 20);
        assert_eq!(meters[0].rect.right, 180);
    }

    #[test]
    fn corrupt_icons_fall_back_to_generated() {
        let dir = tempfile::tempdir().unwrap();
        let icons_dir = dir.path().join(VOLUME).join("icons");
        std::fs::create_dir_all(&icons_dir).unwrap();
        std::fs::write(icons_dir.join("00.png"), b"garbage").unwrap();

        let skin = DirectorySkin::new(Some(dir.path().to_path_buf()));
        assert_eq!(skin.icon_frames(VOLUME).len(), GENERATED_ICON_FRAMES);
    }

    #[test]
    fn meter_extent_rounds_up_to_whole_units() {
        let meter = Meter {
            kind: MeterKind::HorizontalBar,
            rect: Rect::new(0, 0, 100, 10),
            units: 10,
            color: [255, 255, 255, 255],
        };
        assert_eq!(meter.filled_extent(0.0), 0);
        assert_eq!(meter.filled_extent(0.41), 50);
        assert_eq!(meter.filled_extent(1.0), 100);
        assert_eq!(meter.filled_extent(3.0), 100);
    }

    #[test]
    fn compose_fills_meter_up_to_level() {
        let background = SkinImage::blank(10, 2);
        let meter = Meter {
            kind: MeterKind::HorizontalBar,
            rect: Rect::new(0, 0, 10, 1),
            units: 0,
            color: [255, 0, 0, 255],
        };

        let frame = compose_frame(&background, &[meter], 0.5);

        let px = |x: usize, y: usize| &frame.rgba[(y * 10 + x) * 4..(y * 10 + x) * 4 + 4];
        assert_eq!(px(4, 0), &[255, 0, 0, 255]);
        assert_eq!(px(5, 0), &[0, 0, 0, 0]);
        assert_eq!(px(0, 1), &[0, 0, 0, 0]);
    }

    #[test]
    fn premultiplied_bgra_swaps_channels() {
        let image = SkinImage::new(1, 1, vec![200, 100, 50, 128]).unwrap();
        let bgra = image.premultiplied_bgra();
        assert_eq!(bgra, vec![25, 50, 100, 128]);
    }

    #[test]
    fn image_size_must_match_buffer() {
        assert!(SkinImage::new(2, 2, vec![0; 15]).is_err());
    }
}
