//! Generated fallback artwork.
//!
//! Used when no skin directory is configured or a skin file is missing:
//! a speaker glyph with a growing number of sound waves for the
//! notification icon, and a rounded dark panel for the overlays.

use crate::osd::SkinImage;

/// Icon size in pixels.
pub const ICON_SIZE: u32 = 32;

/// Overlay panel size in pixels.
pub const PANEL_WIDTH: u32 = 220;
pub const PANEL_HEIGHT: u32 = 64;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const RED: [u8; 4] = [220, 60, 60, 255];

/// Generate one frame of the volume icon set.
///
/// Frame 0 is the silent speaker with a strike-through; the last frame
/// carries every sound wave.
pub fn generate_volume_icon(frame: usize, frames: usize) -> SkinImage {
    let size = ICON_SIZE as usize;
    let mut rgba = vec![0u8; size * size * 4];

    draw_speaker(&mut rgba, size);

    let max_waves = 3usize;
    let waves = if frames <= 1 {
        max_waves
    } else {
        (frame * max_waves + frames - 2) / (frames - 1)
    };

    if frame == 0 {
        draw_strike_through(&mut rgba, size, RED);
    } else {
        for wave in 1..=waves.min(max_waves) {
            draw_wave(&mut rgba, size, 4.0 + wave as f32 * 4.0);
        }
    }

    SkinImage {
        width: ICON_SIZE,
        height: ICON_SIZE,
        rgba,
    }
}

/// Generate an overlay background panel. The mute variant carries a
/// crossed-out speaker in its centre.
pub fn generate_background(muted: bool) -> SkinImage {
    let (w, h) = (PANEL_WIDTH as usize, PANEL_HEIGHT as usize);
    let mut rgba = vec![0u8; w * h * 4];
    let radius = 12.0f32;

    for y in 0..h {
        for x in 0..w {
            // Distance outside the inner rectangle decides the rounded corners
            let dx = (radius - x as f32).max(x as f32 - (w as f32 - 1.0 - radius)).max(0.0);
            let dy = (radius - y as f32).max(y as f32 - (h as f32 - 1.0 - radius)).max(0.0);
            let dist = (dx * dx + dy * dy).sqrt();
            let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if coverage > 0.0 {
                let idx = (y * w + x) * 4;
                rgba[idx..idx + 4].copy_from_slice(&[24, 24, 24, (200.0 * coverage) as u8]);
            }
        }
    }

    if muted {
        let glyph = generate_volume_icon(0, 2);
        let left = (w - ICON_SIZE as usize) / 2;
        let top = (h - ICON_SIZE as usize) / 2;
        for gy in 0..ICON_SIZE as usize {
            for gx in 0..ICON_SIZE as usize {
                let src = (gy * ICON_SIZE as usize + gx) * 4;
                if glyph.rgba[src + 3] > 0 {
                    let dst = ((top + gy) * w + left + gx) * 4;
                    rgba[dst..dst + 4].copy_from_slice(&glyph.rgba[src..src + 4]);
                }
            }
        }
    }

    SkinImage {
        width: PANEL_WIDTH,
        height: PANEL_HEIGHT,
        rgba,
    }
}

fn put(rgba: &mut [u8], size: usize, x: usize, y: usize, color: [u8; 4]) {
    if x < size && y < size {
        let idx = (y * size + x) * 4;
        rgba[idx..idx + 4].copy_from_slice(&color);
    }
}

/// Speaker body and cone on the left half of the icon.
fn draw_speaker(rgba: &mut [u8], size: usize) {
    let mid = size / 2;

    // Body
    for y in (mid - 4)..(mid + 4) {
        for x in 4..10 {
            put(rgba, size, x, y, WHITE);
        }
    }

    // Cone widens one pixel per column
    for (i, x) in (10..16).enumerate() {
        for y in (mid - 5 - i)..(mid + 5 + i) {
            put(rgba, size, x, y, WHITE);
        }
    }
}

/// Quarter-circle arc to the right of the cone.
fn draw_wave(rgba: &mut [u8], size: usize, radius: f32) {
    let cx = 14.0f32;
    let cy = size as f32 / 2.0;

    for y in 0..size {
        for x in 16..size {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if (dist - radius).abs() < 1.0 && dx > dy.abs() * 0.6 {
                put(rgba, size, x, y, WHITE);
            }
        }
    }
}

/// Diagonal strike-through across the whole icon.
fn draw_strike_through(rgba: &mut [u8], size: usize, color: [u8; 4]) {
    let thickness = 2;

    for i in 4..(size - 4) {
        for t in 0..thickness {
            put(rgba, size, i, i + t, color);
        }
    }
}
