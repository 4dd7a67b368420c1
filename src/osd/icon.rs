//! Notification icon contract and the level-to-frame mapping.

use super::skin::SkinImage;
use thiserror::Error;

/// Notification icon error types.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("Failed to update icon: {0}")]
    UpdateFailed(String),

    #[error("Failed to set tooltip: {0}")]
    TooltipFailed(String),
}

/// The notification area icon.
pub trait NotifyIcon {
    fn set_image(&mut self, image: &SkinImage) -> Result<(), IconError>;
    fn set_tooltip(&mut self, text: &str) -> Result<(), IconError>;

    /// Remove the icon from the notification area.
    fn remove(&mut self);
}

/// Frame index for the current level. Muted always maps to frame 0.
pub fn icon_index(volume: f32, muted: bool, count: usize) -> usize {
    if muted || count == 0 {
        return 0;
    }
    let last = count - 1;
    let index = (volume.clamp(0.0, 1.0) * last as f32).ceil() as usize;
    index.min(last)
}

/// Tooltip text, e.g. `"Speakers: 47%"` or `"Speakers: Muted"`.
pub fn tooltip_text(description: &str, volume: f32, muted: bool) -> String {
    if muted {
        format!("{}: Muted", description)
    } else {
        let percent = (volume.clamp(0.0, 1.0) * 100.0) as u32;
        format!("{}: {}%", description, percent)
    }
}

/// What was last rendered to the icon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconState {
    pub last_index: Option<usize>,
    pub tooltip: String,
}

impl IconState {
    /// Push the current level to the icon. The image is only re-sent when
    /// the frame index changes; the tooltip is re-sent every time.
    pub fn update(
        &mut self,
        icon: &mut dyn NotifyIcon,
        frames: &[SkinImage],
        description: &str,
        volume: f32,
        muted: bool,
    ) -> Result<(), IconError> {
        let index = icon_index(volume, muted, frames.len());
        if self.last_index != Some(index) {
            if let Some(frame) = frames.get(index) {
                icon.set_image(frame)?;
                self.last_index = Some(index);
            }
        }

        self.tooltip = tooltip_text(description, volume, muted);
        icon.set_tooltip(&self.tooltip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osd::testing::{FakeIcon, IconCall};

    fn frames(count: usize) -> Vec<SkinImage> {
        (0..count).map(|i| SkinImage::blank(i as u32 + 1, 1)).collect()
    }

    #[test]
    fn index_covers_full_range() {
        assert_eq!(icon_index(0.0, false, 5), 0);
        assert_eq!(icon_index(0.01, false, 5), 1);
        assert_eq!(icon_index(0.5, false, 5), 2);
        assert_eq!(icon_index(1.0, false, 5), 4);
    }

    #[test]
    fn index_is_non_decreasing_in_level() {
        let mut previous = 0;
        for step in 0..=100 {
            let index = icon_index(step as f32 / 100.0, false, 7);
            assert!(index >= previous);
            previous = index;
        }
        assert_eq!(previous, 6);
    }

    #[test]
    fn mute_forces_first_frame() {
        assert_eq!(icon_index(0.8, true, 5), 0);
        assert_eq!(icon_index(1.0, true, 5), 0);
    }

    #[test]
    fn index_without_frames_is_zero() {
        assert_eq!(icon_index(0.7, false, 0), 0);
        assert_eq!(icon_index(0.7, false, 1), 0);
    }

    #[test]
    fn tooltip_formats() {
        assert_eq!(tooltip_text("Speakers", 0.47, false), "Speakers: 47%");
        assert_eq!(tooltip_text("Speakers", 0.47, true), "Speakers: Muted");
        assert_eq!(tooltip_text("Headset", 0.999, false), "Headset: 99%");
        assert_eq!(tooltip_text("Headset", 1.0, false), "Headset: 100%");
    }

    #[test]
    fn tooltip_percentage_truncates() {
        assert_eq!(tooltip_text("Speakers", 0.476, false), "Speakers: 47%");
        assert_eq!(tooltip_text("Speakers", 0.995, false), "Speakers: 99%");
        assert_eq!(tooltip_text("Speakers", 0.004, false), "Speakers: 0%");
    }

    #[test]
    fn unchanged_index_does_not_resend_image() {
        let icon = FakeIcon::default();
        let mut handle = icon.clone();
        let frames = frames(5);
        let mut state = IconState::default();

        state.update(&mut handle, &frames, "Speakers", 0.47, false).unwrap();
        state.update(&mut handle, &frames, "Speakers", 0.48, false).unwrap();

        let calls = icon.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, IconCall::Image(_))).count(), 1);
        assert_eq!(
            calls.last(),
            Some(&IconCall::Tooltip("Speakers: 48%".to_string()))
        );
        assert_eq!(state.last_index, Some(2));
    }

    #[test]
    fn mute_toggle_resends_image() {
        let icon = FakeIcon::default();
        let mut handle = icon.clone();
        let frames = frames(5);
        let mut state = IconState::default();

        state.update(&mut handle, &frames, "Speakers", 0.47, false).unwrap();
        state.update(&mut handle, &frames, "Speakers", 0.47, true).unwrap();

        let calls = icon.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, IconCall::Image(_))).count(), 2);
        assert_eq!(state.tooltip, "Speakers: Muted");
        assert_eq!(state.last_index, Some(0));
    }

    #[test]
    fn empty_frame_set_still_sets_tooltip() {
        let icon = FakeIcon::default();
        let mut handle = icon.clone();
        let mut state = IconState::default();

        state.update(&mut handle, &[], "Speakers", 0.3, false).unwrap();

        assert_eq!(icon.calls(), vec![IconCall::Tooltip("Speakers: 30%".to_string())]);
        assert_eq!(state.last_index, None);
    }
}
