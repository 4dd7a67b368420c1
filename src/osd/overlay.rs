//! Overlay window contract and the show/fade/hide state model.

use super::skin::{Meter, SkinImage};
use crate::display::WindowHandle;
use std::time::{Duration, Instant};

/// Animation played when an overlay hides on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideAnimation {
    None,
    FadeOut { duration: Duration },
}

impl HideAnimation {
    pub fn duration(&self) -> Duration {
        match self {
            HideAnimation::None => Duration::ZERO,
            HideAnimation::FadeOut { duration } => *duration,
        }
    }
}

/// A transient, topmost overlay surface.
///
/// Implementations own their timers: after `show` the window stays up for
/// the visible duration, then plays its hide animation.
pub trait OverlayWindow {
    fn show(&mut self);

    /// Hide the window. `immediate` skips the hide animation.
    fn hide(&mut self, immediate: bool);

    fn set_position(&mut self, x: i32, y: i32);
    fn set_meter_level(&mut self, level: f32);
    fn set_background_image(&mut self, image: &SkinImage);
    fn add_meter(&mut self, meter: Meter);
    fn set_hide_animation(&mut self, animation: HideAnimation);
    fn set_visible_duration(&mut self, duration: Duration);
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn handle(&self) -> WindowHandle;
}

/// The always-present interactive volume slider.
pub trait VolumeSlider {
    fn set_level(&mut self, level: f32);
    fn is_visible(&self) -> bool;
    fn show(&mut self);
}

/// Observable overlay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Hidden,
    Showing,
    FadingOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Hidden,
    Shown(Instant),
    Hiding(Instant),
}

/// An overlay window paired with a timestamp model of its state.
pub struct Overlay {
    window: Box<dyn OverlayWindow>,
    phase: Phase,
    visible_for: Duration,
    animation: HideAnimation,
}

impl Overlay {
    pub fn new(window: Box<dyn OverlayWindow>) -> Self {
        Self {
            window,
            phase: Phase::Hidden,
            visible_for: Duration::ZERO,
            animation: HideAnimation::None,
        }
    }

    /// Apply the timing configuration to both the model and the window.
    pub fn configure(&mut self, visible_for: Duration, animation: HideAnimation) {
        self.visible_for = visible_for;
        self.animation = animation;
        self.window.set_visible_duration(visible_for);
        self.window.set_hide_animation(animation);
    }

    /// Show, restarting the visible timer. A running fade is not waited on.
    pub fn show(&mut self, now: Instant) {
        self.phase = Phase::Shown(now);
        self.window.show();
    }

    /// Hide. Without `immediate` the window fades out first; an overlay that
    /// is already hidden or fading stays as it is.
    pub fn hide(&mut self, immediate: bool, now: Instant) {
        if immediate {
            self.phase = Phase::Hidden;
            self.window.hide(true);
            return;
        }
        if self.state_at(now) == OverlayState::Showing {
            self.phase = Phase::Hiding(now);
            self.window.hide(false);
        }
    }

    pub fn state_at(&self, now: Instant) -> OverlayState {
        let fade = self.animation.duration();
        match self.phase {
            Phase::Hidden => OverlayState::Hidden,
            Phase::Shown(at) => {
                let elapsed = now.saturating_duration_since(at);
                if elapsed < self.visible_for {
                    OverlayState::Showing
                } else if elapsed < self.visible_for + fade {
                    OverlayState::FadingOut
                } else {
                    OverlayState::Hidden
                }
            }
            Phase::Hiding(at) => {
                if now.saturating_duration_since(at) < fade {
                    OverlayState::FadingOut
                } else {
                    OverlayState::Hidden
                }
            }
        }
    }

    pub fn window(&self) -> &dyn OverlayWindow {
        self.window.as_ref()
    }

    pub fn window_mut(&mut self) -> &mut dyn OverlayWindow {
        self.window.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osd::testing::{FakeOverlay, WindowCall};

    const VISIBLE: Duration = Duration::from_millis(800);
    const FADE: Duration = Duration::from_millis(300);

    fn overlay() -> (Overlay, FakeOverlay) {
        let fake = FakeOverlay::new(1);
        let mut overlay = Overlay::new(Box::new(fake.clone()));
        overlay.configure(VISIBLE, HideAnimation::FadeOut { duration: FADE });
        (overlay, fake)
    }

    #[test]
    fn starts_hidden() {
        let (overlay, _) = overlay();
        assert_eq!(overlay.state_at(Instant::now()), OverlayState::Hidden);
    }

    #[test]
    fn show_then_fade_then_hidden() {
        let (mut overlay, _) = overlay();
        let t0 = Instant::now();
        overlay.show(t0);

        assert_eq!(overlay.state_at(t0), OverlayState::Showing);
        assert_eq!(overlay.state_at(t0 + Duration::from_millis(799)), OverlayState::Showing);
        assert_eq!(overlay.state_at(t0 + Duration::from_millis(900)), OverlayState::FadingOut);
        assert_eq!(overlay.state_at(t0 + Duration::from_millis(1100)), OverlayState::Hidden);
    }

    #[test]
    fn soft_hide_fades() {
        let (mut overlay, fake) = overlay();
        let t0 = Instant::now();
        overlay.show(t0);
        overlay.hide(false, t0 + Duration::from_millis(100));

        assert_eq!(overlay.state_at(t0 + Duration::from_millis(200)), OverlayState::FadingOut);
        assert_eq!(overlay.state_at(t0 + Duration::from_millis(400)), OverlayState::Hidden);
        assert_eq!(fake.calls().last(), Some(&WindowCall::Hide(false)));
    }

    #[test]
    fn soft_hide_of_hidden_overlay_is_silent() {
        let (mut overlay, fake) = overlay();
        overlay.hide(false, Instant::now());

        assert!(!fake.calls().iter().any(|c| matches!(c, WindowCall::Hide(_))));
    }

    #[test]
    fn immediate_hide_skips_fade() {
        let (mut overlay, fake) = overlay();
        let t0 = Instant::now();
        overlay.show(t0);
        overlay.hide(true, t0);

        assert_eq!(overlay.state_at(t0), OverlayState::Hidden);
        assert_eq!(fake.calls().last(), Some(&WindowCall::Hide(true)));
    }

    #[test]
    fn reshow_during_fade_shows_again() {
        let (mut overlay, _) = overlay();
        let t0 = Instant::now();
        overlay.show(t0);
        let fading = t0 + Duration::from_millis(900);
        assert_eq!(overlay.state_at(fading), OverlayState::FadingOut);

        overlay.show(fading);
        assert_eq!(overlay.state_at(fading + Duration::from_millis(500)), OverlayState::Showing);
    }

    #[test]
    fn configure_reaches_window() {
        let (_, fake) = overlay();
        let calls = fake.calls();
        assert!(calls.contains(&WindowCall::VisibleDuration(VISIBLE)));
        assert!(calls.contains(&WindowCall::Animation(HideAnimation::FadeOut { duration: FADE })));
    }
}
