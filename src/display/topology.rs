//! Display topology tracking.
//!
//! `DisplayTopology` owns the map of active displays, answers "which monitor
//! is this point/window on" and detects exclusive fullscreen applications.
//! Raw OS queries go through the `DisplayBackend` trait.

use super::monitor::{DisplayDevice, Monitor, MonitorHandle, Point, Rect, WindowHandle};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Display query error types.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Failed to create probe device: {0}")]
    ProbeDeviceFailed(String),
}

/// Raw display queries supplied by the operating system.
pub trait DisplayBackend {
    /// All active displays with their full rectangles.
    fn enumerate(&self) -> Vec<Monitor>;

    /// Snapshot of a single display.
    fn monitor_info(&self, handle: MonitorHandle) -> Option<Monitor>;

    /// Display nearest to `point`, falling back to the primary display.
    fn monitor_from_point(&self, point: Point) -> Option<MonitorHandle>;

    /// Display a window is on, or `None` if it is on no display.
    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle>;

    fn foreground_window(&self) -> Option<WindowHandle>;
    fn shell_window(&self) -> Option<WindowHandle>;
    fn desktop_window(&self) -> Option<WindowHandle>;

    /// Outer bounding rectangle of a window.
    fn window_rect(&self, window: WindowHandle) -> Option<Rect>;

    /// Create a throwaway graphics device bound to `window` and report
    /// whether its surface is present-but-occluded. Must release everything
    /// it allocates before returning.
    fn probe_occlusion(&self, window: WindowHandle) -> Result<bool, DisplayError>;

    /// Raw display adapter records, active or not.
    fn display_devices(&self) -> Vec<DisplayDevice>;
}

/// Tracks the physical displays attached to the machine.
pub struct DisplayTopology {
    backend: Box<dyn DisplayBackend>,
    monitors: HashMap<String, Monitor>,
}

impl DisplayTopology {
    /// Create an empty tracker. Call `refresh` before point lookups.
    pub fn new(backend: Box<dyn DisplayBackend>) -> Self {
        Self {
            backend,
            monitors: HashMap::new(),
        }
    }

    /// Rebuild the monitor map from scratch.
    pub fn refresh(&mut self) {
        self.monitors.clear();

        for monitor in self.backend.enumerate() {
            if monitor.rect.is_degenerate() {
                warn!(name = %monitor.name, "Skipping display with empty bounds");
                continue;
            }
            self.monitors.insert(monitor.name.clone(), monitor);
        }

        debug!(count = self.monitors.len(), "Display topology refreshed");
    }

    /// Current map of display name to monitor.
    pub fn monitors(&self) -> &HashMap<String, Monitor> {
        &self.monitors
    }

    /// The display at the logical origin. Queries the OS directly, so it
    /// works before the first `refresh`.
    pub fn primary(&self) -> Monitor {
        self.backend
            .monitor_from_point(Point::ORIGIN)
            .and_then(|handle| self.backend.monitor_info(handle))
            .unwrap_or_default()
    }

    /// The display containing `point`, if any.
    pub fn at_point(&self, point: Point, use_work_area: bool) -> Option<Monitor> {
        self.monitors
            .values()
            .find(|m| m.rect.contains(point))
            .cloned()
            .map(|m| Self::select_area(m, use_work_area))
    }

    /// The display a window currently occupies, if any.
    pub fn at_window(&self, window: WindowHandle, use_work_area: bool) -> Option<Monitor> {
        if window.is_null() {
            return None;
        }

        let handle = self.backend.monitor_from_window(window)?;
        let cached = self.monitors.values().find(|m| m.handle == handle).cloned();
        cached
            .or_else(|| self.backend.monitor_info(handle))
            .map(|m| Self::select_area(m, use_work_area))
    }

    pub fn width(monitor: &Monitor) -> i32 {
        monitor.width()
    }

    pub fn height(monitor: &Monitor) -> i32 {
        monitor.height()
    }

    /// Display adapters that are currently active.
    pub fn list_active_devices(&self) -> Vec<DisplayDevice> {
        self.backend
            .display_devices()
            .into_iter()
            .filter(|d| d.active)
            .collect()
    }

    /// Heuristic check for an exclusive fullscreen foreground application.
    ///
    /// True when the foreground window is neither the shell nor the desktop
    /// and its outer rectangle equals the full rectangle of the display
    /// `window` is on. A borderless window sized to the screen is reported
    /// as fullscreen too; the check does not inspect window styles.
    pub fn is_exclusive_fullscreen(&self, window: WindowHandle) -> bool {
        if window.is_null() {
            return false;
        }

        let Some(foreground) = self.backend.foreground_window() else {
            return false;
        };
        if foreground.is_null()
            || Some(foreground) == self.backend.shell_window()
            || Some(foreground) == self.backend.desktop_window()
        {
            return false;
        }

        let Some(foreground_rect) = self.backend.window_rect(foreground) else {
            return false;
        };
        match self.at_window(window, false) {
            Some(monitor) => foreground_rect == monitor.rect,
            None => false,
        }
    }

    /// Ask the graphics subsystem whether `window`'s surface is occluded by
    /// an exclusive-mode surface. Expensive: gate it behind
    /// `is_exclusive_fullscreen` or a user setting.
    pub fn is_occluded(&self, window: WindowHandle) -> bool {
        match self.backend.probe_occlusion(window) {
            Ok(occluded) => {
                debug!(occluded, "Occlusion probe finished");
                occluded
            }
            Err(e) => {
                warn!("Occlusion probe failed, assuming visible: {}", e);
                false
            }
        }
    }

    fn select_area(monitor: Monitor, use_work_area: bool) -> Monitor {
        if use_work_area {
            monitor.with_work_area()
        } else {
            monitor
        }
    }
}
