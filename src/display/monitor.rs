//! Display geometry value types.
//!
//! Defines points, rectangles, opaque OS handles and the `Monitor` snapshot
//! produced by the topology tracker.

/// Position in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Rectangle in virtual-screen coordinates (right/bottom exclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from its origin and size.
    pub fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    /// True when the rectangle has no area.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }
}

/// Opaque monitor handle (an `HMONITOR` on Windows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MonitorHandle(pub isize);

/// Opaque window handle (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Snapshot of one physical display.
///
/// `rect` is the full display rectangle unless the lookup that produced the
/// snapshot asked for the work area, in which case it equals `work_area`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Monitor {
    pub handle: MonitorHandle,
    pub name: String,
    pub rect: Rect,
    pub work_area: Rect,
}

impl Monitor {
    pub fn new(handle: MonitorHandle, name: impl Into<String>, rect: Rect, work_area: Rect) -> Self {
        Self {
            handle,
            name: name.into(),
            rect,
            work_area,
        }
    }

    /// The empty result returned when a lookup misses.
    pub fn is_empty(&self) -> bool {
        self.handle == MonitorHandle::default() && self.rect.is_degenerate()
    }

    pub fn width(&self) -> i32 {
        self.rect.width()
    }

    pub fn height(&self) -> i32 {
        self.rect.height()
    }

    /// Copy of this snapshot whose `rect` excludes taskbars and docked UI.
    pub fn with_work_area(mut self) -> Self {
        self.rect = self.work_area;
        self
    }
}

/// Raw display adapter/device record, used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayDevice {
    /// Device name, e.g. `\\.\DISPLAY1`
    pub name: String,

    /// Adapter description, e.g. the GPU model
    pub description: String,

    /// Raw `DISPLAY_DEVICE_*` state flags
    pub state_flags: u32,

    pub active: bool,
    pub primary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_containment_is_half_open() {
        let rect = Rect::from_origin_size(-1920, 0, 1920, 1080);
        assert!(rect.contains(Point::new(-1920, 0)));
        assert!(rect.contains(Point::new(-1, 1079)));
        assert!(!rect.contains(Point::new(0, 10)));
        assert!(!rect.contains(Point::new(-10, 1080)));
    }

    #[test]
    fn inverted_rect_has_zero_size() {
        let rect = Rect::new(100, 100, 50, 20);
        assert_eq!(rect.width(), 0);
        assert_eq!(rect.height(), 0);
        assert!(rect.is_degenerate());
    }

    #[test]
    fn work_area_variant_replaces_rect() {
        let monitor = Monitor::new(
            MonitorHandle(7),
            r"\\.\DISPLAY1",
            Rect::new(0, 0, 2560, 1440),
            Rect::new(0, 0, 2560, 1400),
        );
        let work = monitor.clone().with_work_area();
        assert_eq!(work.height(), 1400);
        assert_eq!(work.name, monitor.name);
        assert_eq!(monitor.height(), 1440);
    }

    #[test]
    fn default_monitor_is_empty() {
        assert!(Monitor::default().is_empty());
    }
}
