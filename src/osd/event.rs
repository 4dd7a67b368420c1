//! Events delivered to the OSD controller and the commands carried by its
//! context menu.

use crate::display::Point;

/// Everything the controller reacts to, delivered on the control thread.
#[derive(Debug, Clone, PartialEq)]
pub enum OsdEvent {
    /// Volume or mute state of the controlled endpoint changed
    VolumeChanged,

    /// An audio device was added, removed, or the default changed
    DeviceChanged,

    /// The OS reported a display configuration change
    DisplayChanged,

    /// The notification icon was clicked
    Tray(TrayAction),

    /// A context menu entry was chosen
    Menu(MenuCommand),

    /// The user dragged the volume slider
    SliderMoved(f32),

    /// Another OSD announced it is about to show
    OsdShown(OsdKind),
}

/// Notification icon interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// Primary button: reveal the volume slider
    Primary,

    /// Secondary button: open the context menu at the cursor
    Secondary { position: Point },
}

/// Context menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    Settings,
    Mixer,
    Exit,

    /// Position in the most recently built device list
    Device(usize),
}

/// OSD categories that must not overlap on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum OsdKind {
    Volume = 0,
    Brightness = 1,
    Eject = 2,
}

impl OsdKind {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(OsdKind::Volume),
            1 => Some(OsdKind::Brightness),
            2 => Some(OsdKind::Eject),
            _ => None,
        }
    }
}
