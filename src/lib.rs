//! Volume OSD - Library
//!
//! Runtime core of a Windows on-screen display for the master volume.
//!
//! ## Features
//!
//! - Transient volume and mute overlays, auto-hiding with a fade
//! - Overlays placed on the primary display and re-placed when the display
//!   configuration changes
//! - Suppression while an exclusive fullscreen application owns the screen
//! - Notification icon with level frames and a device selection menu
//! - Device pinning with fallback to the system default device
//!
//! Platform-independent logic lives in [`display`], [`audio`], [`osd`] and
//! [`app`]; the Win32 implementations are compiled on Windows only.

pub mod app;
pub mod audio;
pub mod display;
pub mod logging;
pub mod osd;
pub mod platform;
#[cfg(windows)]
pub mod ui;

pub use app::App;
pub use audio::{event_channel, AudioEndpoint, AudioError, DeviceDescriptor, EventSender};
pub use display::{DisplayTopology, Monitor, Point, Rect, WindowHandle};
pub use osd::{OsdController, OsdEvent, OsdParts};
pub use platform::OsdSettings;
