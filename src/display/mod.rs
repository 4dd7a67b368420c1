//! Display module for monitor topology and fullscreen detection.
//!
//! Tracks the physical displays, resolves points and windows to monitors
//! and decides whether an exclusive fullscreen application owns the screen.

pub mod monitor;
pub mod topology;
#[cfg(windows)]
pub mod win32;

pub use monitor::{DisplayDevice, Monitor, MonitorHandle, Point, Rect, WindowHandle};
pub use topology::{DisplayBackend, DisplayError, DisplayTopology};
#[cfg(windows)]
pub use win32::Win32Display;
