//! Win32 user interface: notification icon, popup menu, overlay windows
//! and host actions.

pub mod host;
pub mod menu;
pub mod overlay_window;
pub mod tray;

pub use host::{hide_osd_message, Win32Host};
pub use menu::PopupMenu;
pub use overlay_window::LayeredWindow;
pub use tray::{TrayError, TrayManager};
