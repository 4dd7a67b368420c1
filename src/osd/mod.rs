//! On-screen display core.
//!
//! The controller and the collaborator contracts it drives: overlay
//! windows, the volume slider, the notification icon, the context menu,
//! skins and host actions.

pub mod controller;
pub mod event;
pub mod host;
pub mod icon;
pub mod menu;
pub mod overlay;
pub mod skin;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::{OsdController, OsdParts};
pub use event::{MenuCommand, OsdEvent, OsdKind, TrayAction};
pub use host::OsdHost;
pub use icon::{IconError, IconState, NotifyIcon};
pub use menu::{ContextMenu, MenuAlignment};
pub use overlay::{HideAnimation, Overlay, OverlayState, OverlayWindow, VolumeSlider};
pub use skin::{DirectorySkin, Meter, MeterKind, Skin, SkinError, SkinImage};
