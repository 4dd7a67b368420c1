//! The audio endpoint contract consumed by the OSD controller.

use super::device::{AudioError, DeviceDescriptor};

/// Volume, mute and device selection for the controlled output endpoint.
///
/// Implementations report changes asynchronously through an
/// [`EventSender`](super::notifications::EventSender); they never call back
/// into the controller directly.
pub trait AudioEndpoint {
    /// Master volume of the selected device, 0.0 to 1.0.
    fn volume(&self) -> f32;

    /// Set the master volume (clamped to 0.0..=1.0).
    fn set_volume(&mut self, level: f32) -> Result<(), AudioError>;

    fn is_muted(&self) -> bool;

    /// Active output devices in enumeration order.
    fn devices(&self) -> Vec<DeviceDescriptor>;

    /// ID of the device currently being controlled.
    fn current_device_id(&self) -> Option<String>;

    /// Friendly name of the device currently being controlled.
    fn current_device_description(&self) -> String;

    /// Control a specific device. Fails if the ID no longer resolves.
    fn select_device(&mut self, device_id: &str) -> Result<(), AudioError>;

    /// Control the system default output device.
    fn select_default_device(&mut self) -> Result<(), AudioError>;
}
