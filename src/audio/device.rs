//! Audio device data models.
//!
//! Defines the device descriptor used by the device menu and the error type
//! shared by audio endpoint implementations.

use thiserror::Error;

/// An audio output endpoint as listed in the device menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Unique Windows device ID (opaque string from IMMDevice::GetId),
    /// stable across sessions
    pub id: String,

    /// Human-readable device name (from device properties)
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Audio service error types.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: String },

    #[error("No default device available")]
    NoDefaultDevice,

    #[error("No device selected")]
    NoDeviceSelected,

    #[error("Volume control not available for device")]
    VolumeNotAvailable,

    #[cfg(windows)]
    #[error("COM initialization failed: {0}")]
    ComInitFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to enumerate devices: {0}")]
    EnumerationFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Failed to register notifications: {0}")]
    NotificationFailed(#[source] windows::core::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    WindowsError(#[source] windows::core::Error),

    #[error("String conversion error: {0}")]
    StringConversion(String),
}
