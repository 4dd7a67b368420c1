//! Audio module for the controlled output endpoint.
//!
//! This module provides the endpoint contract the OSD consumes, the device
//! descriptor model, the cross-thread event hand-off and, on Windows, the
//! Core Audio implementation.

pub mod device;
pub mod endpoint;
pub mod notifications;
#[cfg(windows)]
pub mod win32;

pub use device::{AudioError, DeviceDescriptor};
pub use endpoint::AudioEndpoint;
pub use notifications::{event_channel, EventSender};
#[cfg(windows)]
pub use win32::{AudioManager, ComGuard};
