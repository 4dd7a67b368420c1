//! Settings and platform utilities.
//!
//! This module contains the runtime settings model, generated fallback
//! artwork and, on Windows, registry persistence.

pub mod icons;
#[cfg(windows)]
pub mod registry;
pub mod settings;

#[cfg(windows)]
pub use registry::{PreferencesError, RegistryPreferences};
pub use settings::{OsdSettings, SettingsSource};
