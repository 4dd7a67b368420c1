//! Windows Registry preferences management.
//!
//! Settings live under `HKCU\Software\VolumeOsd`. They are read once at
//! startup; only the device pin is written back.

use super::settings::{keys, OsdSettings, SettingsSource};
use thiserror::Error;
use windows::core::PCWSTR;
use windows::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW,
    HKEY, HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_CREATE_KEY_DISPOSITION, REG_DWORD,
    REG_OPTION_NON_VOLATILE, REG_SZ, REG_VALUE_TYPE,
};

/// Preferences service error types.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("Failed to access registry: {0}")]
    RegistryAccess(String),

    #[error("Failed to write preference: {key}")]
    WriteFailed { key: String },
}

/// Registry-based preferences service.
pub struct RegistryPreferences {
    app_key_path: Vec<u16>,
}

impl RegistryPreferences {
    const APP_KEY: &'static str = r"Software\VolumeOsd";

    pub fn new() -> Self {
        Self {
            app_key_path: Self::to_wide(Self::APP_KEY),
        }
    }

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Load settings, falling back to defaults for missing values.
    pub fn load(&self) -> OsdSettings {
        OsdSettings::load(self)
    }

    /// Persist the device pin. `None` removes it so the system default is
    /// followed on the next start.
    pub fn save_pinned_device(&self, device_id: Option<&str>) -> Result<(), PreferencesError> {
        let hkey = self.create_key()?;
        let value_name = Self::to_wide(keys::AUDIO_DEVICE);

        let result = unsafe {
            match device_id {
                Some(id) => {
                    let data = Self::to_wide(id);
                    RegSetValueExW(
                        hkey,
                        PCWSTR::from_raw(value_name.as_ptr()),
                        0,
                        REG_SZ,
                        Some(std::slice::from_raw_parts(
                            data.as_ptr() as *const u8,
                            data.len() * 2,
                        )),
                    )
                    .ok()
                }
                // A value that was never written is fine to "delete"
                None => {
                    let _ = RegDeleteValueW(hkey, PCWSTR::from_raw(value_name.as_ptr()));
                    Ok(())
                }
            }
        };

        unsafe {
            let _ = RegCloseKey(hkey);
        }

        result.map_err(|_| PreferencesError::WriteFailed {
            key: keys::AUDIO_DEVICE.to_string(),
        })
    }

    fn open_key(&self) -> Option<HKEY> {
        let mut hkey = HKEY::default();
        let result = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(self.app_key_path.as_ptr()),
                0,
                KEY_READ,
                &mut hkey,
            )
        };
        if result.is_err() {
            None
        } else {
            Some(hkey)
        }
    }

    fn create_key(&self) -> Result<HKEY, PreferencesError> {
        let mut hkey = HKEY::default();
        let mut disposition = REG_CREATE_KEY_DISPOSITION::default();

        let result = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(self.app_key_path.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                None,
                &mut hkey,
                Some(&mut disposition),
            )
        };

        if result.is_err() {
            return Err(PreferencesError::RegistryAccess(format!(
                "Failed to create {}",
                Self::APP_KEY
            )));
        }
        Ok(hkey)
    }

    /// Raw bytes and type of one value under the application key.
    fn query(&self, name: &str) -> Option<(REG_VALUE_TYPE, Vec<u8>)> {
        let hkey = self.open_key()?;
        let value_name = Self::to_wide(name);

        let value = unsafe {
            let mut kind = REG_VALUE_TYPE::default();
            let mut size = 0u32;
            let sized = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                Some(&mut kind),
                None,
                Some(&mut size),
            );

            if sized.is_err() {
                None
            } else {
                let mut data = vec![0u8; size as usize];
                let read = RegQueryValueExW(
                    hkey,
                    PCWSTR::from_raw(value_name.as_ptr()),
                    None,
                    Some(&mut kind),
                    Some(data.as_mut_ptr()),
                    Some(&mut size),
                );
                if read.is_err() {
                    None
                } else {
                    data.truncate(size as usize);
                    Some((kind, data))
                }
            }
        };

        unsafe {
            let _ = RegCloseKey(hkey);
        }
        value
    }
}

impl SettingsSource for RegistryPreferences {
    fn string(&self, name: &str) -> Option<String> {
        let (kind, data) = self.query(name)?;
        if kind != REG_SZ {
            return None;
        }
        let wide: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .take_while(|&c| c != 0)
            .collect();
        Some(String::from_utf16_lossy(&wide))
    }

    fn dword(&self, name: &str) -> Option<u32> {
        let (kind, data) = self.query(name)?;
        if kind != REG_DWORD || data.len() < 4 {
            return None;
        }
        Some(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
    }
}

impl Default for RegistryPreferences {
    fn default() -> Self {
        Self::new()
    }
}
