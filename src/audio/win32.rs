//! Core Audio implementation of the audio endpoint contract.
//!
//! Enumerates render endpoints with the MMDevice API, controls the selected
//! endpoint through IAudioEndpointVolume and registers the notification
//! clients that feed the event channel.

use super::device::{AudioError, DeviceDescriptor};
use super::endpoint::AudioEndpoint;
use super::notifications::{DeviceNotificationClient, EventSender, VolumeNotificationClient};
use tracing::{debug, info, warn};
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Devices::Properties::DEVPKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::Endpoints::{IAudioEndpointVolume, IAudioEndpointVolumeCallback};
use windows::Win32::Media::Audio::{
    eMultimedia, eRender, IMMDevice, IMMDeviceEnumerator, IMMNotificationClient,
    MMDeviceEnumerator, DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoTaskMemFree, CoUninitialize, CLSCTX_ALL,
    COINIT_APARTMENTTHREADED, STGM,
};
use windows::Win32::UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY};

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    /// Initialize COM for the current thread.
    pub fn new() -> Result<Self, AudioError> {
        unsafe {
            // Use apartment-threaded for UI compatibility
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .map_err(AudioError::ComInitFailed)?;
        }
        Ok(Self { initialized: true })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// The endpoint currently under control.
struct SelectedDevice {
    id: String,
    name: String,
    endpoint_volume: IAudioEndpointVolume,
}

/// Controls one render endpoint and watches the device set.
pub struct AudioManager {
    enumerator: IMMDeviceEnumerator,
    device_client: IMMNotificationClient,
    volume_client: IAudioEndpointVolumeCallback,
    selected: Option<SelectedDevice>,
}

impl AudioManager {
    /// Create the manager and start controlling the default device.
    ///
    /// Note: COM must be initialized before calling this function.
    pub fn new(sender: EventSender) -> Result<Self, AudioError> {
        let enumerator: IMMDeviceEnumerator =
            unsafe { CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL) }
                .map_err(AudioError::EnumerationFailed)?;

        let device_client = DeviceNotificationClient::create(sender.clone());
        unsafe { enumerator.RegisterEndpointNotificationCallback(&device_client) }
            .map_err(AudioError::NotificationFailed)?;

        let mut manager = Self {
            enumerator,
            device_client,
            volume_client: VolumeNotificationClient::create(sender),
            selected: None,
        };

        if let Err(e) = manager.select_default_device() {
            warn!("No default output device at startup: {}", e);
        }

        Ok(manager)
    }

    fn select(&mut self, device: &IMMDevice) -> Result<(), AudioError> {
        let id = Self::device_id(device)?;
        let name = Self::device_name(device).unwrap_or_else(|| "Unknown".to_string());

        let endpoint_volume: IAudioEndpointVolume =
            unsafe { device.Activate(CLSCTX_ALL, None) }.map_err(|_| AudioError::VolumeNotAvailable)?;

        unsafe { endpoint_volume.RegisterControlChangeNotify(&self.volume_client) }
            .map_err(AudioError::NotificationFailed)?;

        if let Some(old) = self.selected.take() {
            unsafe {
                let _ = old
                    .endpoint_volume
                    .UnregisterControlChangeNotify(&self.volume_client);
            }
        }

        info!(device = %name, "Controlling audio device");
        self.selected = Some(SelectedDevice {
            id,
            name,
            endpoint_volume,
        });
        Ok(())
    }

    fn device_id(device: &IMMDevice) -> Result<String, AudioError> {
        unsafe {
            let raw: PWSTR = device.GetId().map_err(AudioError::EnumerationFailed)?;
            let id = raw
                .to_string()
                .map_err(|e| AudioError::StringConversion(e.to_string()));
            CoTaskMemFree(Some(raw.0 as *const _));
            id
        }
    }

    /// Get the friendly name of a device from its property store.
    fn device_name(device: &IMMDevice) -> Option<String> {
        unsafe {
            let props: IPropertyStore = device.OpenPropertyStore(STGM(0)).ok()?; // STGM_READ = 0

            // Convert DEVPROPKEY to PROPERTYKEY
            let key = PROPERTYKEY {
                fmtid: DEVPKEY_Device_FriendlyName.fmtid,
                pid: DEVPKEY_Device_FriendlyName.pid,
            };
            let prop = props.GetValue(&key).ok()?;

            let name = prop.to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
    }

    fn endpoint_volume(&self) -> Result<&IAudioEndpointVolume, AudioError> {
        self.selected
            .as_ref()
            .map(|s| &s.endpoint_volume)
            .ok_or(AudioError::NoDeviceSelected)
    }
}

impl AudioEndpoint for AudioManager {
    fn volume(&self) -> f32 {
        self.endpoint_volume()
            .and_then(|v| {
                unsafe { v.GetMasterVolumeLevelScalar() }.map_err(AudioError::WindowsError)
            })
            .unwrap_or(0.0)
    }

    fn set_volume(&mut self, level: f32) -> Result<(), AudioError> {
        let level = level.clamp(0.0, 1.0);
        let endpoint_volume = self.endpoint_volume()?;
        unsafe { endpoint_volume.SetMasterVolumeLevelScalar(level, std::ptr::null()) }
            .map_err(AudioError::WindowsError)
    }

    fn is_muted(&self) -> bool {
        self.endpoint_volume()
            .and_then(|v| unsafe { v.GetMute() }.map_err(AudioError::WindowsError))
            .map(|muted| muted.as_bool())
            .unwrap_or(false)
    }

    fn devices(&self) -> Vec<DeviceDescriptor> {
        let mut devices = Vec::new();

        unsafe {
            let Ok(collection) = self.enumerator.EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
            else {
                warn!("Failed to enumerate output devices");
                return devices;
            };
            let count = collection.GetCount().unwrap_or(0);

            for i in 0..count {
                let Ok(device) = collection.Item(i) else {
                    continue;
                };
                match Self::device_id(&device) {
                    Ok(id) => {
                        let name =
                            Self::device_name(&device).unwrap_or_else(|| "Unknown".to_string());
                        devices.push(DeviceDescriptor::new(id, name));
                    }
                    Err(e) => debug!("Skipping device without id: {}", e),
                }
            }
        }

        devices
    }

    fn current_device_id(&self) -> Option<String> {
        self.selected.as_ref().map(|s| s.id.clone())
    }

    fn current_device_description(&self) -> String {
        self.selected
            .as_ref()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "No audio device".to_string())
    }

    fn select_device(&mut self, device_id: &str) -> Result<(), AudioError> {
        let device_id_wide: Vec<u16> = device_id.encode_utf16().chain(std::iter::once(0)).collect();

        let device = unsafe {
            self.enumerator
                .GetDevice(PCWSTR::from_raw(device_id_wide.as_ptr()))
        }
        .map_err(|_| AudioError::DeviceNotFound {
            device_id: device_id.to_string(),
        })?;

        // Removed devices can still resolve by id; refuse anything not active.
        let state = unsafe { device.GetState() }.map_err(AudioError::WindowsError)?;
        if state != DEVICE_STATE_ACTIVE {
            return Err(AudioError::DeviceNotFound {
                device_id: device_id.to_string(),
            });
        }

        self.select(&device)
    }

    fn select_default_device(&mut self) -> Result<(), AudioError> {
        match unsafe { self.enumerator.GetDefaultAudioEndpoint(eRender, eMultimedia) } {
            Ok(device) => self.select(&device),
            Err(e) => {
                // Nothing to fall back to; stop listening to the old endpoint
                if let Some(old) = self.selected.take() {
                    debug!(device = %old.name, "Releasing audio device: {}", e);
                    unsafe {
                        let _ = old
                            .endpoint_volume
                            .UnregisterControlChangeNotify(&self.volume_client);
                    }
                }
                Err(AudioError::NoDefaultDevice)
            }
        }
    }
}

impl Drop for AudioManager {
    fn drop(&mut self) {
        unsafe {
            if let Some(selected) = self.selected.take() {
                let _ = selected
                    .endpoint_volume
                    .UnregisterControlChangeNotify(&self.volume_client);
            }
            let _ = self
                .enumerator
                .UnregisterEndpointNotificationCallback(&self.device_client);
        }
    }
}
