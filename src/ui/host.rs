//! Win32 implementation of the controller's host actions.

use crate::osd::{OsdHost, OsdKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::{HWND, HWND_BROADCAST, LPARAM, WPARAM};
use windows::Win32::UI::Shell::ShellExecuteW;
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, PostMessageW, RegisterWindowMessageW, SetForegroundWindow,
    SM_MENUDROPALIGNMENT, SW_SHOWNORMAL,
};

/// Registered message broadcast to every OSD window. `wparam` carries the
/// `OsdKind` that stays visible.
pub fn hide_osd_message() -> u32 {
    unsafe { RegisterWindowMessageW(w!("VolumeOsd_HideOsd")) }
}

pub struct Win32Host {
    hwnd: HWND,
    settings_app: PathBuf,
    hide_message: u32,
}

impl Win32Host {
    /// `settings_app` is resolved against the executable's directory when
    /// relative.
    pub fn new(hwnd: HWND, settings_app: &Path) -> Self {
        let settings_app = if settings_app.is_relative() {
            std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(|dir| dir.join(settings_app)))
                .unwrap_or_else(|| settings_app.to_path_buf())
        } else {
            settings_app.to_path_buf()
        };

        Self {
            hwnd,
            settings_app,
            hide_message: hide_osd_message(),
        }
    }

    fn launch(&self, file: &str) {
        let file_wide: Vec<u16> = file.encode_utf16().chain(std::iter::once(0)).collect();
        let result = unsafe {
            ShellExecuteW(
                self.hwnd,
                w!("open"),
                PCWSTR::from_raw(file_wide.as_ptr()),
                PCWSTR::null(),
                PCWSTR::null(),
                SW_SHOWNORMAL,
            )
        };

        // Values up to 32 are error codes
        if (result.0 as isize) <= 32 {
            warn!(file, code = result.0 as isize, "Failed to launch");
        } else {
            debug!(file, "Launched");
        }
    }
}

impl OsdHost for Win32Host {
    fn open_settings(&mut self) {
        let path = self.settings_app.to_string_lossy().into_owned();
        self.launch(&path);
    }

    fn open_mixer(&mut self) {
        self.launch("sndvol");
    }

    fn hide_others(&mut self, except: OsdKind) {
        let posted = unsafe {
            PostMessageW(
                HWND_BROADCAST,
                self.hide_message,
                WPARAM(except as u32 as usize),
                LPARAM(0),
            )
        };
        if let Err(e) = posted {
            warn!("Failed to broadcast hide message: {}", e);
        }
    }

    fn menu_drop_alignment(&self) -> bool {
        unsafe { GetSystemMetrics(SM_MENUDROPALIGNMENT) != 0 }
    }

    fn take_foreground(&mut self) {
        unsafe {
            let _ = SetForegroundWindow(self.hwnd);
        }
    }
}
