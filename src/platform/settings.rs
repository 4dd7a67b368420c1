//! Runtime settings, read once at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Settings consumed by the OSD controller and the application shell.
#[derive(Debug, Clone, PartialEq)]
pub struct OsdSettings {
    /// Device id the user pinned; `None` follows the system default
    pub audio_device: Option<String>,

    /// Skin directory; `None` uses generated artwork
    pub skin_dir: Option<PathBuf>,

    /// Suppress overlays while a fullscreen application is in front
    pub hide_fullscreen: bool,

    /// Additionally run the Direct3D occlusion probe before showing
    pub hide_directx: bool,

    pub visible_duration: Duration,
    pub fade_duration: Duration,

    /// Distance between the overlay's bottom edge and the display's bottom
    pub bottom_offset: i32,

    pub debug_logging: bool,

    /// Executable launched by the "Settings" menu entry
    pub settings_app: PathBuf,
}

impl OsdSettings {
    pub const DEFAULT_VISIBLE_MS: u64 = 800;
    pub const DEFAULT_FADE_MS: u64 = 300;
    pub const DEFAULT_BOTTOM_OFFSET: i32 = 140;
    pub const SETTINGS_APP: &'static str = "Settings.exe";
}

/// Named values settings are read from.
pub trait SettingsSource {
    fn string(&self, name: &str) -> Option<String>;
    fn dword(&self, name: &str) -> Option<u32>;
}

/// Value names shared by every settings source.
pub mod keys {
    pub const AUDIO_DEVICE: &str = "AudioDevice";
    pub const SKIN_DIR: &str = "Skin";
    pub const HIDE_FULLSCREEN: &str = "HideFullscreen";
    pub const HIDE_DIRECTX: &str = "HideDirectX";
    pub const VISIBLE_DURATION: &str = "VisibleDuration";
    pub const FADE_DURATION: &str = "FadeDuration";
    pub const BOTTOM_OFFSET: &str = "BottomOffset";
    pub const DEBUG_LOGGING: &str = "DebugLogging";
    pub const SETTINGS_APP: &str = "SettingsApp";
}

impl OsdSettings {
    /// Read settings, keeping the default for anything missing or empty.
    pub fn load(source: &dyn SettingsSource) -> Self {
        let defaults = Self::default();
        let string = |name| source.string(name).filter(|s| !s.is_empty());
        let flag = |name, default| source.dword(name).map(|v| v != 0).unwrap_or(default);
        let millis = |name, default| {
            source
                .dword(name)
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(default)
        };

        Self {
            audio_device: string(keys::AUDIO_DEVICE),
            skin_dir: string(keys::SKIN_DIR).map(PathBuf::from),
            hide_fullscreen: flag(keys::HIDE_FULLSCREEN, defaults.hide_fullscreen),
            hide_directx: flag(keys::HIDE_DIRECTX, defaults.hide_directx),
            visible_duration: millis(keys::VISIBLE_DURATION, defaults.visible_duration),
            fade_duration: millis(keys::FADE_DURATION, defaults.fade_duration),
            bottom_offset: source
                .dword(keys::BOTTOM_OFFSET)
                .map(|v| v as i32)
                .unwrap_or(defaults.bottom_offset),
            debug_logging: flag(keys::DEBUG_LOGGING, defaults.debug_logging),
            settings_app: string(keys::SETTINGS_APP)
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_app),
        }
    }
}

impl Default for OsdSettings {
    fn default() -> Self {
        Self {
            audio_device: None,
            skin_dir: None,
            hide_fullscreen: true,
            hide_directx: false,
            visible_duration: Duration::from_millis(Self::DEFAULT_VISIBLE_MS),
            fade_duration: Duration::from_millis(Self::DEFAULT_FADE_MS),
            bottom_offset: Self::DEFAULT_BOTTOM_OFFSET,
            debug_logging: false,
            settings_app: PathBuf::from(Self::SETTINGS_APP),
        }
    }
}
