//! OSD controller.
//!
//! Owns the volume and mute overlays, the notification icon, the context
//! menu and the audio endpoint, and reacts to [`OsdEvent`]s delivered on
//! the control thread. Display queries go through the caller's
//! [`DisplayTopology`].

use super::event::{MenuCommand, OsdEvent, OsdKind, TrayAction};
use super::host::OsdHost;
use super::icon::{IconState, NotifyIcon};
use super::menu::{ContextMenu, MenuAlignment};
use super::overlay::{HideAnimation, Overlay, OverlayState, OverlayWindow, VolumeSlider};
use super::skin::{self, Skin, SkinImage};
use crate::audio::{AudioEndpoint, DeviceDescriptor};
use crate::display::{DisplayTopology, Monitor};
use crate::platform::OsdSettings;
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Collaborators handed to the controller at construction.
pub struct OsdParts {
    pub audio: Box<dyn AudioEndpoint>,
    pub skin: Box<dyn Skin>,
    pub volume_window: Box<dyn OverlayWindow>,
    pub mute_window: Box<dyn OverlayWindow>,
    pub slider: Box<dyn VolumeSlider>,
    pub icon: Box<dyn NotifyIcon>,
    pub menu: Box<dyn ContextMenu>,
    pub host: Box<dyn OsdHost>,
}

pub struct OsdController {
    audio: Box<dyn AudioEndpoint>,
    volume: Overlay,
    mute: Overlay,
    slider: Box<dyn VolumeSlider>,
    icon: Box<dyn NotifyIcon>,
    menu: Box<dyn ContextMenu>,
    host: Box<dyn OsdHost>,

    icon_frames: Vec<SkinImage>,
    icon_state: IconState,

    /// Devices in the order they were inserted into the submenu
    devices: Vec<DeviceDescriptor>,
    description: String,
    pinned: Option<String>,

    hide_fullscreen: bool,
    hide_directx: bool,
    bottom_offset: i32,
}

impl OsdController {
    pub fn new(parts: OsdParts, settings: &OsdSettings, displays: &DisplayTopology) -> Self {
        let OsdParts {
            audio,
            skin,
            volume_window,
            mute_window,
            slider,
            icon,
            menu,
            host,
        } = parts;

        let mut volume = Overlay::new(volume_window);
        let mut mute = Overlay::new(mute_window);
        Self::apply_skin(&mut volume, skin.as_ref(), skin::VOLUME);
        Self::apply_skin(&mut mute, skin.as_ref(), skin::MUTE);

        let animation = HideAnimation::FadeOut {
            duration: settings.fade_duration,
        };
        volume.configure(settings.visible_duration, animation);
        mute.configure(settings.visible_duration, animation);

        let icon_frames = skin.icon_frames(skin::VOLUME);
        debug!(frames = icon_frames.len(), "Loaded icon frames");

        let mut controller = Self {
            audio,
            volume,
            mute,
            slider,
            icon,
            menu,
            host,
            icon_frames,
            icon_state: IconState::default(),
            devices: Vec::new(),
            description: String::new(),
            pinned: settings.audio_device.clone(),
            hide_fullscreen: settings.hide_fullscreen,
            hide_directx: settings.hide_directx,
            bottom_offset: settings.bottom_offset,
        };

        if controller.pinned.is_some() {
            controller.reselect_device();
        }
        controller.description = controller.audio.current_device_description();
        controller.rebuild_device_menu();
        controller.reposition(&displays.primary());
        controller.refresh_icon();

        let level = controller.audio.volume();
        controller.volume.window_mut().set_meter_level(level);
        controller.volume.show(Instant::now());
        controller.slider.set_level(level);

        info!(device = %controller.description, "OSD ready");
        controller
    }

    fn apply_skin(overlay: &mut Overlay, skin: &dyn Skin, category: &str) {
        let window = overlay.window_mut();
        if let Some(background) = skin.background_image(category) {
            window.set_background_image(&background);
        }
        for meter in skin.meters(category) {
            window.add_meter(meter);
        }
    }

    /// React to one event. `Break` asks the application to exit.
    pub fn handle(&mut self, event: OsdEvent, displays: &mut DisplayTopology) -> ControlFlow<()> {
        match event {
            OsdEvent::VolumeChanged => self.on_volume_changed(displays),
            OsdEvent::DeviceChanged => self.on_device_changed(),
            OsdEvent::DisplayChanged => {
                displays.refresh();
                self.reposition(&displays.primary());
            }
            OsdEvent::Tray(TrayAction::Primary) => self.slider.show(),
            OsdEvent::Tray(TrayAction::Secondary { position }) => {
                let alignment = MenuAlignment::from_drop_alignment(self.host.menu_drop_alignment());
                self.host.take_foreground();
                if let Some(command) = self.menu.popup(position, alignment) {
                    return self.on_command(command);
                }
            }
            OsdEvent::Menu(command) => return self.on_command(command),
            OsdEvent::OsdShown(kind) => self.hide_for(kind),
            OsdEvent::SliderMoved(level) => {
                if let Err(e) = self.audio.set_volume(level.clamp(0.0, 1.0)) {
                    warn!("Failed to set volume: {}", e);
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn on_volume_changed(&mut self, displays: &DisplayTopology) {
        let level = self.audio.volume();
        let muted = self.audio.is_muted();

        self.slider.set_level(level);

        if !self.slider.is_visible() {
            if self.suppressed(displays) {
                debug!("Fullscreen application in front, not showing overlay");
            } else {
                let now = Instant::now();
                if muted || level == 0.0 {
                    self.mute.show(now);
                    self.volume.hide(false, now);
                } else {
                    self.volume.window_mut().set_meter_level(level);
                    self.volume.show(now);
                    self.mute.hide(false, now);
                }
                self.host.hide_others(OsdKind::Volume);
            }
        }

        self.refresh_icon();
    }

    /// Fullscreen gate. The occlusion probe only runs when enabled and the
    /// cheap rectangle check did not already decide.
    fn suppressed(&self, displays: &DisplayTopology) -> bool {
        let window = self.volume.window().handle();
        if self.hide_fullscreen && displays.is_exclusive_fullscreen(window) {
            return true;
        }
        self.hide_directx && displays.is_occluded(window)
    }

    fn on_device_changed(&mut self) {
        self.reselect_device();
        self.description = self.audio.current_device_description();
        self.rebuild_device_menu();
        self.refresh_icon();
    }

    fn on_command(&mut self, command: MenuCommand) -> ControlFlow<()> {
        match command {
            MenuCommand::Settings => self.host.open_settings(),
            MenuCommand::Mixer => self.host.open_mixer(),
            MenuCommand::Exit => {
                info!("Exit requested");
                return ControlFlow::Break(());
            }
            MenuCommand::Device(index) => self.select_from_menu(index),
        }
        ControlFlow::Continue(())
    }

    fn select_from_menu(&mut self, index: usize) {
        let Some(device) = self.devices.get(index).cloned() else {
            warn!(index, "Device menu entry out of range");
            return;
        };

        if self.audio.current_device_id().as_deref() == Some(device.id.as_str()) {
            debug!(device = %device.name, "Device already selected");
            return;
        }

        match self.audio.select_device(&device.id) {
            Ok(()) => {
                info!(device = %device.name, "Switched audio device");
                self.pinned = Some(device.id);
            }
            Err(e) => {
                warn!("Failed to select {}: {}", device.name, e);
                self.select_default();
            }
        }

        self.description = self.audio.current_device_description();
        self.rebuild_device_menu();
        self.refresh_icon();
    }

    /// Follow the pin if there is one, otherwise the system default.
    fn reselect_device(&mut self) {
        let Some(pinned) = self.pinned.clone() else {
            self.select_default();
            return;
        };

        if let Err(e) = self.audio.select_device(&pinned) {
            warn!("Pinned device unavailable, using default: {}", e);
            self.select_default();
        }
    }

    fn select_default(&mut self) {
        if let Err(e) = self.audio.select_default_device() {
            warn!("Failed to select default device: {}", e);
        }
    }

    /// Replace every device entry with the current enumeration.
    fn rebuild_device_menu(&mut self) {
        for position in (0..self.menu.device_count()).rev() {
            self.menu.remove_device(position);
        }

        self.devices = self.audio.devices();
        let current = self.audio.current_device_id();
        for (index, device) in self.devices.iter().enumerate() {
            let checked = current.as_deref() == Some(device.id.as_str());
            self.menu
                .insert_device(index, &device.name, checked, MenuCommand::Device(index));
        }

        debug!(count = self.devices.len(), "Device menu rebuilt");
    }

    fn refresh_icon(&mut self) {
        let level = self.audio.volume();
        let muted = self.audio.is_muted();
        if let Err(e) = self.icon_state.update(
            self.icon.as_mut(),
            &self.icon_frames,
            &self.description,
            level,
            muted,
        ) {
            warn!("Failed to update notification icon: {}", e);
        }
    }

    /// Center both overlays horizontally on `monitor`, `bottom_offset`
    /// pixels above its bottom edge.
    pub fn reposition(&mut self, monitor: &Monitor) {
        let center = monitor.rect.left + monitor.width() / 2;
        for overlay in [&mut self.volume, &mut self.mute] {
            let window = overlay.window_mut();
            let x = center - window.width() / 2;
            let y = monitor.rect.bottom - window.height() - self.bottom_offset;
            window.set_position(x, y);
        }
        debug!(display = %monitor.name, "Overlays positioned");
    }

    /// Another OSD category is about to show: get out of its way.
    pub fn hide_for(&mut self, kind: OsdKind) {
        if kind == OsdKind::Volume {
            return;
        }
        let now = Instant::now();
        self.volume.hide(true, now);
        self.mute.hide(true, now);
    }

    /// Remove the notification icon and hide both overlays for good.
    pub fn shutdown(&mut self) {
        let now = Instant::now();
        self.icon.remove();
        self.volume.hide(true, now);
        self.mute.hide(true, now);
    }

    /// Device id the user picked from the menu, if any.
    pub fn pinned_device(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn icon_state(&self) -> &IconState {
        &self.icon_state
    }

    pub fn volume_state(&self) -> OverlayState {
        self.volume.state_at(Instant::now())
    }

    pub fn mute_state(&self) -> OverlayState {
        self.mute.state_at(Instant::now())
    }
}
