//! Recording fakes for the OSD collaborators.
//!
//! Every fake is a cheap `Clone` over shared state, so a test keeps one
//! handle and gives the other to the controller.

use super::controller::{OsdController, OsdParts};
use super::event::{MenuCommand, OsdKind};
use super::host::OsdHost;
use super::icon::{IconError, NotifyIcon};
use super::menu::{ContextMenu, MenuAlignment};
use super::overlay::{HideAnimation, OverlayWindow, VolumeSlider};
use super::skin::{Meter, Skin, SkinImage};
use crate::audio::{AudioEndpoint, AudioError, DeviceDescriptor};
use crate::display::topology::fake::{topology, FakeDisplays};
use crate::display::{DisplayTopology, Point, Rect, WindowHandle};
use crate::platform::OsdSettings;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCall {
    Show,
    Hide(bool),
    Position(i32, i32),
    Level(f32),
    Background(u32, u32),
    Meter,
    Animation(HideAnimation),
    VisibleDuration(Duration),
}

#[derive(Clone)]
pub struct FakeOverlay {
    handle: WindowHandle,
    calls: Rc<RefCell<Vec<WindowCall>>>,
}

impl FakeOverlay {
    pub const WIDTH: i32 = 200;
    pub const HEIGHT: i32 = 60;

    pub fn new(id: isize) -> Self {
        Self {
            handle: WindowHandle(0x100 + id),
            calls: Rc::default(),
        }
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn shows(&self) -> usize {
        self.calls.borrow().iter().filter(|c| **c == WindowCall::Show).count()
    }

    pub fn position(&self) -> Option<(i32, i32)> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            WindowCall::Position(x, y) => Some((*x, *y)),
            _ => None,
        })
    }

    pub fn level(&self) -> Option<f32> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            WindowCall::Level(level) => Some(*level),
            _ => None,
        })
    }

    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    fn record(&self, call: WindowCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl OverlayWindow for FakeOverlay {
    fn show(&mut self) {
        self.record(WindowCall::Show);
    }

    fn hide(&mut self, immediate: bool) {
        self.record(WindowCall::Hide(immediate));
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.record(WindowCall::Position(x, y));
    }

    fn set_meter_level(&mut self, level: f32) {
        self.record(WindowCall::Level(level));
    }

    fn set_background_image(&mut self, image: &SkinImage) {
        self.record(WindowCall::Background(image.width, image.height));
    }

    fn add_meter(&mut self, _meter: Meter) {
        self.record(WindowCall::Meter);
    }

    fn set_hide_animation(&mut self, animation: HideAnimation) {
        self.record(WindowCall::Animation(animation));
    }

    fn set_visible_duration(&mut self, duration: Duration) {
        self.record(WindowCall::VisibleDuration(duration));
    }

    fn width(&self) -> i32 {
        Self::WIDTH
    }

    fn height(&self) -> i32 {
        Self::HEIGHT
    }

    fn handle(&self) -> WindowHandle {
        self.handle
    }
}

#[derive(Debug, Default)]
pub struct SliderState {
    pub level: Option<f32>,
    pub visible: bool,
    pub shows: usize,
}

#[derive(Clone, Default)]
pub struct FakeSlider(pub Rc<RefCell<SliderState>>);

impl VolumeSlider for FakeSlider {
    fn set_level(&mut self, level: f32) {
        self.0.borrow_mut().level = Some(level);
    }

    fn is_visible(&self) -> bool {
        self.0.borrow().visible
    }

    fn show(&mut self) {
        let mut state = self.0.borrow_mut();
        state.visible = true;
        state.shows += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconCall {
    /// Identified by the frame's width
    Image(u32),
    Tooltip(String),
    Remove,
}

#[derive(Clone, Default)]
pub struct FakeIcon(Rc<RefCell<Vec<IconCall>>>);

impl FakeIcon {
    pub fn calls(&self) -> Vec<IconCall> {
        self.0.borrow().clone()
    }

    pub fn images(&self) -> Vec<u32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                IconCall::Image(width) => Some(*width),
                _ => None,
            })
            .collect()
    }

    pub fn tooltip(&self) -> Option<String> {
        self.0.borrow().iter().rev().find_map(|c| match c {
            IconCall::Tooltip(text) => Some(text.clone()),
            _ => None,
        })
    }
}

impl NotifyIcon for FakeIcon {
    fn set_image(&mut self, image: &SkinImage) -> Result<(), IconError> {
        self.0.borrow_mut().push(IconCall::Image(image.width));
        Ok(())
    }

    fn set_tooltip(&mut self, text: &str) -> Result<(), IconError> {
        self.0.borrow_mut().push(IconCall::Tooltip(text.to_string()));
        Ok(())
    }

    fn remove(&mut self) {
        self.0.borrow_mut().push(IconCall::Remove);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: String,
    pub checked: bool,
    pub command: MenuCommand,
}

#[derive(Debug, Default)]
pub struct MenuState {
    pub entries: Vec<MenuEntry>,
    pub popups: Vec<(Point, MenuAlignment)>,
    pub choice: Option<MenuCommand>,
    pub removals: usize,
}

#[derive(Clone, Default)]
pub struct FakeMenu(pub Rc<RefCell<MenuState>>);

impl FakeMenu {
    pub fn entries(&self) -> Vec<MenuEntry> {
        self.0.borrow().entries.clone()
    }

    /// Labels with a `*` marking the checked entry.
    pub fn labels(&self) -> Vec<String> {
        self.0
            .borrow()
            .entries
            .iter()
            .map(|e| {
                if e.checked {
                    format!("*{}", e.label)
                } else {
                    e.label.clone()
                }
            })
            .collect()
    }
}

impl ContextMenu for FakeMenu {
    fn device_count(&self) -> usize {
        self.0.borrow().entries.len()
    }

    fn remove_device(&mut self, position: usize) {
        let mut state = self.0.borrow_mut();
        state.entries.remove(position);
        state.removals += 1;
    }

    fn insert_device(&mut self, position: usize, label: &str, checked: bool, command: MenuCommand) {
        self.0.borrow_mut().entries.insert(
            position,
            MenuEntry {
                label: label.to_string(),
                checked,
                command,
            },
        );
    }

    fn popup(&mut self, position: Point, alignment: MenuAlignment) -> Option<MenuCommand> {
        let mut state = self.0.borrow_mut();
        state.popups.push((position, alignment));
        state.choice.take()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    OpenSettings,
    OpenMixer,
    HideOthers(OsdKind),
    TakeForeground,
}

#[derive(Debug, Default)]
pub struct HostState {
    pub calls: Vec<HostCall>,
    pub right_aligned: bool,
}

#[derive(Clone, Default)]
pub struct FakeHost(pub Rc<RefCell<HostState>>);

impl FakeHost {
    pub fn calls(&self) -> Vec<HostCall> {
        self.0.borrow().calls.clone()
    }
}

impl OsdHost for FakeHost {
    fn open_settings(&mut self) {
        self.0.borrow_mut().calls.push(HostCall::OpenSettings);
    }

    fn open_mixer(&mut self) {
        self.0.borrow_mut().calls.push(HostCall::OpenMixer);
    }

    fn hide_others(&mut self, except: OsdKind) {
        self.0.borrow_mut().calls.push(HostCall::HideOthers(except));
    }

    fn menu_drop_alignment(&self) -> bool {
        self.0.borrow().right_aligned
    }

    fn take_foreground(&mut self) {
        self.0.borrow_mut().calls.push(HostCall::TakeForeground);
    }
}

#[derive(Debug, Default)]
pub struct AudioState {
    pub devices: Vec<DeviceDescriptor>,
    pub default_id: Option<String>,
    pub current: Option<String>,
    pub volume: f32,
    pub muted: bool,
    /// Every `select_device` request, successful or not
    pub selects: Vec<String>,
    pub default_selects: usize,
    pub set_volumes: Vec<f32>,
}

#[derive(Clone, Default)]
pub struct FakeAudio(pub Rc<RefCell<AudioState>>);

impl FakeAudio {
    /// Speakers ("A", default and current) and Headset ("B") at 47%.
    pub fn speakers_and_headset() -> Self {
        Self(Rc::new(RefCell::new(AudioState {
            devices: vec![
                DeviceDescriptor::new("A", "Speakers"),
                DeviceDescriptor::new("B", "Headset"),
            ],
            default_id: Some("A".to_string()),
            current: Some("A".to_string()),
            volume: 0.47,
            ..AudioState::default()
        })))
    }

    pub fn set_level(&self, volume: f32, muted: bool) {
        let mut state = self.0.borrow_mut();
        state.volume = volume;
        state.muted = muted;
    }
}

impl AudioEndpoint for FakeAudio {
    fn volume(&self) -> f32 {
        self.0.borrow().volume
    }

    fn set_volume(&mut self, level: f32) -> Result<(), AudioError> {
        let mut state = self.0.borrow_mut();
        let level = level.clamp(0.0, 1.0);
        state.set_volumes.push(level);
        state.volume = level;
        Ok(())
    }

    fn is_muted(&self) -> bool {
        self.0.borrow().muted
    }

    fn devices(&self) -> Vec<DeviceDescriptor> {
        self.0.borrow().devices.clone()
    }

    fn current_device_id(&self) -> Option<String> {
        self.0.borrow().current.clone()
    }

    fn current_device_description(&self) -> String {
        let state = self.0.borrow();
        state
            .current
            .as_ref()
            .and_then(|id| state.devices.iter().find(|d| &d.id == id))
            .map(|d| d.name.clone())
            .unwrap_or_else(|| "No audio device".to_string())
    }

    fn select_device(&mut self, device_id: &str) -> Result<(), AudioError> {
        let mut state = self.0.borrow_mut();
        state.selects.push(device_id.to_string());
        if state.devices.iter().any(|d| d.id == device_id) {
            state.current = Some(device_id.to_string());
            Ok(())
        } else {
            Err(AudioError::DeviceNotFound {
                device_id: device_id.to_string(),
            })
        }
    }

    fn select_default_device(&mut self) -> Result<(), AudioError> {
        let mut state = self.0.borrow_mut();
        state.default_selects += 1;
        match state.default_id.clone() {
            Some(id) => {
                state.current = Some(id);
                Ok(())
            }
            None => {
                state.current = None;
                Err(AudioError::NoDefaultDevice)
            }
        }
    }
}

/// Skin with a fixed number of icon frames; frame `i` is `i + 1` pixels wide.
pub struct FakeSkin {
    pub frames: usize,
}

impl Skin for FakeSkin {
    fn background_image(&self, _category: &str) -> Option<SkinImage> {
        Some(SkinImage::blank(
            FakeOverlay::WIDTH as u32,
            FakeOverlay::HEIGHT as u32,
        ))
    }

    fn meters(&self, category: &str) -> Vec<Meter> {
        if category == super::skin::VOLUME {
            vec![Meter::default_bar(
                FakeOverlay::WIDTH as u32,
                FakeOverlay::HEIGHT as u32,
            )]
        } else {
            Vec::new()
        }
    }

    fn icon_frames(&self, _category: &str) -> Vec<SkinImage> {
        (0..self.frames)
            .map(|i| SkinImage::blank(i as u32 + 1, 1))
            .collect()
    }
}

/// All collaborators of one controller, with the handles a test inspects.
pub struct Rig {
    pub audio: FakeAudio,
    pub volume: FakeOverlay,
    pub mute: FakeOverlay,
    pub slider: FakeSlider,
    pub icon: FakeIcon,
    pub menu: FakeMenu,
    pub host: FakeHost,
    pub displays: Rc<FakeDisplays>,
    pub frames: usize,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            audio: FakeAudio::speakers_and_headset(),
            volume: FakeOverlay::new(1),
            mute: FakeOverlay::new(2),
            slider: FakeSlider::default(),
            icon: FakeIcon::default(),
            menu: FakeMenu::default(),
            host: FakeHost::default(),
            displays: FakeDisplays::dual_head(),
            frames: 5,
        }
    }

    pub fn parts(&self) -> OsdParts {
        OsdParts {
            audio: Box::new(self.audio.clone()),
            skin: Box::new(FakeSkin {
                frames: self.frames,
            }),
            volume_window: Box::new(self.volume.clone()),
            mute_window: Box::new(self.mute.clone()),
            slider: Box::new(self.slider.clone()),
            icon: Box::new(self.icon.clone()),
            menu: Box::new(self.menu.clone()),
            host: Box::new(self.host.clone()),
        }
    }

    pub fn topology(&self) -> DisplayTopology {
        let mut displays = topology(&self.displays);
        displays.refresh();
        displays
    }

    /// Build a controller and clear the window logs of its startup calls.
    pub fn start(&self, settings: &OsdSettings) -> (OsdController, DisplayTopology) {
        let displays = self.topology();
        let controller = OsdController::new(self.parts(), settings, &displays);
        self.place_overlay();
        self.volume.clear();
        self.mute.clear();
        self.host.0.borrow_mut().calls.clear();
        (controller, displays)
    }

    /// Register the volume overlay's on-screen rectangle with the fake
    /// display backend.
    fn place_overlay(&self) {
        if let Some((x, y)) = self.volume.position() {
            self.displays.place_window(
                self.volume.handle(),
                Rect::from_origin_size(x, y, FakeOverlay::WIDTH, FakeOverlay::HEIGHT),
            );
        }
    }
}
