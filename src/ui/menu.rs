//! Win32 popup menu for the notification icon.
//!
//! Layout: Settings, Audio Device (submenu), Mixer, separator, Exit. Menu
//! item ids are private to this module and map back to `MenuCommand`s.

use crate::display::Point;
use crate::osd::{ContextMenu, MenuAlignment, MenuCommand};
use std::collections::HashMap;
use tracing::warn;
use windows::core::{w, PCWSTR};
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, InsertMenuW, RemoveMenu, TrackPopupMenu, HMENU,
    MF_BYPOSITION, MF_CHECKED, MF_POPUP, MF_SEPARATOR, MF_STRING, TPM_LEFTALIGN, TPM_RETURNCMD,
    TPM_RIGHTALIGN, TPM_RIGHTBUTTON,
};

const ID_SETTINGS: u32 = 1;
const ID_MIXER: u32 = 2;
const ID_EXIT: u32 = 3;
const ID_FIRST_DEVICE: u32 = 100;

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

pub struct PopupMenu {
    owner: HWND,
    menu: HMENU,
    devices: HMENU,
    /// Item id of each device entry, by submenu position
    device_ids: Vec<u32>,
    commands: HashMap<u32, MenuCommand>,
    next_id: u32,
}

impl PopupMenu {
    /// Build the fixed part of the menu. `owner` receives focus while the
    /// menu is open.
    pub fn new(owner: HWND) -> windows::core::Result<Self> {
        unsafe {
            let menu = CreatePopupMenu()?;
            let devices = CreatePopupMenu()?;

            AppendMenuW(menu, MF_STRING, ID_SETTINGS as usize, w!("Settings"))?;
            AppendMenuW(menu, MF_POPUP, devices.0 as usize, w!("Audio Device"))?;
            AppendMenuW(menu, MF_STRING, ID_MIXER as usize, w!("Mixer"))?;
            AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null())?;
            AppendMenuW(menu, MF_STRING, ID_EXIT as usize, w!("Exit"))?;

            let commands = HashMap::from([
                (ID_SETTINGS, MenuCommand::Settings),
                (ID_MIXER, MenuCommand::Mixer),
                (ID_EXIT, MenuCommand::Exit),
            ]);

            Ok(Self {
                owner,
                menu,
                devices,
                device_ids: Vec::new(),
                commands,
                next_id: ID_FIRST_DEVICE,
            })
        }
    }
}

impl ContextMenu for PopupMenu {
    fn device_count(&self) -> usize {
        self.device_ids.len()
    }

    fn remove_device(&mut self, position: usize) {
        if position >= self.device_ids.len() {
            return;
        }
        if let Err(e) = unsafe { RemoveMenu(self.devices, position as u32, MF_BYPOSITION) } {
            warn!("Failed to remove device menu entry: {}", e);
        }
        let id = self.device_ids.remove(position);
        self.commands.remove(&id);
    }

    fn insert_device(&mut self, position: usize, label: &str, checked: bool, command: MenuCommand) {
        let id = self.next_id;
        self.next_id += 1;

        let mut flags = MF_BYPOSITION | MF_STRING;
        if checked {
            flags |= MF_CHECKED;
        }
        let label = to_wide(label);
        let inserted = unsafe {
            InsertMenuW(
                self.devices,
                position as u32,
                flags,
                id as usize,
                PCWSTR::from_raw(label.as_ptr()),
            )
        };

        match inserted {
            Ok(()) => {
                let position = position.min(self.device_ids.len());
                self.device_ids.insert(position, id);
                self.commands.insert(id, command);
            }
            Err(e) => warn!("Failed to add device menu entry: {}", e),
        }
    }

    fn popup(&mut self, position: Point, alignment: MenuAlignment) -> Option<MenuCommand> {
        let align = match alignment {
            MenuAlignment::Left => TPM_LEFTALIGN,
            MenuAlignment::Right => TPM_RIGHTALIGN,
        };

        // With TPM_RETURNCMD the result is the chosen item id, or 0
        let chosen = unsafe {
            TrackPopupMenu(
                self.menu,
                TPM_RETURNCMD | TPM_RIGHTBUTTON | align,
                position.x,
                position.y,
                0,
                self.owner,
                None,
            )
        };

        self.commands.get(&(chosen.0 as u32)).copied()
    }
}

impl Drop for PopupMenu {
    fn drop(&mut self) {
        // Destroying the top menu destroys the attached submenu too
        unsafe {
            let _ = DestroyMenu(self.menu);
        }
    }
}
