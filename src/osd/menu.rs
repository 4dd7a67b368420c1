//! Context menu contract.

use super::event::MenuCommand;
use crate::display::Point;

/// Horizontal alignment of a popup menu relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAlignment {
    Left,
    Right,
}

impl MenuAlignment {
    /// Menus drop right-aligned when the system drop-alignment flag is set
    /// (right-handed tablet setting).
    pub fn from_drop_alignment(right_aligned: bool) -> Self {
        if right_aligned {
            MenuAlignment::Right
        } else {
            MenuAlignment::Left
        }
    }
}

/// The notification icon's context menu.
///
/// Fixed entries (settings, mixer, exit) are part of the menu itself; the
/// controller only manages the positional entries of the device submenu.
pub trait ContextMenu {
    /// Number of entries currently in the device submenu.
    fn device_count(&self) -> usize;

    fn remove_device(&mut self, position: usize);

    fn insert_device(&mut self, position: usize, label: &str, checked: bool, command: MenuCommand);

    /// Show the menu and block until it closes. Returns the chosen command.
    fn popup(&mut self, position: Point, alignment: MenuAlignment) -> Option<MenuCommand>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_alignment_maps_to_side() {
        assert_eq!(MenuAlignment::from_drop_alignment(true), MenuAlignment::Right);
        assert_eq!(MenuAlignment::from_drop_alignment(false), MenuAlignment::Left);
    }
}
