//! Side effects the controller asks of the surrounding application.

use super::event::OsdKind;

pub trait OsdHost {
    /// Launch the settings application.
    fn open_settings(&mut self);

    /// Launch the system volume mixer.
    fn open_mixer(&mut self);

    /// Tell every other OSD category to hide so overlays never stack.
    fn hide_others(&mut self, except: OsdKind);

    /// True when popup menus drop right-aligned.
    fn menu_drop_alignment(&self) -> bool;

    /// Bring the control window to the foreground so a popup menu
    /// dismisses on outside clicks.
    fn take_foreground(&mut self);
}
