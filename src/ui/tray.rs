//! System tray icon management.
//!
//! Owns the notification area icon and forwards its clicks into the event
//! channel. The context menu is shown by the controller, not by tray-icon.

use crate::audio::EventSender;
use crate::display::Point;
use crate::osd::{IconError, NotifyIcon, OsdEvent, SkinImage, TrayAction};
use thiserror::Error;
use tracing::{debug, warn};
use tray_icon::{Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent};

/// Tray service error types.
#[derive(Debug, Error)]
pub enum TrayError {
    #[error("Failed to create tray icon: {0}")]
    CreateFailed(String),

    #[error("Failed to load icon image: {0}")]
    IconLoadFailed(String),
}

/// System tray manager.
pub struct TrayManager {
    tray_icon: Option<TrayIcon>,
}

impl TrayManager {
    /// Create and show the tray icon, routing clicks to `sender`.
    pub fn create(initial: &SkinImage, tooltip: &str, sender: EventSender) -> Result<Self, TrayError> {
        let icon = Self::icon(initial).map_err(|e| TrayError::IconLoadFailed(e.to_string()))?;

        let tray_icon = TrayIconBuilder::new()
            .with_icon(icon)
            .with_tooltip(tooltip)
            .build()
            .map_err(|e| TrayError::CreateFailed(e.to_string()))?;

        TrayIconEvent::set_event_handler(Some(move |event: TrayIconEvent| {
            if let Some(action) = Self::action(&event) {
                sender.send(OsdEvent::Tray(action));
            }
        }));

        Ok(Self {
            tray_icon: Some(tray_icon),
        })
    }

    /// Map a click to the action it triggers. Buttons act on release.
    fn action(event: &TrayIconEvent) -> Option<TrayAction> {
        match event {
            TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } => Some(TrayAction::Primary),
            TrayIconEvent::Click {
                button: MouseButton::Right,
                button_state: MouseButtonState::Up,
                position,
                ..
            } => Some(TrayAction::Secondary {
                position: Point::new(position.x as i32, position.y as i32),
            }),
            _ => None,
        }
    }

    fn icon(image: &SkinImage) -> Result<Icon, tray_icon::BadIcon> {
        Icon::from_rgba(image.rgba.clone(), image.width, image.height)
    }
}

impl NotifyIcon for TrayManager {
    fn set_image(&mut self, image: &SkinImage) -> Result<(), IconError> {
        let icon = Self::icon(image).map_err(|e| IconError::UpdateFailed(e.to_string()))?;
        if let Some(tray) = self.tray_icon.as_mut() {
            tray.set_icon(Some(icon))
                .map_err(|e| IconError::UpdateFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn set_tooltip(&mut self, text: &str) -> Result<(), IconError> {
        if let Some(tray) = self.tray_icon.as_mut() {
            tray.set_tooltip(Some(text))
                .map_err(|e| IconError::TooltipFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn remove(&mut self) {
        TrayIconEvent::set_event_handler(None::<fn(TrayIconEvent)>);
        if self.tray_icon.take().is_some() {
            debug!("Tray icon removed");
        } else {
            warn!("Tray icon already removed");
        }
    }
}
