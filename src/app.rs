//! Application state and lifecycle management.
//!
//! `App` owns the OSD controller, the display topology and the receiving
//! end of the event channel. Everything that changes controller state runs
//! here, on the control thread.

use crate::display::DisplayTopology;
use crate::osd::{OsdController, OsdEvent, OsdParts};
use crate::platform::OsdSettings;
use std::ops::ControlFlow;
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::{debug, info, trace};

/// Main application state.
pub struct App {
    controller: OsdController,
    displays: DisplayTopology,
    events: Receiver<OsdEvent>,
}

impl App {
    /// Build the topology map and the controller.
    pub fn new(
        parts: OsdParts,
        settings: &OsdSettings,
        mut displays: DisplayTopology,
        events: Receiver<OsdEvent>,
    ) -> Self {
        displays.refresh();
        let controller = OsdController::new(parts, settings, &displays);

        Self {
            controller,
            displays,
            events,
        }
    }

    /// Handle one event immediately.
    pub fn dispatch(&mut self, event: OsdEvent) -> ControlFlow<()> {
        trace!(?event, "Dispatching event");
        self.controller.handle(event, &mut self.displays)
    }

    /// Drain every queued event without blocking. Stops at the first event
    /// that asks the application to exit.
    pub fn pump(&mut self) -> ControlFlow<()> {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.dispatch(event)?,
                Err(TryRecvError::Empty) => return ControlFlow::Continue(()),
                Err(TryRecvError::Disconnected) => {
                    debug!("Event channel closed");
                    return ControlFlow::Continue(());
                }
            }
        }
    }

    pub fn shutdown(&mut self) {
        info!("Shutting down");
        self.controller.shutdown();
    }

    pub fn controller(&self) -> &OsdController {
        &self.controller
    }

    pub fn displays(&self) -> &DisplayTopology {
        &self.displays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::event_channel;
    use crate::display::topology::fake::topology;
    use crate::osd::testing::{IconCall, Rig, WindowCall};
    use crate::osd::{MenuCommand, OsdKind};
    use std::thread;

    fn app(rig: &Rig) -> (App, crate::audio::EventSender) {
        let (sender, receiver) = event_channel();
        let app = App::new(
            rig.parts(),
            &OsdSettings::default(),
            topology(&rig.displays),
            receiver,
        );
        (app, sender)
    }

    #[test]
    fn new_refreshes_displays() {
        let rig = Rig::new();
        let (app, _sender) = app(&rig);

        assert_eq!(app.displays().monitors().len(), 2);
        assert_eq!(app.controller().description(), "Speakers");
    }

    #[test]
    fn events_apply_only_when_pumped() {
        let rig = Rig::new();
        let (mut app, sender) = app(&rig);
        rig.audio.set_level(0.9, false);

        let worker = thread::spawn(move || {
            sender.send(OsdEvent::VolumeChanged);
        });
        worker.join().unwrap();

        assert_eq!(rig.icon.tooltip().as_deref(), Some("Speakers: 47%"));

        assert_eq!(app.pump(), ControlFlow::Continue(()));
        assert_eq!(rig.icon.tooltip().as_deref(), Some("Speakers: 90%"));
    }

    #[test]
    fn pump_stops_at_exit() {
        let rig = Rig::new();
        let (mut app, sender) = app(&rig);
        rig.audio.set_level(0.9, false);

        sender.send(OsdEvent::Menu(MenuCommand::Exit));
        sender.send(OsdEvent::VolumeChanged);

        assert_eq!(app.pump(), ControlFlow::Break(()));
        assert_eq!(rig.icon.tooltip().as_deref(), Some("Speakers: 47%"));

        // The remaining event is still queued
        assert_eq!(app.pump(), ControlFlow::Continue(()));
        assert_eq!(rig.icon.tooltip().as_deref(), Some("Speakers: 90%"));
    }

    #[test]
    fn queued_osd_broadcast_hides_overlays_on_pump() {
        let rig = Rig::new();
        let (mut app, sender) = app(&rig);
        rig.volume.clear();

        // Arrives while the tray menu holds the app
        sender.send(OsdEvent::OsdShown(OsdKind::Brightness));
        assert!(rig.volume.calls().is_empty());

        assert_eq!(app.pump(), ControlFlow::Continue(()));
        assert_eq!(rig.volume.calls(), vec![WindowCall::Hide(true)]);
    }

    #[test]
    fn pump_survives_closed_channel() {
        let rig = Rig::new();
        let (mut app, sender) = app(&rig);
        drop(sender);

        assert_eq!(app.pump(), ControlFlow::Continue(()));
    }

    #[test]
    fn shutdown_removes_icon() {
        let rig = Rig::new();
        let (mut app, _sender) = app(&rig);

        app.shutdown();

        assert_eq!(rig.icon.calls().last(), Some(&IconCall::Remove));
    }
}
