//! Cross-thread event hand-off.
//!
//! Core Audio and the tray icon call back on their own threads. Those
//! callbacks only push an [`OsdEvent`] into a channel; the control thread
//! drains it and is the only place controller state changes. A waker lets
//! the sender nudge the control thread's message loop after each send.

use crate::osd::OsdEvent;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Sending half of the control-thread event channel.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<OsdEvent>,
    waker: Option<Waker>,
}

impl EventSender {
    /// Attach a waker called after every successful send.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Queue an event for the control thread. Returns false once the
    /// receiving side is gone.
    pub fn send(&self, event: OsdEvent) -> bool {
        if self.sender.send(event).is_err() {
            return false;
        }
        if let Some(ref wake) = self.waker {
            wake();
        }
        true
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

/// Creates the event channel between callback threads and the control thread.
pub fn event_channel() -> (EventSender, Receiver<OsdEvent>) {
    let (sender, receiver) = mpsc::channel();
    (
        EventSender {
            sender,
            waker: None,
        },
        receiver,
    )
}

#[cfg(windows)]
pub use com::{DeviceNotificationClient, VolumeNotificationClient};

#[cfg(windows)]
mod com {
    use super::EventSender;
    use crate::osd::OsdEvent;
    use tracing::trace;
    use windows::core::{implement, PCWSTR};
    use windows::Win32::Media::Audio::Endpoints::{
        IAudioEndpointVolumeCallback, IAudioEndpointVolumeCallback_Impl,
    };
    use windows::Win32::Media::Audio::{
        eMultimedia, eRender, EDataFlow, ERole, IMMNotificationClient, IMMNotificationClient_Impl,
        AUDIO_VOLUME_NOTIFICATION_DATA, DEVICE_STATE,
    };
    use windows::Win32::UI::Shell::PropertiesSystem::PROPERTYKEY;
    // Re-export windows_core so the implement macro can find it
    #[allow(unused_imports)]
    use windows_core;

    /// Endpoint notification client: any change to the device set becomes a
    /// `DeviceChanged` event.
    #[implement(IMMNotificationClient)]
    pub struct DeviceNotificationClient {
        sender: EventSender,
    }

    impl DeviceNotificationClient {
        pub fn create(sender: EventSender) -> IMMNotificationClient {
            Self { sender }.into()
        }
    }

    impl DeviceNotificationClient_Impl {
        fn notify_change(&self, reason: &str) {
            trace!(reason, "Endpoint notification");
            self.sender.send(OsdEvent::DeviceChanged);
        }
    }

    impl IMMNotificationClient_Impl for DeviceNotificationClient_Impl {
        fn OnDeviceStateChanged(
            &self,
            _pwstrdeviceid: &PCWSTR,
            _dwnewstate: DEVICE_STATE,
        ) -> windows::core::Result<()> {
            self.notify_change("state changed");
            Ok(())
        }

        fn OnDeviceAdded(&self, _pwstrdeviceid: &PCWSTR) -> windows::core::Result<()> {
            self.notify_change("added");
            Ok(())
        }

        fn OnDeviceRemoved(&self, _pwstrdeviceid: &PCWSTR) -> windows::core::Result<()> {
            self.notify_change("removed");
            Ok(())
        }

        fn OnDefaultDeviceChanged(
            &self,
            flow: EDataFlow,
            role: ERole,
            _pwstrdefaultdeviceid: &PCWSTR,
        ) -> windows::core::Result<()> {
            // Only care about the multimedia output default
            if flow == eRender && role == eMultimedia {
                self.notify_change("default changed");
            }
            Ok(())
        }

        fn OnPropertyValueChanged(
            &self,
            _pwstrdeviceid: &PCWSTR,
            _key: &PROPERTYKEY,
        ) -> windows::core::Result<()> {
            Ok(())
        }
    }

    /// Endpoint volume callback: volume and mute changes become
    /// `VolumeChanged` events. The controller re-reads the values itself.
    #[implement(IAudioEndpointVolumeCallback)]
    pub struct VolumeNotificationClient {
        sender: EventSender,
    }

    impl VolumeNotificationClient {
        pub fn create(sender: EventSender) -> IAudioEndpointVolumeCallback {
            Self { sender }.into()
        }
    }

    impl IAudioEndpointVolumeCallback_Impl for VolumeNotificationClient_Impl {
        fn OnNotify(
            &self,
            _pnotify: *mut AUDIO_VOLUME_NOTIFICATION_DATA,
        ) -> windows::core::Result<()> {
            self.sender.send(OsdEvent::VolumeChanged);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn events_cross_threads_in_order() {
        let (sender, receiver) = event_channel();
        let worker = thread::spawn(move || {
            sender.send(OsdEvent::VolumeChanged);
            sender.send(OsdEvent::DeviceChanged);
        });
        worker.join().unwrap();

        assert_eq!(receiver.try_recv().unwrap(), OsdEvent::VolumeChanged);
        assert_eq!(receiver.try_recv().unwrap(), OsdEvent::DeviceChanged);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn waker_runs_after_each_send() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (sender, _receiver) = event_channel();
        let sender = sender.with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sender.send(OsdEvent::VolumeChanged);
        sender.clone().send(OsdEvent::VolumeChanged);

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn send_reports_closed_channel() {
        let (sender, receiver) = event_channel();
        drop(receiver);
        assert!(!sender.send(OsdEvent::DeviceChanged));
    }
}
