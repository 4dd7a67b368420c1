#![cfg_attr(windows, windows_subsystem = "windows")]

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    shell::run()
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("volume-osd only runs on Windows")
}

#[cfg(windows)]
mod shell {
    use anyhow::Context;
    use std::cell::{Cell, RefCell};
    use std::ffi::c_void;
    use std::path::PathBuf;
    use tracing::{error, info, warn};
    use volume_osd::audio::{event_channel, AudioManager, ComGuard, EventSender};
    use volume_osd::display::{DisplayTopology, Win32Display};
    use volume_osd::osd::skin::{self, Skin};
    use volume_osd::osd::{DirectorySkin, Meter, OsdEvent, OsdKind, OsdParts};
    use volume_osd::platform::{icons, RegistryPreferences};
    use volume_osd::ui::{hide_osd_message, LayeredWindow, PopupMenu, TrayManager, Win32Host};
    use volume_osd::{logging, App};
    use windows::core::{w, PCWSTR};
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, MessageBoxW,
        PostMessageW, PostQuitMessage, RegisterClassExW, TranslateMessage, CW_USEDEFAULT,
        MB_ICONERROR, MB_OK, MSG, WINDOW_EX_STYLE, WM_APP, WM_DESTROY, WM_DISPLAYCHANGE,
        WNDCLASSEXW, WS_OVERLAPPED,
    };

    /// Posted by the event channel's waker: drain the queue.
    const WM_APP_WAKE: u32 = WM_APP + 1;

    thread_local! {
        static APP: RefCell<Option<App>> = const { RefCell::new(None) };
        static SENDER: RefCell<Option<EventSender>> = const { RefCell::new(None) };
        static HIDE_MESSAGE: Cell<u32> = const { Cell::new(0) };
    }

    /// Run `f` on the app unless it is missing or already borrowed further up
    /// the stack (a modal loop inside an event handler).
    fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
        APP.with(|cell| {
            let mut app = cell.try_borrow_mut().ok()?;
            app.as_mut().map(f)
        })
    }

    fn send(event: OsdEvent) {
        SENDER.with(|sender| {
            if let Some(sender) = sender.borrow().as_ref() {
                sender.send(event);
            }
        });
    }

    fn show_error(msg: &str) {
        unsafe {
            let msg_wide: Vec<u16> = msg.encode_utf16().chain(std::iter::once(0)).collect();
            MessageBoxW(
                None,
                PCWSTR(msg_wide.as_ptr()),
                w!("Volume OSD Error"),
                MB_OK | MB_ICONERROR,
            );
        }
    }

    fn log_dir() -> Option<PathBuf> {
        let dir = PathBuf::from(std::env::var_os("LOCALAPPDATA")?).join("VolumeOsd");
        std::fs::create_dir_all(&dir).ok()?;
        Some(dir)
    }

    pub fn run() -> anyhow::Result<()> {
        let preferences = RegistryPreferences::new();
        let settings = preferences.load();
        let _log_guard = logging::init(settings.debug_logging, log_dir().as_deref());
        info!(version = env!("CARGO_PKG_VERSION"), "Starting");

        let result = start(&preferences, &settings);
        if let Err(ref e) = result {
            error!("{:#}", e);
            show_error(&format!("{:#}", e));
        }
        result
    }

    fn start(
        preferences: &RegistryPreferences,
        settings: &volume_osd::OsdSettings,
    ) -> anyhow::Result<()> {
        let _com = ComGuard::new().context("COM init failed")?;

        let hwnd = create_dispatch_window().context("Failed to create message window")?;
        HIDE_MESSAGE.with(|m| m.set(hide_osd_message()));

        // HWND is not Send; the waker only needs the raw value
        let raw_hwnd = hwnd.0 as isize;
        let (sender, receiver) = event_channel();
        let sender = sender.with_waker(move || unsafe {
            let _ = PostMessageW(
                HWND(raw_hwnd as *mut c_void),
                WM_APP_WAKE,
                WPARAM(0),
                LPARAM(0),
            );
        });
        SENDER.with(|s| *s.borrow_mut() = Some(sender.clone()));

        let audio = AudioManager::new(sender.clone()).context("Audio init failed")?;
        let skin = DirectorySkin::new(settings.skin_dir.clone());

        let background = skin
            .background_image(skin::VOLUME)
            .unwrap_or_else(|| icons::generate_background(false));
        let slider = LayeredWindow::slider(
            &background,
            Meter::default_bar(background.width, background.height),
            sender.clone(),
        )?;

        let first_frame = skin
            .icon_frames(skin::VOLUME)
            .into_iter()
            .next()
            .unwrap_or_else(|| icons::generate_volume_icon(0, 1));
        let icon = TrayManager::create(&first_frame, "Volume", sender.clone())?;

        let parts = OsdParts {
            audio: Box::new(audio),
            skin: Box::new(skin),
            volume_window: Box::new(LayeredWindow::overlay()?),
            mute_window: Box::new(LayeredWindow::overlay()?),
            slider: Box::new(slider),
            icon: Box::new(icon),
            menu: Box::new(PopupMenu::new(hwnd)?),
            host: Box::new(Win32Host::new(hwnd, &settings.settings_app)),
        };

        let displays = DisplayTopology::new(Box::new(Win32Display::new()));
        let app = App::new(parts, settings, displays, receiver);
        APP.with(|cell| *cell.borrow_mut() = Some(app));

        unsafe {
            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }

        // Tear down COM objects before the guard uninitializes COM
        let app = APP.with(|cell| cell.borrow_mut().take());
        SENDER.with(|s| s.borrow_mut().take());
        if let Some(mut app) = app {
            let pinned = app.controller().pinned_device().map(str::to_owned);
            app.shutdown();
            drop(app);

            if pinned != settings.audio_device {
                if let Err(e) = preferences.save_pinned_device(pinned.as_deref()) {
                    warn!("Failed to save device pin: {}", e);
                }
            }
        }

        info!("Exited");
        Ok(())
    }

    /// Hidden top-level window. It receives the wake message, display
    /// changes and the hide-OSD broadcast, and owns the popup menu.
    fn create_dispatch_window() -> windows::core::Result<HWND> {
        unsafe {
            let instance = GetModuleHandleW(None)?;
            let window_class = w!("VolumeOsdDispatcher");

            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(window_proc),
                hInstance: instance.into(),
                lpszClassName: window_class,
                ..Default::default()
            };
            RegisterClassExW(&wc);

            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                window_class,
                w!("Volume OSD"),
                WS_OVERLAPPED,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                None,
                None,
                instance,
                None,
            )
        }
    }

    unsafe extern "system" fn window_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_APP_WAKE => {
                // Busy means an outer pump is still draining the queue
                if let Some(flow) = with_app(|app| app.pump()) {
                    if flow.is_break() {
                        let _ = DestroyWindow(hwnd);
                    }
                }
                LRESULT(0)
            }
            WM_DISPLAYCHANGE => {
                send(OsdEvent::DisplayChanged);
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            // Queued like every other event so a running popup menu cannot drop it
            _ if msg != 0 && msg == HIDE_MESSAGE.with(Cell::get) => {
                if let Some(kind) = OsdKind::from_raw(wparam.0 as u32) {
                    send(OsdEvent::OsdShown(kind));
                }
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}
