//! Layered overlay windows.
//!
//! Each overlay is a borderless, topmost, per-pixel-alpha window painted
//! with `UpdateLayeredWindow` from the composed skin frame. The window owns
//! its visible-duration and fade timers. The interactive variant serves as
//! the volume slider: it takes focus, follows mouse drags and closes when
//! it loses activation.

use crate::audio::EventSender;
use crate::display::win32::window_handle;
use crate::display::WindowHandle;
use crate::osd::skin::compose_frame;
use crate::osd::{HideAnimation, Meter, OsdEvent, OverlayWindow, SkinImage, VolumeSlider};
use std::cell::RefCell;
use std::ffi::c_void;
use std::mem::size_of;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{trace, warn};
use windows::core::w;
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, SIZE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, SelectObject, AC_SRC_ALPHA,
    AC_SRC_OVER, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, BLENDFUNCTION, DIB_RGB_COLORS, HGDIOBJ,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{ReleaseCapture, SetCapture};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetCursorPos, GetWindowLongPtrW, KillTimer,
    RegisterClassExW, SetForegroundWindow, SetTimer, SetWindowLongPtrW, ShowWindow, GWLP_USERDATA,
    SW_HIDE, SW_SHOW, SW_SHOWNOACTIVATE, UpdateLayeredWindow, ULW_ALPHA, WM_ACTIVATE,
    WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE, WM_NCDESTROY, WM_TIMER, WNDCLASSEXW, WS_EX_LAYERED,
    WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

const TIMER_VISIBLE: usize = 1;
const TIMER_FADE: usize = 2;
const FADE_TICK_MS: u32 = 15;
const WA_INACTIVE: usize = 0;

struct WindowState {
    background: SkinImage,
    meters: Vec<Meter>,
    level: f32,
    x: i32,
    y: i32,
    visible_for: Duration,
    animation: HideAnimation,
    alpha: u8,
    fade_started: Option<Instant>,
    visible: bool,

    /// Slider only: where drags are reported
    slider: Option<EventSender>,
    dragging: bool,
}

/// A layered overlay window.
pub struct LayeredWindow {
    hwnd: HWND,
    state: Rc<RefCell<WindowState>>,
}

impl LayeredWindow {
    /// Create a click-through overlay.
    pub fn overlay() -> windows::core::Result<Self> {
        Self::create(None)
    }

    /// Create the interactive slider; drags are sent as `SliderMoved`.
    pub fn slider(
        background: &SkinImage,
        meter: Meter,
        sender: EventSender,
    ) -> windows::core::Result<Self> {
        let window = Self::create(Some(sender))?;
        window.state.borrow_mut().background = background.clone();
        window.state.borrow_mut().meters.push(meter);
        Ok(window)
    }

    fn create(slider: Option<EventSender>) -> windows::core::Result<Self> {
        let class_name = w!("VolumeOsdOverlay");
        let interactive = slider.is_some();

        unsafe {
            let instance = GetModuleHandleW(None)?;

            let wc = WNDCLASSEXW {
                cbSize: size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(window_proc),
                hInstance: instance.into(),
                lpszClassName: class_name,
                ..Default::default()
            };
            // Fails harmlessly once the class exists
            RegisterClassExW(&wc);

            let mut ex_style = WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW;
            if !interactive {
                ex_style |= WS_EX_TRANSPARENT | WS_EX_NOACTIVATE;
            }

            let hwnd = CreateWindowExW(
                ex_style,
                class_name,
                w!("Volume OSD"),
                WS_POPUP,
                0,
                0,
                0,
                0,
                None,
                None,
                instance,
                None,
            )?;

            let state = Rc::new(RefCell::new(WindowState {
                background: SkinImage::blank(1, 1),
                meters: Vec::new(),
                level: 0.0,
                x: 0,
                y: 0,
                visible_for: Duration::ZERO,
                animation: HideAnimation::None,
                alpha: 255,
                fade_started: None,
                visible: false,
                slider,
                dragging: false,
            }));

            // Released in WM_NCDESTROY
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, Rc::into_raw(Rc::clone(&state)) as isize);

            Ok(Self { hwnd, state })
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut WindowState) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }
}

/// Compose the current frame and push it to the screen.
fn render(hwnd: HWND, state: &RefCell<WindowState>) {
    let (pixels, width, height, x, y, alpha) = {
        let s = state.borrow();
        let frame = compose_frame(&s.background, &s.meters, s.level);
        (
            frame.premultiplied_bgra(),
            frame.width as i32,
            frame.height as i32,
            s.x,
            s.y,
            s.alpha,
        )
    };

    unsafe {
        let hdc = CreateCompatibleDC(None);

        let bmi = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height: top-down rows
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut bits: *mut c_void = std::ptr::null_mut();
        let bitmap = match CreateDIBSection(hdc, &bmi, DIB_RGB_COLORS, &mut bits, None, 0) {
            Ok(bitmap) if !bits.is_null() => bitmap,
            Ok(bitmap) => {
                let _ = DeleteObject(HGDIOBJ(bitmap.0));
                let _ = DeleteDC(hdc);
                warn!("Overlay bitmap has no pixel storage");
                return;
            }
            Err(e) => {
                let _ = DeleteDC(hdc);
                warn!("Failed to create overlay bitmap: {}", e);
                return;
            }
        };
        std::ptr::copy_nonoverlapping(pixels.as_ptr(), bits as *mut u8, pixels.len());

        let previous = SelectObject(hdc, HGDIOBJ(bitmap.0));

        let position = POINT { x, y };
        let size = SIZE {
            cx: width,
            cy: height,
        };
        let source = POINT { x: 0, y: 0 };
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: alpha,
            AlphaFormat: AC_SRC_ALPHA as u8,
        };

        if let Err(e) = UpdateLayeredWindow(
            hwnd,
            None,
            Some(&position as *const POINT),
            Some(&size as *const SIZE),
            hdc,
            Some(&source as *const POINT),
            COLORREF(0),
            Some(&blend as *const BLENDFUNCTION),
            ULW_ALPHA,
        ) {
            trace!("UpdateLayeredWindow failed: {}", e);
        }

        SelectObject(hdc, previous);
        let _ = DeleteObject(HGDIOBJ(bitmap.0));
        let _ = DeleteDC(hdc);
    }
}

fn start_fade(hwnd: HWND, state: &RefCell<WindowState>) {
    let animated = {
        let mut s = state.borrow_mut();
        match s.animation {
            HideAnimation::FadeOut { .. } => {
                s.fade_started = Some(Instant::now());
                true
            }
            HideAnimation::None => false,
        }
    };

    unsafe {
        let _ = KillTimer(hwnd, TIMER_VISIBLE);
        if animated {
            SetTimer(hwnd, TIMER_FADE, FADE_TICK_MS, None);
        }
    }
    if !animated {
        hide_now(hwnd, state);
    }
}

fn fade_step(hwnd: HWND, state: &RefCell<WindowState>) {
    let done = {
        let mut s = state.borrow_mut();
        let total = s.animation.duration();
        let elapsed = s.fade_started.map(|t| t.elapsed()).unwrap_or(total);
        if total.is_zero() || elapsed >= total {
            true
        } else {
            let remaining = 1.0 - elapsed.as_secs_f32() / total.as_secs_f32();
            s.alpha = (255.0 * remaining) as u8;
            false
        }
    };

    if done {
        hide_now(hwnd, state);
    } else {
        render(hwnd, state);
    }
}

fn hide_now(hwnd: HWND, state: &RefCell<WindowState>) {
    {
        let mut s = state.borrow_mut();
        s.visible = false;
        s.fade_started = None;
        s.dragging = false;
    }
    unsafe {
        let _ = KillTimer(hwnd, TIMER_VISIBLE);
        let _ = KillTimer(hwnd, TIMER_FADE);
        let _ = ShowWindow(hwnd, SW_HIDE);
    }
}

/// Move the slider to `x` (client coordinates) and report the new level.
fn drag_to(hwnd: HWND, state: &RefCell<WindowState>, x: i32) {
    let sender = {
        let mut s = state.borrow_mut();
        let Some(meter) = s.meters.first() else {
            return;
        };
        let width = meter.rect.width().max(1);
        let level = ((x - meter.rect.left) as f32 / width as f32).clamp(0.0, 1.0);
        s.level = level;
        s.slider.clone().map(|sender| (sender, level))
    };

    render(hwnd, state);
    if let Some((sender, level)) = sender {
        sender.send(OsdEvent::SliderMoved(level));
    }
}

fn client_x(lparam: LPARAM) -> i32 {
    (lparam.0 & 0xFFFF) as i16 as i32
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const RefCell<WindowState>;
    if ptr.is_null() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    if msg == WM_NCDESTROY {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
        drop(Rc::from_raw(ptr));
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let state = &*ptr;
    // Nested messages sent while state is borrowed fall through
    if state.try_borrow_mut().is_err() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    match msg {
        WM_TIMER => {
            match wparam.0 {
                TIMER_VISIBLE => start_fade(hwnd, state),
                TIMER_FADE => fade_step(hwnd, state),
                _ => {}
            }
            LRESULT(0)
        }
        WM_ACTIVATE => {
            let interactive = state.borrow().slider.is_some();
            if interactive && (wparam.0 & 0xFFFF) == WA_INACTIVE {
                hide_now(hwnd, state);
            }
            LRESULT(0)
        }
        WM_LBUTTONDOWN => {
            if state.borrow().slider.is_some() {
                state.borrow_mut().dragging = true;
                SetCapture(hwnd);
                drag_to(hwnd, state, client_x(lparam));
            }
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            if state.borrow().dragging {
                drag_to(hwnd, state, client_x(lparam));
            }
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            if state.borrow().dragging {
                state.borrow_mut().dragging = false;
                let _ = ReleaseCapture();
            }
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

impl OverlayWindow for LayeredWindow {
    fn show(&mut self) {
        let visible_ms = self.with_state(|s| {
            s.alpha = 255;
            s.fade_started = None;
            s.visible = true;
            s.visible_for.as_millis() as u32
        });

        render(self.hwnd, &self.state);
        unsafe {
            let _ = KillTimer(self.hwnd, TIMER_FADE);
            let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
            if visible_ms > 0 {
                SetTimer(self.hwnd, TIMER_VISIBLE, visible_ms, None);
            }
        }
    }

    fn hide(&mut self, immediate: bool) {
        if immediate {
            hide_now(self.hwnd, &self.state);
        } else if self.with_state(|s| s.visible && s.fade_started.is_none()) {
            start_fade(self.hwnd, &self.state);
        }
    }

    fn set_position(&mut self, x: i32, y: i32) {
        let visible = self.with_state(|s| {
            s.x = x;
            s.y = y;
            s.visible
        });
        if visible {
            render(self.hwnd, &self.state);
        }
    }

    fn set_meter_level(&mut self, level: f32) {
        let visible = self.with_state(|s| {
            s.level = level.clamp(0.0, 1.0);
            s.visible
        });
        if visible {
            render(self.hwnd, &self.state);
        }
    }

    fn set_background_image(&mut self, image: &SkinImage) {
        self.with_state(|s| s.background = image.clone());
    }

    fn add_meter(&mut self, meter: Meter) {
        self.with_state(|s| s.meters.push(meter));
    }

    fn set_hide_animation(&mut self, animation: HideAnimation) {
        self.with_state(|s| s.animation = animation);
    }

    fn set_visible_duration(&mut self, duration: Duration) {
        self.with_state(|s| s.visible_for = duration);
    }

    fn width(&self) -> i32 {
        self.state.borrow().background.width as i32
    }

    fn height(&self) -> i32 {
        self.state.borrow().background.height as i32
    }

    fn handle(&self) -> WindowHandle {
        window_handle(self.hwnd)
    }
}

impl VolumeSlider for LayeredWindow {
    fn set_level(&mut self, level: f32) {
        // Ignore echoes while the user is dragging
        if self.with_state(|s| s.dragging) {
            return;
        }
        self.set_meter_level(level);
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    /// Open above the cursor (the notification icon that was clicked).
    fn show(&mut self) {
        let mut cursor = POINT::default();
        unsafe {
            let _ = GetCursorPos(&mut cursor);
        }
        self.with_state(|s| {
            s.x = cursor.x - s.background.width as i32 / 2;
            s.y = cursor.y - s.background.height as i32 - 16;
            s.alpha = 255;
            s.visible = true;
        });

        render(self.hwnd, &self.state);
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
            let _ = SetForegroundWindow(self.hwnd);
        }
    }
}

impl Drop for LayeredWindow {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}
