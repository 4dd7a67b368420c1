//! Win32 display backend.
//!
//! Monitor enumeration through GDI and the Direct3D 9Ex occlusion probe.

use super::monitor::{DisplayDevice, Monitor, MonitorHandle, Point, Rect, WindowHandle};
use super::topology::{DisplayBackend, DisplayError};
use std::ffi::c_void;
use std::mem::size_of;
use tracing::trace;
use windows::core::{Interface, HRESULT, PCWSTR};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Direct3D9::{
    Direct3DCreate9Ex, IDirect3DDevice9Ex, D3DADAPTER_DEFAULT, D3DCREATE_HARDWARE_VERTEXPROCESSING,
    D3DDEVTYPE_HAL, D3DPRESENT_PARAMETERS, D3DSWAPEFFECT_DISCARD, D3D_SDK_VERSION,
};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayDevicesW, EnumDisplayMonitors, GetMonitorInfoW, MonitorFromPoint,
    MonitorFromWindow, DISPLAY_DEVICEW, DISPLAY_DEVICE_ACTIVE, DISPLAY_DEVICE_PRIMARY_DEVICE, HDC,
    HMONITOR, MONITORINFO, MONITORINFOEXW, MONITOR_DEFAULTTONULL, MONITOR_DEFAULTTOPRIMARY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetDesktopWindow, GetForegroundWindow, GetShellWindow, GetWindowRect,
};

// Success code returned by CheckDeviceState when another surface owns the screen.
const S_PRESENT_OCCLUDED: HRESULT = HRESULT(0x0876_0868);

/// Display backend backed by GDI and Direct3D 9Ex.
#[derive(Debug, Default)]
pub struct Win32Display;

impl Win32Display {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0 as *mut c_void)
}

pub(crate) fn window_handle(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0 as isize)
}

fn hmonitor(handle: MonitorHandle) -> HMONITOR {
    HMONITOR(handle.0 as *mut c_void)
}

fn rect(r: RECT) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

fn non_null(hwnd: HWND) -> Option<WindowHandle> {
    if hwnd.0.is_null() {
        None
    } else {
        Some(window_handle(hwnd))
    }
}

/// Read the monitor's device name and both rectangles.
fn query_monitor(monitor: HMONITOR) -> Option<Monitor> {
    let mut info = MONITORINFOEXW::default();
    info.monitorInfo.cbSize = size_of::<MONITORINFOEXW>() as u32;

    let ok = unsafe {
        GetMonitorInfoW(monitor, &mut info.monitorInfo as *mut MONITORINFO).as_bool()
    };
    if !ok {
        return None;
    }

    Some(Monitor::new(
        MonitorHandle(monitor.0 as isize),
        wide_to_string(&info.szDevice),
        rect(info.monitorInfo.rcMonitor),
        rect(info.monitorInfo.rcWork),
    ))
}

unsafe extern "system" fn collect_monitor(
    monitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    data: LPARAM,
) -> BOOL {
    let monitors = &mut *(data.0 as *mut Vec<Monitor>);
    if let Some(m) = query_monitor(monitor) {
        trace!(name = %m.name, rect = ?m.rect, "Enumerated monitor");
        monitors.push(m);
    }
    TRUE
}

impl DisplayBackend for Win32Display {
    fn enumerate(&self) -> Vec<Monitor> {
        let mut monitors: Vec<Monitor> = Vec::new();
        unsafe {
            let _ = EnumDisplayMonitors(
                None,
                None,
                Some(collect_monitor),
                LPARAM(&mut monitors as *mut Vec<Monitor> as isize),
            );
        }
        monitors
    }

    fn monitor_info(&self, handle: MonitorHandle) -> Option<Monitor> {
        query_monitor(hmonitor(handle))
    }

    fn monitor_from_point(&self, point: Point) -> Option<MonitorHandle> {
        let pt = POINT {
            x: point.x,
            y: point.y,
        };
        let monitor = unsafe { MonitorFromPoint(pt, MONITOR_DEFAULTTOPRIMARY) };
        if monitor.0.is_null() {
            None
        } else {
            Some(MonitorHandle(monitor.0 as isize))
        }
    }

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle> {
        let monitor = unsafe { MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONULL) };
        if monitor.0.is_null() {
            None
        } else {
            Some(MonitorHandle(monitor.0 as isize))
        }
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        non_null(unsafe { GetForegroundWindow() })
    }

    fn shell_window(&self) -> Option<WindowHandle> {
        non_null(unsafe { GetShellWindow() })
    }

    fn desktop_window(&self) -> Option<WindowHandle> {
        non_null(unsafe { GetDesktopWindow() })
    }

    fn window_rect(&self, window: WindowHandle) -> Option<Rect> {
        let mut r = RECT::default();
        unsafe { GetWindowRect(hwnd(window), &mut r) }.ok()?;
        Some(rect(r))
    }

    fn probe_occlusion(&self, window: WindowHandle) -> Result<bool, DisplayError> {
        let target = hwnd(window);

        // The factory and device are COM objects released on drop at the end
        // of this scope.
        let d3d = unsafe { Direct3DCreate9Ex(D3D_SDK_VERSION) }
            .map_err(|e| DisplayError::ProbeDeviceFailed(e.to_string()))?;

        let mut params = D3DPRESENT_PARAMETERS {
            Windowed: TRUE,
            SwapEffect: D3DSWAPEFFECT_DISCARD,
            hDeviceWindow: target,
            ..Default::default()
        };
        let mut device: Option<IDirect3DDevice9Ex> = None;

        unsafe {
            d3d.CreateDeviceEx(
                D3DADAPTER_DEFAULT,
                D3DDEVTYPE_HAL,
                target,
                D3DCREATE_HARDWARE_VERTEXPROCESSING as u32,
                &mut params,
                std::ptr::null_mut(),
                &mut device,
            )
        }
        .map_err(|e| DisplayError::ProbeDeviceFailed(e.to_string()))?;

        let device = device
            .ok_or_else(|| DisplayError::ProbeDeviceFailed("no device returned".to_string()))?;

        // Call through the vtable: the generated wrapper folds success codes
        // such as S_PRESENT_OCCLUDED into Ok(()).
        let hr = unsafe {
            (Interface::vtable(&device).CheckDeviceState)(Interface::as_raw(&device), HWND::default())
        };

        Ok(hr == S_PRESENT_OCCLUDED)
    }

    fn display_devices(&self) -> Vec<DisplayDevice> {
        let mut devices = Vec::new();
        let mut index = 0u32;

        loop {
            let mut dev = DISPLAY_DEVICEW {
                cb: size_of::<DISPLAY_DEVICEW>() as u32,
                ..Default::default()
            };
            let found =
                unsafe { EnumDisplayDevicesW(PCWSTR::null(), index, &mut dev, 0) }.as_bool();
            if !found {
                break;
            }

            let flags = dev.StateFlags.0;
            devices.push(DisplayDevice {
                name: wide_to_string(&dev.DeviceName),
                description: wide_to_string(&dev.DeviceString),
                state_flags: flags,
                active: flags & DISPLAY_DEVICE_ACTIVE.0 != 0,
                primary: flags & DISPLAY_DEVICE_PRIMARY_DEVICE.0 != 0,
            });
            index += 1;
        }

        devices
    }
}
