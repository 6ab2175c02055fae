// ── Main window ───────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the main window class with a black background brush (the
//     compositor treats black GDI pixels as fully transparent).
//   • Create the top-level window and attach a menu bar.
//   • Apply the background blur at startup when settings ask for it.
//   • Run the Win32 message loop.
//   • Dispatch WM_COMMAND (blur toggle, about, exit), WM_CLOSE, WM_DESTROY.
//   • Expose a safe error-dialog helper for use by main().

#![allow(unsafe_code)]

use tracing::{info, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::Gdi::{GetStockObject, UpdateWindow, BLACK_BRUSH, HBRUSH},
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            AppendMenuW, CreateMenu, CreateWindowExW, DefWindowProcW, DestroyWindow,
            DispatchMessageW, GetMessageW, LoadCursorW, LoadIconW, MessageBoxW,
            PostQuitMessage, RegisterClassExW, SetMenu, ShowWindow, TranslateMessage,
            CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, HMENU, IDC_ARROW, IDI_APPLICATION,
            MB_ICONERROR, MB_OK, MF_POPUP, MF_SEPARATOR, MF_STRING, MSG, SW_SHOW,
            WINDOW_EX_STYLE, WM_CLOSE, WM_COMMAND, WM_DESTROY, WNDCLASSEXW,
            WS_OVERLAPPEDWINDOW,
        },
    },
};

use super::{compositor::DwmCompositor, version};
use crate::{
    effect::{buffer::SystemHeap, BlurEffectApplier, WindowHandle},
    error::{FrostError, Result},
    settings::{self, Settings},
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the main window class.
const CLASS_NAME: PCWSTR = w!("FrostMainWindow");

/// Title bar text.
const APP_TITLE: PCWSTR = w!("Frost");

// ── Menu command IDs ──────────────────────────────────────────────────────────

const IDM_FILE_EXIT: usize = 1001;
const IDM_VIEW_BLUR_ON: usize = 2001;
const IDM_VIEW_BLUR_OFF: usize = 2002;
const IDM_HELP_ABOUT: usize = 9001;

// ── Public API ────────────────────────────────────────────────────────────────

/// Register the main window class, create the window, apply the blur if
/// `settings` enables it, and drive the message loop until the user closes
/// the application.
pub(crate) fn run(settings: &Settings) -> Result<()> {
    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime and never fails in practice.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(FrostError::from)?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;
    let hwnd = create_window(hinstance, settings)?;

    if settings.background_blur {
        // Missing blur is cosmetic; the window is still usable without it.
        set_blur(hwnd, true);
    }

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // ShowWindow returns the previous visibility state; UpdateWindow returns
    // a success BOOL — both are intentionally ignored here.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }
    info!(event = "window.shown");

    message_loop()
}

/// Show a modal error dialog with the given message.
///
/// Used by `main()` when `run()` returns an error.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_wide: Vec<u16> = message.encode_utf16().chain(std::iter::once(0)).collect();

    // SAFETY: msg_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call.
    // HWND::default() (null) means the dialog has no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            w!("Frost: Fatal Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Blur toggle ───────────────────────────────────────────────────────────────

/// Turn the blur on or off for `hwnd` on the running OS.
fn set_blur(hwnd: HWND, on: bool) -> bool {
    let tier = version::detect_tier();
    let compositor = DwmCompositor::new();
    let heap = SystemHeap;
    let applier = BlurEffectApplier::new(&compositor, &heap);
    let window = WindowHandle(hwnd.0);

    if on {
        applier.enable(window, tier)
    } else {
        applier.disable(window, tier)
    }
}

/// Apply a menu toggle and remember it for the next launch.
fn toggle_blur(hwnd: HWND, on: bool) {
    let applied = set_blur(hwnd, on);
    if !applied && on {
        message_box(hwnd, "Background blur is not available on this system.");
    }

    let mut stored = settings::load().unwrap_or_default();
    if !stored.record_blur_toggle(on, applied) {
        return;
    }
    if let Err(error) = settings::save(&stored) {
        warn!(event = "settings.save_failed", %error);
    }
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadIconW with IDI_APPLICATION always succeeds; it loads the
    // built-in application icon resource.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(FrostError::from)?;

    // SAFETY: LoadCursorW with IDC_ARROW always succeeds; the arrow cursor is
    // a built-in resource.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(FrostError::from)?;

    // SAFETY: GetStockObject with BLACK_BRUSH always returns a valid HGDIOBJ.
    // Stock brush objects are valid HBRUSH values.
    let bg_brush = unsafe { HBRUSH(GetStockObject(BLACK_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszMenuName: PCWSTR::null(),
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE, settings: &Settings) -> Result<HWND> {
    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module.
    // A null parent creates a top-level window; the menu is attached below.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            APP_TITLE,
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            settings.window_width,
            settings.window_height,
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(FrostError::from)?;

    let menu = build_menu()?;
    // SAFETY: hwnd and menu are valid handles.
    unsafe { SetMenu(hwnd, menu) }.map_err(FrostError::from)?;

    Ok(hwnd)
}

// ── Menu construction ─────────────────────────────────────────────────────────

fn build_menu() -> Result<HMENU> {
    // SAFETY: CreateMenu has no preconditions; failures propagate through ?.
    // All strings are w!() literals with static lifetime.
    unsafe {
        let bar = CreateMenu().map_err(FrostError::from)?;

        let file = CreateMenu().map_err(FrostError::from)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_EXIT, w!("E&xit\tAlt+F4"))
            .map_err(FrostError::from)?;

        let view = CreateMenu().map_err(FrostError::from)?;
        AppendMenuW(view, MF_STRING, IDM_VIEW_BLUR_ON, w!("&Enable Background Blur"))
            .map_err(FrostError::from)?;
        AppendMenuW(view, MF_SEPARATOR, 0, PCWSTR::null()).map_err(FrostError::from)?;
        AppendMenuW(view, MF_STRING, IDM_VIEW_BLUR_OFF, w!("&Disable Background Blur"))
            .map_err(FrostError::from)?;

        let help = CreateMenu().map_err(FrostError::from)?;
        AppendMenuW(help, MF_STRING, IDM_HELP_ABOUT, w!("&About Frost…"))
            .map_err(FrostError::from)?;

        // The uIDNewItem parameter for MF_POPUP is the child HMENU cast to usize.
        AppendMenuW(bar, MF_POPUP, file.0 as usize, w!("&File")).map_err(FrostError::from)?;
        AppendMenuW(bar, MF_POPUP, view.0 as usize, w!("&View")).map_err(FrostError::from)?;
        AppendMenuW(bar, MF_POPUP, help.0 as usize, w!("&Help")).map_err(FrostError::from)?;

        Ok(bar)
    }
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop() -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; a null HWND retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            -1 => return Err(last_error("GetMessageW")),
            0 => break,
            _ => unsafe {
                // SAFETY: msg was populated by a successful GetMessageW call.
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_COMMAND => {
            // Low word of WPARAM is the command identifier.
            match wparam.0 & 0xFFFF {
                IDM_FILE_EXIT => {
                    let _ = DestroyWindow(hwnd);
                    LRESULT(0)
                }
                IDM_VIEW_BLUR_ON => {
                    toggle_blur(hwnd, true);
                    LRESULT(0)
                }
                IDM_VIEW_BLUR_OFF => {
                    toggle_blur(hwnd, false);
                    LRESULT(0)
                }
                IDM_HELP_ABOUT => {
                    about_dialog(hwnd);
                    LRESULT(0)
                }
                _ => DefWindowProcW(hwnd, msg, wparam, lparam),
            }
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Helper dialogs ────────────────────────────────────────────────────────────

/// Display the "About Frost" box with the detected OS and blur tier.
fn about_dialog(hwnd: HWND) {
    let detected = match version::detect() {
        Ok(v) => format!("Windows {v}\n{}", v.tier().describe()),
        Err(e) => format!("OS version unknown ({e})"),
    };
    message_box(
        hwnd,
        &format!("Frost {}\n\n{detected}", env!("CARGO_PKG_VERSION")),
    );
}

fn message_box(hwnd: HWND, body: &str) {
    let body_wide: Vec<u16> = body.encode_utf16().chain(std::iter::once(0)).collect();

    // SAFETY: body_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call; hwnd is the owner
    // window from WndProc.
    unsafe {
        let _ = MessageBoxW(hwnd, PCWSTR(body_wide.as_ptr()), w!("Frost"), MB_OK);
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `FrostError`.
///
/// Call immediately after the failing Win32 function; `GetLastError` reads
/// thread-local state that any later API call can overwrite.
fn last_error(function: &'static str) -> FrostError {
    // SAFETY: GetLastError reads thread-local state and never fails.
    let code = unsafe { GetLastError() };
    FrostError::Win32 {
        function,
        code: code.0,
    }
}
