use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::sync::Once;

use tracing::trace;

/// Forwards whisper.cpp log lines to `tracing` under the `whisper_cpp` target.
///
/// The native library logs model internals for every load; they're only useful when debugging,
/// so everything lands at TRACE (`TRANSCRIBE_SRT_LOG=whisper_cpp=trace` to see them).
unsafe extern "C" fn whisper_log_callback(
    _level: u32,
    c_msg: *const c_char,
    _user_data: *mut c_void,
) {
    if c_msg.is_null() {
        return;
    }

    // SAFETY: whisper.cpp passes a NUL-terminated string that lives for the duration of the call.
    let msg = unsafe { CStr::from_ptr(c_msg) }.to_string_lossy();
    let msg = msg.trim_end();
    if !msg.is_empty() {
        trace!(target: "whisper_cpp", "{msg}");
    }
}

/// Install [`whisper_log_callback`], once per process, before the first model load.
pub(super) fn route_whisper_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| unsafe {
        whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
    });
}
