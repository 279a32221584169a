//! Runtime Error Handling
//!
//! Provides thread-local error state so the exported functions can report
//! why a call was ignored without panicking across the FFI boundary.
//!
//! # Usage
//!
//! Exported functions record the error and return their neutral value:
//! ```ignore
//! if let Err(e) = table.push(handle, data) {
//!     set_runtime_error(e.to_string());
//!     return; // stack unchanged
//! }
//! ```
//!
//! Callers can check for errors:
//! ```ignore
//! if hstack_has_error() {
//!     let error = hstack_take_error();
//!     // Handle error...
//! }
//! ```
//!
//! A successful call does not clear a pending error.

use std::cell::RefCell;
use std::ffi::{CString, c_char};
use std::ptr;

thread_local! {
    /// Thread-local storage for the last runtime error message
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };

    /// Cached C string for FFI access (avoids allocation on every get)
    static ERROR_CSTRING: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last runtime error message
///
/// Note: This clears any cached CString to prevent stale pointer access.
pub fn set_runtime_error(msg: impl Into<String>) {
    let msg = msg.into();
    tracing::debug!(error = %msg, "hstack call ignored");
    // try_with: the thread may be tearing down its locals
    let _ = ERROR_CSTRING.try_with(|cs| *cs.borrow_mut() = None);
    let _ = LAST_ERROR.try_with(|e| {
        *e.borrow_mut() = Some(msg);
    });
}

/// Take (and clear) the last runtime error message
pub fn take_runtime_error() -> Option<String> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}

/// Check if there's a pending runtime error
pub fn has_runtime_error() -> bool {
    LAST_ERROR.with(|e| e.borrow().is_some())
}

/// Clear any pending runtime error
pub fn clear_runtime_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
    ERROR_CSTRING.with(|e| *e.borrow_mut() = None);
}

/// Cache `msg` as a C string and return a pointer to it
fn cache_cstring(msg: &str) -> *const c_char {
    // Interior NULs would truncate the message; keep it readable instead
    let safe_msg: String = msg
        .chars()
        .map(|c| if c == '\0' { '?' } else { c })
        .collect();
    let Ok(cstring) = CString::new(safe_msg) else {
        return ptr::null();
    };
    ERROR_CSTRING.with(|cs| {
        let ptr = cstring.as_ptr();
        *cs.borrow_mut() = Some(cstring);
        ptr
    })
}

// FFI-safe error access functions

/// Check if there's a pending runtime error (FFI-safe)
#[unsafe(no_mangle)]
pub extern "C" fn hstack_has_error() -> bool {
    has_runtime_error()
}

/// Get the last error message as a C string pointer (FFI-safe)
///
/// Returns null if no error is pending.
///
/// # WARNING: Pointer Lifetime
/// The returned pointer is only valid until the next call to `set_runtime_error`,
/// `get_error`, `take_error`, or `clear_error`. Callers must copy the string
/// immediately if they need to retain it.
#[unsafe(no_mangle)]
pub extern "C" fn hstack_get_error() -> *const c_char {
    let msg = LAST_ERROR.with(|e| e.borrow().clone());
    match msg {
        Some(msg) => cache_cstring(&msg),
        None => ptr::null(),
    }
}

/// Take (and clear) the last error, returning it as a C string (FFI-safe)
///
/// Returns null if no error is pending.
///
/// # WARNING: Pointer Lifetime
/// Same as [`hstack_get_error`].
#[unsafe(no_mangle)]
pub extern "C" fn hstack_take_error() -> *const c_char {
    match take_runtime_error() {
        Some(msg) => cache_cstring(&msg),
        None => ptr::null(),
    }
}

/// Clear any pending error (FFI-safe)
#[unsafe(no_mangle)]
pub extern "C" fn hstack_clear_error() {
    clear_runtime_error();
}
