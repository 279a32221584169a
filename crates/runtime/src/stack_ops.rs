//! Stack operations exported over the C ABI
//!
//! The process holds one [`StackTable`] behind a mutex, created on first use
//! from [`TableConfig::from_env`]. A handle issued on one thread is valid on
//! every thread until it is freed, and each call runs under the lock.
//!
//! No function here panics or aborts. Every failure returns the documented
//! neutral value (`INVALID_HANDLE`, `0`, or nothing) and records a message
//! retrievable with `hstack_take_error` on the calling thread. Any function
//! given a handle that does not name a live stack records
//! "invalid stack handle ..."; `hstack_valid_handler` and `hstack_size`
//! included.
//!
//! # C Declarations
//!
//! ```c
//! typedef int64_t hstack_t;
//!
//! hstack_t     hstack_new(void);
//! void         hstack_free(hstack_t stack);
//! int          hstack_valid_handler(hstack_t stack);   /* 0 = valid, 1 = invalid */
//! unsigned int hstack_size(hstack_t stack);
//! void         hstack_push(hstack_t stack, const void *data_in, unsigned int size);
//! unsigned int hstack_pop(hstack_t stack, void *data_out, unsigned int size);
//! size_t       hstack_table_capacity(void);
//! ```

use crate::error::set_runtime_error;
use hstack_core::{Handle, INVALID_HANDLE, StackError, StackTable, TableConfig};
use libc::{c_int, c_uint, c_void, size_t};
use std::sync::{LazyLock, Mutex};

/// Raw handle type seen by C callers
#[allow(non_camel_case_types)]
pub type hstack_t = i64;

/// `hstack_valid_handler` result for a live handle
pub const RESULT_OK: c_int = 0;
/// `hstack_valid_handler` result for anything else
pub const RESULT_NOT_OK: c_int = 1;

static TABLE: LazyLock<Mutex<StackTable>> =
    LazyLock::new(|| Mutex::new(StackTable::with_config(TableConfig::from_env())));

/// Run `f` against the process-wide table
///
/// Returns `None` if a previous caller panicked while holding the lock.
fn with_table<R>(f: impl FnOnce(&mut StackTable) -> R) -> Option<R> {
    match TABLE.lock() {
        Ok(mut table) => Some(f(&mut table)),
        Err(_) => {
            set_runtime_error("stack table lock poisoned");
            None
        }
    }
}

/// Decode a raw handle, recording an error for negative values
fn decode(raw: hstack_t) -> Option<Handle> {
    let handle = Handle::from_raw(raw);
    if handle.is_none() {
        set_runtime_error(format!("invalid stack handle {}", raw));
    }
    handle
}

fn record<T>(result: Result<T, StackError>) -> Option<T> {
    result.map_err(|e| set_runtime_error(e.to_string())).ok()
}

/// Create a new empty stack
///
/// Returns `INVALID_HANDLE` (-1) when the table cannot provide a slot.
#[unsafe(no_mangle)]
pub extern "C" fn hstack_new() -> hstack_t {
    with_table(|table| record(table.create()))
        .flatten()
        .map(Handle::to_raw)
        .unwrap_or(INVALID_HANDLE)
}

/// Destroy a stack and every element on it
///
/// Silent no-op for an invalid handle; freeing twice is harmless.
#[unsafe(no_mangle)]
pub extern "C" fn hstack_free(stack: hstack_t) {
    let Some(handle) = decode(stack) else {
        return;
    };
    with_table(|table| record(table.destroy(handle)));
}

/// Look up a live handle, recording an error when it names no stack
fn require_live(table: &StackTable, handle: Handle) -> Option<()> {
    if table.is_valid(handle) {
        Some(())
    } else {
        record(Err(StackError::InvalidHandle(handle)))
    }
}

/// Check a handle: `0` if it addresses a live stack, `1` otherwise
#[unsafe(no_mangle)]
pub extern "C" fn hstack_valid_handler(stack: hstack_t) -> c_int {
    let valid = decode(stack)
        .and_then(|handle| with_table(|table| require_live(table, handle)))
        .flatten()
        .is_some();
    if valid { RESULT_OK } else { RESULT_NOT_OK }
}

/// Number of elements on a stack, `0` for an invalid handle
#[unsafe(no_mangle)]
pub extern "C" fn hstack_size(stack: hstack_t) -> c_uint {
    decode(stack)
        .and_then(|handle| {
            with_table(|table| require_live(table, handle).map(|()| table.size(handle)))
        })
        .flatten()
        .unwrap_or(0)
}

/// Push a copy of `size` bytes from `data_in`
///
/// Silent no-op when `data_in` is null, `size` is 0, the handle is invalid,
/// the stack is full, or the node cannot be allocated.
///
/// # Safety
/// `data_in` must be null or point to at least `size` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hstack_push(stack: hstack_t, data_in: *const c_void, size: c_uint) {
    if data_in.is_null() || size == 0 {
        set_runtime_error(StackError::EmptyPayload.to_string());
        return;
    }
    let Some(handle) = decode(stack) else {
        return;
    };
    let data = unsafe { std::slice::from_raw_parts(data_in as *const u8, size as usize) };
    with_table(|table| record(table.push(handle, data)));
}

/// Pop the top element into `data_out`, returning the bytes written
///
/// Returns `0` when `data_out` is null, `size` is 0, the handle is invalid,
/// or the stack is empty. When the top element is larger than `size` it
/// also returns `0` and the element stays on the stack.
///
/// # Safety
/// `data_out` must be null or point to at least `size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn hstack_pop(stack: hstack_t, data_out: *mut c_void, size: c_uint) -> c_uint {
    if data_out.is_null() || size == 0 {
        set_runtime_error(StackError::EmptyBuffer.to_string());
        return 0;
    }
    let Some(handle) = decode(stack) else {
        return 0;
    };
    // `data_out` may be uninitialized, so it is only ever written through a
    // raw copy, never viewed as a slice.
    let write = |payload: &[u8]| unsafe {
        std::ptr::copy_nonoverlapping(payload.as_ptr(), data_out as *mut u8, payload.len());
    };
    with_table(|table| record(table.pop_with(handle, size as usize, write)))
        .flatten()
        // Never more than `size`, so it fits
        .map(|len| len as c_uint)
        .unwrap_or(0)
}

/// Slots currently allocated by the table (`0` when absent)
#[unsafe(no_mangle)]
pub extern "C" fn hstack_table_capacity() -> size_t {
    with_table(|table| table.capacity()).unwrap_or(0)
}
