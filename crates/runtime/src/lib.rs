//! hstack runtime: C ABI over the hstack handle table
//!
//! Key design principles:
//! - One process-wide `StackTable` behind a mutex, configured from the
//!   environment on first use
//! - Handles cross the ABI as non-negative `int64_t`; -1 means "no handle"
//! - Nothing panics across the boundary: failures return neutral values and
//!   leave a message in thread-local error state
//!
//! # Modules
//!
//! - `stack_ops`: the exported stack functions
//! - `error`: thread-local last-error reporting
//! - `logging`: optional stderr `tracing` subscriber

pub mod error;
pub mod logging;
pub mod stack_ops;

pub use hstack_core::{
    GrowthPolicy, Handle, INVALID_HANDLE, StackError, StackTable, TableConfig, TableStats,
};

// Stack operations (exported for C linking)
pub use stack_ops::{
    RESULT_NOT_OK, RESULT_OK, hstack_free as free_stack, hstack_new as new_stack,
    hstack_pop as pop, hstack_push as push, hstack_size as stack_size,
    hstack_t, hstack_table_capacity as table_capacity,
    hstack_valid_handler as valid_handler,
};

// Error handling
pub use error::{
    clear_runtime_error, has_runtime_error, hstack_clear_error as clear_error,
    hstack_get_error as get_error, hstack_has_error as has_error,
    hstack_take_error as take_error, set_runtime_error, take_runtime_error,
};

// Logging
pub use logging::{hstack_init_logging as init_logging_ffi, init_logging};
