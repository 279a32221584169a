//! Error kinds for table and stack operations
//!
//! Every failing operation leaves the table and the addressed stack exactly
//! as they were. Callers that prefer the silent C-style contract can simply
//! discard the error; the state is the same either way.

use crate::handle::Handle;

/// Why a table or stack operation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Handle is out of range, names a free slot, or is stale
    InvalidHandle(Handle),
    /// Push was given zero bytes
    EmptyPayload,
    /// Blob length does not fit the node length prefix
    PayloadTooLarge(usize),
    /// Pop was given a zero-length output buffer
    EmptyBuffer,
    /// Pop on a stack with no elements
    StackEmpty,
    /// Element count is at its maximum; no further pushes are accepted
    CountSaturated,
    /// Top blob does not fit the output buffer (the element is kept)
    BufferTooSmall { needed: usize, capacity: usize },
    /// Allocation for a node or the initial table failed
    OutOfMemory,
    /// No free slot and the table could not grow
    TableExhausted,
}

impl std::fmt::Display for StackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StackError::InvalidHandle(h) => write!(f, "invalid stack handle {}", h),
            StackError::EmptyPayload => write!(f, "push: payload is empty"),
            StackError::PayloadTooLarge(len) => {
                write!(f, "push: payload of {} bytes exceeds the length prefix", len)
            }
            StackError::EmptyBuffer => write!(f, "pop: output buffer is empty"),
            StackError::StackEmpty => write!(f, "pop: stack is empty"),
            StackError::CountSaturated => write!(f, "push: element count is saturated"),
            StackError::BufferTooSmall { needed, capacity } => write!(
                f,
                "pop: top element needs {} bytes but buffer holds {}",
                needed, capacity
            ),
            StackError::OutOfMemory => write!(f, "allocation failed"),
            StackError::TableExhausted => write!(f, "handle table cannot grow"),
        }
    }
}

impl std::error::Error for StackError {}
