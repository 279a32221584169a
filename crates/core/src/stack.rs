//! Blob Stack Engine
//!
//! LIFO storage for opaque byte blobs as a singly linked chain of
//! variably sized heap nodes.
//!
//! ## Chain Layout
//!
//! ```text
//! top ──► ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!         │ len: 1       │    │ len: 3       │    │ len: 5       │
//!         │ payload: "x" │    │ payload:"abc"│    │ ...          │
//!         │ prev ────────┼──► │ prev ────────┼──► │ prev: None   │
//!         └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Each node exclusively owns the node below it. The payload length is fixed
//! when the node is created and doubles as its length prefix.
//!
//! - Push: allocate a node sized exactly to the blob, link it on top
//! - Pop: copy the top blob out, unlink and free the node
//!
//! Both are O(1). The stack knows nothing about handles or tables.

use crate::error::StackError;

/// Largest blob a node can hold (the length prefix is a `u32`)
pub const MAX_BLOB_LEN: usize = u32::MAX as usize;

struct Node {
    prev: Option<Box<Node>>,
    payload: Box<[u8]>,
}

impl Node {
    /// Allocate a node holding a verbatim copy of `data`
    ///
    /// The payload allocation is fallible; the node header is not.
    fn try_new(data: &[u8]) -> Result<Box<Node>, StackError> {
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(data.len())
            .map_err(|_| StackError::OutOfMemory)?;
        payload.extend_from_slice(data);
        Ok(Box::new(Node {
            prev: None,
            payload: payload.into_boxed_slice(),
        }))
    }
}

/// One LIFO stack of byte blobs
#[derive(Default)]
pub struct BlobStack {
    top: Option<Box<Node>>,
    count: u32,
}

impl BlobStack {
    /// Create an empty stack (no allocation)
    pub const fn new() -> Self {
        Self {
            top: None,
            count: 0,
        }
    }

    /// Number of elements currently stored
    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Push a copy of `data` as the new top element
    ///
    /// On any error the stack is unchanged.
    pub fn push(&mut self, data: &[u8]) -> Result<(), StackError> {
        if data.is_empty() {
            return Err(StackError::EmptyPayload);
        }
        if self.count == u32::MAX {
            return Err(StackError::CountSaturated);
        }
        if data.len() > MAX_BLOB_LEN {
            return Err(StackError::PayloadTooLarge(data.len()));
        }

        // Link only after the allocation succeeded
        let mut node = Node::try_new(data)?;
        node.prev = self.top.take();
        self.top = Some(node);
        self.count += 1;
        Ok(())
    }

    /// Pop the top element into `out`, returning its length
    ///
    /// When the top blob is longer than `out` the pop is rejected with
    /// [`StackError::BufferTooSmall`] and the element stays on the stack.
    pub fn pop(&mut self, out: &mut [u8]) -> Result<usize, StackError> {
        self.pop_with(out.len(), |payload| {
            out[..payload.len()].copy_from_slice(payload)
        })
    }

    /// Pop the top element, handing its bytes to `write`
    ///
    /// `capacity` is the room the caller has for the blob; `write` is only
    /// called with a payload no longer than that, and only once the element
    /// is known to fit. Lets callers copy into memory that cannot be viewed
    /// as a `&mut [u8]` (e.g. an uninitialized C buffer).
    pub fn pop_with(
        &mut self,
        capacity: usize,
        write: impl FnOnce(&[u8]),
    ) -> Result<usize, StackError> {
        if capacity == 0 {
            return Err(StackError::EmptyBuffer);
        }
        let needed = match &self.top {
            Some(node) => node.payload.len(),
            None => return Err(StackError::StackEmpty),
        };
        if needed > capacity {
            return Err(StackError::BufferTooSmall { needed, capacity });
        }

        let Some(mut node) = self.top.take() else {
            return Err(StackError::StackEmpty);
        };
        self.top = node.prev.take();
        debug_assert!(self.count > 0, "pop: count out of sync with chain");
        self.count -= 1;

        write(&node.payload);
        Ok(needed)
    }

    /// Total payload bytes held by the chain
    ///
    /// Walks the whole chain; meant for diagnostics, not the data path.
    pub fn payload_bytes(&self) -> usize {
        let mut total = 0usize;
        let mut cur = self.top.as_deref();
        while let Some(node) = cur {
            total += node.payload.len();
            cur = node.prev.as_deref();
        }
        total
    }

    /// Free every node and reset the count
    pub fn clear(&mut self) {
        // Unlink one node at a time so long chains never recurse in Drop
        let mut cur = self.top.take();
        while let Some(mut node) = cur {
            cur = node.prev.take();
        }
        self.count = 0;
    }
}

impl Drop for BlobStack {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for BlobStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStack")
            .field("count", &self.count)
            .field("top_len", &self.top.as_ref().map(|n| n.payload.len()))
            .finish()
    }
}
