//! Table occupancy statistics
//!
//! Aggregated on demand by walking every live stack, so the push/pop path
//! carries no bookkeeping beyond the element count. Intended for diagnostics
//! and tests, not for hot loops: the payload total is O(elements).

use crate::stack::BlobStack;

/// Aggregated occupancy of one [`crate::StackTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// Allocated slots (0 when the table is absent)
    pub capacity: usize,
    /// Slots bound to a stack
    pub live_stacks: usize,
    /// Elements summed over all live stacks
    pub total_elements: u64,
    /// Payload bytes summed over all live stacks
    pub payload_bytes: u64,
}

impl TableStats {
    pub(crate) fn aggregate<'a>(
        capacity: usize,
        stacks: impl Iterator<Item = &'a BlobStack>,
    ) -> Self {
        let mut stats = TableStats {
            capacity,
            ..TableStats::default()
        };
        for stack in stacks {
            stats.live_stacks += 1;
            stats.total_elements += u64::from(stack.len());
            stats.payload_bytes += stack.payload_bytes() as u64;
        }
        stats
    }
}
