//! Handle Table
//!
//! A resizable array of slots, each free or bound to one [`BlobStack`].
//! The table owns every stack it holds and is addressed only through
//! [`Handle`]s, so callers never share references into it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    StackTable                           │
//! ├─────────────────────────────────────────────────────────┤
//! │ slots: Vec<Slot>   (capacity == slots.len())            │
//! │                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐             │
//! │  │ Slot 0           │  │ Slot 1           │  ...        │
//! │  │ generation: 4    │  │ generation: 2    │             │
//! │  │ stack: Some(..)  │  │ stack: None      │             │
//! │  └──────────────────┘  └──────────────────┘             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! - The table starts absent: zero slots, no allocation.
//! - The first `create` allocates `initial_capacity` slots, or a single slot
//!   if that allocation fails.
//! - Free slots are reused first-fit (lowest index first).
//! - With no free slot the table grows per its [`GrowthPolicy`], falling back
//!   to one extra slot. Existing indices never move.
//! - Destroying the last live stack releases the whole allocation.
//!
//! [`GrowthPolicy`]: crate::GrowthPolicy

use crate::config::TableConfig;
use crate::error::StackError;
use crate::handle::{Handle, next_generation};
use crate::stack::BlobStack;
use crate::stats::TableStats;
use tracing::{debug, trace, warn};

/// Slot indices must fit the 32-bit index half of a handle
pub const MAX_SLOTS: usize = u32::MAX as usize;

#[derive(Debug, Default)]
struct Slot {
    /// Generation stamped when the slot was last bound
    generation: u32,
    /// `None` when the slot is free
    stack: Option<BlobStack>,
}

impl Slot {
    #[inline]
    fn is_live(&self) -> bool {
        self.stack.is_some()
    }
}

/// A registry of independent blob stacks addressed by [`Handle`]
///
/// No internal synchronization: mutation needs `&mut self`. Share one table
/// across threads behind a single lock.
#[derive(Debug, Default)]
pub struct StackTable {
    slots: Vec<Slot>,
    /// Number of occupied slots
    live: usize,
    /// Last generation handed out; survives table release
    last_generation: u32,
    config: TableConfig,
}

impl StackTable {
    /// Create an empty table with default configuration (no allocation)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table with the given configuration (no allocation)
    pub fn with_config(config: TableConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Number of slots currently allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stacks currently alive
    #[inline]
    pub fn live_stacks(&self) -> usize {
        self.live
    }

    /// Issue a handle bound to a new, empty stack
    ///
    /// Fails with [`StackError::OutOfMemory`] when not even a single-slot
    /// table can be allocated, and with [`StackError::TableExhausted`] when
    /// every slot is taken and the table cannot grow.
    pub fn create(&mut self) -> Result<Handle, StackError> {
        if self.slots.is_empty() {
            self.allocate_table()?;
        }

        let index = match self.first_free() {
            Some(index) => index,
            None => {
                let index = self.slots.len();
                if !self.grow() {
                    warn!(capacity = index, "handle table exhausted");
                    return Err(StackError::TableExhausted);
                }
                index
            }
        };

        self.last_generation = next_generation(self.last_generation);
        let slot = &mut self.slots[index];
        slot.generation = self.last_generation;
        slot.stack = Some(BlobStack::new());
        self.live += 1;

        let handle = Handle::new(index as u32, slot.generation);
        trace!(%handle, "stack created");
        Ok(handle)
    }

    /// Destroy a stack and free all of its elements
    ///
    /// When this was the last live stack the table releases its allocation
    /// and returns to the absent state.
    pub fn destroy(&mut self, handle: Handle) -> Result<(), StackError> {
        self.stack_mut(handle)?;
        let slot = &mut self.slots[handle.index() as usize];
        // Dropping the stack unwinds its chain iteratively
        drop(slot.stack.take());
        self.live -= 1;
        trace!(%handle, "stack destroyed");

        if self.live == 0 {
            self.release_table();
        }
        Ok(())
    }

    /// True iff `handle` addresses a live stack issued by this table
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.stack(handle).is_ok()
    }

    /// Element count of the addressed stack, 0 for an invalid handle
    ///
    /// 0 does not distinguish "invalid" from "empty"; use [`Self::is_valid`].
    pub fn size(&self, handle: Handle) -> u32 {
        self.stack(handle).map(BlobStack::len).unwrap_or(0)
    }

    /// Push a copy of `data` onto the addressed stack
    pub fn push(&mut self, handle: Handle, data: &[u8]) -> Result<(), StackError> {
        let stack = self.stack_mut(handle)?;
        stack.push(data)?;
        trace!(%handle, len = data.len(), depth = stack.len(), "push");
        Ok(())
    }

    /// Pop the top element of the addressed stack into `out`
    ///
    /// Returns the number of bytes written. A buffer shorter than the top
    /// element is rejected and the element stays on the stack.
    pub fn pop(&mut self, handle: Handle, out: &mut [u8]) -> Result<usize, StackError> {
        let stack = self.stack_mut(handle)?;
        let len = stack.pop(out)?;
        trace!(%handle, len, depth = stack.len(), "pop");
        Ok(len)
    }

    /// Pop the top element of the addressed stack through `write`
    ///
    /// Same contract as [`BlobStack::pop_with`].
    pub fn pop_with(
        &mut self,
        handle: Handle,
        capacity: usize,
        write: impl FnOnce(&[u8]),
    ) -> Result<usize, StackError> {
        let stack = self.stack_mut(handle)?;
        let len = stack.pop_with(capacity, write)?;
        trace!(%handle, len, depth = stack.len(), "pop");
        Ok(len)
    }

    /// Aggregate occupancy across all slots
    pub fn stats(&self) -> TableStats {
        TableStats::aggregate(
            self.capacity(),
            self.slots.iter().filter_map(|slot| slot.stack.as_ref()),
        )
    }

    fn stack(&self, handle: Handle) -> Result<&BlobStack, StackError> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.stack.as_ref())
            .ok_or(StackError::InvalidHandle(handle))
    }

    fn stack_mut(&mut self, handle: Handle) -> Result<&mut BlobStack, StackError> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.stack.as_mut())
            .ok_or(StackError::InvalidHandle(handle))
    }

    fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.is_live())
    }

    /// Allocate the initial table, falling back to a single slot
    fn allocate_table(&mut self) -> Result<(), StackError> {
        debug_assert!(self.slots.is_empty());
        let preferred = self.config.initial_capacity.max(1);
        if self.try_resize(preferred) {
            debug!(capacity = preferred, "handle table allocated");
            return Ok(());
        }
        warn!(
            preferred,
            "initial table allocation failed, falling back to one slot"
        );
        if self.try_resize(1) {
            return Ok(());
        }
        warn!("handle table allocation failed");
        Err(StackError::OutOfMemory)
    }

    /// Grow per the policy, falling back to one extra slot
    fn grow(&mut self) -> bool {
        let current = self.slots.len();
        let preferred = self.config.growth.next_capacity(current);
        if self.try_resize(preferred) {
            debug!(from = current, to = preferred, "handle table grown");
            return true;
        }
        let minimal = current.saturating_add(1);
        warn!(
            from = current,
            preferred, "table growth failed, falling back to one slot"
        );
        if self.try_resize(minimal) {
            debug!(from = current, to = minimal, "handle table grown");
            return true;
        }
        false
    }

    /// Extend the slot array to exactly `new_capacity` free-initialized slots
    ///
    /// Returns false, leaving the table untouched, when the size is refused
    /// by the configured ceiling or the allocation fails.
    fn try_resize(&mut self, new_capacity: usize) -> bool {
        let current = self.slots.len();
        if new_capacity <= current || new_capacity > MAX_SLOTS || !self.config.permits(new_capacity)
        {
            return false;
        }
        if self.slots.try_reserve_exact(new_capacity - current).is_err() {
            return false;
        }
        self.slots.resize_with(new_capacity, Slot::default);
        true
    }

    fn release_table(&mut self) {
        debug!(capacity = self.slots.len(), "handle table released");
        self.slots = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::GrowthPolicy;

    fn pop_vec(table: &mut StackTable, handle: Handle) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; 256];
        let len = table.pop(handle, &mut buf).ok()?;
        buf.truncate(len);
        Some(buf)
    }

    #[test]
    fn test_starts_absent() {
        let table = StackTable::new();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.live_stacks(), 0);
    }

    #[test]
    fn test_push_pop_scenario() {
        let mut table = StackTable::new();
        let s = table.create().unwrap();

        table.push(s, b"abc").unwrap();
        table.push(s, b"x").unwrap();
        assert_eq!(table.size(s), 2);

        let mut buf = [0u8; 8];
        assert_eq!(table.pop(s, &mut buf), Ok(1));
        assert_eq!(buf[0], b'x');
        assert_eq!(table.pop(s, &mut buf), Ok(3));
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(table.size(s), 0);
        assert_eq!(table.pop(s, &mut buf), Err(StackError::StackEmpty));
    }

    #[test]
    fn test_lifo_order() {
        let mut table = StackTable::new();
        let s = table.create().unwrap();
        let blobs: Vec<Vec<u8>> = (1..=20u8).map(|n| vec![n; n as usize]).collect();
        for blob in &blobs {
            table.push(s, blob).unwrap();
        }
        for blob in blobs.iter().rev() {
            assert_eq!(pop_vec(&mut table, s).as_ref(), Some(blob));
        }
        assert_eq!(table.size(s), 0);
    }

    #[test]
    fn test_size_tracks_pushes_and_pops() {
        let mut table = StackTable::new();
        let s = table.create().unwrap();
        for i in 0..7u8 {
            table.push(s, &[i]).unwrap();
        }
        for _ in 0..3 {
            pop_vec(&mut table, s).unwrap();
        }
        assert_eq!(table.size(s), 4);
    }

    #[test]
    fn test_handle_isolation() {
        let mut table = StackTable::new();
        let a = table.create().unwrap();
        let b = table.create().unwrap();
        assert_ne!(a, b);

        table.push(a, b"from-a").unwrap();
        table.push(b, b"from-b").unwrap();
        table.push(b, b"from-b-2").unwrap();

        assert_eq!(table.size(a), 1);
        assert_eq!(table.size(b), 2);
        assert_eq!(pop_vec(&mut table, a).unwrap(), b"from-a");
        assert_eq!(table.pop(a, &mut [0u8; 16]), Err(StackError::StackEmpty));
        assert_eq!(pop_vec(&mut table, b).unwrap(), b"from-b-2");
    }

    #[test]
    fn test_invalid_handle_is_neutral() {
        let mut table = StackTable::new();
        let live = table.create().unwrap();
        table.push(live, b"keep").unwrap();

        let bogus = Handle::new(7, 1);
        assert!(!table.is_valid(bogus));
        assert_eq!(table.size(bogus), 0);
        assert_eq!(
            table.push(bogus, b"data"),
            Err(StackError::InvalidHandle(bogus))
        );
        assert_eq!(
            table.pop(bogus, &mut [0u8; 8]),
            Err(StackError::InvalidHandle(bogus))
        );
        assert_eq!(table.destroy(bogus), Err(StackError::InvalidHandle(bogus)));

        let out_of_range = Handle::new(10_000, 1);
        assert!(!table.is_valid(out_of_range));
        assert!(table.destroy(out_of_range).is_err());

        assert_eq!(table.live_stacks(), 1);
        assert_eq!(table.capacity(), 10);
        assert_eq!(pop_vec(&mut table, live).unwrap(), b"keep");
    }

    #[test]
    fn test_short_buffer_pop_is_not_destructive() {
        let mut table = StackTable::new();
        let s = table.create().unwrap();
        table.push(s, b"0123456789").unwrap();

        let mut small = [0u8; 9];
        assert_eq!(
            table.pop(s, &mut small),
            Err(StackError::BufferTooSmall {
                needed: 10,
                capacity: 9
            })
        );
        assert_eq!(table.size(s), 1);
        assert_eq!(pop_vec(&mut table, s).unwrap(), b"0123456789");
    }

    #[test]
    fn test_double_destroy_is_noop() {
        let mut table = StackTable::new();
        let a = table.create().unwrap();
        let b = table.create().unwrap();
        table.destroy(a).unwrap();
        assert_eq!(table.destroy(a), Err(StackError::InvalidHandle(a)));
        assert!(table.is_valid(b));
        assert_eq!(table.live_stacks(), 1);
    }

    #[test]
    fn test_first_fit_reuse_with_fresh_generation() {
        let mut table = StackTable::new();
        let h0 = table.create().unwrap();
        let h1 = table.create().unwrap();
        let h2 = table.create().unwrap();
        assert_eq!((h0.index(), h1.index(), h2.index()), (0, 1, 2));

        table.destroy(h2).unwrap();
        table.destroy(h0).unwrap();

        // Lowest free index wins, not the most recently freed
        let reused = table.create().unwrap();
        assert_eq!(reused.index(), 0);
        assert_ne!(reused, h0);

        // The stale handle no longer reaches the slot
        assert!(!table.is_valid(h0));
        assert_eq!(table.push(h0, b"x"), Err(StackError::InvalidHandle(h0)));
        assert_eq!(table.size(reused), 0);
    }

    #[test]
    fn test_growth_keeps_existing_handles() {
        let mut table = StackTable::new();
        let handles: Vec<Handle> = (0..25).map(|_| table.create().unwrap()).collect();
        assert_eq!(table.capacity(), 40);

        for (i, &h) in handles.iter().enumerate() {
            assert_eq!(h.index() as usize, i);
            table.push(h, &(i as u32).to_le_bytes()).unwrap();
        }
        for (i, &h) in handles.iter().enumerate() {
            assert_eq!(pop_vec(&mut table, h).unwrap(), (i as u32).to_le_bytes());
        }
    }

    #[test]
    fn test_linear_growth_policy() {
        let config = TableConfig::new()
            .with_initial_capacity(2)
            .with_growth(GrowthPolicy::Linear { step: 3 });
        let mut table = StackTable::with_config(config);
        for _ in 0..3 {
            table.create().unwrap();
        }
        assert_eq!(table.capacity(), 5);
    }

    #[test]
    fn test_growth_falls_back_to_one_slot() {
        let mut table = StackTable::with_config(TableConfig::new().with_max_capacity(15));
        for _ in 0..10 {
            table.create().unwrap();
        }
        assert_eq!(table.capacity(), 10);

        // Doubling to 20 is refused, +1 is not
        table.create().unwrap();
        assert_eq!(table.capacity(), 11);
    }

    #[test]
    fn test_exhausted_table_fails_without_side_effects() {
        let mut table = StackTable::with_config(TableConfig::new().with_max_capacity(10));
        let handles: Vec<Handle> = (0..10).map(|_| table.create().unwrap()).collect();
        assert_eq!(table.create(), Err(StackError::TableExhausted));
        assert_eq!(table.capacity(), 10);
        assert_eq!(table.live_stacks(), 10);
        assert!(handles.iter().all(|&h| table.is_valid(h)));
    }

    #[test]
    fn test_initial_allocation_falls_back_to_one_slot() {
        let mut table = StackTable::with_config(TableConfig::new().with_max_capacity(3));
        table.create().unwrap();
        assert_eq!(table.capacity(), 1);
        table.create().unwrap();
        assert_eq!(table.capacity(), 2);
        table.create().unwrap();
        assert_eq!(table.capacity(), 3);
        assert_eq!(table.create(), Err(StackError::TableExhausted));
    }

    #[test]
    fn test_no_slot_at_all() {
        let mut table = StackTable::with_config(TableConfig::new().with_max_capacity(0));
        assert_eq!(table.create(), Err(StackError::OutOfMemory));
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn test_table_reclaimed_after_last_destroy() {
        let mut table = StackTable::with_config(TableConfig::new().with_max_capacity(10));
        let handles: Vec<Handle> = (0..10).map(|_| table.create().unwrap()).collect();
        for &h in &handles {
            table.push(h, b"payload").unwrap();
        }
        assert_eq!(table.create(), Err(StackError::TableExhausted));

        // Destroy in a scrambled order
        for &i in &[3, 9, 0, 5, 1, 8, 2, 7, 4] {
            table.destroy(handles[i]).unwrap();
            assert_eq!(table.capacity(), 10);
        }
        table.destroy(handles[6]).unwrap();
        assert_eq!(table.capacity(), 0);
        assert_eq!(table.live_stacks(), 0);

        // Fresh start: the new table is allocated from scratch
        let h = table.create().unwrap();
        assert_eq!(h.index(), 0);
        assert_eq!(table.capacity(), 10);
        assert!(handles.iter().all(|&old| !table.is_valid(old)));
    }

    #[test]
    fn test_destroy_frees_elements() {
        let mut table = StackTable::new();
        let keep = table.create().unwrap();
        let s = table.create().unwrap();
        for _ in 0..100 {
            table.push(s, &[0u8; 64]).unwrap();
        }
        assert_eq!(table.stats().payload_bytes, 6400);
        table.destroy(s).unwrap();
        assert_eq!(table.stats().payload_bytes, 0);
        assert!(table.is_valid(keep));
    }

    #[test]
    fn test_precondition_failures_leave_stack_unchanged() {
        let mut table = StackTable::new();
        let s = table.create().unwrap();
        table.push(s, b"a").unwrap();

        assert_eq!(table.push(s, &[]), Err(StackError::EmptyPayload));
        assert_eq!(table.pop(s, &mut []), Err(StackError::EmptyBuffer));
        assert_eq!(table.size(s), 1);
    }
}
