//! Stack handles
//!
//! A handle pairs a slot index with the generation stamped on that slot when
//! the handle was issued. Slot indices are reused first-fit, generations are
//! not, so a handle kept past `destroy` stops validating even after its slot
//! is bound to a new stack.
//!
//! ## Raw Layout
//!
//! ```text
//! ┌───┬──────────────────────────────┬──────────────────────────────────┐
//! │ 0 │  generation (31 bits)        │  index (32 bits)                 │
//! └───┴──────────────────────────────┴──────────────────────────────────┘
//!  bit 63                             bit 31                        bit 0
//! ```
//!
//! The sign bit is always clear for issued handles, so any negative raw value
//! (in particular [`INVALID_HANDLE`]) never names a slot.

/// Raw sentinel returned when no handle could be issued
pub const INVALID_HANDLE: i64 = -1;

/// Generations occupy 31 bits so raw handles stay non-negative
pub const GENERATION_MASK: u32 = 0x7FFF_FFFF;

/// Identifies one stack inside a [`crate::StackTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Build a handle from its parts (generation is truncated to 31 bits)
    pub const fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation: generation & GENERATION_MASK,
        }
    }

    /// Slot index in the table
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Encode as the signed integer handed across the C ABI
    #[inline]
    pub const fn to_raw(self) -> i64 {
        ((self.generation as i64) << 32) | self.index as i64
    }

    /// Decode a raw handle; negative values are never handles
    #[inline]
    pub const fn from_raw(raw: i64) -> Option<Self> {
        if raw < 0 {
            return None;
        }
        Some(Self {
            index: raw as u32,
            generation: ((raw >> 32) as u32) & GENERATION_MASK,
        })
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.index, self.generation)
    }
}

/// Advance a generation counter, skipping 0 and wrapping inside the mask
///
/// Generation 0 is never issued, so a bare slot index passed as a raw handle
/// does not validate.
#[inline]
pub(crate) const fn next_generation(current: u32) -> u32 {
    let next = (current.wrapping_add(1)) & GENERATION_MASK;
    if next == 0 { 1 } else { next }
}
