//! hstack core: a handle table of independent LIFO byte-blob stacks
//!
//! Callers create stacks and get back small integer handles instead of
//! references. Every operation goes through the table, which validates the
//! handle first, so a stale or forged handle can never reach another stack.
//!
//! Key design principles:
//! - StackTable: explicit context owning every stack (no global state)
//! - Handle: slot index plus generation; reused slots get fresh generations
//! - BlobStack: singly linked chain of exactly sized, length-prefixed nodes
//! - Failures return a `StackError` and never change any state
//!
//! # Modules
//!
//! - `table`: slot array, handle issue/reuse, growth and release
//! - `stack`: per-stack push/pop storage engine
//! - `handle`: handle type and its raw signed encoding
//! - `growth`: tunable growth policy
//! - `config`: table configuration from TOML or environment
//! - `stats`: occupancy aggregation for diagnostics
//! - `error`: error kinds shared by all operations

pub mod config;
pub mod error;
pub mod growth;
pub mod handle;
pub mod stack;
pub mod stats;
pub mod table;

pub use config::{ConfigError, DEFAULT_INITIAL_CAPACITY, TableConfig};
pub use error::StackError;
pub use growth::GrowthPolicy;
pub use handle::{GENERATION_MASK, Handle, INVALID_HANDLE};
pub use stack::{BlobStack, MAX_BLOB_LEN};
pub use stats::TableStats;
pub use table::{MAX_SLOTS, StackTable};
