//! Per-variable history storage for the Cadence synchronization engine.
//!
//! Provides the shift-addressed [`HistoryBuffer`], the [`Variable`]
//! bookkeeping wrapper with idempotent-per-instant writes, and the
//! declaration-ordered [`VarArena`] with staged-write commit/discard.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod arena;
pub mod buffer;
pub mod error;
pub mod variable;

pub use arena::{HistoryStore, StagedWrites, VarArena};
pub use buffer::HistoryBuffer;
pub use error::HistoryError;
pub use variable::Variable;
