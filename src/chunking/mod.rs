//! Transcript chunking for semantic indexing.
//!
//! Splits raw transcript text into overlapping segments so that context is
//! not severed at chunk boundaries.

mod recursive;

pub use recursive::RecursiveSplitter;
