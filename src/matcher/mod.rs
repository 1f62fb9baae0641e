//! Streaming pattern matching against the frozen index.
//!
//! The matcher scans an input string exactly once, byte by byte, keeping a
//! cursor into the trie and per-word-position active sets of in-flight
//! patterns. Matches are emitted eagerly, the moment a pattern's final word
//! is confirmed; the scan never backtracks.
//!
//! ## Scratch state
//!
//! Each call takes a caller-owned [`MatchContext`] by exclusive reference.
//! Allocating the active sets and substring table anew per call would
//! dominate the profile at small input sizes, so contexts are reused and
//! their buffers grow monotonically. Contexts must not be shared between
//! threads; give each worker its own.
//!
//! ## Concurrency
//!
//! The index is read-only during matching, so any number of threads may
//! scan concurrently against one frozen [`PhraseIndex`](crate::PhraseIndex)
//! behind an `Arc`, each with its own context.

pub mod context;
pub mod lcss;
pub mod scan;
pub mod types;

pub use context::MatchContext;
pub use types::MatchResult;
