//! # Phrase Engine
//!
//! A high-performance Rust library for matching multi-word phrase patterns
//! from large catalogs (hundreds of thousands to millions of entries)
//! against free-form input strings.
//!
//! ## Architecture
//!
//! This crate is divided into two main components:
//! - **Index builder** (offline): Normalizes raw pattern lines and compiles
//!   them into a compact tokenized trie with an end-of-word index
//! - **Matcher** (online): Streams over input bytes at high speed against
//!   the frozen index, with caller-owned scratch and no allocation in the
//!   hot loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use phrase_engine::{EngineOptions, MatchContext, PhraseIndex};
//!
//! // Offline build
//! let options = EngineOptions::new().with_matching_substring(true);
//! let mut index = PhraseIndex::new();
//! index.add_pattern("new york city\tNYC", &options)?;
//! index.prepare_for_matching()?;
//!
//! // Online matching
//! let mut ctx = MatchContext::new();
//! let results = index.match_str("welcome to New York City", &options, &mut ctx);
//! ```
//!
//! Many threads may share one frozen index behind an `Arc`; each thread
//! owns its own `MatchContext`.

pub mod batch;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod index;
pub mod matcher;
pub mod normalize;
pub mod reader;
pub mod server;
pub mod trie;

pub use batch::{run_batch_file, BatchStats};
pub use config::EngineOptions;
pub use error::{PhraseError, Result};
pub use index::{LoadStats, PhraseIndex};
pub use matcher::{MatchContext, MatchResult};
pub use trie::{BlockId, PatternId};
