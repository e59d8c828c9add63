//! # Keyword matcher (`matcher`)
//!
//! Multi-pattern keyword detection over free text. A [`Matcher`] is built once
//! from an ordered keyword dictionary (collocations such as
//! `"neural networks"` or `"hidden units"`) and then scans text in a single
//! pass, reporting every occurrence of every keyword, overlapping ones
//! included.
//!
//! ## Guarantees
//!
//! - Scanning runs in time proportional to `text length + number of matches`,
//!   independent of dictionary size (trie with failure and dictionary links).
//! - Offsets are character positions, `end` exclusive.
//! - Matches come out ordered by end offset, then shortest keyword first, so
//!   downstream span rewriting is reproducible.
//! - The automaton is immutable after [`Matcher::build`] and can be shared
//!   across threads.
//!
//! ## Example
//!
//! ```
//! use matcher::{Matcher, MatcherConfig};
//!
//! let matcher = Matcher::build(["neural networks", "hidden units"], &MatcherConfig::default())
//!     .expect("distinct keywords");
//! let hits = matcher.find_all("neural networks with hidden units");
//!
//! assert_eq!(hits.len(), 2);
//! assert_eq!(hits[0].span(), 0..15);
//! assert_eq!(matcher.keyword(hits[1].keyword_id), Some("hidden units"));
//! ```

mod engine;
mod types;

pub use crate::engine::Matcher;
pub use crate::types::{Match, MatchError, MatcherConfig};
