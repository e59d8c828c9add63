//! Canonical rewriting of keyword spans.
//!
//! Given the matches reported by the keyword automaton, this crate rewrites
//! every matched span into its canonical token: collocations are merged with
//! a join character (`hidden units` -> `hidden_unit`) and spelling or plural
//! variants are resolved through a [`CanonicalMap`].
//!
//! ## How spans are rewritten
//!
//! - Matches are turned into an ordered list of [`Edit`]s and applied to a
//!   fresh character buffer, in the order the matcher produced them.
//! - Each replacement is right-justified and space-padded to its span, so
//!   offsets of later (possibly overlapping) matches stay valid. Later edits
//!   win on shared cells.
//! - A final [`collapse_whitespace`] pass removes the padding.
//!
//! The crate also carries the [`TokenFilter`] used after rewriting to pick
//! tokens for topic and feature models.
//!
//! ```rust
//! use canonical::{apply, CanonicalMap, CanonicalizeConfig};
//! use matcher::{Matcher, MatcherConfig};
//!
//! let matcher = Matcher::build(["neural networks", "hidden units"], &MatcherConfig::default())?;
//! let map: CanonicalMap = [
//!     ("neural networks", "neural network"),
//!     ("hidden units", "hidden unit"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let text = "neural networks with hidden units";
//! let out = apply(text, &matcher.find_all(text), &matcher, &map, &CanonicalizeConfig::default())?;
//! assert_eq!(out, "neural_network with hidden_unit");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod map;
mod pipeline;
mod token;
mod whitespace;

pub use crate::config::CanonicalizeConfig;
pub use crate::error::CanonicalError;
pub use crate::map::CanonicalMap;
pub use crate::pipeline::{apply, apply_edits, plan_edits, prepare_text, Canonicalizer, Edit};
pub use crate::token::{
    default_stopwords, SimpleToken, StopwordSet, TokenAttributes, TokenFilter, Tokenizer,
    WordTokenizer, DEFAULT_STOPWORDS, PRONOUN_PLACEHOLDER,
};
pub use crate::whitespace::collapse_whitespace;
