use std::borrow::Cow;
use std::sync::Arc;

use matcher::{Match, Matcher};
use unicode_normalization::UnicodeNormalization;

use crate::config::CanonicalizeConfig;
use crate::error::CanonicalError;
use crate::map::CanonicalMap;
use crate::whitespace::collapse_whitespace;

/// One span rewrite over character offsets `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Edit {
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }
}

/// A character cell of the output buffer.
///
/// `Wide` only appears at the first cell of a span whose replacement is
/// longer than the span; it carries the surplus leading characters.
#[derive(Debug, Clone)]
enum Cell {
    Char(char),
    Wide(Box<str>),
}

/// Turn matches into edits, in match order.
///
/// The replacement for each match is its canonical target when mapped,
/// otherwise the matched keyword, with spaces swapped for the join character.
pub fn plan_edits(
    text: &str,
    matches: &[Match],
    matcher: &Matcher,
    map: &CanonicalMap,
    cfg: &CanonicalizeConfig,
) -> Result<Vec<Edit>, CanonicalError> {
    let chars: Vec<char> = text.chars().collect();
    plan_edits_over(&chars, matches, matcher, map, cfg)
}

fn plan_edits_over(
    chars: &[char],
    matches: &[Match],
    matcher: &Matcher,
    map: &CanonicalMap,
    cfg: &CanonicalizeConfig,
) -> Result<Vec<Edit>, CanonicalError> {
    let mut edits = Vec::with_capacity(matches.len());
    for m in matches {
        if m.start > m.end || m.end > chars.len() {
            return Err(CanonicalError::EditOutOfBounds {
                start: m.start,
                end: m.end,
                len: chars.len(),
            });
        }
        let keyword = matcher
            .keyword(m.keyword_id)
            .ok_or(CanonicalError::UnknownKeyword { id: m.keyword_id })?;
        if cfg.whole_words && !on_word_boundaries(chars, m.start, m.end, cfg.join_char) {
            continue;
        }
        let target = map.lookup(keyword, cfg.resolve_chains).unwrap_or(keyword);
        edits.push(Edit {
            start: m.start,
            end: m.end,
            replacement: join_term(target, cfg.join_char),
        });
    }
    Ok(edits)
}

/// Apply edits in order to a fresh cell buffer built from `text`.
///
/// Each replacement is right-justified inside its span and left-padded with
/// spaces. Later edits overwrite earlier ones cell by cell. A replacement
/// longer than its span keeps the span's cell count: the first cell absorbs
/// the surplus leading characters. The result is not whitespace-collapsed.
pub fn apply_edits(text: &str, edits: &[Edit]) -> Result<String, CanonicalError> {
    let mut cells: Vec<Cell> = text.chars().map(Cell::Char).collect();

    for edit in edits {
        if edit.start > edit.end || edit.end > cells.len() {
            return Err(CanonicalError::EditOutOfBounds {
                start: edit.start,
                end: edit.end,
                len: cells.len(),
            });
        }
        let span = edit.end - edit.start;
        if span == 0 {
            continue;
        }
        let replacement: Vec<char> = edit.replacement.chars().collect();
        let target = &mut cells[edit.start..edit.end];

        if replacement.len() <= span {
            let pad = span - replacement.len();
            for (offset, cell) in target.iter_mut().enumerate() {
                *cell = if offset < pad {
                    Cell::Char(' ')
                } else {
                    Cell::Char(replacement[offset - pad])
                };
            }
        } else {
            let surplus = replacement.len() - span;
            let (head, tail) = replacement.split_at(surplus + 1);
            target[0] = Cell::Wide(head.iter().collect::<String>().into_boxed_str());
            for (cell, &ch) in target[1..].iter_mut().zip(tail) {
                *cell = Cell::Char(ch);
            }
        }
    }

    let mut out = String::with_capacity(text.len());
    for cell in &cells {
        match cell {
            Cell::Char(ch) => out.push(*ch),
            Cell::Wide(run) => out.push_str(run),
        }
    }
    Ok(out)
}

/// Rewrite every matched span of `text` with its canonical form, then
/// collapse whitespace.
///
/// `matches` must come from `matcher.find_all(text)` (or preserve its order);
/// they are applied in the given order and never re-sorted.
pub fn apply(
    text: &str,
    matches: &[Match],
    matcher: &Matcher,
    map: &CanonicalMap,
    cfg: &CanonicalizeConfig,
) -> Result<String, CanonicalError> {
    let chars: Vec<char> = text.chars().collect();
    let edits = plan_edits_over(&chars, matches, matcher, map, cfg)?;
    let rewritten = apply_edits(text, &edits)?;
    Ok(collapse_whitespace(&rewritten))
}

/// NFKC and lowercase `text` as the config asks, borrowing when neither is on.
pub fn prepare_text<'a>(text: &'a str, cfg: &CanonicalizeConfig) -> Cow<'a, str> {
    let normalized: Cow<'a, str> = if cfg.normalize_unicode {
        Cow::Owned(text.nfkc().collect::<String>())
    } else {
        Cow::Borrowed(text)
    };
    if cfg.lowercase {
        Cow::Owned(normalized.to_lowercase())
    } else {
        normalized
    }
}

fn join_term(term: &str, join_char: char) -> String {
    term.chars()
        .map(|c| if c == ' ' { join_char } else { c })
        .collect()
}

#[inline]
fn is_word_char(ch: char, join_char: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == join_char
}

fn on_word_boundaries(chars: &[char], start: usize, end: usize, join_char: char) -> bool {
    let left = start == 0 || !is_word_char(chars[start - 1], join_char);
    let right = end == chars.len() || !is_word_char(chars[end], join_char);
    left && right
}

/// Matcher, mapping table and config bundled for repeated use.
///
/// Cloning is cheap: the automaton is shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    matcher: Arc<Matcher>,
    map: CanonicalMap,
    cfg: CanonicalizeConfig,
}

impl Canonicalizer {
    pub fn new(
        matcher: Arc<Matcher>,
        map: CanonicalMap,
        cfg: CanonicalizeConfig,
    ) -> Result<Self, CanonicalError> {
        cfg.validate()?;
        Ok(Self { matcher, map, cfg })
    }

    /// Prepare `text`, find all keyword matches and rewrite them.
    pub fn canonicalize(&self, text: &str) -> Result<String, CanonicalError> {
        let prepared = prepare_text(text, &self.cfg);
        let matches = self.matcher.find_all(&prepared);
        apply(&prepared, &matches, &self.matcher, &self.map, &self.cfg)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn map(&self) -> &CanonicalMap {
        &self.map
    }

    pub fn config(&self) -> &CanonicalizeConfig {
        &self.cfg
    }
}
