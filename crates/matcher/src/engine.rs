use fxhash::FxHashMap;
use std::collections::VecDeque;

use crate::types::{Match, MatchError, MatcherConfig};


const ROOT: u32 = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    next: FxHashMap<char, u32>,
    /// Longest proper suffix of this node's path that is also a trie path.
    fail: u32,
    /// Keyword ending exactly at this node.
    output: Option<u32>,
    /// Nearest node on the failure chain that carries an output.
    dict_link: Option<u32>,
}

/// Multi-pattern keyword automaton (trie with failure and dictionary links).
///
/// Built once from an ordered keyword dictionary and immutable afterwards, so
/// a single instance can be shared across threads without locking.
#[derive(Debug, Clone)]
pub struct Matcher {
    keywords: Vec<Box<str>>,
    /// Keyword lengths in characters, indexed by keyword id.
    char_lens: Vec<usize>,
    nodes: Vec<Node>,
    cfg: MatcherConfig,
}

impl Matcher {
    /// Build an automaton over `keywords`; insertion order defines keyword ids.
    ///
    /// Repeated keywords are rejected with [`MatchError::DuplicateKeyword`]
    /// and empty keywords with [`MatchError::EmptyKeyword`]. An empty
    /// dictionary is valid and never matches.
    pub fn build<I, S>(keywords: I, cfg: &MatcherConfig) -> Result<Self, MatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Matcher {
            keywords: Vec::new(),
            char_lens: Vec::new(),
            nodes: vec![Node::default()],
            cfg: cfg.clone(),
        };
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();

        for (position, keyword) in keywords.into_iter().enumerate() {
            let keyword = keyword.as_ref();
            if keyword.is_empty() {
                return Err(MatchError::EmptyKeyword { position });
            }
            let folded: String = keyword.chars().map(|c| matcher.fold(c)).collect();
            if let Some(&first) = seen.get(&folded) {
                return Err(MatchError::DuplicateKeyword {
                    keyword: keyword.to_string(),
                    first,
                    second: position,
                });
            }
            matcher.insert(&folded, position)?;
            seen.insert(folded, position);
            matcher.keywords.push(keyword.into());
            matcher.char_lens.push(keyword.chars().count());
        }

        matcher.link();
        tracing::debug!(
            keywords = matcher.keywords.len(),
            states = matcher.nodes.len(),
            "keyword automaton built"
        );
        Ok(matcher)
    }

    /// Report every occurrence of every keyword in `text`, overlaps included.
    ///
    /// Matches are ordered by end offset, then by increasing length. Runs in
    /// time proportional to the text length plus the number of matches.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        let mut out = Vec::new();
        if self.keywords.is_empty() {
            return out;
        }

        let mut state = ROOT;
        let mut ending: Vec<u32> = Vec::new();
        for (pos, ch) in text.chars().enumerate() {
            state = self.step(state, self.fold(ch));

            // Output chain runs longest to shortest; emit shortest first.
            ending.clear();
            let node = &self.nodes[state as usize];
            if let Some(id) = node.output {
                ending.push(id);
            }
            let mut link = node.dict_link;
            while let Some(l) = link {
                let linked = &self.nodes[l as usize];
                if let Some(id) = linked.output {
                    ending.push(id);
                }
                link = linked.dict_link;
            }

            let end = pos + 1;
            for &id in ending.iter().rev() {
                let keyword_id = id as usize;
                out.push(Match {
                    start: end - self.char_lens[keyword_id],
                    end,
                    keyword_id,
                });
            }
        }
        out
    }

    /// Whether any keyword occurs in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let mut state = ROOT;
        for ch in text.chars() {
            state = self.step(state, self.fold(ch));
            let node = &self.nodes[state as usize];
            if node.output.is_some() || node.dict_link.is_some() {
                return true;
            }
        }
        false
    }

    /// Keyword text for a keyword id, as it was supplied to [`Matcher::build`].
    pub fn keyword(&self, id: usize) -> Option<&str> {
        self.keywords.get(id).map(|k| k.as_ref())
    }

    /// Iterate keywords in insertion order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.as_ref())
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Number of automaton states, root included.
    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    #[inline]
    fn fold(&self, ch: char) -> char {
        if self.cfg.ascii_case_insensitive {
            ch.to_ascii_lowercase()
        } else {
            ch
        }
    }

    #[inline]
    fn step(&self, mut state: u32, ch: char) -> u32 {
        loop {
            if let Some(&next) = self.nodes[state as usize].next.get(&ch) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.nodes[state as usize].fail;
        }
    }

    fn insert(&mut self, folded: &str, position: usize) -> Result<(), MatchError> {
        let mut state = ROOT;
        for ch in folded.chars() {
            state = match self.nodes[state as usize].next.get(&ch) {
                Some(&next) => next,
                None => {
                    let next = u32::try_from(self.nodes.len()).map_err(|_| {
                        MatchError::TooManyStates {
                            states: self.nodes.len(),
                        }
                    })?;
                    self.nodes.push(Node::default());
                    self.nodes[state as usize].next.insert(ch, next);
                    next
                }
            };
        }
        // Duplicates are filtered before insertion, so the slot is free.
        self.nodes[state as usize].output = Some(position as u32);
        Ok(())
    }

    /// Breadth-first pass computing failure and dictionary links.
    fn link(&mut self) {
        let mut queue: VecDeque<u32> = VecDeque::new();
        let root_children: Vec<u32> = self.nodes[ROOT as usize].next.values().copied().collect();
        for child in root_children {
            self.nodes[child as usize].fail = ROOT;
            self.nodes[child as usize].dict_link = None;
            queue.push_back(child);
        }

        while let Some(parent) = queue.pop_front() {
            let children: Vec<(char, u32)> = self.nodes[parent as usize]
                .next
                .iter()
                .map(|(&ch, &node)| (ch, node))
                .collect();

            for (ch, child) in children {
                let mut f = self.nodes[parent as usize].fail;
                let fail = loop {
                    if let Some(&next) = self.nodes[f as usize].next.get(&ch) {
                        break next;
                    }
                    if f == ROOT {
                        break ROOT;
                    }
                    f = self.nodes[f as usize].fail;
                };

                let fail_node = &self.nodes[fail as usize];
                let dict_link = if fail_node.output.is_some() {
                    Some(fail)
                } else {
                    fail_node.dict_link
                };

                let node = &mut self.nodes[child as usize];
                node.fail = fail;
                node.dict_link = dict_link;
                queue.push_back(child);
            }
        }
    }
}
