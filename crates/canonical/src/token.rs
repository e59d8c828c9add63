//! Token filtering ahead of topic and feature models.
//!
//! Tokenization itself is a capability: anything implementing
//! [`TokenAttributes`] can be filtered, whether it comes from the bundled
//! [`WordTokenizer`] or from an external NLP toolkit that provides proper
//! lemmas. [`TokenFilter`] is a pure predicate over those attributes.

use std::sync::Arc;

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Immutable stopword set, built once and shared between tokenizer and filter.
pub type StopwordSet = Arc<FxHashSet<String>>;

/// English function words dropped before modelling.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "although", "am", "among",
    "an", "and", "another", "any", "are", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cannot", "could", "did", "do", "does",
    "doing", "down", "during", "each", "either", "else", "enough", "etc", "even", "ever",
    "every", "few", "for", "from", "further", "had", "has", "have", "having", "he", "hence",
    "her", "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in",
    "indeed", "into", "is", "it", "its", "itself", "just", "may", "me", "might", "more",
    "moreover", "most", "much", "must", "my", "myself", "namely", "neither", "no", "nor", "not",
    "now", "of", "off", "often", "on", "once", "only", "or", "other", "otherwise", "our", "ours",
    "ourselves", "out", "over", "own", "per", "perhaps", "rather", "same", "several", "she",
    "should", "since", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "thereby", "therefore", "these", "they", "this", "those",
    "though", "through", "throughout", "thus", "to", "together", "too", "toward", "towards",
    "under", "unless", "until", "up", "upon", "us", "very", "via", "was", "we", "well", "were",
    "what", "whatever", "when", "whence", "whenever", "where", "whereas", "whereby", "wherein",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Lemma emitted by some lemmatizers for every pronoun.
pub const PRONOUN_PLACEHOLDER: &str = "-PRON-";

/// Build the default stopword set.
pub fn default_stopwords() -> StopwordSet {
    Arc::new(DEFAULT_STOPWORDS.iter().map(|w| w.to_string()).collect())
}

/// Per-token attributes a tokenizer backend must expose.
pub trait TokenAttributes {
    /// Text as it appeared in the input.
    fn surface(&self) -> &str;
    /// Base form used as the model feature.
    fn lemma(&self) -> &str;
    fn is_stopword(&self) -> bool;
    fn is_numeric(&self) -> bool;
}

/// Splits text into tokens carrying [`TokenAttributes`].
pub trait Tokenizer {
    type Token: TokenAttributes;

    fn tokenize(&self, text: &str) -> Vec<Self::Token>;
}

/// Token produced by [`WordTokenizer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleToken {
    pub surface: String,
    pub lemma: String,
    pub stopword: bool,
    pub numeric: bool,
}

impl TokenAttributes for SimpleToken {
    fn surface(&self) -> &str {
        &self.surface
    }

    fn lemma(&self) -> &str {
        &self.lemma
    }

    fn is_stopword(&self) -> bool {
        self.stopword
    }

    fn is_numeric(&self) -> bool {
        self.numeric
    }
}

/// Unicode word-boundary tokenizer (UAX #29).
///
/// Underscore joins words, so merged collocations such as `hidden_unit`
/// survive as one token. The lemma is the lowercased surface form; there is
/// no morphological analysis.
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    stopwords: StopwordSet,
}

impl WordTokenizer {
    pub fn new(stopwords: StopwordSet) -> Self {
        Self { stopwords }
    }

    pub fn stopwords(&self) -> &StopwordSet {
        &self.stopwords
    }
}

impl Default for WordTokenizer {
    fn default() -> Self {
        Self::new(default_stopwords())
    }
}

impl Tokenizer for WordTokenizer {
    type Token = SimpleToken;

    fn tokenize(&self, text: &str) -> Vec<SimpleToken> {
        text.unicode_words()
            .map(|word| {
                let lemma = word.to_lowercase();
                SimpleToken {
                    surface: word.to_string(),
                    stopword: self.stopwords.contains(&lemma),
                    numeric: is_numeric(&lemma),
                    lemma,
                }
            })
            .collect()
    }
}

// `f64` parsing also accepts "inf" and "nan", hence the digit check.
fn is_numeric(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
        && (word.parse::<f64>().is_ok() || word.replace([',', '_'], "").parse::<f64>().is_ok())
}

/// Keeps tokens worth modelling.
///
/// A token survives iff its lemma is longer than `min_len` characters, it is
/// neither flagged nor listed as a stopword, it is not numeric, and its lemma
/// is not a placeholder tag.
#[derive(Debug, Clone)]
pub struct TokenFilter {
    pub min_len: usize,
    pub stopwords: StopwordSet,
    pub placeholder_tags: Arc<FxHashSet<String>>,
}

impl TokenFilter {
    pub fn new(stopwords: StopwordSet) -> Self {
        Self {
            stopwords,
            ..Self::default()
        }
    }

    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    pub fn with_placeholder_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholder_tags = Arc::new(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn keep<T: TokenAttributes + ?Sized>(&self, token: &T) -> bool {
        let lemma = token.lemma();
        lemma.chars().count() > self.min_len
            && !token.is_stopword()
            && !token.is_numeric()
            && !self.stopwords.contains(lemma)
            && !self.placeholder_tags.contains(lemma)
    }

    /// Lemmas of the tokens that pass [`TokenFilter::keep`], in order.
    pub fn apply<T: TokenAttributes>(&self, tokens: &[T]) -> Vec<String> {
        tokens
            .iter()
            .filter(|t| self.keep(*t))
            .map(|t| t.lemma().to_string())
            .collect()
    }

    /// Tokenize `text` with `tokenizer` and filter the result.
    pub fn filter_text<K: Tokenizer>(&self, tokenizer: &K, text: &str) -> Vec<String> {
        self.apply(&tokenizer.tokenize(text))
    }
}

impl Default for TokenFilter {
    fn default() -> Self {
        let mut placeholders = FxHashSet::default();
        placeholders.insert(PRONOUN_PLACEHOLDER.to_string());
        Self {
            min_len: 5,
            stopwords: default_stopwords(),
            placeholder_tags: Arc::new(placeholders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lemmatized {
        surface: &'static str,
        lemma: &'static str,
    }

    impl TokenAttributes for Lemmatized {
        fn surface(&self) -> &str {
            self.surface
        }
        fn lemma(&self) -> &str {
            self.lemma
        }
        fn is_stopword(&self) -> bool {
            false
        }
        fn is_numeric(&self) -> bool {
            false
        }
    }

    #[test]
    fn merged_collocations_stay_whole() {
        let tokens = WordTokenizer::default().tokenize("We trained neural_network models.");
        let lemmas: Vec<&str> = tokens.iter().map(|t| t.lemma()).collect();
        assert_eq!(lemmas, vec!["we", "trained", "neural_network", "models"]);
        assert_eq!(tokens[0].surface(), "We");
        assert!(tokens[0].is_stopword());
    }

    #[test]
    fn numbers_are_flagged() {
        let tokens = WordTokenizer::default().tokenize("accuracy 93.5 over 10,000 runs");
        let numeric: Vec<&str> = tokens
            .iter()
            .filter(|t| t.is_numeric())
            .map(|t| t.surface())
            .collect();
        assert_eq!(numeric, vec!["93.5", "10,000"]);
    }

    #[test]
    fn filter_drops_short_stop_and_numeric_tokens() {
        let filter = TokenFilter::default();
        let kept = filter.filter_text(
            &WordTokenizer::default(),
            "Therefore the hidden_unit activations exceeded 123456 in every network",
        );
        assert_eq!(kept, vec!["hidden_unit", "activations", "exceeded", "network"]);
    }

    #[test]
    fn length_threshold_is_strict() {
        let filter = TokenFilter::default();
        let tokens = WordTokenizer::default().tokenize("model models");
        assert_eq!(filter.apply(&tokens), vec!["models"]);

        let filter = filter.with_min_len(4);
        assert_eq!(filter.apply(&tokens), vec!["model", "models"]);
    }

    #[test]
    fn placeholder_lemmas_are_dropped() {
        let tokens = [
            Lemmatized {
                surface: "themselves",
                lemma: PRONOUN_PLACEHOLDER,
            },
            Lemmatized {
                surface: "networks",
                lemma: "network",
            },
        ];
        let filter = TokenFilter::new(Arc::new(FxHashSet::default()));
        assert_eq!(filter.apply(&tokens), vec!["network"]);

        let filter = filter.with_placeholder_tags(Vec::<String>::new());
        assert_eq!(filter.apply(&tokens), vec!["-PRON-", "network"]);
    }

    #[test]
    fn custom_stopwords_are_threaded_through() {
        let stopwords: StopwordSet = Arc::new(["dataset".to_string()].into_iter().collect());
        let tokenizer = WordTokenizer::new(Arc::clone(&stopwords));
        let filter = TokenFilter::new(stopwords);
        assert_eq!(
            filter.filter_text(&tokenizer, "dataset therefore sampled"),
            vec!["therefore", "sampled"]
        );
    }
}
