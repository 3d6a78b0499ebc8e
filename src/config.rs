use std::{collections::BTreeSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// English stoplist used by the reference runs (the NLTK English list)
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// Set of lowercase terms dropped during tokenization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Stoplist {
    words: BTreeSet<String>,
}

impl Stoplist {
    pub fn empty() -> Self {
        Self { words: BTreeSet::new() }
    }

    pub fn english() -> Self {
        Self::from_words(ENGLISH_STOPWORDS)
    }

    /// Words are lowercased on insertion.
    pub fn from_words<T: AsRef<str>>(words: &[T]) -> Self {
        Self {
            words: words.iter().map(|w| w.as_ref().trim().to_lowercase()).filter(|w| !w.is_empty()).collect(),
        }
    }

    /// One word per line; blank lines and `#` comments are ignored.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let words: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        Ok(Self::from_words(&words))
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<Vec<String>> for Stoplist {
    fn from(words: Vec<String>) -> Self {
        Self::from_words(&words)
    }
}

impl From<Stoplist> for Vec<String> {
    fn from(stoplist: Stoplist) -> Self {
        stoplist.words.into_iter().collect()
    }
}

impl Default for Stoplist {
    fn default() -> Self {
        Self::english()
    }
}

/// BM25 saturation and length-normalization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    /// term frequency saturation, > 0
    pub k1: f64,
    /// document length normalization, in [0, 1]
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Vocabulary selection and weighting options for one run.
///
/// The defaults match the reference build: `min_df = 5`, `max_df = 0.95`,
/// `max_features = 20000`, `k1 = 1.5`, `b = 0.75`, English stoplist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// minimum number of documents a term must appear in
    pub min_df: u64,
    /// maximum fraction of documents a term may appear in
    pub max_df: f64,
    /// vocabulary size cap
    pub max_features: usize,
    pub bm25: Bm25Params,
    pub stoplist: Stoplist,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            min_df: 5,
            max_df: 0.95,
            max_features: 20_000,
            bm25: Bm25Params::default(),
            stoplist: Stoplist::english(),
        }
    }
}

impl VectorizerConfig {
    /// Reads a TOML file; missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_df == 0 {
            return Err(Error::Config("min_df must be at least 1".into()));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(Error::Config(format!("max_df must be in (0, 1], got {}", self.max_df)));
        }
        if self.max_features == 0 {
            return Err(Error::Config("max_features must be positive".into()));
        }
        if self.max_features > u32::MAX as usize {
            return Err(Error::Config(format!("max_features must not exceed {}", u32::MAX)));
        }
        if !(self.bm25.k1.is_finite() && self.bm25.k1 > 0.0) {
            return Err(Error::Config(format!("k1 must be a positive number, got {}", self.bm25.k1)));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(Error::Config(format!("b must be in [0, 1], got {}", self.bm25.b)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_build() {
        let c = VectorizerConfig::default();
        assert_eq!(c.min_df, 5);
        assert_eq!(c.max_df, 0.95);
        assert_eq!(c.max_features, 20_000);
        assert_eq!(c.bm25, Bm25Params { k1: 1.5, b: 0.75 });
        assert_eq!(c.stoplist.len(), 179);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let bad = [
            VectorizerConfig { min_df: 0, ..Default::default() },
            VectorizerConfig { max_df: 0.0, ..Default::default() },
            VectorizerConfig { max_df: 1.5, ..Default::default() },
            VectorizerConfig { max_df: f64::NAN, ..Default::default() },
            VectorizerConfig { max_features: 0, ..Default::default() },
            VectorizerConfig { bm25: Bm25Params { k1: 0.0, b: 0.75 }, ..Default::default() },
            VectorizerConfig { bm25: Bm25Params { k1: 1.5, b: 1.1 }, ..Default::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(Error::Config(_))), "{c:?} should be rejected");
        }
    }

    #[test]
    fn boundary_values_are_accepted() {
        let c = VectorizerConfig {
            min_df: 1,
            max_df: 1.0,
            max_features: 1,
            bm25: Bm25Params { k1: 0.1, b: 0.0 },
            stoplist: Stoplist::empty(),
        };
        assert!(c.validate().is_ok());
        let c = VectorizerConfig { bm25: Bm25Params { k1: 1.2, b: 1.0 }, ..c };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn stoplist_lowercases_and_skips_blanks() {
        let s = Stoplist::from_words(&["The", "  AND ", ""]);
        assert_eq!(s.len(), 2);
        assert!(s.contains("the"));
        assert!(s.contains("and"));
        assert!(!s.contains("The"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c: VectorizerConfig = toml::from_str(
            r#"
            min_df = 1
            stoplist = ["foo", "bar"]

            [bm25]
            k1 = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(c.min_df, 1);
        assert_eq!(c.max_df, 0.95);
        assert_eq!(c.bm25.k1, 2.0);
        assert_eq!(c.bm25.b, 0.75);
        assert_eq!(c.stoplist, Stoplist::from_words(&["foo", "bar"]));
    }

    #[test]
    fn toml_stoplist_is_lowercased_like_a_stopword_file() {
        let c: VectorizerConfig = toml::from_str(r#"stoplist = ["The", " AND "]"#).unwrap();
        assert_eq!(c.stoplist, Stoplist::from_words(&["the", "and"]));
        let tokens = crate::vectorizer::token::Tokenizer::new(c.stoplist).tokenize("The cat and the hat");
        assert_eq!(tokens, vec!["cat", "hat"]);
    }

    #[test]
    fn stoplist_file_ignores_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        std::fs::write(&path, "# custom list\nalpha\n\nBeta\n").unwrap();
        let s = Stoplist::from_file(&path).unwrap();
        assert_eq!(s, Stoplist::from_words(&["alpha", "beta"]));
    }
}
