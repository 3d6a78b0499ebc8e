use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Stoplist;

/// Word tokenizer.
///
/// Lowercases the text, splits it into maximal runs of Unicode word
/// characters and drops every token found in the stoplist.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    word: Regex,
    stoplist: Stoplist,
}

impl Tokenizer {
    pub fn new(stoplist: Stoplist) -> Self {
        Self {
            // `\w` is Unicode-aware in the regex crate
            word: Regex::new(r"\w+").expect("static pattern"),
            stoplist,
        }
    }

    /// Tokens of `text` in order of appearance
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.word
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| !self.stoplist.contains(t))
            .map(str::to_string)
            .collect()
    }

    /// Token counts of `text`
    pub fn frequency(&self, text: &str) -> TokenFrequency {
        let lowered = text.to_lowercase();
        let mut freq = TokenFrequency::new();
        for m in self.word.find_iter(&lowered) {
            let token = m.as_str();
            if !self.stoplist.contains(token) {
                freq.add_token(token);
            }
        }
        freq
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(Stoplist::english())
    }
}

///  TokenFrequency
/// Occurrence count of every token of one document.
/// Tokens keep first-seen order.
///
/// # Examples
/// ```
/// use bm25_matrix::TokenFrequency;
/// let mut freq = TokenFrequency::new();
/// freq.add_tokens(&["cat", "sat", "cat"]);
/// assert_eq!(freq.token_count("cat"), 2);
/// assert_eq!(freq.token_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TokenFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    token_count: IndexMap<String, u32>,
    total_token_count: u64,
}

impl TokenFrequency {
    pub fn new() -> Self {
        TokenFrequency {
            token_count: IndexMap::new(),
            total_token_count: 0,
        }
    }

    /// add a token
    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        match self.token_count.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.token_count.insert(token.to_string(), 1);
            }
        }
        self.total_token_count += 1;
        self
    }

    /// add several tokens
    #[inline]
    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }

    /// Occurrences of `token`, 0 when absent
    #[inline]
    pub fn token_count(&self, token: &str) -> u32 {
        self.token_count.get(token).copied().unwrap_or(0)
    }

    /// Total number of tokens
    #[inline]
    pub fn token_sum(&self) -> u64 {
        self.total_token_count
    }

    /// Number of distinct tokens
    #[inline]
    pub fn token_num(&self) -> usize {
        self.token_count.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.token_count.is_empty()
    }

    /// (token, count) in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.token_count.iter().map(|(t, &c)| (t.as_str(), c))
    }
}
