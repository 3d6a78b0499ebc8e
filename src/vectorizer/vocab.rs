use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::VectorizerConfig,
    error::{Error, Result},
    vectorizer::corpus::{CorpusStats, TermStats},
};

/// Frozen term -> column mapping.
///
/// Terms are stored in ascending lexicographic order; the position of a term
/// is its column index. A `Vocabulary` is fit once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    #[serde(with = "indexmap::map::serde_seq")]
    terms: IndexMap<Box<str>, TermStats>,
    /// number of documents the vocabulary was fit on
    doc_num: u64,
}

impl Vocabulary {
    /// Selects the vocabulary from corpus statistics.
    ///
    /// 1. keep terms with `min_df <= df` and `df <= max_df * N`
    /// 2. if more than `max_features` remain, keep the most frequent ones
    ///    (total corpus count descending, ties by term ascending)
    /// 3. number the survivors in lexicographic order
    ///
    /// # Errors
    /// `Error::Vocabulary` when no term survives, or when `max_df` admits
    /// fewer documents than `min_df`.
    pub fn fit(stats: &CorpusStats, config: &VectorizerConfig) -> Result<Self> {
        let doc_num = stats.doc_num();
        let max_doc_count = config.max_df * doc_num as f64;
        if max_doc_count < config.min_df as f64 {
            return Err(Error::Vocabulary(format!(
                "max_df={} admits at most {:.2} of {} documents, fewer than min_df={}",
                config.max_df, max_doc_count, doc_num, config.min_df
            )));
        }

        let mut candidates: Vec<(&str, TermStats)> = stats
            .iter()
            .filter(|(_, s)| s.doc_freq >= config.min_df && s.doc_freq as f64 <= max_doc_count)
            .collect();
        let pruned = stats.term_num() - candidates.len();

        if candidates.len() > config.max_features {
            candidates.sort_by(|a, b| b.1.total_count.cmp(&a.1.total_count).then_with(|| a.0.cmp(b.0)));
            candidates.truncate(config.max_features);
        }
        candidates.sort_by(|a, b| a.0.cmp(b.0));

        if candidates.is_empty() {
            return Err(Error::Vocabulary(format!(
                "no terms remain after pruning {} candidates (min_df={}, max_df={})",
                stats.term_num(),
                config.min_df,
                config.max_df
            )));
        }

        let terms: IndexMap<Box<str>, TermStats> =
            candidates.into_iter().map(|(t, s)| (Box::from(t), s)).collect();
        debug!(seen = stats.term_num(), pruned_by_df = pruned, "vocabulary candidates filtered");
        info!(terms = terms.len(), documents = doc_num, "vocabulary fitted");
        Ok(Self { terms, doc_num })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Column of `term`
    #[inline]
    pub fn column(&self, term: &str) -> Option<u32> {
        self.terms.get_index_of(term).map(|i| i as u32)
    }

    /// Term at `column`
    #[inline]
    pub fn term(&self, column: u32) -> Option<&str> {
        self.terms.get_index(column as usize).map(|(t, _)| t.as_ref())
    }

    /// Terms in column order
    pub fn terms(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.keys().map(|t| t.as_ref())
    }

    /// Document frequency per column
    pub fn doc_freqs(&self) -> impl Iterator<Item = u64> + '_ {
        self.terms.values().map(|s| s.doc_freq)
    }

    pub fn stats(&self, term: &str) -> Option<TermStats> {
        self.terms.get(term).copied()
    }

    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }
}
