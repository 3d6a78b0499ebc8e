use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::vectorizer::token::TokenFrequency;

/// One input record. `id` is the row index in every matrix built from the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: usize,
    pub text: String,
    pub label: String,
    pub source_filename: String,
}

/// Ordered document collection.
/// Insertion order is the canonical row order and is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self { documents: Vec::new() }
    }

    /// Builds a corpus from `(text, label, source_filename)` records in order.
    pub fn from_records<I, T, L, F>(records: I) -> Self
    where
        I: IntoIterator<Item = (T, L, F)>,
        T: Into<String>,
        L: Into<String>,
        F: Into<String>,
    {
        let mut corpus = Self::new();
        for (text, label, filename) in records {
            corpus.push(text, label, filename);
        }
        corpus
    }

    /// Appends a document and returns its row index
    pub fn push(
        &mut self,
        text: impl Into<String>,
        label: impl Into<String>,
        source_filename: impl Into<String>,
    ) -> usize {
        let id = self.documents.len();
        self.documents.push(Document {
            id,
            text: text.into(),
            label: label.into(),
            source_filename: source_filename.into(),
        });
        id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.documents.iter().map(|d| d.label.as_str())
    }

    /// Metadata rows in matrix row order
    pub fn metadata(&self) -> Vec<MetadataRow> {
        self.documents
            .iter()
            .map(|d| MetadataRow {
                text: d.text.clone(),
                category: d.label.clone(),
                source_filename: d.source_filename.clone(),
                row_index: d.id,
            })
            .collect()
    }
}

/// Per-document metadata, joined to matrix rows by `row_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub text: String,
    pub category: String,
    pub source_filename: String,
    pub row_index: usize,
}

/// Deterministic category -> integer mapping.
/// Categories are numbered in sorted order, first category is 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    classes: Vec<String>,
}

impl LabelEncoding {
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(str::to_string).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Sorted distinct categories; position is the code
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Codes for every document of `corpus`, in row order
    pub fn encode_corpus(&self, corpus: &Corpus) -> Option<Vec<usize>> {
        corpus.labels().map(|l| self.encode(l)).collect()
    }
}

/// Corpus-wide occurrence statistics for one term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    /// number of documents containing the term
    pub doc_freq: u64,
    /// occurrences over the whole corpus
    pub total_count: u64,
}

/// Document frequency and total count of every term seen in a corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    doc_num: u64,
    term_stats: IndexMap<Box<str>, TermStats>,
}

impl CorpusStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects statistics over per-document token frequencies
    pub fn from_frequencies(freqs: &[TokenFrequency]) -> Self {
        let mut stats = Self::new();
        for freq in freqs {
            stats.add_document(freq);
        }
        stats
    }

    /// Counts one document
    pub fn add_document(&mut self, freq: &TokenFrequency) {
        self.doc_num += 1;
        for (token, count) in freq.iter() {
            let entry = self.term_stats.entry(Box::from(token)).or_default();
            entry.doc_freq += 1;
            entry.total_count += count as u64;
        }
    }

    /// Merge another set of statistics into self
    pub fn merge(&mut self, other: &CorpusStats) {
        self.doc_num += other.doc_num;
        for (term, s) in other.term_stats.iter() {
            let entry = self.term_stats.entry(term.clone()).or_default();
            entry.doc_freq += s.doc_freq;
            entry.total_count += s.total_count;
        }
    }

    #[inline]
    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    pub fn term(&self, term: &str) -> Option<TermStats> {
        self.term_stats.get(term).copied()
    }

    /// Number of distinct terms
    pub fn term_num(&self) -> usize {
        self.term_stats.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TermStats)> + '_ {
        self.term_stats.iter().map(|(k, v)| (k.as_ref(), *v))
    }
}
