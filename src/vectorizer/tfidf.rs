use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{Error, Result},
    utils::datastruct::{CsrMatrix, RowView, SparseRow},
    vectorizer::{token::TokenFrequency, vocab::Vocabulary, CancelToken},
};

/// Dense IDF weights, one per vocabulary column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdfVector {
    /// IDF Vector it is not sparse because it is fully filled
    pub idf_vec: Vec<f64>,
    /// document count the weights were computed from
    pub doc_num: u64,
}

impl IdfVector {
    #[inline]
    pub fn len(&self) -> usize {
        self.idf_vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idf_vec.is_empty()
    }

    /// # Panics
    /// if `column` is out of range
    #[inline]
    pub fn get(&self, column: u32) -> f64 {
        self.idf_vec[column as usize]
    }
}

/// TF-IDF calculation strategy.
///
/// Implementors decide how IDF weights are derived from document
/// frequencies and how a row of raw counts becomes a weighted row.
/// `DefaultTFIDFEngine` is the smoothed-IDF, L2-normalized variant.
pub trait TFIDFEngine {
    /// IDF of a term contained in `doc_freq` of `doc_num` documents
    fn idf(doc_num: u64, doc_freq: u64) -> f64;

    /// Weighted values for one row of counts, one per stored entry
    fn tf_idf_row(counts: RowView<'_, u32>, idf: &IdfVector) -> Vec<f64>;

    /// IDF vector for every vocabulary column
    fn idf_vec(vocab: &Vocabulary) -> IdfVector {
        let doc_num = vocab.doc_num();
        IdfVector {
            idf_vec: vocab.doc_freqs().map(|df| Self::idf(doc_num, df)).collect(),
            doc_num,
        }
    }
}

/// Default TF-IDF engine
///
/// - `idf(t) = ln((1 + N) / (1 + df(t))) + 1`, always > 0
/// - `w = count * idf`, then each row is scaled to unit L2 norm
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl TFIDFEngine for DefaultTFIDFEngine {
    #[inline]
    fn idf(doc_num: u64, doc_freq: u64) -> f64 {
        ((1.0 + doc_num as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
    }

    fn tf_idf_row(counts: RowView<'_, u32>, idf: &IdfVector) -> Vec<f64> {
        let mut row: Vec<f64> = counts.iter().map(|(col, c)| c as f64 * idf.get(col)).collect();
        let norm = row.iter().fold(0.0_f64, |acc, v| acc + v * v).sqrt();
        // an all-zero row stays all-zero
        if norm > 0.0 {
            for v in row.iter_mut() {
                *v /= norm;
            }
        }
        row
    }
}

/// Raw per-document counts of vocabulary terms.
/// Shape is (documents, vocabulary size); out-of-vocabulary tokens are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct TermFrequencyMatrix {
    counts: CsrMatrix<u32>,
}

impl TermFrequencyMatrix {
    /// Builds the matrix from per-document token frequencies, row `i` from `freqs[i]`.
    pub fn build(freqs: &[TokenFrequency], vocab: &Vocabulary, cancel: &CancelToken) -> Result<Self> {
        let rows: Option<Vec<SparseRow<u32>>> = freqs
            .par_iter()
            .map(|freq| {
                if cancel.is_cancelled() {
                    return None;
                }
                let (cols, counts): (Vec<u32>, Vec<u32>) = freq
                    .iter()
                    .filter_map(|(token, count)| vocab.column(token).map(|col| (col, count)))
                    .unzip();
                Some(SparseRow::from_unsorted(cols, counts))
            })
            .collect();
        let rows = rows.ok_or(Error::Cancelled)?;
        let counts = CsrMatrix::from_rows(vocab.len(), rows).map_err(Error::ShapeMismatch)?;
        info!(rows = counts.n_rows(), cols = counts.n_cols(), nnz = counts.nnz(), "term frequency matrix built");
        Ok(Self { counts })
    }

    #[inline]
    pub fn matrix(&self) -> &CsrMatrix<u32> {
        &self.counts
    }

    /// TF-IDF weighting with per-row L2 normalization.
    /// Produces a new matrix with the same shape and nonzero pattern.
    pub fn tf_idf<E: TFIDFEngine>(&self, idf: &IdfVector, cancel: &CancelToken) -> Result<CsrMatrix<f64>> {
        if idf.len() != self.counts.n_cols() {
            return Err(Error::ShapeMismatch(format!(
                "idf vector has {} entries but the matrix has {} columns",
                idf.len(),
                self.counts.n_cols()
            )));
        }
        let weighted = self
            .counts
            .try_map_rows(|_, row| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(E::tf_idf_row(row, idf))
            })
            .ok_or(Error::Cancelled)?;
        info!(nnz = weighted.nnz(), "tf-idf matrix normalized");
        Ok(weighted)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::config::{Stoplist, VectorizerConfig};
    use crate::vectorizer::{corpus::CorpusStats, token::Tokenizer};

    fn fixture(texts: &[&str]) -> (Vec<TokenFrequency>, Vocabulary) {
        let tok = Tokenizer::new(Stoplist::empty());
        let freqs: Vec<_> = texts.iter().map(|t| tok.frequency(t)).collect();
        let config = VectorizerConfig {
            min_df: 1,
            max_df: 1.0,
            max_features: 10,
            stoplist: Stoplist::empty(),
            ..Default::default()
        };
        let vocab = Vocabulary::fit(&CorpusStats::from_frequencies(&freqs), &config).unwrap();
        (freqs, vocab)
    }

    #[test]
    fn smoothed_idf_values() {
        let (_, vocab) = fixture(&["cat sat mat", "cat sat hat", "dog ran far"]);
        let idf = DefaultTFIDFEngine::idf_vec(&vocab);
        assert_eq!(idf.len(), 7);
        assert_eq!(idf.doc_num, 3);
        let common = (4.0_f64 / 3.0).ln() + 1.0;
        let rare = 2.0_f64.ln() + 1.0;
        assert_abs_diff_eq!(idf.get(vocab.column("cat").unwrap()), common, epsilon = 1e-12);
        assert_abs_diff_eq!(idf.get(vocab.column("sat").unwrap()), common, epsilon = 1e-12);
        for t in ["dog", "far", "hat", "mat", "ran"] {
            assert_abs_diff_eq!(idf.get(vocab.column(t).unwrap()), rare, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(common, 1.2877, epsilon = 1e-4);
        assert_abs_diff_eq!(rare, 1.6931, epsilon = 1e-4);
    }

    #[test]
    fn idf_stays_positive_when_term_is_everywhere() {
        assert_abs_diff_eq!(DefaultTFIDFEngine::idf(5, 5), 1.0, epsilon = 1e-15);
        assert!(DefaultTFIDFEngine::idf(1, 1) > 0.0);
    }

    #[test]
    fn counts_ignore_out_of_vocabulary_tokens() {
        let (_, vocab) = fixture(&["a b", "b c"]);
        let tok = Tokenizer::new(Stoplist::empty());
        let freqs = vec![tok.frequency("b b zz a"), tok.frequency("unknown")];
        let tf = TermFrequencyMatrix::build(&freqs, &vocab, &CancelToken::new()).unwrap();
        let m = tf.matrix();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.to_dense(), vec![vec![1, 2, 0], vec![0, 0, 0]]);
    }

    #[test]
    fn tf_idf_rows_have_unit_norm() {
        let (freqs, vocab) = fixture(&["cat sat mat cat", "cat sat hat", "dog ran far far far"]);
        let idf = DefaultTFIDFEngine::idf_vec(&vocab);
        let cancel = CancelToken::new();
        let tf = TermFrequencyMatrix::build(&freqs, &vocab, &cancel).unwrap();
        let m = tf.tf_idf::<DefaultTFIDFEngine>(&idf, &cancel).unwrap();
        assert!(m.same_pattern(tf.matrix()));
        for row in m.iter_rows() {
            let norm: f64 = row.values.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn tf_idf_of_first_example_row() {
        let (freqs, vocab) = fixture(&["cat sat mat", "cat sat hat", "dog ran far"]);
        let idf = DefaultTFIDFEngine::idf_vec(&vocab);
        let cancel = CancelToken::new();
        let tf = TermFrequencyMatrix::build(&freqs, &vocab, &cancel).unwrap();
        let m = tf.tf_idf::<DefaultTFIDFEngine>(&idf, &cancel).unwrap();
        let common = (4.0_f64 / 3.0).ln() + 1.0;
        let rare = 2.0_f64.ln() + 1.0;
        let norm = (2.0 * common * common + rare * rare).sqrt();
        assert_abs_diff_eq!(m.get(0, vocab.column("cat").unwrap()), common / norm, epsilon = 1e-12);
        assert_abs_diff_eq!(m.get(0, vocab.column("mat").unwrap()), rare / norm, epsilon = 1e-12);
        assert_eq!(m.get(0, vocab.column("dog").unwrap()), 0.0);
    }

    #[test]
    fn empty_row_stays_zero() {
        let (_, vocab) = fixture(&["a b", "b c"]);
        let idf = DefaultTFIDFEngine::idf_vec(&vocab);
        let cancel = CancelToken::new();
        let tf = TermFrequencyMatrix::build(&[TokenFrequency::new()], &vocab, &cancel).unwrap();
        let m = tf.tf_idf::<DefaultTFIDFEngine>(&idf, &cancel).unwrap();
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.row_sums(), vec![0.0]);
    }

    #[test]
    fn mismatched_idf_is_rejected() {
        let (freqs, vocab) = fixture(&["a b", "b c"]);
        let cancel = CancelToken::new();
        let tf = TermFrequencyMatrix::build(&freqs, &vocab, &cancel).unwrap();
        let idf = IdfVector { idf_vec: vec![1.0], doc_num: 2 };
        assert!(matches!(tf.tf_idf::<DefaultTFIDFEngine>(&idf, &cancel), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn cancelled_build_returns_no_matrix() {
        let (freqs, vocab) = fixture(&["a b", "b c"]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(TermFrequencyMatrix::build(&freqs, &vocab, &cancel), Err(Error::Cancelled)));
    }
}
