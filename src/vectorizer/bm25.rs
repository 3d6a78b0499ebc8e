use tracing::{debug, info};

use crate::{
    config::Bm25Params,
    error::{Error, Result},
    utils::datastruct::CsrMatrix,
    vectorizer::{tfidf::IdfVector, CancelToken},
};

/// BM25 reweighting of a normalized TF-IDF matrix.
///
/// Unlike Okapi BM25 over raw counts, the "term frequency" here is the
/// L2-normalized TF-IDF value and the document length is the sum of those
/// values. IDF is applied again on top of the TF-IDF weight. Both are kept
/// as-is for output parity with existing matrices.
///
/// For a stored value `v` at (doc, term):
/// ```text
/// length_norm = (1 - b) + b * (doc_length[doc] / avg_doc_length)
/// core        = v * (k1 + 1) / (v + k1 * length_norm)
/// output      = core * idf[term]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Reweighter {
    params: Bm25Params,
}

impl Bm25Reweighter {
    pub fn new(params: Bm25Params) -> Self {
        Self { params }
    }

    /// Sum of the stored weights of every row
    pub fn doc_lengths(matrix: &CsrMatrix<f64>) -> Vec<f64> {
        matrix.row_sums()
    }

    /// Mean document length.
    ///
    /// # Errors
    /// `Error::DegenerateCorpus` for no documents or a zero mean.
    pub fn avg_doc_length(doc_lengths: &[f64]) -> Result<f64> {
        if doc_lengths.is_empty() {
            return Err(Error::DegenerateCorpus("no documents to average".into()));
        }
        let avg = doc_lengths.iter().sum::<f64>() / doc_lengths.len() as f64;
        check_avg_doc_length(avg, doc_lengths.len())?;
        Ok(avg)
    }

    /// Length normalization factor of a document
    #[inline]
    pub fn length_norm(&self, doc_length: f64, avg_doc_length: f64) -> f64 {
        (1.0 - self.params.b) + self.params.b * (doc_length / avg_doc_length)
    }

    /// Weight of a single stored value
    #[inline]
    pub fn weight(&self, value: f64, idf: f64, length_norm: f64) -> f64 {
        let k1 = self.params.k1;
        let core = value * (k1 + 1.0) / (value + k1 * length_norm);
        core * idf
    }

    /// Reweights `matrix` into a new matrix with the same shape and pattern.
    ///
    /// Document lengths and their average are computed in full before any
    /// row is transformed; rows are then reweighted in parallel.
    pub fn reweight(&self, matrix: &CsrMatrix<f64>, idf: &IdfVector, cancel: &CancelToken) -> Result<CsrMatrix<f64>> {
        let doc_lengths = Self::doc_lengths(matrix);
        let avg_doc_length = Self::avg_doc_length(&doc_lengths)?;
        self.reweight_with_lengths(matrix, idf, &doc_lengths, avg_doc_length, cancel)
    }

    /// Same as [`reweight`](Self::reweight) with precomputed document lengths.
    ///
    /// # Errors
    /// `Error::DegenerateCorpus` unless `avg_doc_length` is finite and positive.
    pub fn reweight_with_lengths(
        &self,
        matrix: &CsrMatrix<f64>,
        idf: &IdfVector,
        doc_lengths: &[f64],
        avg_doc_length: f64,
        cancel: &CancelToken,
    ) -> Result<CsrMatrix<f64>> {
        if idf.len() != matrix.n_cols() {
            return Err(Error::ShapeMismatch(format!(
                "idf vector has {} entries but the matrix has {} columns",
                idf.len(),
                matrix.n_cols()
            )));
        }
        if doc_lengths.len() != matrix.n_rows() {
            return Err(Error::ShapeMismatch(format!(
                "{} document lengths for {} rows",
                doc_lengths.len(),
                matrix.n_rows()
            )));
        }
        check_avg_doc_length(avg_doc_length, doc_lengths.len())?;
        debug!(avg_doc_length, k1 = self.params.k1, b = self.params.b, "bm25 barrier scalars ready");

        let weighted = matrix
            .try_map_rows(|i, row| {
                if cancel.is_cancelled() {
                    return None;
                }
                let length_norm = self.length_norm(doc_lengths[i], avg_doc_length);
                Some(row.iter().map(|(col, v)| self.weight(v, idf.get(col), length_norm)).collect())
            })
            .ok_or(Error::Cancelled)?;
        info!(nnz = weighted.nnz(), avg_doc_length, "bm25 reweighting done");
        Ok(weighted)
    }
}

fn check_avg_doc_length(avg: f64, documents: usize) -> Result<()> {
    if avg.is_finite() && avg > 0.0 {
        Ok(())
    } else {
        Err(Error::DegenerateCorpus(format!(
            "average document length is {avg} over {documents} documents"
        )))
    }
}

impl Default for Bm25Reweighter {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}
