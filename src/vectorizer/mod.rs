pub mod bm25;
pub mod corpus;
pub mod stats;
pub mod tfidf;
pub mod token;
pub mod vocab;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::prelude::*;
use tracing::{info, info_span};

use crate::{
    config::VectorizerConfig,
    error::{Error, Result},
    utils::datastruct::CsrMatrix,
    vectorizer::{
        bm25::Bm25Reweighter,
        corpus::{Corpus, CorpusStats, LabelEncoding, MetadataRow},
        stats::{validate_shape, MatrixStats},
        tfidf::{DefaultTFIDFEngine, IdfVector, TFIDFEngine, TermFrequencyMatrix},
        token::{TokenFrequency, Tokenizer},
        vocab::Vocabulary,
    },
};

/// Default name recorded in the stats table
pub const DEFAULT_MATRIX_NAME: &str = "BM25-UK-US";

/// Cooperative cancellation flag shared between a run and its caller.
/// Checked before each row; a cancelled phase produces no matrix.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Corpus-wide state computed once per run and read by every row transform.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub vocabulary: Vocabulary,
    pub idf: IdfVector,
    /// mean of the TF-IDF row sums
    pub avg_doc_length: f64,
}

/// Everything a completed run hands to the persistence layer.
/// Only constructed when every phase finished.
#[derive(Debug, Clone)]
pub struct Bm25Output {
    pub model: FittedModel,
    /// L2-normalized TF-IDF matrix the BM25 weights were derived from
    pub tf_idf: CsrMatrix<f64>,
    /// BM25-weighted matrix
    pub matrix: CsrMatrix<f64>,
    pub labels: Vec<String>,
    pub label_encoding: LabelEncoding,
    pub label_codes: Vec<usize>,
    pub metadata: Vec<MetadataRow>,
    pub stats: MatrixStats,
}

/// BM25 Vectorizer
/// Turns a labeled corpus into a BM25-weighted document-term matrix in one pass:
///
/// tokenize -> fit vocabulary -> count -> IDF -> TF-IDF + L2 -> BM25 -> stats
///
/// `E` is the TF-IDF engine, `DefaultTFIDFEngine` by default.
#[derive(Debug, Clone)]
pub struct Bm25Vectorizer<E = DefaultTFIDFEngine>
where
    E: TFIDFEngine + Send + Sync,
{
    config: VectorizerConfig,
    tokenizer: Tokenizer,
    matrix_name: String,
    cancel: CancelToken,
    _marker: std::marker::PhantomData<E>,
}

impl Bm25Vectorizer<DefaultTFIDFEngine> {
    /// Create a vectorizer with the default engine
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        Self::with_engine(config)
    }
}

impl<E> Bm25Vectorizer<E>
where
    E: TFIDFEngine + Send + Sync,
{
    /// Create a vectorizer with a custom engine.
    /// The configuration is validated here.
    pub fn with_engine(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let tokenizer = Tokenizer::new(config.stoplist.clone());
        Ok(Self {
            config,
            tokenizer,
            matrix_name: DEFAULT_MATRIX_NAME.to_string(),
            cancel: CancelToken::new(),
            _marker: std::marker::PhantomData,
        })
    }

    pub fn with_matrix_name(mut self, name: impl Into<String>) -> Self {
        self.matrix_name = name.into();
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Per-document token counts, in row order
    pub fn tokenize_corpus(&self, corpus: &Corpus) -> Result<Vec<TokenFrequency>> {
        let freqs: Option<Vec<TokenFrequency>> = corpus
            .documents()
            .par_iter()
            .map(|d| (!self.cancel.is_cancelled()).then(|| self.tokenizer.frequency(&d.text)))
            .collect();
        freqs.ok_or(Error::Cancelled)
    }

    /// Fits the vocabulary over the whole corpus
    pub fn fit_vocabulary(&self, freqs: &[TokenFrequency]) -> Result<Vocabulary> {
        let stats = freqs
            .par_iter()
            .fold(CorpusStats::new, |mut acc, f| {
                acc.add_document(f);
                acc
            })
            .reduce(CorpusStats::new, |mut a, b| {
                a.merge(&b);
                a
            });
        Vocabulary::fit(&stats, &self.config)
    }

    /// Runs the full pipeline.
    ///
    /// Phases are separated by barriers: the vocabulary is complete before
    /// any count is taken, and the IDF vector and average document length
    /// are complete before any row is reweighted.
    ///
    /// # Errors
    /// - `Error::DegenerateCorpus` for an empty corpus or zero average length
    /// - `Error::Vocabulary` when no term survives filtering
    /// - `Error::Cancelled` when the cancel token fires
    /// - `Error::ShapeMismatch` when the final validation fails
    pub fn fit_transform(&self, corpus: &Corpus) -> Result<Bm25Output> {
        let _span = info_span!("fit_transform", matrix = %self.matrix_name, documents = corpus.len()).entered();
        if corpus.is_empty() {
            return Err(Error::DegenerateCorpus("corpus has no documents".into()));
        }

        let freqs = self.tokenize_corpus(corpus)?;
        let vocabulary = self.fit_vocabulary(&freqs)?;

        let tf = TermFrequencyMatrix::build(&freqs, &vocabulary, &self.cancel)?;
        drop(freqs);
        let idf = E::idf_vec(&vocabulary);
        let tf_idf = tf.tf_idf::<E>(&idf, &self.cancel)?;
        drop(tf);

        let reweighter = Bm25Reweighter::new(self.config.bm25);
        let doc_lengths = Bm25Reweighter::doc_lengths(&tf_idf);
        let avg_doc_length = Bm25Reweighter::avg_doc_length(&doc_lengths)?;
        let matrix = reweighter.reweight_with_lengths(&tf_idf, &idf, &doc_lengths, avg_doc_length, &self.cancel)?;

        let metadata = corpus.metadata();
        validate_shape(&matrix, metadata.len(), vocabulary.len())?;
        if !matrix.same_pattern(&tf_idf) {
            return Err(Error::ShapeMismatch("bm25 matrix pattern differs from its tf-idf input".into()));
        }

        let labels: Vec<String> = corpus.labels().map(str::to_string).collect();
        let label_encoding = LabelEncoding::fit(corpus.labels());
        let label_codes = label_encoding
            .encode_corpus(corpus)
            .ok_or_else(|| Error::ShapeMismatch("label missing from its own encoding".into()))?;

        let stats = MatrixStats::from_matrix(self.matrix_name.clone(), &matrix);
        info!(
            documents = stats.num_documents,
            features = stats.num_features,
            nnz = stats.nnz,
            sparsity_percent = stats.sparsity_percent,
            "bm25 matrix ready"
        );

        Ok(Bm25Output {
            model: FittedModel { vocabulary, idf, avg_doc_length },
            tf_idf,
            matrix,
            labels,
            label_encoding,
            label_codes,
            metadata,
            stats,
        })
    }
}
