/// This crate turns a folder of labeled plaintext documents into a BM25-weighted
/// sparse document-term matrix, ready for downstream classifiers.
pub mod config;
pub mod error;
pub mod ingest;
pub mod persist;
pub mod utils;
pub mod vectorizer;

/// BM25 Vectorizer
/// The top-level struct of this crate. It runs the whole pipeline over a corpus:
/// tokenization, vocabulary fitting, term counting, IDF, TF-IDF with L2
/// normalization, BM25 reweighting and summary statistics.
///
/// `Bm25Vectorizer<E>` has one generic parameter:
/// - `E`: TF-IDF calculation engine type (e.g., DefaultTFIDFEngine)
///
/// The configuration is validated when the vectorizer is created.
/// A run can be stopped from another thread through a `CancelToken`;
/// a cancelled run yields an error and no matrix.
pub use vectorizer::{Bm25Vectorizer, CancelToken};

/// Output of a completed run
/// Holds the BM25 matrix, the TF-IDF matrix it was derived from, the fitted
/// vocabulary and IDF vector, labels and their integer codes, per-row metadata
/// and the stats row.
pub use vectorizer::{Bm25Output, FittedModel};

/// Corpus and Document
/// An ordered list of labeled documents. The position of a document in the
/// corpus is its row index in every matrix built from it.
pub use vectorizer::corpus::{Corpus, Document, LabelEncoding, MetadataRow};

/// Token Frequency structure
/// A struct for analyzing/managing token occurrence frequency within a document.
/// It manages:
/// - The count of occurrences of each token
/// - The total number of tokens in the document
///
/// Used as base data for TF (Term Frequency) calculation.
pub use vectorizer::token::{TokenFrequency, Tokenizer};

/// Vocabulary
/// The retained terms after document-frequency filtering, in column order.
pub use vectorizer::vocab::Vocabulary;

/// TF IDF Calculation Engine Trait
/// A trait that defines the behavior of a TF-IDF calculation engine.
///
/// By implementing this trait, you can plug different TF-IDF calculation strategies
/// into `Bm25Vectorizer<E>`.
/// A default implementation, `DefaultTFIDFEngine`, is provided and performs
/// smoothed-IDF TF-IDF with per-row L2 normalization.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, IdfVector, TFIDFEngine, TermFrequencyMatrix};

/// BM25 Reweighter
/// Applies BM25 saturation and length normalization to a normalized TF-IDF matrix.
pub use vectorizer::bm25::Bm25Reweighter;

/// Matrix statistics
pub use vectorizer::stats::MatrixStats;

/// Compressed-row sparse matrix
pub use utils::datastruct::CsrMatrix;

pub use config::{Bm25Params, Stoplist, VectorizerConfig};
pub use error::{Error, Result};
