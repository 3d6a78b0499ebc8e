use std::{collections::BTreeMap, fs, path::Path};

use tracing::info;

use crate::{
    error::{Error, Result},
    persist::{ArtifactPaths, ARTIFACT_FILES, COMPLETE_MARKER},
    utils::datastruct::CsrMatrix,
    vectorizer::{
        corpus::{LabelEncoding, MetadataRow},
        stats::{sparsity, validate_shape, MatrixStats},
    },
};

/// Summary of an artifact directory that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyReport {
    /// (documents, features)
    pub shape: (usize, usize),
    pub nnz: usize,
    pub sparsity_percent: f64,
    /// documents per category
    pub label_counts: BTreeMap<String, usize>,
}

/// Reloads an artifact directory and checks that its parts agree.
///
/// # Errors
/// - `Error::Input` when an artifact or the completion marker is missing
/// - `Error::ShapeMismatch` when the matrix is malformed or its rows and
///   columns disagree with the metadata, labels, feature names or stats
pub fn verify(dir: impl AsRef<Path>) -> Result<VerifyReport> {
    let dir = dir.as_ref();
    let missing: Vec<&str> = ARTIFACT_FILES
        .iter()
        .chain(std::iter::once(&COMPLETE_MARKER))
        .copied()
        .filter(|f| !dir.join(f).is_file())
        .collect();
    if !missing.is_empty() {
        return Err(Error::Input(format!("missing artifacts in {}: {}", dir.display(), missing.join(", "))));
    }
    let paths = ArtifactPaths::in_dir(dir);

    let bytes = fs::read(&paths.matrix).map_err(|e| Error::io(&paths.matrix, e))?;
    let matrix: CsrMatrix<f64> = serde_cbor::from_slice(&bytes)?;
    matrix.validate().map_err(Error::ShapeMismatch)?;
    let (rows, cols) = matrix.shape();

    let features = fs::read_to_string(&paths.feature_names).map_err(|e| Error::io(&paths.feature_names, e))?;
    let metadata: Vec<MetadataRow> = csv::Reader::from_path(&paths.metadata)?
        .deserialize::<MetadataRow>()
        .collect::<std::result::Result<_, _>>()?;
    validate_shape(&matrix, metadata.len(), features.lines().count())?;
    if let Some((pos, row)) = metadata.iter().enumerate().find(|(pos, row)| row.row_index != *pos) {
        return Err(Error::ShapeMismatch(format!(
            "metadata line {pos} carries row_index {}",
            row.row_index
        )));
    }

    let labels: Vec<String> = read_json(&paths.labels_str)?;
    let codes: Vec<usize> = read_json(&paths.labels_num)?;
    if labels.len() != rows || codes.len() != rows {
        return Err(Error::ShapeMismatch(format!(
            "{} string labels and {} numeric labels for {rows} rows",
            labels.len(),
            codes.len()
        )));
    }
    if let Some(row) = metadata.iter().zip(&labels).position(|(m, l)| &m.category != l) {
        return Err(Error::ShapeMismatch(format!("label of row {row} disagrees with its metadata")));
    }
    let encoding = LabelEncoding::fit(labels.iter().map(String::as_str));
    if let Some(row) = labels.iter().zip(&codes).position(|(l, c)| encoding.encode(l) != Some(*c)) {
        return Err(Error::ShapeMismatch(format!(
            "numeric label {} of row {row} does not encode {:?}",
            codes[row], labels[row]
        )));
    }

    let stats: Vec<MatrixStats> = csv::Reader::from_path(&paths.stats)?
        .deserialize::<MatrixStats>()
        .collect::<std::result::Result<_, _>>()?;
    match stats.as_slice() {
        [s] if s.num_documents == rows && s.num_features == cols && s.nnz == matrix.nnz() => {}
        _ => {
            return Err(Error::ShapeMismatch(format!(
                "stats table does not describe a {rows}x{cols} matrix with {} stored values",
                matrix.nnz()
            )))
        }
    }

    let mut label_counts = BTreeMap::new();
    for label in labels {
        *label_counts.entry(label).or_insert(0) += 1;
    }
    let report = VerifyReport {
        shape: (rows, cols),
        nnz: matrix.nnz(),
        sparsity_percent: sparsity(matrix.nnz(), rows, cols) * 100.0,
        label_counts,
    };
    info!(rows, cols, nnz = report.nnz, sparsity_percent = report.sparsity_percent, "artifacts verified");
    Ok(report)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}
