//! On-disk artifacts of a completed run.
//!
//! | file | content |
//! |------|---------|
//! | `X_bm25.cbor` | BM25 matrix, CSR, CBOR encoded |
//! | `y_labels_str.json` | category string per row |
//! | `y_labels_num.json` | category code per row |
//! | `feature_names.txt` | one vocabulary term per line, in column order |
//! | `documents_metadata.csv` | text, category, source_filename, row_index |
//! | `bm25_stats.csv` | matrix_name, num_documents, num_features, sparsity_percent, nnz |
//!
//! The whole set is first written into a staging directory next to the
//! artifacts. Only when every file is complete is the `_SUCCESS` marker
//! removed, the files renamed into place and the marker written again. A
//! directory without the marker is never a valid artifact set.

pub mod verify;

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    vectorizer::Bm25Output,
};

pub use verify::{verify, VerifyReport};

pub const MATRIX_FILE: &str = "X_bm25.cbor";
pub const LABELS_STR_FILE: &str = "y_labels_str.json";
pub const LABELS_NUM_FILE: &str = "y_labels_num.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.txt";
pub const METADATA_FILE: &str = "documents_metadata.csv";
pub const STATS_FILE: &str = "bm25_stats.csv";

/// Written last; its presence marks a complete artifact set
pub const COMPLETE_MARKER: &str = "_SUCCESS";

/// Every artifact file name, in write order
pub const ARTIFACT_FILES: [&str; 6] = [
    MATRIX_FILE,
    LABELS_STR_FILE,
    LABELS_NUM_FILE,
    FEATURE_NAMES_FILE,
    METADATA_FILE,
    STATS_FILE,
];

/// Paths of the written artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub matrix: PathBuf,
    pub labels_str: PathBuf,
    pub labels_num: PathBuf,
    pub feature_names: PathBuf,
    pub metadata: PathBuf,
    pub stats: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            matrix: dir.join(MATRIX_FILE),
            labels_str: dir.join(LABELS_STR_FILE),
            labels_num: dir.join(LABELS_NUM_FILE),
            feature_names: dir.join(FEATURE_NAMES_FILE),
            metadata: dir.join(METADATA_FILE),
            stats: dir.join(STATS_FILE),
        }
    }
}

/// Destination of a finished run
pub trait ArtifactWriter {
    fn write(&self, output: &Bm25Output) -> Result<ArtifactPaths>;
}

/// Writes artifacts into a directory, creating it when missing
#[derive(Debug, Clone)]
pub struct FsArtifactWriter {
    dir: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(COMPLETE_MARKER)
    }

    /// Moves a fully staged set into place, bracketed by the completion marker.
    fn publish(&self, staging: &Path) -> Result<()> {
        let marker = self.marker_path();
        match fs::remove_file(&marker) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&marker, e)),
        }
        for name in ARTIFACT_FILES {
            let target = self.dir.join(name);
            fs::rename(staging.join(name), &target).map_err(|e| Error::io(&target, e))?;
        }
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        writeln!(tmp, "{}", ARTIFACT_FILES.join("\n")).map_err(|e| Error::io(&marker, e))?;
        tmp.persist(&marker).map_err(|e| Error::io(&marker, e.error))?;
        Ok(())
    }
}

/// Creates `path` and fills it through a buffered writer, synced to disk.
fn write_file<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    {
        let mut w = BufWriter::new(&file);
        fill(&mut w)?;
        w.flush().map_err(|e| Error::io(path, e))?;
    }
    file.sync_all().map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), "artifact staged");
    Ok(())
}

impl ArtifactWriter for FsArtifactWriter {
    fn write(&self, output: &Bm25Output) -> Result<ArtifactPaths> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let staging = tempfile::Builder::new()
            .prefix(".bm25-staging")
            .tempdir_in(&self.dir)
            .map_err(|e| Error::io(&self.dir, e))?;
        let staged = ArtifactPaths::in_dir(staging.path());

        write_file(&staged.matrix, |w| Ok(serde_cbor::to_writer(w, &output.matrix)?))?;
        write_file(&staged.labels_str, |w| Ok(serde_json::to_writer(w, &output.labels)?))?;
        write_file(&staged.labels_num, |w| Ok(serde_json::to_writer(w, &output.label_codes)?))?;
        write_file(&staged.feature_names, |w| {
            for term in output.model.vocabulary.terms() {
                writeln!(w, "{term}").map_err(|e| Error::io(&staged.feature_names, e))?;
            }
            Ok(())
        })?;
        write_file(&staged.metadata, |w| {
            let mut csv = csv::Writer::from_writer(w);
            for row in &output.metadata {
                csv.serialize(row)?;
            }
            csv.flush().map_err(|e| Error::io(&staged.metadata, e))
        })?;
        write_file(&staged.stats, |w| {
            let mut csv = csv::Writer::from_writer(w);
            csv.serialize(&output.stats)?;
            csv.flush().map_err(|e| Error::io(&staged.stats, e))
        })?;

        self.publish(staging.path())?;
        staging.close().map_err(|e| Error::io(&self.dir, e))?;
        info!(dir = %self.dir.display(), files = ARTIFACT_FILES.len(), "artifacts written");
        Ok(ArtifactPaths::in_dir(&self.dir))
    }
}
