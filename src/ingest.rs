//! Folder loader for labeled plaintext documents.
//!
//! Every `*.txt` file directly inside the input folder is one document. The
//! category is the file name prefix before the first `_` (`UK_0001.txt` is
//! `UK`). Files are read in file-name order, which fixes the row order.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    error::{Error, Result},
    vectorizer::corpus::Corpus,
};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Accepted label prefixes; `None` accepts any prefix
    pub allowed_labels: Option<Vec<String>>,
    /// File extension to pick up, without the dot
    pub extension: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            allowed_labels: None,
            extension: "txt".to_string(),
        }
    }
}

impl LoadOptions {
    pub fn with_labels<T: AsRef<str>>(mut self, labels: &[T]) -> Self {
        self.allowed_labels = Some(labels.iter().map(|l| l.as_ref().to_string()).collect());
        self
    }

    fn label_of(&self, file_name: &str) -> Option<String> {
        let (prefix, _) = file_name.split_once('_')?;
        if prefix.is_empty() {
            return None;
        }
        match &self.allowed_labels {
            Some(allowed) if !allowed.iter().any(|l| l == prefix) => None,
            _ => Some(prefix.to_string()),
        }
    }
}

/// Loads every eligible document of `dir` into a corpus.
///
/// Files without an accepted label prefix, unreadable files and files whose
/// text is blank are logged and skipped.
///
/// # Errors
/// `Error::Input` when `dir` does not exist or yields no documents.
pub fn load_folder(dir: impl AsRef<Path>, options: &LoadOptions) -> Result<Corpus> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::Input(format!("folder not found: {}", dir.display())));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == options.extension.as_str()))
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(Error::Input(format!("no .{} files found in {}", options.extension, dir.display())));
    }

    let mut corpus = Corpus::new();
    let mut skipped = 0usize;
    for path in &files {
        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            warn!(path = %path.display(), "skipping file with non UTF-8 name");
            skipped += 1;
            continue;
        };
        let Some(label) = options.label_of(file_name) else {
            warn!(file = file_name, "skipping file without an accepted label prefix");
            skipped += 1;
            continue;
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = file_name, error = %e, "skipping unreadable file");
                skipped += 1;
                continue;
            }
        };
        if text.trim().is_empty() {
            warn!(file = file_name, "skipping blank file");
            skipped += 1;
            continue;
        }
        corpus.push(text, label, file_name);
    }

    if corpus.is_empty() {
        return Err(Error::Input(format!("no eligible documents in {}", dir.display())));
    }
    info!(documents = corpus.len(), skipped, folder = %dir.display(), "corpus loaded");
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &[u8]) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn loads_in_file_name_order_with_prefix_labels() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "US_b.txt", b"second text");
        write(dir.path(), "UK_a.txt", b"first text");
        write(dir.path(), "notes.md", b"ignored");
        let corpus = load_folder(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(corpus.len(), 2);
        let docs = corpus.documents();
        assert_eq!((docs[0].label.as_str(), docs[0].source_filename.as_str()), ("UK", "UK_a.txt"));
        assert_eq!((docs[1].label.as_str(), docs[1].text.as_str()), ("US", "second text"));
        assert_eq!(docs[1].id, 1);
    }

    #[test]
    fn skips_blank_unlabeled_and_invalid_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "UK_blank.txt", b"   \n\t");
        write(dir.path(), "nolabel.txt", b"text");
        write(dir.path(), "UK_bad.txt", &[0xff, 0xfe, 0x00]);
        write(dir.path(), "UK_good.txt", b"kept");
        let corpus = load_folder(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents()[0].source_filename, "UK_good.txt");
    }

    #[test]
    fn allowed_labels_filter_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "UK_1.txt", b"a");
        write(dir.path(), "FR_1.txt", b"b");
        write(dir.path(), "US_1.txt", b"c");
        let corpus = load_folder(dir.path(), &LoadOptions::default().with_labels(&["UK", "US"])).unwrap();
        assert_eq!(corpus.labels().collect::<Vec<_>>(), vec!["UK", "US"]);
    }

    #[test]
    fn missing_or_empty_folder_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_folder(dir.path().join("absent"), &LoadOptions::default()), Err(Error::Input(_))));
        assert!(matches!(load_folder(dir.path(), &LoadOptions::default()), Err(Error::Input(_))));
        write(dir.path(), "plain.txt", b"no prefix");
        assert!(matches!(load_folder(dir.path(), &LoadOptions::default()), Err(Error::Input(_))));
    }
}
