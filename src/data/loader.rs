// ============================================================
// Layer 4 — Text Loader
// ============================================================
// Reads the training corpus from disk.
//
// Two input shapes are supported:
//   - a single text file   (word-vocabulary runs on one corpus)
//   - a directory of files (subword runs over many .txt files)
//
// Directory entries are sorted by file name so the token stream,
// and therefore every window, is the same from run to run.
//
// Files that are not valid UTF-8 are decoded lossily instead of
// rejected — one stray byte in a scraped text file should not
// abort a training run.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading a File)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::document::Document;
use crate::domain::traits::DocumentSource;

/// Extension of the files picked up in directory mode
const TEXT_EXTENSION: &str = "txt";

/// Loads a text corpus from a file or a directory of .txt files.
pub struct TextLoader {
    path: PathBuf,
}

impl TextLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The corpus files this loader reads, in load order.
    fn files(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            bail!("Corpus path '{}' does not exist", self.path.display());
        }

        if self.path.is_file() {
            return Ok(vec![self.path.clone()]);
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read directory '{}'", self.path.display()))?
        {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(TEXT_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl DocumentSource for TextLoader {
    fn load_all(&self) -> Result<Vec<Document>> {
        let mut docs = Vec::new();

        for path in self.files()? {
            match load_single_file(&path) {
                Ok(doc) => {
                    tracing::debug!("Loaded: {} ({} chars)", doc.source, doc.text.len());
                    docs.push(doc);
                }
                // One unreadable file is logged and skipped
                Err(e) => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!("Loaded {} documents from '{}'", docs.len(), self.path.display());
        Ok(docs)
    }
}

fn load_single_file(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(Document::new(source, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_mode() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("corpus.txt");
        fs::write(&file, "hello world").unwrap();

        let docs = TextLoader::new(&file).load_all().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "corpus.txt");
        assert_eq!(docs[0].text, "hello world");
    }

    #[test]
    fn test_directory_mode_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let docs = TextLoader::new(dir.path()).load_all().unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_invalid_utf8_is_decoded_lossily() {
        let dir  = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.txt");
        fs::write(&file, [b'o', b'k', 0xFF, b'!']).unwrap();

        let docs = TextLoader::new(&file).load_all().unwrap();
        assert!(docs[0].text.starts_with("ok"));
        assert!(docs[0].text.ends_with('!'));
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = TextLoader::new(dir.path().join("nope")).load_all();
        assert!(res.is_err());
    }
}
