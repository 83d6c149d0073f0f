//! Durable favorites storage: a newline-delimited file of ticker symbols.
//!
//! Adds are appends; removals rewrite the whole file (a removal cannot be
//! expressed as an append-only log entry). A missing file reads as an
//! empty list.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
#[error("favorites file {path}: {source}")]
pub struct StoreError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Handle on the favorites file. Cheap to clone; holds only the path.
#[derive(Debug, Clone)]
pub struct FavoritesFile {
    path: PathBuf,
}

impl FavoritesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn err(&self, source: std::io::Error) -> StoreError {
        StoreError {
            path: self.path.clone(),
            source,
        }
    }

    /// Read every persisted symbol. Lines are trimmed and uppercased;
    /// blank lines are skipped.
    pub fn load(&self) -> Result<Vec<String>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.err(e))?;
        Ok(contents
            .lines()
            .map(|line| line.trim().to_uppercase())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Append one symbol as a new line, creating the file if needed.
    pub fn append(&self, symbol: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.err(e))?;
        writeln!(file, "{}", symbol.trim().to_uppercase()).map_err(|e| self.err(e))
    }

    /// Replace the file contents with the given symbol list.
    pub fn rewrite(&self, symbols: &[String]) -> Result<(), StoreError> {
        let mut contents = symbols.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(|e| self.err(e))
    }
}
