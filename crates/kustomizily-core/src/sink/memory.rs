//! In-memory sink

use indexmap::IndexMap;

use super::FileSink;
use crate::error::{CoreError, Result};

/// Keeps every file in memory, in write order
///
/// A second write to the same path is rejected with
/// [`CoreError::DuplicateWrite`], which makes it useful to check that a run
/// never produces the same file twice.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: IndexMap<(String, String), Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, directory: &str, filename: &str) -> Option<&[u8]> {
        self.files
            .get(&(directory.to_string(), filename.to_string()))
            .map(Vec::as_slice)
    }

    /// File content as text, `None` when missing or not UTF-8
    pub fn get_str(&self, directory: &str, filename: &str) -> Option<&str> {
        self.get(directory, filename)
            .and_then(|data| std::str::from_utf8(data).ok())
    }

    /// `(directory, filename, data)` in write order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &[u8])> {
        self.files
            .iter()
            .map(|((dir, name), data)| (dir.as_str(), name.as_str(), data.as_slice()))
    }

    /// Filenames written to one directory, in write order
    pub fn filenames(&self, directory: &str) -> Vec<&str> {
        self.entries()
            .filter(|(dir, _, _)| *dir == directory)
            .map(|(_, name, _)| name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSink for MemorySink {
    fn put(&mut self, directory: &str, filename: &str, data: &[u8]) -> Result<()> {
        let key = (directory.to_string(), filename.to_string());
        if self.files.contains_key(&key) {
            return Err(CoreError::DuplicateWrite {
                directory: key.0,
                filename: key.1,
            });
        }
        self.files.insert(key, data.to_vec());
        Ok(())
    }
}
