//! Dry-run sink

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use super::{FileSink, check_target};
use crate::error::{CoreError, Result};

/// Reports what a filesystem run would do
///
/// Prints `mkdir <path>` once per directory and `write <path>` per file to
/// the wrapped writer. Nothing is written to disk.
#[derive(Debug)]
pub struct DryRunSink<W: Write> {
    root: PathBuf,
    out: W,
    announced: HashSet<String>,
}

impl<W: Write> DryRunSink<W> {
    pub fn new(root: impl Into<PathBuf>, out: W) -> Self {
        Self {
            root: root.into(),
            out,
            announced: HashSet::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn report(&mut self, directory: &str, filename: &str) -> std::io::Result<()> {
        let dir = if directory.is_empty() {
            self.root.clone()
        } else {
            self.root.join(directory)
        };

        if self.announced.insert(directory.to_string()) {
            writeln!(self.out, "mkdir {}", dir.display())?;
        }
        writeln!(self.out, "write {}", dir.join(filename).display())
    }
}

impl<W: Write> FileSink for DryRunSink<W> {
    fn put(&mut self, directory: &str, filename: &str, _data: &[u8]) -> Result<()> {
        check_target(directory, filename)?;
        self.report(directory, filename)
            .map_err(|source| CoreError::Sink {
                directory: directory.to_string(),
                filename: filename.to_string(),
                source,
            })
    }
}
