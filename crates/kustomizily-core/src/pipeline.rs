//! Stream to directory tree
//!
//! A [`Pipeline`] buffers every resource it ingests and only touches the sink
//! in [`Pipeline::finalize`], which consumes it. A run that fails while
//! streaming therefore writes nothing. After a failed ingest every further
//! call returns [`CoreError::PipelineAborted`].
//!
//! ```no_run
//! use kustomizily_core::{MemorySink, Pipeline};
//!
//! let input = "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: prod\n";
//! let mut pipeline = Pipeline::new();
//! pipeline.ingest(input.as_bytes())?;
//!
//! let mut sink = MemorySink::new();
//! let summary = pipeline.finalize(&mut sink)?;
//! assert_eq!(summary.file_count(), 2);
//! # Ok::<(), kustomizily_core::CoreError>(())
//! ```

use std::io::BufRead;

use tracing::{debug, info};

use crate::aggregator::DirectoryTree;
use crate::error::{CoreError, Result};
use crate::kustomization::emit_directory;
use crate::naming::{ReservedNames, resolve_directory};
use crate::resource::Resource;
use crate::sink::FileSink;
use crate::splitter::{DEFAULT_MAX_DOCUMENT_SIZE, DocumentSplitter};

/// Library knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Largest document the splitter buffers, in bytes
    pub max_document_size: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

/// Files written for one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySummary {
    /// Directory name, `""` for the root
    pub name: String,
    /// Filenames in write order, manifest last
    pub files: Vec<String>,
}

/// Outcome of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Documents seen, including skipped ones
    pub documents: usize,
    /// Documents that became resources
    pub resources: usize,
    /// Directories in write order
    pub directories: Vec<DirectorySummary>,
}

impl BuildSummary {
    pub fn file_count(&self) -> usize {
        self.directories.iter().map(|d| d.files.len()).sum()
    }

    /// Documents dropped for being blank or missing identity fields
    pub fn skipped(&self) -> usize {
        self.documents - self.resources
    }
}

/// Buffered stream-to-tree transform
#[derive(Debug, Default)]
pub struct Pipeline {
    options: Options,
    tree: DirectoryTree,
    documents: usize,
    resources: usize,
    failed: bool,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Resources buffered so far, per directory
    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// Whether an earlier ingest failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn ensure_running(&self) -> Result<()> {
        if self.failed {
            Err(CoreError::PipelineAborted)
        } else {
            Ok(())
        }
    }

    /// Split a stream and route every document in it
    ///
    /// May be called several times; document numbering continues across
    /// calls. Stops at the first fatal error.
    pub fn ingest<R: BufRead>(&mut self, reader: R) -> Result<()> {
        self.ensure_running()?;
        let splitter = DocumentSplitter::with_max_size(reader, self.options.max_document_size);
        for document in splitter {
            let document = document.inspect_err(|_| self.failed = true)?;
            self.ingest_document(&document)?;
        }
        Ok(())
    }

    /// Route one document, returning its directory when it became a resource
    pub fn ingest_document(&mut self, document: &[u8]) -> Result<Option<String>> {
        self.ensure_running()?;
        let routed = self.route(document);
        if routed.is_err() {
            self.failed = true;
        }
        routed
    }

    fn route(&mut self, document: &[u8]) -> Result<Option<String>> {
        self.documents += 1;
        let index = self.documents;

        let Some(resource) = Resource::parse(document, index)? else {
            debug!(index, "skipped document without identity");
            return Ok(None);
        };

        let directory = self.tree.insert(resource)?;
        self.resources += 1;
        Ok(Some(directory))
    }

    /// Resolve filenames and write every directory to the sink
    ///
    /// Directories go out in lexicographic order, the root first.
    pub fn finalize<S>(self, sink: &mut S) -> Result<BuildSummary>
    where
        S: FileSink + ?Sized,
    {
        self.ensure_running()?;
        let mut reserved = ReservedNames::new();
        let mut summary = BuildSummary {
            documents: self.documents,
            resources: self.resources,
            directories: Vec::with_capacity(self.tree.len()),
        };

        for (directory, aggregator) in self.tree.iter() {
            let resolved = resolve_directory(directory, aggregator, &mut reserved)?;
            let files = emit_directory(directory, aggregator, &resolved, sink)?;
            info!(directory, files = files.len(), "wrote directory");

            summary.directories.push(DirectorySummary {
                name: directory.to_string(),
                files,
            });
        }

        Ok(summary)
    }
}

/// Run a whole stream through a fresh pipeline
pub fn build<R, S>(reader: R, sink: &mut S, options: Options) -> Result<BuildSummary>
where
    R: BufRead,
    S: FileSink + ?Sized,
{
    let mut pipeline = Pipeline::with_options(options);
    pipeline.ingest(reader)?;
    pipeline.finalize(sink)
}
