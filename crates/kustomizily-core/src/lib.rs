//! Kustomizily Core - turn a multi-document manifest stream into a kustomize tree
//!
//! This crate holds the whole engine:
//! - `DocumentSplitter`: lazy `---` splitting with a size cap
//! - `Resource`: decoded identity, labels and kind-specific payloads
//! - `DirectoryTree`: routing and per-directory aggregation
//! - `FilenameResolver`: run-wide unique, readable filenames
//! - `Kustomization`: the generated `kustomization.yaml`
//! - `FileSink`: where the files go (disk, dry run, memory)
//! - `Pipeline`: ties it together, buffering until `finalize`

pub mod aggregator;
pub mod error;
pub mod kustomization;
pub mod naming;
pub mod pipeline;
pub mod resource;
pub mod routing;
pub mod sink;
pub mod splitter;

pub use aggregator::{DirectoryAggregator, DirectoryTree, FileGroup};
pub use error::{CoreError, Result};
pub use kustomization::{Generator, GeneratorFile, GeneratorKind, Kustomization, emit_directory};
pub use naming::{
    Batch, EntryStrategy, FilenameResolver, MANIFEST_FILENAME, ReservedNames, ResolvedDirectory,
    ResourceStrategy, resolve_directory,
};
pub use pipeline::{BuildSummary, DirectorySummary, Options, Pipeline, build};
pub use resource::{ObjectMeta, Payload, Resource, ResourceClass};
pub use routing::target_directory;
pub use sink::{DryRunSink, FileSink, FsSink, MemorySink};
pub use splitter::{DEFAULT_MAX_DOCUMENT_SIZE, DocumentSplitter};
