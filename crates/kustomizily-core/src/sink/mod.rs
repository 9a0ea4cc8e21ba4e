//! Destinations for generated files
//!
//! The pipeline hands every file to a [`FileSink`] as a
//! `(directory, filename, bytes)` triple, the manifest of a directory last.
//! Three sinks are provided:
//! - **Filesystem** ([`FsSink`]): writes below an output root
//! - **Dry run** ([`DryRunSink`]): reports `mkdir`/`write` lines, touches nothing
//! - **Memory** ([`MemorySink`]): keeps everything in a map, for tests and
//!   embedding

mod dry_run;
mod fs;
mod memory;

pub use dry_run::DryRunSink;
pub use fs::FsSink;
pub use memory::MemorySink;

use std::path::{Component, Path};

use crate::error::{CoreError, Result};

/// Receives generated files
///
/// `directory` is relative to the output root; the root itself is `""`.
pub trait FileSink {
    /// Store one file
    fn put(&mut self, directory: &str, filename: &str, data: &[u8]) -> Result<()>;
}

/// Reject targets that would resolve outside the output root
///
/// Every component of `directory` must be a plain name (`""` is the root) and
/// `filename` must be exactly one plain name.
pub(crate) fn check_target(directory: &str, filename: &str) -> Result<()> {
    let directory_ok = Path::new(directory)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));

    if directory_ok && is_plain_name(filename) {
        Ok(())
    } else {
        Err(CoreError::UnsafePath {
            directory: directory.to_string(),
            filename: filename.to_string(),
        })
    }
}

/// Whether `name` is a single path component naming itself
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(n)), None) if n == name
    )
}

impl<T: FileSink + ?Sized> FileSink for &mut T {
    fn put(&mut self, directory: &str, filename: &str, data: &[u8]) -> Result<()> {
        (**self).put(directory, filename, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names() {
        assert!(is_plain_name("service.yaml"));
        assert!(is_plain_name("configmap_.."));
        assert!(is_plain_name(".env"));
        assert!(!is_plain_name(""));
        assert!(!is_plain_name("."));
        assert!(!is_plain_name(".."));
        assert!(!is_plain_name("a/b"));
        assert!(!is_plain_name("dir/"));
        assert!(!is_plain_name("/etc/passwd"));
    }

    #[test]
    fn test_check_target() {
        assert!(check_target("", "kustomization.yaml").is_ok());
        assert!(check_target("team/web", "service.yaml").is_ok());

        for (directory, filename) in [
            ("..", "service.yaml"),
            ("web/../..", "service.yaml"),
            ("/tmp", "service.yaml"),
            (".", "service.yaml"),
            ("web", "../service.yaml"),
            ("web", "/tmp/x"),
        ] {
            let err = check_target(directory, filename).unwrap_err();
            assert!(
                matches!(err, CoreError::UnsafePath { .. }),
                "{directory}/{filename} accepted"
            );
        }
    }
}

impl<T: FileSink + ?Sized> FileSink for Box<T> {
    fn put(&mut self, directory: &str, filename: &str, data: &[u8]) -> Result<()> {
        (**self).put(directory, filename, data)
    }
}
