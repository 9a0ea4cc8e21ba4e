//! Filesystem sink

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::{FileSink, check_target};
use crate::error::{CoreError, Result};

/// Writes files below an output root
///
/// Each directory is created (with parents) the first time a file lands in
/// it. Existing files are overwritten.
#[derive(Debug)]
pub struct FsSink {
    root: PathBuf,
    created: HashSet<String>,
}

impl FsSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: HashSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn directory_path(&self, directory: &str) -> PathBuf {
        if directory.is_empty() {
            self.root.clone()
        } else {
            self.root.join(directory)
        }
    }
}

impl FileSink for FsSink {
    fn put(&mut self, directory: &str, filename: &str, data: &[u8]) -> Result<()> {
        check_target(directory, filename)?;
        let dir = self.directory_path(directory);
        let sink_error = |source| CoreError::Sink {
            directory: directory.to_string(),
            filename: filename.to_string(),
            source,
        };

        if !self.created.contains(directory) {
            std::fs::create_dir_all(&dir).map_err(sink_error)?;
            self.created.insert(directory.to_string());
            trace!(path = %dir.display(), "created directory");
        }

        let path = dir.join(filename);
        std::fs::write(&path, data).map_err(sink_error)?;
        trace!(path = %path.display(), bytes = data.len(), "wrote file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_into_nested_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("out");
        let mut sink = FsSink::new(&root);

        sink.put("", "kustomization.yaml", b"root").unwrap();
        sink.put("web", "service.yaml", b"svc").unwrap();
        sink.put("web", "kustomization.yaml", b"web").unwrap();

        assert_eq!(std::fs::read(root.join("kustomization.yaml")).unwrap(), b"root");
        assert_eq!(std::fs::read(root.join("web/service.yaml")).unwrap(), b"svc");
        assert_eq!(std::fs::read(root.join("web/kustomization.yaml")).unwrap(), b"web");
    }

    #[test]
    fn test_overwrites_existing_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.yaml"), b"old").unwrap();

        let mut sink = FsSink::new(temp.path());
        sink.put("", "a.yaml", b"new").unwrap();

        assert_eq!(std::fs::read(temp.path().join("a.yaml")).unwrap(), b"new");
    }

    #[test]
    fn test_unwritable_target_is_a_sink_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("blocked"), b"file, not a directory").unwrap();

        let mut sink = FsSink::new(temp.path());
        let err = sink.put("blocked", "a.yaml", b"x").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Sink { ref directory, ref filename, .. }
                if directory == "blocked" && filename == "a.yaml"
        ));
    }

    #[test]
    fn test_refuses_paths_outside_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("out");
        let outside = temp.path().join("escaped.yaml");
        let mut sink = FsSink::new(&root);

        let err = sink.put("", outside.to_str().unwrap(), b"x").unwrap_err();
        assert!(matches!(err, CoreError::UnsafePath { .. }));

        let err = sink.put("..", "escaped.yaml", b"x").unwrap_err();
        assert!(matches!(err, CoreError::UnsafePath { ref directory, .. } if directory == ".."));

        assert!(!outside.exists());
        assert!(!root.exists());
    }
}
