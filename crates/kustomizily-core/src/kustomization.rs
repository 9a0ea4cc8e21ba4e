//! Generated `kustomization.yaml` documents
//!
//! A [`Kustomization`] is assembled from a directory's aggregator and its
//! resolved filenames, and rendered through `Display`:
//!
//! ```yaml
//! apiVersion: kustomize.config.k8s.io/v1beta1
//! kind: Kustomization
//!
//! resources:
//! - web
//! - deployment.yaml
//!
//! configMapGenerator:
//! - name: web-config
//!   options:
//!     disableNameSuffixHash: true
//!   files:
//!   - index.html
//! ```
//!
//! Everything keeps insertion order. Label and annotation pairs are always
//! double-quoted; other scalars are written plain when that reads back as the
//! same string.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::aggregator::{DirectoryAggregator, FileGroup};
use crate::error::Result;
use crate::naming::{MANIFEST_FILENAME, ResolvedDirectory};
use crate::sink::FileSink;

pub const KUSTOMIZE_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";
pub const KUSTOMIZE_KIND: &str = "Kustomization";

/// Generator flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    ConfigMap,
    Secret,
}

impl GeneratorKind {
    fn section(self) -> &'static str {
        match self {
            GeneratorKind::ConfigMap => "configMapGenerator",
            GeneratorKind::Secret => "secretGenerator",
        }
    }
}

/// One file source of a generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorFile {
    pub key: String,
    pub filename: String,
}

impl GeneratorFile {
    /// `key=filename`, or just the key when both are equal
    pub fn source(&self) -> Cow<'_, str> {
        if self.key == self.filename {
            Cow::Borrowed(&self.key)
        } else {
            Cow::Owned(format!("{}={}", self.key, self.filename))
        }
    }
}

/// A configMapGenerator or secretGenerator entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    pub namespace: Option<String>,
    /// Secret type, only rendered for secret generators
    pub secret_type: Option<String>,
    pub annotations: IndexMap<String, String>,
    pub labels: IndexMap<String, String>,
    pub immutable: bool,
    pub files: Vec<GeneratorFile>,
}

impl Generator {
    fn from_group(group: &FileGroup, filenames: &[String]) -> Self {
        let resource = &group.resource;
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());

        Self {
            name: resource.metadata.name.clone(),
            namespace: non_empty(&resource.metadata.namespace),
            secret_type: non_empty(&resource.payload.secret_type),
            annotations: resource.metadata.annotations.clone(),
            labels: resource.metadata.labels.clone(),
            immutable: resource.payload.immutable,
            files: group
                .files
                .keys()
                .zip(filenames)
                .map(|(key, filename)| GeneratorFile {
                    key: key.clone(),
                    filename: filename.clone(),
                })
                .collect(),
        }
    }
}

/// Aggregator manifest of one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kustomization {
    /// Sub-directories first, then resource files
    pub resources: Vec<String>,
    pub config_map_generator: Vec<Generator>,
    pub secret_generator: Vec<Generator>,
}

impl Kustomization {
    pub fn new(aggregator: &DirectoryAggregator, resolved: &ResolvedDirectory) -> Self {
        let generators = |groups: &[FileGroup], names: &[Vec<String>]| -> Vec<Generator> {
            groups
                .iter()
                .zip(names)
                .map(|(group, filenames)| Generator::from_group(group, filenames))
                .collect()
        };

        Self {
            resources: aggregator
                .subdirectories()
                .iter()
                .chain(&resolved.resources)
                .cloned()
                .collect(),
            config_map_generator: generators(aggregator.config_maps(), &resolved.config_maps),
            secret_generator: generators(aggregator.secrets(), &resolved.secrets),
        }
    }
}

fn fmt_generators(
    f: &mut fmt::Formatter<'_>,
    kind: GeneratorKind,
    generators: &[Generator],
) -> fmt::Result {
    if generators.is_empty() {
        return Ok(());
    }

    writeln!(f)?;
    writeln!(f, "{}:", kind.section())?;
    for generator in generators {
        writeln!(f, "- name: {}", scalar(&generator.name))?;
        if let Some(namespace) = &generator.namespace {
            writeln!(f, "  namespace: {}", scalar(namespace))?;
        }
        if kind == GeneratorKind::Secret
            && let Some(secret_type) = &generator.secret_type
        {
            writeln!(f, "  type: {}", scalar(secret_type))?;
        }

        writeln!(f, "  options:")?;
        writeln!(f, "    disableNameSuffixHash: true")?;
        fmt_quoted_map(f, "annotations", &generator.annotations)?;
        fmt_quoted_map(f, "labels", &generator.labels)?;
        if generator.immutable {
            writeln!(f, "    immutable: true")?;
        }

        if !generator.files.is_empty() {
            writeln!(f, "  files:")?;
            for file in &generator.files {
                writeln!(f, "  - {}", scalar(&file.source()))?;
            }
        }
    }
    Ok(())
}

impl fmt::Display for Kustomization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "apiVersion: {}", KUSTOMIZE_API_VERSION)?;
        writeln!(f, "kind: {}", KUSTOMIZE_KIND)?;

        if !self.resources.is_empty() {
            writeln!(f)?;
            writeln!(f, "resources:")?;
            for resource in &self.resources {
                writeln!(f, "- {}", scalar(resource))?;
            }
        }

        fmt_generators(f, GeneratorKind::ConfigMap, &self.config_map_generator)?;
        fmt_generators(f, GeneratorKind::Secret, &self.secret_generator)
    }
}

fn fmt_quoted_map(
    f: &mut fmt::Formatter<'_>,
    field: &str,
    map: &IndexMap<String, String>,
) -> fmt::Result {
    if map.is_empty() {
        return Ok(());
    }
    writeln!(f, "    {}:", field)?;
    for (key, value) in map {
        writeln!(f, "      {}: {}", quoted(key), quoted(value))?;
    }
    Ok(())
}

/// Double-quoted scalar with JSON escaping, which YAML reads unchanged
fn quoted(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Plain scalar when it reads back as the same string, quoted otherwise
fn scalar(s: &str) -> Cow<'_, str> {
    let safe_chars = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '='));
    let reads_back = safe_chars
        && matches!(serde_yaml::from_str::<Value>(s), Ok(Value::String(ref p)) if p == s);

    if reads_back {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(quoted(s))
    }
}

/// Bytes of a resource file: the trimmed document plus a final newline
fn resource_file(raw: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(raw.len() + 1);
    data.extend_from_slice(raw);
    data.push(b'\n');
    data
}

/// Write every file of a directory, then its manifest
///
/// Files go out in manifest order (resources, ConfigMap entries, Secret
/// entries) so the manifest never references a file that was not written.
/// Returns the written filenames in write order.
pub fn emit_directory<S>(
    directory: &str,
    aggregator: &DirectoryAggregator,
    resolved: &ResolvedDirectory,
    sink: &mut S,
) -> Result<Vec<String>>
where
    S: FileSink + ?Sized,
{
    let mut written = Vec::new();

    for (resource, filename) in aggregator.resources().iter().zip(&resolved.resources) {
        sink.put(directory, filename, &resource_file(&resource.raw))?;
        written.push(filename.clone());
    }

    let groups = aggregator
        .config_maps()
        .iter()
        .zip(&resolved.config_maps)
        .chain(aggregator.secrets().iter().zip(&resolved.secrets));
    for (group, filenames) in groups {
        for (data, filename) in group.files.values().zip(filenames) {
            sink.put(directory, filename, data)?;
            written.push(filename.clone());
        }
    }

    let manifest = Kustomization::new(aggregator, resolved).to_string();
    sink.put(directory, MANIFEST_FILENAME, manifest.as_bytes())?;
    written.push(MANIFEST_FILENAME.to_string());

    Ok(written)
}
