//! Per-directory accumulation of resources
//!
//! Every resource routed to a directory lands in that directory's
//! [`DirectoryAggregator`]. ConfigMaps and Secrets are unpacked into
//! [`FileGroup`]s so their entries can become generator files; everything
//! else is kept as raw bytes.

use std::collections::BTreeMap;

use base64::Engine as _;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::resource::{Resource, ResourceClass};
use crate::routing::{ROOT_DIRECTORY, target_directory};

/// A resource whose entries become individual files
#[derive(Debug, Clone)]
pub struct FileGroup {
    /// Owning ConfigMap or Secret, payload maps already consumed
    pub resource: Resource,
    /// Logical key to decoded bytes, in document order
    pub files: IndexMap<String, Vec<u8>>,
}

impl FileGroup {
    /// Plain `data` entries followed by decoded `binaryData` entries
    pub fn from_config_map(mut resource: Resource) -> Result<Self> {
        let data = std::mem::take(&mut resource.payload.data);
        let binary = std::mem::take(&mut resource.payload.binary_data);

        let mut files = IndexMap::with_capacity(data.len() + binary.len());
        for (key, value) in data {
            files.insert(key, value.into_bytes());
        }
        for (key, value) in binary {
            let decoded = decode(&resource, &key, &value)?;
            files.insert(key, decoded);
        }

        Ok(Self { resource, files })
    }

    /// Decoded `data` entries followed by plain `stringData` entries
    pub fn from_secret(mut resource: Resource) -> Result<Self> {
        let data = std::mem::take(&mut resource.payload.data);
        let plain = std::mem::take(&mut resource.payload.string_data);

        let mut files = IndexMap::with_capacity(data.len() + plain.len());
        for (key, value) in data {
            let decoded = decode(&resource, &key, &value)?;
            files.insert(key, decoded);
        }
        for (key, value) in plain {
            files.insert(key, value.into_bytes());
        }

        Ok(Self { resource, files })
    }
}

/// Line breaks inside the encoded text are ignored, as block scalars often
/// wrap long payloads.
fn decode(resource: &Resource, key: &str, value: &str) -> Result<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact.trim())
        .map_err(|source| CoreError::InvalidEncodedPayload {
            resource: resource.display_name(),
            key: key.to_string(),
            source,
        })
}

/// Everything destined for one output directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryAggregator {
    resources: Vec<Resource>,
    config_maps: Vec<FileGroup>,
    secrets: Vec<FileGroup>,
    subdirectories: Vec<String>,
}

impl DirectoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and store a resource
    pub fn add(&mut self, resource: Resource) -> Result<()> {
        match resource.class() {
            ResourceClass::ConfigMap => {
                self.config_maps.push(FileGroup::from_config_map(resource)?)
            }
            ResourceClass::Secret => self.secrets.push(FileGroup::from_secret(resource)?),
            ResourceClass::Definition | ResourceClass::Generic => self.resources.push(resource),
        }
        Ok(())
    }

    pub fn add_subdirectory(&mut self, name: impl Into<String>) {
        self.subdirectories.push(name.into());
    }

    /// Resources written as whole files, in arrival order
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn config_maps(&self) -> &[FileGroup] {
        &self.config_maps
    }

    pub fn secrets(&self) -> &[FileGroup] {
        &self.secrets
    }

    /// Sub-directory references (root directory only)
    pub fn subdirectories(&self) -> &[String] {
        &self.subdirectories
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
            && self.config_maps.is_empty()
            && self.secrets.is_empty()
            && self.subdirectories.is_empty()
    }
}

/// All aggregators of a run, keyed by directory name
///
/// Iteration is in lexicographic directory order, root (`""`) first. The
/// root aggregator always exists and references every other directory.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    directories: BTreeMap<String, DirectoryAggregator>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryTree {
    pub fn new() -> Self {
        let mut directories = BTreeMap::new();
        directories.insert(ROOT_DIRECTORY.to_string(), DirectoryAggregator::new());
        Self { directories }
    }

    /// Route a resource and add it to its directory
    ///
    /// Returns the directory name the resource went to.
    pub fn insert(&mut self, resource: Resource) -> Result<String> {
        let directory = target_directory(&resource);
        debug!(
            resource = %resource.display_name(),
            directory = %directory,
            "routed resource"
        );
        self.aggregator(&directory).add(resource)?;
        Ok(directory)
    }

    /// Aggregator for a directory, created and linked from the root on first use
    pub fn aggregator(&mut self, directory: &str) -> &mut DirectoryAggregator {
        if !self.directories.contains_key(directory) {
            self.directories
                .insert(directory.to_string(), DirectoryAggregator::new());
            if let Some(root) = self.directories.get_mut(ROOT_DIRECTORY) {
                root.add_subdirectory(directory);
            }
        }
        self.directories
            .entry(directory.to_string())
            .or_default()
    }

    pub fn get(&self, directory: &str) -> Option<&DirectoryAggregator> {
        self.directories.get(directory)
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectoryAggregator)> {
        self.directories.iter().map(|(k, v)| (k.as_str(), v))
    }
}
