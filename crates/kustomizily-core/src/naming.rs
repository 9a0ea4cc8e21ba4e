//! Filename resolution
//!
//! Every artifact in a directory needs a filename that is unique across the
//! whole run. Names are chosen per batch (the generic resources of a
//! directory, its ConfigMap entries, its Secret entries): a batch takes the
//! first strategy of a fixed list that names all of its members uniquely,
//! from the most readable (`deployment.yaml`) to the most qualified
//! (`web_apps_deployment.yaml`).
//!
//! An accepted batch is then shortened by dropping the longest common prefix
//! up to its last `-`/`_` separator, when the shortened names still pass the
//! same checks:
//!
//! ```text
//! svc-api.yaml, svc-web.yaml  ->  api.yaml, web.yaml
//! ```
//!
//! Names accepted for a batch are reserved before the next batch runs, and
//! directories are resolved in a fixed order, so the outcome only depends on
//! the input.

use std::collections::HashSet;
use std::fmt;

use tracing::debug;

use crate::aggregator::{DirectoryAggregator, FileGroup};
use crate::error::{CoreError, Result};
use crate::resource::Resource;
use crate::sink::is_plain_name;

/// Filename of the generated aggregator manifest
pub const MANIFEST_FILENAME: &str = "kustomization.yaml";

/// Label whose value is stripped from the front of resource names
pub const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

/// Filenames claimed so far in a run
///
/// Starts with [`MANIFEST_FILENAME`] and only grows.
#[derive(Debug, Clone)]
pub struct ReservedNames {
    names: HashSet<String>,
}

impl Default for ReservedNames {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservedNames {
    pub fn new() -> Self {
        let mut names = HashSet::new();
        names.insert(MANIFEST_FILENAME.to_string());
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> Extend<S> for ReservedNames {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

/// The three batches resolved per directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batch {
    Resources,
    ConfigMapFiles,
    SecretFiles,
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Batch::Resources => write!(f, "resources"),
            Batch::ConfigMapFiles => write!(f, "configMapGenerator files"),
            Batch::SecretFiles => write!(f, "secretGenerator files"),
        }
    }
}

/// Naming strategies for resources written as whole files, in trial order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStrategy {
    /// `<group>_<plural>.yaml`, definitions only
    DefinitionName,
    /// `<kind>.yaml`
    Kind,
    /// `<short name>.yaml`
    ShortName,
    /// `<short name>_<kind>.yaml`
    ShortNameAndKind,
    /// `<short name>_<api group>_<kind>.yaml`
    QualifiedKind,
}

impl ResourceStrategy {
    pub const ORDER: [Self; 5] = [
        Self::DefinitionName,
        Self::Kind,
        Self::ShortName,
        Self::ShortNameAndKind,
        Self::QualifiedKind,
    ];

    /// Candidate filename, `None` when the strategy does not apply
    pub fn filename(self, resource: &Resource) -> Option<String> {
        let kind = resource.kind.to_lowercase();
        match self {
            Self::DefinitionName => {
                let spec = &resource.definition;
                if !resource.is_definition() || spec.group.is_empty() || spec.plural.is_empty() {
                    return None;
                }
                Some(format!("{}_{}.yaml", spec.group, spec.plural))
            }
            Self::Kind => Some(format!("{}.yaml", kind)),
            Self::ShortName => Some(format!("{}.yaml", short_name(resource))),
            Self::ShortNameAndKind => Some(format!("{}_{}.yaml", short_name(resource), kind)),
            Self::QualifiedKind => Some(format!(
                "{}_{}.yaml",
                short_name(resource),
                qualified_kind(resource)
            )),
        }
    }

    /// Definition filenames are final and never shortened
    fn refinable(self) -> bool {
        self != Self::DefinitionName
    }
}

/// Naming strategies for ConfigMap and Secret entries, in trial order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStrategy {
    /// `<key>`
    Key,
    /// `<kind>_<key>`
    KindAndKey,
    /// `<short name>_<key>`
    ShortNameAndKey,
    /// `<short name>_<kind>_<key>`
    Full,
}

impl EntryStrategy {
    pub const ORDER: [Self; 4] = [
        Self::Key,
        Self::KindAndKey,
        Self::ShortNameAndKey,
        Self::Full,
    ];

    pub fn filename(self, resource: &Resource, key: &str) -> String {
        match self {
            Self::Key => key.to_string(),
            Self::KindAndKey => format!("{}_{}", resource.kind.to_lowercase(), key),
            Self::ShortNameAndKey => format!("{}_{}", short_name(resource), key),
            Self::Full => format!(
                "{}_{}_{}",
                short_name(resource),
                resource.kind.to_lowercase(),
                key
            ),
        }
    }
}

/// Resource name without its instance prefix, `:` replaced by `_`
///
/// `myrelease-web` with label `app.kubernetes.io/instance: myrelease`
/// becomes `web`.
pub fn short_name(resource: &Resource) -> String {
    let name = resource.name();
    let name = match resource.metadata.label(INSTANCE_LABEL) {
        Some(instance) => strip_prefix_loose(name, &format!("{}-", instance)),
        None => name,
    };
    name.replace(':', "_")
}

/// `<group>_<kind>` for `group/v1`, `<apiVersion>_<kind>` with `/` replaced
/// for other versions, plain `<kind>` for core `v1`
pub fn qualified_kind(resource: &Resource) -> String {
    let kind = resource.kind.to_lowercase();
    let api_version = resource.api_version.as_str();

    if !api_version.contains('.')
        && let Some(group) = api_version.strip_suffix("/v1")
    {
        format!("{}_{}", group, kind)
    } else if api_version != "v1" {
        format!("{}_{}", api_version.replace('/', "_"), kind)
    } else {
        kind
    }
}

fn is_separator(b: u8) -> bool {
    b == b'-' || b == b'_'
}

/// Byte equality with `-` and `_` interchangeable
fn loose_eq(a: u8, b: u8) -> bool {
    a == b || (is_separator(a) && is_separator(b))
}

fn strip_prefix_loose<'a>(s: &'a str, prefix: &str) -> &'a str {
    let (sb, pb) = (s.as_bytes(), prefix.as_bytes());
    if sb.len() < pb.len() || !sb.iter().zip(pb).all(|(&a, &b)| loose_eq(a, b)) {
        return s;
    }
    // Matching bytes up to a full prefix keeps the cut on a char boundary.
    s.get(pb.len()..).unwrap_or(s)
}

/// Length of the longest common prefix, `-` and `_` compared as equal
///
/// Fewer than two names share no prefix.
pub fn common_prefix_len(names: &[String]) -> usize {
    let [first, rest @ ..] = names else {
        return 0;
    };
    if rest.is_empty() {
        return 0;
    }

    let first = first.as_bytes();
    let shortest = names.iter().map(String::len).min().unwrap_or(0);
    (0..shortest)
        .find(|&i| rest.iter().any(|name| !loose_eq(name.as_bytes()[i], first[i])))
        .unwrap_or(shortest)
}

/// Names with their common prefix removed up to and including its last
/// separator, `None` when the common prefix holds no separator
pub fn strip_common_prefix(names: &[String]) -> Option<Vec<String>> {
    let len = common_prefix_len(names);
    let first = names.first()?;
    let cut = first.as_bytes()[..len]
        .iter()
        .rposition(|&b| is_separator(b))?
        + 1;

    names
        .iter()
        .map(|name| name.get(cut..).map(str::to_string))
        .collect()
}

/// Outcome of resolving one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<S> {
    pub strategy: S,
    /// Whether the common prefix was stripped
    pub refined: bool,
    /// One name per batch member, in batch order
    pub names: Vec<String>,
}

/// Resolves batches against the names reserved so far
///
/// Sub-directory names of the directory being resolved are excluded as
/// well, so no file shadows a generated directory.
pub struct FilenameResolver<'a> {
    reserved: &'a mut ReservedNames,
    subdirectories: &'a [String],
}

impl<'a> FilenameResolver<'a> {
    pub fn new(reserved: &'a mut ReservedNames) -> Self {
        Self {
            reserved,
            subdirectories: &[],
        }
    }

    pub fn with_subdirectories(mut self, subdirectories: &'a [String]) -> Self {
        self.subdirectories = subdirectories;
        self
    }

    fn is_taken(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.subdirectories.iter().any(|d| d == name)
    }

    /// All names present, plain single path components, distinct and
    /// unclaimed
    fn accept<I>(&self, candidates: I) -> Option<Vec<String>>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for name in candidates {
            let name = name.filter(|n| is_plain_name(n))?;
            if self.is_taken(&name) || !seen.insert(name.clone()) {
                return None;
            }
            names.push(name);
        }
        Some(names)
    }

    fn select<S, F>(
        &self,
        strategies: &[S],
        refinable: impl Fn(S) -> bool,
        names_for: F,
    ) -> Option<Selection<S>>
    where
        S: Copy,
        F: Fn(S) -> Vec<Option<String>>,
    {
        strategies.iter().find_map(|&strategy| {
            let names = self.accept(names_for(strategy))?;

            if refinable(strategy)
                && let Some(refined) = strip_common_prefix(&names)
                    .and_then(|refined| self.accept(refined.into_iter().map(Some)))
            {
                return Some(Selection {
                    strategy,
                    refined: true,
                    names: refined,
                });
            }

            Some(Selection {
                strategy,
                refined: false,
                names,
            })
        })
    }

    fn commit<S>(&mut self, selection: &Selection<S>) {
        self.reserved.extend(selection.names.iter().cloned());
    }

    /// Name every resource of the batch, reserving the names on success
    pub fn resources(&mut self, resources: &[Resource]) -> Option<Selection<ResourceStrategy>> {
        let selection = self.select(&ResourceStrategy::ORDER, ResourceStrategy::refinable, |s| {
            resources.iter().map(|r| s.filename(r)).collect()
        })?;
        self.commit(&selection);
        Some(selection)
    }

    /// Name every entry of every group, in group then key order, reserving
    /// the names on success
    pub fn entries(&mut self, groups: &[FileGroup]) -> Option<Selection<EntryStrategy>> {
        let selection = self.select(&EntryStrategy::ORDER, |_| true, |s| {
            groups
                .iter()
                .flat_map(|g| g.files.keys().map(move |key| Some(s.filename(&g.resource, key))))
                .collect()
        })?;
        self.commit(&selection);
        Some(selection)
    }
}

/// Filenames for everything in one directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDirectory {
    /// One per generic resource
    pub resources: Vec<String>,
    /// One list per ConfigMap group, one name per entry
    pub config_maps: Vec<Vec<String>>,
    /// One list per Secret group, one name per entry
    pub secrets: Vec<Vec<String>>,
}

/// Resolve the three batches of a directory in order
pub fn resolve_directory(
    directory: &str,
    aggregator: &DirectoryAggregator,
    reserved: &mut ReservedNames,
) -> Result<ResolvedDirectory> {
    let mut resolver =
        FilenameResolver::new(reserved).with_subdirectories(aggregator.subdirectories());

    let unresolvable = |batch| CoreError::UnresolvableNaming {
        directory: directory.to_string(),
        batch,
    };

    let resources = resolver
        .resources(aggregator.resources())
        .ok_or_else(|| unresolvable(Batch::Resources))?;
    log_selection(directory, Batch::Resources, &resources);

    let config_maps = resolver
        .entries(aggregator.config_maps())
        .ok_or_else(|| unresolvable(Batch::ConfigMapFiles))?;
    log_selection(directory, Batch::ConfigMapFiles, &config_maps);

    let secrets = resolver
        .entries(aggregator.secrets())
        .ok_or_else(|| unresolvable(Batch::SecretFiles))?;
    log_selection(directory, Batch::SecretFiles, &secrets);

    Ok(ResolvedDirectory {
        resources: resources.names,
        config_maps: regroup(aggregator.config_maps(), config_maps.names),
        secrets: regroup(aggregator.secrets(), secrets.names),
    })
}

fn log_selection<S: fmt::Debug>(directory: &str, batch: Batch, selection: &Selection<S>) {
    if selection.names.is_empty() {
        return;
    }
    debug!(
        directory,
        %batch,
        strategy = ?selection.strategy,
        refined = selection.refined,
        count = selection.names.len(),
        "selected filename strategy"
    );
}

/// Split a flat entry list back into one list per group
fn regroup(groups: &[FileGroup], names: Vec<String>) -> Vec<Vec<String>> {
    let mut names = names.into_iter();
    groups
        .iter()
        .map(|g| names.by_ref().take(g.files.len()).collect())
        .collect()
}
