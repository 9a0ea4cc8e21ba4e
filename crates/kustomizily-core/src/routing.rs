//! Target directory selection

use crate::resource::Resource;

/// Directory holding every CustomResourceDefinition
pub const DEFINITION_DIRECTORY: &str = "crd";

/// Root directory name
pub const ROOT_DIRECTORY: &str = "";

/// Labels consulted for the target directory, highest priority first
pub const ROUTING_LABELS: [&str; 4] = [
    "app.kubernetes.io/component",
    "component",
    "app.kubernetes.io/name",
    "app",
];

/// Directory a resource belongs to
///
/// Definitions always go to [`DEFINITION_DIRECTORY`]. Other resources use the
/// first non-empty label from [`ROUTING_LABELS`], or the root directory.
pub fn target_directory(resource: &Resource) -> String {
    if resource.is_definition() {
        return DEFINITION_DIRECTORY.to_string();
    }

    ROUTING_LABELS
        .iter()
        .find_map(|label| resource.metadata.label(label))
        .unwrap_or(ROOT_DIRECTORY)
        .to_string()
}
