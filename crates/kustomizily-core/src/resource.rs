//! Kubernetes resource records decoded from individual documents
//!
//! Only the fields needed for routing and naming are decoded. Kind-specific
//! fields are decoded for the kinds that use them, so a Deployment with an
//! unusual `data:` block never fails on ConfigMap rules.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// API group of CustomResourceDefinition objects
pub const DEFINITION_GROUP: &str = "apiextensions.k8s.io";

/// Kind of CustomResourceDefinition objects
pub const DEFINITION_KIND: &str = "CustomResourceDefinition";

/// How a resource is handled by the directory aggregators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    /// CustomResourceDefinition, written as a whole file under `crd/`
    Definition,
    /// Core ConfigMap, turned into a configMapGenerator entry
    ConfigMap,
    /// Core Secret, turned into a secretGenerator entry
    Secret,
    /// Everything else, written verbatim
    Generic,
}

/// Object metadata subset
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObjectMeta {
    #[serde(deserialize_with = "de::scalar_string")]
    pub namespace: String,

    #[serde(deserialize_with = "de::scalar_string")]
    pub name: String,

    #[serde(deserialize_with = "de::scalar_map")]
    pub labels: IndexMap<String, String>,

    #[serde(deserialize_with = "de::scalar_map")]
    pub annotations: IndexMap<String, String>,
}

impl ObjectMeta {
    /// Look up a label, treating an empty value as absent
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// ConfigMap and Secret payload fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Payload {
    #[serde(deserialize_with = "de::scalar_map")]
    pub data: IndexMap<String, String>,

    #[serde(deserialize_with = "de::scalar_map")]
    pub binary_data: IndexMap<String, String>,

    #[serde(deserialize_with = "de::scalar_map")]
    pub string_data: IndexMap<String, String>,

    #[serde(deserialize_with = "de::null_as_default")]
    pub immutable: bool,

    #[serde(rename = "type", deserialize_with = "de::scalar_string")]
    pub secret_type: String,
}

/// `spec.group` and `spec.names.plural` of a CustomResourceDefinition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionSpec {
    pub group: String,
    pub plural: String,
}

/// A decoded manifest record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: String,
    pub api_version: String,
    pub metadata: ObjectMeta,

    /// Populated for definition kinds only
    pub definition: DefinitionSpec,

    /// Populated for ConfigMap and Secret only
    pub payload: Payload,

    /// Whitespace-trimmed document bytes
    pub raw: Vec<u8>,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Header {
    #[serde(deserialize_with = "de::scalar_string")]
    kind: String,

    #[serde(deserialize_with = "de::scalar_string")]
    api_version: String,

    #[serde(deserialize_with = "de::null_as_default")]
    metadata: ObjectMeta,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DefinitionDoc {
    #[serde(deserialize_with = "de::null_as_default")]
    spec: DefinitionDocSpec,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DefinitionDocSpec {
    #[serde(deserialize_with = "de::scalar_string")]
    group: String,

    #[serde(deserialize_with = "de::null_as_default")]
    names: DefinitionDocNames,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct DefinitionDocNames {
    #[serde(deserialize_with = "de::scalar_string")]
    plural: String,
}

impl Resource {
    /// Decode one document
    ///
    /// `index` is the 1-based position of the document in its stream and is
    /// only used for error reporting. Returns `Ok(None)` for blank and
    /// comment-only documents and for documents without kind, apiVersion or
    /// name.
    pub fn parse(document: &[u8], index: usize) -> Result<Option<Self>> {
        let trimmed = document.trim_ascii();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let malformed = |source| CoreError::MalformedDocument { index, source };

        let value: Value = serde_yaml::from_slice(trimmed).map_err(malformed)?;
        if value.is_null() {
            return Ok(None);
        }

        let header: Header = serde_yaml::from_value(value.clone()).map_err(malformed)?;
        if header.kind.is_empty()
            || header.api_version.is_empty()
            || header.metadata.name.is_empty()
        {
            return Ok(None);
        }

        let mut resource = Resource {
            kind: header.kind,
            api_version: header.api_version,
            metadata: header.metadata,
            definition: DefinitionSpec::default(),
            payload: Payload::default(),
            raw: trimmed.to_vec(),
        };

        match resource.class() {
            ResourceClass::Definition => {
                let doc: DefinitionDoc = serde_yaml::from_value(value).map_err(malformed)?;
                resource.definition = DefinitionSpec {
                    group: doc.spec.group,
                    plural: doc.spec.names.plural,
                };
            }
            ResourceClass::ConfigMap | ResourceClass::Secret => {
                resource.payload = serde_yaml::from_value(value).map_err(malformed)?;
            }
            ResourceClass::Generic => {}
        }

        Ok(Some(resource))
    }

    pub fn class(&self) -> ResourceClass {
        if self.kind == DEFINITION_KIND && self.api_group() == DEFINITION_GROUP {
            return ResourceClass::Definition;
        }
        match (self.api_version.as_str(), self.kind.as_str()) {
            ("v1", "ConfigMap") => ResourceClass::ConfigMap,
            ("v1", "Secret") => ResourceClass::Secret,
            _ => ResourceClass::Generic,
        }
    }

    pub fn is_definition(&self) -> bool {
        self.class() == ResourceClass::Definition
    }

    /// API group part of apiVersion, empty for the core group
    pub fn api_group(&self) -> &str {
        self.api_version
            .rsplit_once('/')
            .map(|(group, _)| group)
            .unwrap_or("")
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// `Kind/name` for log and error messages
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.kind, self.metadata.name)
    }
}

/// Lenient deserializers matching how manifests are written in practice:
/// labels like `version: 2` or `enabled: true` are strings to Kubernetes.
mod de {
    use super::*;
    use serde::de::Error as _;

    pub(super) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub(super) fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        scalar_to_string(value).map_err(D::Error::custom)
    }

    pub(super) fn scalar_map<'de, D>(
        deserializer: D,
    ) -> std::result::Result<IndexMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(IndexMap::new()),
            Value::Mapping(mapping) => mapping
                .into_iter()
                .map(|(k, v)| -> std::result::Result<(String, String), String> {
                    Ok((scalar_to_string(k)?, scalar_to_string(v)?))
                })
                .collect::<std::result::Result<IndexMap<_, _>, String>>()
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected a mapping of strings, found {}",
                type_name(&other)
            ))),
        }
    }

    fn scalar_to_string(value: Value) -> std::result::Result<String, String> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(format!(
                "expected a scalar value, found {}",
                type_name(&other)
            )),
        }
    }

    fn type_name(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Tagged(_) => "tagged value",
        }
    }
}
