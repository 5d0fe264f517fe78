//! OpenAPI v3 document model and strict validation
//!
//! A fixed-up exporter document is checked against an embedded OpenAPI 3.0
//! meta-schema before it is loaded into the typed model. Only the schema
//! registered under the requested name leaves this module.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

use crate::error::{Result, SchemaError, Violation};

const META_SCHEMA: &str = include_str!("openapi_meta_schema.json");

/// OpenAPI document carrying a set of component schemas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub paths: serde_json::Map<String, JsonValue>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, Schema>,
}

/// OpenAPI v3 Schema Object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// `Some(Value::Null)` is an explicit `default: null`
    #[serde(
        default,
        deserialize_with = "explicit_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<JsonValue>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Remaining keywords and `x-` extensions, kept verbatim
    #[serde(flatten)]
    pub extensions: IndexMap<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Array,
    Boolean,
    Integer,
    Number,
    Object,
    String,
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaType::Array => write!(f, "array"),
            SchemaType::Boolean => write!(f, "boolean"),
            SchemaType::Integer => write!(f, "integer"),
            SchemaType::Number => write!(f, "number"),
            SchemaType::Object => write!(f, "object"),
            SchemaType::String => write!(f, "string"),
        }
    }
}

impl Schema {
    /// Schema of the given type with nothing else set
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    pub fn is_object(&self) -> bool {
        self.schema_type == Some(SchemaType::Object)
    }

    pub fn is_array(&self) -> bool {
        self.schema_type == Some(SchemaType::Array)
    }
}

fn explicit_value<'de, D>(deserializer: D) -> std::result::Result<Option<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    JsonValue::deserialize(deserializer).map(Some)
}

fn meta_validator() -> std::result::Result<&'static jsonschema::Validator, String> {
    static VALIDATOR: OnceLock<std::result::Result<jsonschema::Validator, String>> =
        OnceLock::new();

    VALIDATOR
        .get_or_init(|| {
            let schema: JsonValue =
                serde_json::from_str(META_SCHEMA).map_err(|e| e.to_string())?;
            jsonschema::validator_for(&schema).map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a document against the OpenAPI 3.0 meta-schema
pub fn validate_document(document: &JsonValue) -> Result<()> {
    let validator = meta_validator()
        .map_err(|e| SchemaError::compile("cannot compile OpenAPI meta-schema", e))?;

    let violations: Vec<Violation> = validator
        .iter_errors(document)
        .map(|e| {
            let path = e.instance_path.to_string();
            Violation {
                path: if path.is_empty() {
                    "(root)".to_string()
                } else {
                    path
                },
                message: e.to_string().replace('"', "'"),
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::validation(
            "schema is not valid OpenAPI v3",
            violations,
        ))
    }
}

/// Validate a fixed-up document and return the schema registered as `root`
pub fn validate_and_extract(fixed: &[u8], root: &str) -> Result<Schema> {
    let document: JsonValue = serde_json::from_slice(fixed)
        .map_err(|e| SchemaError::decode("cannot unmarshal fixed schema", e))?;

    validate_document(&document)?;

    let mut document: OpenApiDocument = serde_json::from_value(document).map_err(|e| {
        SchemaError::validation(
            "cannot load OpenAPI document",
            vec![Violation {
                path: "(root)".to_string(),
                message: e.to_string(),
            }],
        )
    })?;

    document.components.schemas.shift_remove(root).ok_or_else(|| {
        SchemaError::validation(
            "root schema not found",
            vec![Violation {
                path: format!("/components/schemas/{}", root),
                message: format!("schema '{}' is not defined", root),
            }],
        )
    })
}
