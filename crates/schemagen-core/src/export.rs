//! OpenAPI exporter for compiled declarations
//!
//! The exporter emits the constraint tree as it is, so its output still has
//! the shapes OpenAPI v3 does not accept: tuple-style `items` arrays,
//! single-valued `enum` pins on every leaf and `required` listing every field.
//! Those are corrected downstream by [`crate::compat`] and [`crate::normalize`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::HashSet;
use thiserror::Error;

use crate::infer::{Declaration, Field, Node};

/// OpenAPI version written into exported documents
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Document-level settings of the exporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// `info.title`
    pub title: String,
    /// `info.version`
    pub version: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            title: "Generated by schemagen.".to_string(),
            version: "no version".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no declarations to export")]
    Empty,

    #[error("duplicate declaration: #{0}")]
    DuplicateDeclaration(String),

    #[error("duplicate field '{label}' in {path}")]
    DuplicateField { path: String, label: String },
}

/// Export declarations as a raw OpenAPI document
pub fn generate(
    declarations: &[Declaration],
    config: &ExportConfig,
) -> Result<JsonValue, ExportError> {
    if declarations.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut schemas = Map::new();
    for decl in declarations {
        if schemas.contains_key(&decl.name) {
            return Err(ExportError::DuplicateDeclaration(decl.name.clone()));
        }
        let mut path = vec![format!("#{}", decl.name)];
        let schema = export_node(&decl.value, decl.doc.as_deref(), &mut path)?;
        schemas.insert(decl.name.clone(), schema);
    }

    Ok(json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": config.title,
            "version": config.version,
        },
        "paths": {},
        "components": {
            "schemas": schemas,
        },
    }))
}

fn export_node(
    node: &Node,
    doc: Option<&str>,
    path: &mut Vec<String>,
) -> Result<JsonValue, ExportError> {
    let mut schema = Map::new();

    match node {
        Node::Null => {
            describe(&mut schema, doc);
            schema.insert("nullable".into(), JsonValue::Bool(true));
            schema.insert("enum".into(), json!([null]));
        }
        Node::Bool(b) => leaf(&mut schema, "boolean", doc, JsonValue::Bool(*b)),
        Node::Number(n) => {
            let ty = if n.is_f64() { "number" } else { "integer" };
            leaf(&mut schema, ty, doc, JsonValue::Number(n.clone()));
        }
        Node::String(s) => leaf(&mut schema, "string", doc, JsonValue::String(s.clone())),
        Node::List(items) => {
            schema.insert("type".into(), "array".into());
            describe(&mut schema, doc);
            if items.is_empty() {
                schema.insert("items".into(), JsonValue::Object(Map::new()));
                schema.insert("enum".into(), json!([[]]));
            } else {
                let mut exported = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    path.push(i.to_string());
                    exported.push(export_node(item, None, path)?);
                    path.pop();
                }
                schema.insert("items".into(), JsonValue::Array(exported));
            }
        }
        Node::Struct(fields) => {
            schema.insert("type".into(), "object".into());
            describe(&mut schema, doc);
            export_struct(&mut schema, fields, path)?;
        }
    }

    Ok(JsonValue::Object(schema))
}

fn export_struct(
    schema: &mut Map<String, JsonValue>,
    fields: &[Field],
    path: &mut Vec<String>,
) -> Result<(), ExportError> {
    if fields.is_empty() {
        return Ok(());
    }

    let mut seen = HashSet::with_capacity(fields.len());
    let mut required = Vec::with_capacity(fields.len());
    let mut properties = Map::new();

    for field in fields {
        if !seen.insert(field.label.as_str()) {
            return Err(ExportError::DuplicateField {
                path: path.join("."),
                label: field.label.clone(),
            });
        }
        path.push(field.label.clone());
        let property = export_node(&field.value, field.doc.as_deref(), path)?;
        path.pop();

        required.push(JsonValue::String(field.label.clone()));
        properties.insert(field.label.clone(), property);
    }

    schema.insert("required".into(), JsonValue::Array(required));
    schema.insert("properties".into(), JsonValue::Object(properties));
    Ok(())
}

fn leaf(schema: &mut Map<String, JsonValue>, ty: &str, doc: Option<&str>, value: JsonValue) {
    schema.insert("type".into(), ty.into());
    describe(schema, doc);
    schema.insert("enum".into(), JsonValue::Array(vec![value]));
}

fn describe(schema: &mut Map<String, JsonValue>, doc: Option<&str>) {
    if let Some(doc) = doc {
        schema.insert("description".into(), doc.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(fields: Vec<Field>) -> Vec<Declaration> {
        vec![Declaration {
            name: "values".to_string(),
            doc: None,
            value: Node::Struct(fields),
        }]
    }

    #[test]
    fn test_document_envelope() {
        let doc = generate(&values(vec![]), &ExportConfig::default()).unwrap();

        assert_eq!(doc["openapi"], "3.0.0");
        assert_eq!(doc["info"]["title"], "Generated by schemagen.");
        assert_eq!(doc["info"]["version"], "no version");
        assert_eq!(doc["paths"], json!({}));
        assert_eq!(doc["components"]["schemas"]["values"], json!({"type": "object"}));
    }

    #[test]
    fn test_leaves_are_pinned() {
        let doc = generate(
            &values(vec![
                Field::new("replicas", Node::Number(3.into())).with_doc("Replica count"),
                Field::new("ratio", Node::Number(serde_json::Number::from_f64(0.5).unwrap())),
                Field::new("enabled", Node::Bool(false)),
                Field::new("host", Node::Null),
            ]),
            &ExportConfig::default(),
        )
        .unwrap();

        let schema = &doc["components"]["schemas"]["values"];
        assert_eq!(schema["required"], json!(["replicas", "ratio", "enabled", "host"]));
        assert_eq!(
            schema["properties"]["replicas"],
            json!({"type": "integer", "description": "Replica count", "enum": [3]})
        );
        assert_eq!(schema["properties"]["ratio"], json!({"type": "number", "enum": [0.5]}));
        assert_eq!(schema["properties"]["enabled"], json!({"type": "boolean", "enum": [false]}));
        assert_eq!(schema["properties"]["host"], json!({"nullable": true, "enum": [null]}));
    }

    #[test]
    fn test_lists_export_tuple_items() {
        let doc = generate(
            &values(vec![
                Field::new(
                    "tags",
                    Node::List(vec![Node::String("a".into()), Node::String("b".into())]),
                ),
                Field::new("empty", Node::List(vec![])),
            ]),
            &ExportConfig::default(),
        )
        .unwrap();

        let props = &doc["components"]["schemas"]["values"]["properties"];
        assert_eq!(
            props["tags"],
            json!({
                "type": "array",
                "items": [
                    {"type": "string", "enum": ["a"]},
                    {"type": "string", "enum": ["b"]}
                ]
            })
        );
        assert_eq!(props["empty"], json!({"type": "array", "items": {}, "enum": [[]]}));
    }

    #[test]
    fn test_custom_info() {
        let config = ExportConfig {
            title: "nginx".to_string(),
            version: "1.2.3".to_string(),
        };
        let doc = generate(&values(vec![]), &config).unwrap();
        assert_eq!(doc["info"], json!({"title": "nginx", "version": "1.2.3"}));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            generate(&[], &ExportConfig::default()),
            Err(ExportError::Empty)
        ));

        let mut decls = values(vec![]);
        decls.extend(values(vec![]));
        assert!(matches!(
            generate(&decls, &ExportConfig::default()),
            Err(ExportError::DuplicateDeclaration(name)) if name == "values"
        ));

        let err = generate(
            &values(vec![
                Field::new("image", Node::Struct(vec![
                    Field::new("tag", Node::Null),
                    Field::new("tag", Node::Null),
                ])),
            ]),
            &ExportConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "duplicate field 'tag' in #values.image");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ExportConfig = serde_json::from_str(r#"{"title": "chart"}"#).unwrap();
        assert_eq!(config.title, "chart");
        assert_eq!(config.version, "no version");
    }
}
