//! Values-to-schema pipeline
//!
//! ```text
//! values.yaml ─► infer ─► raw OpenAPI ─► fix_structure ─► validate_and_extract ─► normalize ─► JSON
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::compat::fix_structure;
use crate::document::ValuesDocument;
use crate::error::{Result, SchemaError};
use crate::export::{self, ExportConfig};
use crate::infer::infer_document;
use crate::normalize::normalize;
use crate::openapi::{Schema, validate_and_extract};
use crate::syntax;

/// Name of the definition the values are declared under
const ROOT_IDENTIFIER: &str = "values";

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorOptions {
    /// Spaces per indentation level of the output JSON
    pub indent: usize,
    /// Document-level exporter settings
    pub export: ExportConfig,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            indent: 3,
            export: ExportConfig::default(),
        }
    }
}

/// Generates OpenAPI v3 schemas from values documents
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    options: GeneratorOptions,
}

impl SchemaGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Infer the raw (not yet OpenAPI-compatible) schema document
    pub fn infer(&self, values: &[u8]) -> Result<Vec<u8>> {
        let document = ValuesDocument::from_slice(values)?;
        self.infer_values(&document)
    }

    fn infer_values(&self, document: &ValuesDocument) -> Result<Vec<u8>> {
        tracing::debug!(
            keys = document.root().len(),
            comments = document.comments().len(),
            "decoded values document"
        );

        let fields = infer_document(document)?;
        let body = syntax::render_fields(&fields);
        let source = syntax::wrap_declaration(ROOT_IDENTIFIER, &body);
        tracing::debug!(bytes = source.len(), "rendered constraint definition");

        let declarations = syntax::parse(&source).map_err(|e| {
            let context = match e.line_col() {
                Some((line, col)) => {
                    format!("cannot compile #{} at {}:{}", ROOT_IDENTIFIER, line, col)
                }
                None => format!("cannot compile #{}", ROOT_IDENTIFIER),
            };
            SchemaError::compile(context, e)
        })?;

        let raw = export::generate(&declarations, &self.options.export)
            .map_err(|e| SchemaError::generation("cannot generate OpenAPI schema", e))?;
        tracing::debug!("exported raw OpenAPI document");

        serde_json::to_vec(&raw)
            .map_err(|e| SchemaError::generation("cannot marshal raw schema", e))
    }

    /// Run the whole pipeline and return the final schema
    pub fn generate_schema(&self, values: &[u8]) -> Result<Schema> {
        let raw = self.infer(values)?;
        self.finish(&raw)
    }

    fn finish(&self, raw: &[u8]) -> Result<Schema> {
        let fixed = fix_structure(raw)?;
        tracing::debug!("fixed array items");

        let mut schema = validate_and_extract(&fixed, ROOT_IDENTIFIER)?;
        tracing::debug!("validated OpenAPI document");

        normalize(&mut schema);
        tracing::debug!("normalized enum and required");

        Ok(schema)
    }

    /// Run the whole pipeline and return the pretty-printed schema
    pub fn generate(&self, values: &[u8]) -> Result<Vec<u8>> {
        let schema = self.generate_schema(values)?;
        self.render(&schema)
    }

    /// Run the whole pipeline on a values file
    pub fn generate_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let document = ValuesDocument::from_file(path)?;
        let raw = self.infer_values(&document)?;
        let schema = self.finish(&raw)?;
        self.render(&schema)
    }

    fn render(&self, schema: &Schema) -> Result<Vec<u8>> {
        let indent = " ".repeat(self.options.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        schema
            .serialize(&mut serializer)
            .map_err(|e| SchemaError::generation("cannot marshal schema", e))?;

        Ok(out)
    }
}

/// Infer the raw schema document with default options
pub fn infer(values: &[u8]) -> Result<Vec<u8>> {
    SchemaGenerator::default().infer(values)
}

/// Generate a pretty-printed OpenAPI v3 schema with default options
pub fn generate_schema_from_values(values: &[u8]) -> Result<Vec<u8>> {
    SchemaGenerator::default().generate(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_three_space_indent() {
        let out = generate_schema_from_values(b"replicas: 3\n").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "{\n   \"type\": \"object\",\n   \"properties\": {\n      \"replicas\": {\n         \"type\": \"integer\",\n         \"default\": 3\n      }\n   }\n}"
        );
    }

    #[test]
    fn test_custom_indent() {
        let generator = SchemaGenerator::new(GeneratorOptions {
            indent: 2,
            ..Default::default()
        });
        let text = String::from_utf8(generator.generate(b"a: true\n").unwrap()).unwrap();
        assert!(text.contains("\n  \"type\": \"object\""));
    }

    #[test]
    fn test_raw_schema_still_has_exporter_shapes() {
        let raw = infer(b"tags: [a, b]\n").unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&raw).unwrap();

        let values = &raw["components"]["schemas"]["values"];
        assert_eq!(values["required"], json!(["tags"]));
        assert!(values["properties"]["tags"]["items"].is_array());
    }

    #[test]
    fn test_root_identifier_does_not_leak() {
        let out = generate_schema_from_values(b"name: web\n").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("components"));
        assert!(!text.contains("#values"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: GeneratorOptions =
            serde_json::from_str(r#"{"export": {"version": "1.0.0"}}"#).unwrap();
        assert_eq!(options.indent, 3);
        assert_eq!(options.export.version, "1.0.0");
        assert_eq!(options.export.title, "Generated by schemagen.");
    }

    #[test]
    fn test_generator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaGenerator>();
    }
}
