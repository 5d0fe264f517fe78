//! Schemagen Core - OpenAPI v3 schema generation for Helm chart values
//!
//! This crate turns a `values.yaml` document into an OpenAPI v3 Schema Object
//! that describes its shape and carries every observed value as a `default`:
//! - `ValuesDocument`: the decoded values file with its doc-comments
//! - `infer` / `syntax` / `export`: the constraint engine that infers a typed
//!   tree, renders and re-parses it as text, and exports raw OpenAPI
//! - `compat`: structural fix-up of exporter output (`items` arrays)
//! - `openapi`: strict OpenAPI v3 validation and the typed `Schema` model
//! - `normalize`: rewrites `enum` into `default` and drops `required`
//! - `SchemaGenerator`: the whole pipeline
//!
//! # Example
//!
//! ```rust
//! use schemagen_core::generate_schema_from_values;
//!
//! let schema = generate_schema_from_values(b"replicaCount: 1\n").unwrap();
//! let json: serde_json::Value = serde_json::from_slice(&schema).unwrap();
//! assert_eq!(json["properties"]["replicaCount"]["default"], 1);
//! ```

pub mod compat;
pub mod document;
pub mod error;
pub mod export;
pub mod generate;
pub mod infer;
pub mod normalize;
pub mod openapi;
pub mod syntax;

pub use compat::fix_structure;
pub use document::{DocComments, ValuesDocument};
pub use error::{ErrorKind, Result, SchemaError, Violation};
pub use export::ExportConfig;
pub use generate::{GeneratorOptions, SchemaGenerator, generate_schema_from_values, infer};
pub use infer::{Declaration, Field, Node};
pub use normalize::normalize;
pub use openapi::{OpenApiDocument, Schema, SchemaType, validate_and_extract};
