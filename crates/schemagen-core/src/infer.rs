//! Constraint tree inference
//!
//! Walks a decoded values document and builds a typed tree whose leaves are
//! pinned to their observed value. Struct fields keep the document's key
//! order and carry the doc-comment found above the key.

use serde_yaml::Value as YamlValue;

use crate::document::{ValuesDocument, key_to_string};
use crate::error::{Result, SchemaError};

/// Inferred constraint node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    /// Integer or float, kept exactly as observed
    Number(serde_json::Number),
    String(String),
    List(Vec<Node>),
    Struct(Vec<Field>),
}

impl Node {
    /// Short name of the node kind
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Number(n) if n.is_f64() => "float",
            Node::Number(_) => "int",
            Node::String(_) => "string",
            Node::List(_) => "list",
            Node::Struct(_) => "struct",
        }
    }

    /// Scalars render on a single line
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::List(_) | Node::Struct(_))
    }
}

/// A labelled struct member
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: String,
    pub doc: Option<String>,
    pub value: Node,
}

impl Field {
    pub fn new(label: impl Into<String>, value: Node) -> Self {
        Self {
            label: label.into(),
            doc: None,
            value,
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// A named top-level definition (`#name: { ... }`)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub doc: Option<String>,
    pub value: Node,
}

/// Infer the fields of a values document's top-level mapping
pub fn infer_document(document: &ValuesDocument) -> Result<Vec<Field>> {
    let mut path = Vec::new();
    infer_mapping(document.root(), document, &mut path, true)
}

fn infer_mapping(
    mapping: &serde_yaml::Mapping,
    document: &ValuesDocument,
    path: &mut Vec<String>,
    with_docs: bool,
) -> Result<Vec<Field>> {
    let mut fields = Vec::with_capacity(mapping.len());

    for (key, value) in mapping {
        let label = key_to_string(key).ok_or_else(|| {
            SchemaError::compile(
                format!("cannot infer field under {}", display_path(path)),
                "complex mapping keys are not supported",
            )
        })?;

        path.push(label.clone());
        let doc = if with_docs {
            document.comments().get(path.as_slice()).map(str::to_string)
        } else {
            None
        };
        let node = infer_value(value, document, path, with_docs)?;
        path.pop();

        fields.push(Field {
            label,
            doc,
            value: node,
        });
    }

    Ok(fields)
}

fn infer_value(
    value: &YamlValue,
    document: &ValuesDocument,
    path: &mut Vec<String>,
    with_docs: bool,
) -> Result<Node> {
    let node = match value {
        YamlValue::Null => Node::Null,
        YamlValue::Bool(b) => Node::Bool(*b),
        YamlValue::Number(n) => infer_number(n),
        YamlValue::String(s) => Node::String(s.clone()),
        YamlValue::Sequence(items) => Node::List(
            items
                .iter()
                .map(|item| infer_value(item, document, path, false))
                .collect::<Result<_>>()?,
        ),
        YamlValue::Mapping(map) => Node::Struct(infer_mapping(map, document, path, with_docs)?),
        YamlValue::Tagged(tagged) => infer_value(&tagged.value, document, path, with_docs)?,
    };
    Ok(node)
}

fn infer_number(n: &serde_yaml::Number) -> Node {
    if let Some(i) = n.as_i64() {
        Node::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Node::Number(u.into())
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Node::Number)
            .unwrap_or(Node::Null)
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.join(".")
    }
}
