//! Values document decoding with doc-comment extraction
//!
//! `serde_yaml` drops comments, so head comments are recovered by a line
//! scanner that tracks the key path of every mapping entry. A comment block
//! directly above a key (no blank line in between) becomes that key's doc.

use serde_yaml::{Mapping, Value as YamlValue};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SchemaError};

/// Doc-comments keyed by the path of mapping keys leading to the entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComments(HashMap<Vec<String>, String>);

impl DocComments {
    /// Scan YAML source for head comments
    pub fn scan(source: &str) -> Self {
        Scanner::default().run(source)
    }

    /// Get the doc for a key path
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        let key: Vec<String> = path.iter().map(|p| p.as_ref().to_string()).collect();
        self.0.get(&key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A decoded values file: the top-level mapping plus its doc-comments
#[derive(Debug, Clone, Default)]
pub struct ValuesDocument {
    root: Mapping,
    comments: DocComments,
}

impl ValuesDocument {
    /// Load a values document from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            SchemaError::io(format!("cannot read values file {}", path.display()), e)
        })?;
        Self::from_slice(&bytes)
    }

    /// Decode raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| SchemaError::decode("values document is not valid UTF-8", e))?;
        Self::from_yaml(source)
    }

    /// Decode a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut value: YamlValue = serde_yaml::from_str(yaml)
            .map_err(|e| SchemaError::decode("cannot decode values document", e))?;
        value
            .apply_merge()
            .map_err(|e| SchemaError::decode("cannot apply merge keys", e))?;

        let root = match value {
            YamlValue::Null => Mapping::new(),
            YamlValue::Mapping(map) => map,
            YamlValue::Tagged(tagged) => match tagged.value {
                YamlValue::Mapping(map) => map,
                other => return Err(not_a_mapping(&other)),
            },
            other => return Err(not_a_mapping(&other)),
        };

        Ok(Self {
            root,
            comments: DocComments::scan(yaml),
        })
    }

    /// Top-level mapping
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// Doc-comments of the document
    pub fn comments(&self) -> &DocComments {
        &self.comments
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn not_a_mapping(value: &YamlValue) -> SchemaError {
    let found = match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a sequence",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    };
    SchemaError::decode(
        "cannot decode values document",
        format!("top level must be a mapping, found {}", found),
    )
}

/// Render a YAML mapping key the way the scanner sees it
pub(crate) fn key_to_string(key: &YamlValue) -> Option<String> {
    match key {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Bool(b) => Some(b.to_string()),
        YamlValue::Null => Some("null".to_string()),
        YamlValue::Tagged(tagged) => key_to_string(&tagged.value),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => None,
    }
}

// =============================================================================
// COMMENT SCANNER
// =============================================================================

#[derive(Debug)]
enum Frame {
    Key { indent: usize, name: String },
    Item { indent: usize },
}

impl Frame {
    fn indent(&self) -> usize {
        match self {
            Frame::Key { indent, .. } | Frame::Item { indent } => *indent,
        }
    }
}

#[derive(Debug, Default)]
struct Scanner {
    docs: HashMap<Vec<String>, String>,
    pending: Vec<String>,
    stack: Vec<Frame>,
    /// Lines indented deeper than this belong to a block scalar
    block_scalar: Option<usize>,
}

impl Scanner {
    fn run(mut self, source: &str) -> DocComments {
        for raw in source.lines() {
            let line = raw.trim_end_matches('\r');
            let content = line.trim_start_matches(' ');
            let indent = line.len() - content.len();

            if let Some(owner) = self.block_scalar {
                if content.trim().is_empty() || indent > owner {
                    continue;
                }
                self.block_scalar = None;
            }

            let trimmed = content.trim_end();
            if trimmed.is_empty() {
                self.pending.clear();
            } else if let Some(comment) = trimmed.strip_prefix('#') {
                let text = comment.strip_prefix(' ').unwrap_or(comment);
                self.pending.push(text.to_string());
            } else if trimmed.starts_with("---")
                || trimmed.starts_with("...")
                || trimmed.starts_with('%')
            {
                self.pending.clear();
                self.stack.clear();
            } else {
                self.entry(indent, trimmed);
            }
        }

        DocComments(self.docs)
    }

    fn entry(&mut self, indent: usize, content: &str) {
        if let Some(rest) = sequence_item(content) {
            while self.stack.last().is_some_and(|top| match top {
                Frame::Item { indent: i } => *i >= indent,
                Frame::Key { indent: i, .. } => *i > indent,
            }) {
                self.stack.pop();
            }
            self.stack.push(Frame::Item { indent });
            self.pending.clear();

            let offset = content.len() - rest.len();
            if rest.is_empty() {
                return;
            }
            if is_block_indicator(rest) {
                self.block_scalar = Some(indent);
                return;
            }
            self.entry(indent + offset, rest);
            return;
        }

        let Some((name, value)) = split_key(content) else {
            self.pending.clear();
            return;
        };

        while self.stack.last().is_some_and(|top| top.indent() >= indent) {
            self.stack.pop();
        }

        let in_sequence = self.stack.iter().any(|f| matches!(f, Frame::Item { .. }));
        if !self.pending.is_empty() {
            if in_sequence {
                tracing::trace!(key = %name, "ignoring comment inside a sequence item");
            } else {
                let mut path: Vec<String> = self
                    .stack
                    .iter()
                    .filter_map(|f| match f {
                        Frame::Key { name, .. } => Some(name.clone()),
                        Frame::Item { .. } => None,
                    })
                    .collect();
                path.push(name.clone());
                self.docs.insert(path, self.pending.join("\n"));
            }
            self.pending.clear();
        }

        if is_block_indicator(value) {
            self.block_scalar = Some(indent);
        }
        self.stack.push(Frame::Key { indent, name });
    }
}

/// Content after a `- ` sequence marker, if the line is a sequence item
fn sequence_item(content: &str) -> Option<&str> {
    if content == "-" {
        return Some("");
    }
    content
        .strip_prefix("- ")
        .map(|rest| rest.trim_start_matches(' '))
}

/// Value part starts a literal or folded block scalar (`|`, `>-`, `|2+` ...)
fn is_block_indicator(value: &str) -> bool {
    let value = match value.find(" #") {
        Some(pos) => &value[..pos],
        None => value,
    }
    .trim();
    let mut chars = value.chars();
    matches!(chars.next(), Some('|') | Some('>'))
        && chars.all(|c| c == '-' || c == '+' || c.is_ascii_digit())
}

/// Split `key: value` into the unquoted key and the remaining value text
fn split_key(content: &str) -> Option<(String, &str)> {
    let first = content.chars().next()?;

    let (key, rest) = match first {
        '"' => {
            let end = closing_double_quote(content)?;
            let key: String = serde_yaml::from_str(&content[..=end]).ok()?;
            (key, &content[end + 1..])
        }
        '\'' => {
            let end = closing_single_quote(content)?;
            let key = content[1..end].replace("''", "'");
            (key, &content[end + 1..])
        }
        '#' | '[' | '{' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' | '?' => return None,
        _ => {
            let colon = plain_key_end(content)?;
            (content[..colon].trim_end().to_string(), &content[colon..])
        }
    };

    let rest = rest.trim_start().strip_prefix(':')?;
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }
    Some((key, rest.trim()))
}

fn plain_key_end(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i] == b':' && (i + 1 == bytes.len() || bytes[i + 1] == b' ' || bytes[i + 1] == b'\t')
    })
}

fn closing_double_quote(content: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in content.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

fn closing_single_quote(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_head_comments_attach_to_nested_keys() {
        let docs = DocComments::scan(
            r#"
# Number of replicas
replicaCount: 1
image:
  # Image repository
  # (without tag)
  repository: nginx
  tag: "1.16.0"
"#,
        );

        assert_eq!(docs.get(&["replicaCount"]), Some("Number of replicas"));
        assert_eq!(
            docs.get(&["image", "repository"]),
            Some("Image repository\n(without tag)")
        );
        assert_eq!(docs.get(&["image", "tag"]), None);
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_blank_line_detaches_comment() {
        let docs = DocComments::scan("# Section header\n\nservice:\n  port: 80\n");
        assert!(docs.is_empty());
    }

    #[test]
    fn test_sequence_items_do_not_collect_docs() {
        let docs = DocComments::scan(
            r#"
# Extra ports
ports:
  # first port
  - name: http
    # container port
    port: 80
# Next
next: true
"#,
        );

        assert_eq!(docs.get(&["ports"]), Some("Extra ports"));
        assert_eq!(docs.get(&["next"]), Some("Next"));
        assert_eq!(docs.get(&["ports", "port"]), None);
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_block_scalars_are_skipped() {
        let docs = DocComments::scan(
            r#"
script: |
  # not a comment
  key: not a key
# After the script
after: 1
"#,
        );

        assert_eq!(docs.get(&["after"]), Some("After the script"));
        assert_eq!(docs.get(&["key"]), None);
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_quoted_keys() {
        let docs = DocComments::scan(
            "# dotted\n\"app.kubernetes.io/name\": web\n# single\n'it''s': x\n",
        );

        assert_eq!(docs.get(&["app.kubernetes.io/name"]), Some("dotted"));
        assert_eq!(docs.get(&["it's"]), Some("single"));
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("a: 1"), Some(("a".to_string(), "1")));
        assert_eq!(split_key("a:"), Some(("a".to_string(), "")));
        assert_eq!(split_key("url: http://x"), Some(("url".to_string(), "http://x")));
        assert_eq!(split_key("http://x"), None);
        assert_eq!(split_key("{a: 1}"), None);
    }

    #[test]
    fn test_block_indicator() {
        assert!(is_block_indicator("|"));
        assert!(is_block_indicator(">-"));
        assert!(is_block_indicator("|2+ # comment"));
        assert!(!is_block_indicator("| not"));
        assert!(!is_block_indicator("value"));
    }

    #[test]
    fn test_document_from_yaml() {
        let doc = ValuesDocument::from_yaml("# Replicas\nreplicas: 3\n").unwrap();
        assert_eq!(doc.root().len(), 1);
        assert_eq!(doc.comments().get(&["replicas"]), Some("Replicas"));
    }

    #[test]
    fn test_empty_document_is_empty_mapping() {
        let doc = ValuesDocument::from_yaml("").unwrap();
        assert!(doc.is_empty());

        let doc = ValuesDocument::from_yaml("# only a comment\n").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_non_mapping_is_decode_error() {
        let err = ValuesDocument::from_yaml("- a\n- b\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = ValuesDocument::from_yaml("just a string").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_merge_keys_are_applied() {
        let doc = ValuesDocument::from_yaml(
            "base: &base\n  port: 80\nsvc:\n  <<: *base\n  name: web\n",
        )
        .unwrap();

        let svc = doc.root()["svc"].as_mapping().unwrap();
        assert_eq!(svc.len(), 2);
        assert_eq!(svc["port"].as_u64(), Some(80));
        assert!(!svc.contains_key("<<"));
    }

    #[test]
    fn test_integers_wider_than_u64_are_rejected() {
        let err = ValuesDocument::from_yaml("big: 18446744073709551616\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let doc = ValuesDocument::from_yaml("big: 18446744073709551615\n").unwrap();
        assert_eq!(doc.root()["big"].as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ValuesDocument::from_file("/nonexistent/values.yaml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("/nonexistent/values.yaml"));
    }

    #[test]
    fn test_malformed_yaml_is_decode_error() {
        let err = ValuesDocument::from_yaml("a: [1, 2\nb: {").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = ValuesDocument::from_slice(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
