//! Textual form of constraint trees
//!
//! Inferred fields are rendered as text (with `//` doc-comments), wrapped in
//! a named definition and parsed back with a pest grammar. The parse is the
//! point where the rendered definition is compiled into declarations.

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

use crate::infer::{Declaration, Field, Node};

#[derive(Parser)]
#[grammar = "constraint.pest"]
struct ConstraintParser;

const INDENT: &str = "    ";

/// Parser error
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    Pest(Box<pest::error::Error<Rule>>),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid string: {0}")]
    InvalidString(String),

    #[error("Unexpected rule: {0:?}")]
    UnexpectedRule(Rule),
}

impl ParseError {
    /// Line and column of a grammar error
    pub fn line_col(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::Pest(e) => match e.line_col {
                pest::error::LineColLocation::Pos(pos) => Some(pos),
                pest::error::LineColLocation::Span(start, _) => Some(start),
            },
            _ => None,
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        ParseError::Pest(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;

// =============================================================================
// RENDERING
// =============================================================================

/// Render struct fields, one per line, with their doc-comments
pub fn render_fields(fields: &[Field]) -> String {
    let mut out = String::new();
    write_fields(&mut out, fields, 0);
    out
}

/// Wrap rendered fields into `#name: { ... }`
pub fn wrap_declaration(name: &str, body: &str) -> String {
    let mut out = format!("#{}: {{\n", name);
    for line in body.lines() {
        if !line.is_empty() {
            out.push_str(INDENT);
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn write_fields(out: &mut String, fields: &[Field], depth: usize) {
    for field in fields {
        if let Some(doc) = &field.doc {
            // a bare carriage return would end the comment early
            for line in doc.lines().flat_map(|line| line.split('\r')) {
                push_indent(out, depth);
                if line.is_empty() {
                    out.push_str("//\n");
                } else {
                    out.push_str("// ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        push_indent(out, depth);
        out.push_str(&render_label(&field.label));
        out.push_str(": ");
        write_node(out, &field.value, depth);
        out.push('\n');
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    match node {
        Node::Null => out.push_str("null"),
        Node::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Node::Number(n) => out.push_str(&n.to_string()),
        Node::String(s) => out.push_str(&quote(s)),
        Node::Struct(fields) if fields.is_empty() => out.push_str("{}"),
        Node::Struct(fields) => {
            out.push_str("{\n");
            write_fields(out, fields, depth + 1);
            push_indent(out, depth);
            out.push('}');
        }
        Node::List(items) if items.is_empty() => out.push_str("[]"),
        Node::List(items) if items.iter().all(Node::is_scalar) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_node(out, item, depth);
            }
            out.push(']');
        }
        Node::List(items) => {
            out.push_str("[\n");
            for item in items {
                push_indent(out, depth + 1);
                write_node(out, item, depth + 1);
                out.push_str(",\n");
            }
            push_indent(out, depth);
            out.push(']');
        }
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn render_label(label: &str) -> String {
    if is_identifier(label) {
        label.to_string()
    } else {
        quote(label)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse constraint text into its declarations
pub fn parse(input: &str) -> Result<Vec<Declaration>> {
    let pairs = ConstraintParser::parse(Rule::file, input)?;

    let mut declarations = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::file {
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::declaration => declarations.push(parse_declaration(inner)?),
                    Rule::EOI => {}
                    other => return Err(ParseError::UnexpectedRule(other)),
                }
            }
        }
    }

    Ok(declarations)
}

fn parse_declaration(pair: Pair<Rule>) -> Result<Declaration> {
    let mut docs = Vec::new();
    let mut name = String::new();
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::doc => docs.push(doc_text(inner.as_str())),
            Rule::definition => name = inner.as_str().trim_start_matches('#').to_string(),
            _ => value = Some(parse_value(inner)?),
        }
    }

    Ok(Declaration {
        name,
        doc: join_docs(docs),
        value: value.ok_or(ParseError::UnexpectedRule(Rule::declaration))?,
    })
}

fn parse_field(pair: Pair<Rule>) -> Result<Field> {
    let mut docs = Vec::new();
    let mut label = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::doc => docs.push(doc_text(inner.as_str())),
            Rule::label => label = Some(parse_label(inner)?),
            _ => value = Some(parse_value(inner)?),
        }
    }

    Ok(Field {
        label: label.ok_or(ParseError::UnexpectedRule(Rule::field))?,
        doc: join_docs(docs),
        value: value.ok_or(ParseError::UnexpectedRule(Rule::field))?,
    })
}

fn parse_label(pair: Pair<Rule>) -> Result<String> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or(ParseError::UnexpectedRule(Rule::label))?;
    match inner.as_rule() {
        Rule::identifier => Ok(inner.as_str().to_string()),
        Rule::string => parse_string(inner.as_str()),
        other => Err(ParseError::UnexpectedRule(other)),
    }
}

fn parse_value(pair: Pair<Rule>) -> Result<Node> {
    match pair.as_rule() {
        Rule::null => Ok(Node::Null),
        Rule::boolean => Ok(Node::Bool(pair.as_str() == "true")),
        Rule::number => serde_json::from_str::<serde_json::Number>(pair.as_str())
            .map(Node::Number)
            .map_err(|_| ParseError::InvalidNumber(pair.as_str().to_string())),
        Rule::string => parse_string(pair.as_str()).map(Node::String),
        Rule::list => pair
            .into_inner()
            .map(parse_value)
            .collect::<Result<Vec<_>>>()
            .map(Node::List),
        Rule::structure => pair
            .into_inner()
            .map(parse_field)
            .collect::<Result<Vec<_>>>()
            .map(Node::Struct),
        other => Err(ParseError::UnexpectedRule(other)),
    }
}

fn parse_string(literal: &str) -> Result<String> {
    serde_json::from_str(literal).map_err(|_| ParseError::InvalidString(literal.to_string()))
}

fn doc_text(raw: &str) -> String {
    let text = raw.trim_start_matches("//");
    text.strip_prefix(' ').unwrap_or(text).trim_end().to_string()
}

fn join_docs(docs: Vec<String>) -> Option<String> {
    if docs.is_empty() {
        None
    } else {
        Some(docs.join("\n"))
    }
}
