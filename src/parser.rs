//! Schema text → `Schema`.
//!
//! One node per non-blank line:
//!
//! ```text
//! negation | expression operand
//! binary   | expression lhs, token op, expression rhs
//! empty
//! ```
//!
//! The first malformed line aborts the parse; there is no partial result.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Config;
use crate::schema::{FieldDescriptor, NodeDefinition, Schema};

// ------------------------------- Grammar --------------------------------- //

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap()
});

// identifiers plus `<`, `>` and `:` so `std::vector<expression>` passes
static TYPE_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_<>:]*$").unwrap()
});

pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

pub fn is_type_expr(s: &str) -> bool {
    TYPE_EXPR.is_match(s)
}

/// Words the generated header cannot use as a class or member name.
const CPP_RESERVED: &[&str] = &[
    "alignas", "alignof", "and", "and_eq", "asm", "auto", "bitand", "bitor", "bool", "break",
    "case", "catch", "char", "char8_t", "char16_t", "char32_t", "class", "compl", "concept",
    "const", "consteval", "constexpr", "constinit", "const_cast", "continue", "co_await",
    "co_return", "co_yield", "decltype", "default", "delete", "do", "double", "dynamic_cast",
    "else", "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto",
    "if", "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "not_eq",
    "nullptr", "operator", "or", "or_eq", "private", "protected", "public", "register",
    "reinterpret_cast", "requires", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "thread_local",
    "throw", "true", "try", "typedef", "typeid", "typename", "union", "unsigned", "using",
    "virtual", "void", "volatile", "wchar_t", "while", "xor", "xor_eq",
    // the header qualifies its own names with `std::`
    "std",
];

pub fn is_cpp_reserved(s: &str) -> bool {
    CPP_RESERVED.contains(&s)
}

/// Characters that may appear somewhere inside a type expression.
pub fn is_type_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '<' | '>' | ':')
}

// ------------------------------- Errors ---------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}\n    {line} | {text}")]
pub struct ParseError {
    /// 1-based, counting blank lines
    pub line: usize,
    pub text: String,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("malformed node name {0:?}, expected an identifier")]
    MalformedName(String),
    #[error("node name `{0}` is reserved in the generated header")]
    ReservedName(String),
    #[error("malformed field descriptor {descriptor:?}, expected `<type> <name>` but found {tokens} token(s)")]
    MalformedFieldDescriptor { descriptor: String, tokens: usize },
    #[error("invalid field name {0:?}, expected an identifier that is not a C++ keyword")]
    InvalidFieldName(String),
    #[error("invalid type {ty:?} for field `{field}`, expected an identifier optionally using `<`, `>` and `::`")]
    InvalidFieldType { field: String, ty: String },
    #[error("field `{field}` appears more than once in node `{node}`")]
    DuplicateFieldName { node: String, field: String },
    #[error("field `{0}` has the same name as its node")]
    FieldNamedAfterNode(String),
    #[error("field `{field}` has the same name as a type used in its node (`{ty}`)")]
    FieldShadowsType { field: String, ty: String },
    #[error("duplicate node name `{name}` (first defined on line {first_line})")]
    DuplicateNodeName { name: String, first_line: usize },
}

impl ParseErrorKind {
    /// Stable machine-readable name of the condition.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedName(_) => "MalformedName",
            Self::ReservedName(_) => "ReservedName",
            Self::MalformedFieldDescriptor { .. } => "MalformedFieldDescriptor",
            Self::InvalidFieldName(_) => "InvalidFieldName",
            Self::InvalidFieldType { .. } => "InvalidFieldType",
            Self::DuplicateFieldName { .. } => "DuplicateFieldName",
            Self::FieldNamedAfterNode(_) => "FieldNamedAfterNode",
            Self::FieldShadowsType { .. } => "FieldShadowsType",
            Self::DuplicateNodeName { .. } => "DuplicateNodeName",
        }
    }
}

// ------------------------------ Front API -------------------------------- //

/// Parse with the default `|` separator and default reserved names.
pub fn parse_schema(source: &str) -> Result<Schema, ParseError> {
    parse_schema_with(source, &Config::default())
}

pub fn parse_schema_with(source: &str, config: &Config) -> Result<Schema, ParseError> {
    let mut schema = Schema::default();
    for (index, text) in source.lines().enumerate() {
        if text.trim().is_empty() {
            continue
        }
        let line = index + 1;
        let error = |kind| ParseError { line, text: text.trim().to_string(), kind };
        let node = parse_line(text, line, config).map_err(error)?;
        if let Err(node) = schema.push(node) {
            let first_line = schema.get(node.name()).map_or(0, |first| first.line());
            return Err(error(ParseErrorKind::DuplicateNodeName {
                name: node.name().to_string(),
                first_line,
            }))
        }
    }
    Ok(schema)
}

// ------------------------------ Internals -------------------------------- //

fn parse_line(text: &str, line: usize, config: &Config) -> Result<NodeDefinition, ParseErrorKind> {
    let (head, rest) = match text.split_once(config.separator) {
        Some((head, rest)) => (head, Some(rest)),
        None => (text, None),
    };

    let name = head.trim();
    if !is_identifier(name) {
        return Err(ParseErrorKind::MalformedName(name.to_string()))
    }
    if is_cpp_reserved(name) || config.reserved_names().contains(&name) {
        return Err(ParseErrorKind::ReservedName(name.to_string()))
    }

    let fields = match rest {
        Some(rest) => parse_fields(name, rest)?,
        None => Vec::new(),
    };
    Ok(NodeDefinition::new(name, fields, line))
}

fn parse_fields(node: &str, rest: &str) -> Result<Vec<FieldDescriptor>, ParseErrorKind> {
    let mut fields: Vec<FieldDescriptor> = Vec::new();
    for piece in rest.split(',') {
        let tokens = piece.split_whitespace().collect::<Vec<_>>();
        let [ty, name] = tokens[..] else {
            return Err(ParseErrorKind::MalformedFieldDescriptor {
                descriptor: piece.trim().to_string(),
                tokens: tokens.len(),
            })
        };
        if !is_identifier(name) || is_cpp_reserved(name) {
            return Err(ParseErrorKind::InvalidFieldName(name.to_string()))
        }
        if !is_type_expr(ty) {
            return Err(ParseErrorKind::InvalidFieldType {
                field: name.to_string(),
                ty: ty.to_string(),
            })
        }
        if fields.iter().any(|f| f.name() == name) {
            return Err(ParseErrorKind::DuplicateFieldName {
                node: node.to_string(),
                field: name.to_string(),
            })
        }
        if name == node {
            return Err(ParseErrorKind::FieldNamedAfterNode(name.to_string()))
        }
        fields.push(FieldDescriptor::new(ty, name));
    }
    // a member named like a type would hide that type inside the class
    for field in &fields {
        let shadowed = fields.iter().find(|other| {
            other.ty().split(['<', '>', ':']).any(|word| word == field.name())
        });
        if let Some(other) = shadowed {
            return Err(ParseErrorKind::FieldShadowsType {
                field: field.name().to_string(),
                ty: other.ty().to_string(),
            })
        }
    }
    Ok(fields)
}

// ------------------------------- Tests ----------------------------------- //
