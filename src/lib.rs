//! Compile a line-oriented node schema into C++ AST declarations: forward
//! declarations, a `std::variant` over every node, a visitor template and one
//! class per node.
//!
//! ```
//! let schema = nodegen::parse_schema("negation | expression operand\nempty").unwrap();
//! let header = nodegen::emit_declarations(&schema, &nodegen::Config::default());
//! assert!(header.contains("using expression = std::variant<negation, empty>;"));
//! ```
pub mod codegen;
pub mod config;
pub mod parser;
pub mod schema;

pub use codegen::{emit_declarations, Codegen};
pub use config::{Config, ConfigError};
pub use parser::{parse_schema, parse_schema_with, ParseError, ParseErrorKind};
pub use schema::{FieldDescriptor, NodeDefinition, Schema};
