//! Generator settings: JSON file first, command-line overrides on top.
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::codegen::{DISPATCH_NAME, RESULT_PARAM};
use crate::parser::{is_cpp_reserved, is_identifier, is_type_char};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// splits the node name from its field list
    pub separator: char,
    /// enclosing C++ namespace, `::`-separated; empty for the global namespace
    pub namespace: String,
    /// the tagged-union alias
    pub union_name: String,
    /// the visitor class template
    pub visitor_name: String,
    /// derived from the namespace when absent
    pub include_guard: Option<String>,
    /// extra headers; `"foo.hpp"` (quoted) is emitted as a local include, anything else as `<...>`
    pub includes: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid config at JSON path {path}: {message}")]
    Json { path: String, message: String },
    #[error("`{key}` must be a plain identifier that is not a C++ keyword or generated name, got {value:?}")]
    InvalidName { key: &'static str, value: String },
    #[error("{0:?} cannot be used as a separator (it may appear inside names, types or field lists)")]
    InvalidSeparator(char),
    #[error("invalid include {0:?}")]
    InvalidInclude(String),
    #[error("`union_name` and `visitor_name` are both {0:?}")]
    NameClash(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: '|',
            namespace: String::from("ast"),
            union_name: String::from("expression"),
            visitor_name: String::from("visitor"),
            include_guard: None,
            includes: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = from_str_with_path(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sep = self.separator;
        if sep == ',' || sep.is_whitespace() || is_type_char(sep) {
            return Err(ConfigError::InvalidSeparator(sep))
        }
        for (key, value) in [("union_name", &self.union_name), ("visitor_name", &self.visitor_name)] {
            let generated = [RESULT_PARAM, DISPATCH_NAME].contains(&value.as_str());
            if !is_identifier(value) || is_cpp_reserved(value) || generated {
                return Err(ConfigError::InvalidName { key, value: value.clone() })
            }
        }
        if self.union_name == self.visitor_name {
            return Err(ConfigError::NameClash(self.union_name.clone()))
        }
        // every `::`-separated segment, so `::a`, `a::` and `a::::b` are rejected too
        let bad_segment = |s: &str| !is_identifier(s) || is_cpp_reserved(s);
        if !self.namespace.is_empty() && self.namespace.split("::").any(bad_segment) {
            return Err(ConfigError::InvalidName { key: "namespace", value: self.namespace.clone() })
        }
        if let Some(guard) = self.include_guard.as_ref() {
            if !is_identifier(guard) {
                return Err(ConfigError::InvalidName { key: "include_guard", value: guard.clone() })
            }
        }
        for include in &self.includes {
            let bad = include.trim().is_empty()
                || include.contains(['\n', '\r', '<', '>'])
                || (include.starts_with('"') && (include.len() < 3 || !include.ends_with('"')));
            if bad {
                return Err(ConfigError::InvalidInclude(include.clone()))
            }
        }
        Ok(())
    }

    pub fn namespace_segments(&self) -> impl Iterator<Item = &str> {
        self.namespace.split("::").filter(|s| !s.is_empty())
    }

    /// `pierogi::ast` → `PIEROGI_AST_HPP`
    pub fn include_guard(&self) -> String {
        if let Some(guard) = self.include_guard.as_ref() {
            return guard.clone()
        }
        let mut stem = self.namespace_segments()
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join("_");
        if stem.is_empty() {
            stem.push_str("AST");
        }
        format!("{stem}_HPP")
    }

    /// Names the generated header defines besides the node types.
    pub fn reserved_names(&self) -> [&str; 4] {
        [self.union_name.as_str(), self.visitor_name.as_str(), RESULT_PARAM, DISPATCH_NAME]
    }
}

/// Deserialize with JSON-path context in error messages.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, ConfigError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        ConfigError::Json { path, message: err.into_inner().to_string() }
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
