//! `Schema` → C++17 header.
//!
//! Section order is fixed: forward declarations, the `std::variant` alias, the
//! visitor template, one class per node, then the `dispatch` helper. Every section
//! walks the schema in source order, so identical input gives identical bytes.
use std::borrow::Cow;

use crate::config::Config;
use crate::schema::{FieldDescriptor, NodeDefinition, Schema};

const INDENT: &str = "    ";
const STD_INCLUDES: [&str; 3] = ["memory", "utility", "variant"];

/// The visitor's result-type template parameter.
pub const RESULT_PARAM: &str = "R";
/// The free function template forwarding a union value to a visitor.
pub const DISPATCH_NAME: &str = "dispatch";

/// Pure entry point: render the whole header.
pub fn emit_declarations(schema: &Schema, config: &Config) -> String {
    let mut cg = Codegen::new(config);
    cg.emit(schema);
    cg.into_string()
}

pub struct Codegen<'a> {
    config: &'a Config,
    out: String,
}

impl<'a> Codegen<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, out: String::new() }
    }

    pub fn emit(&mut self, schema: &Schema) {
        self.preamble();
        self.forward_declarations(schema);
        self.union_alias(schema);
        self.visitor(schema);
        for node in schema.nodes() {
            self.definition(schema, node);
        }
        self.dispatch(schema);
        self.trailer();
    }

    pub fn into_string(self) -> String {
        self.out
    }

    // ————————————————————————————————————————————————————————————————————————
    // SECTIONS
    // ————————————————————————————————————————————————————————————————————————

    fn preamble(&mut self) {
        let config = self.config;
        let guard = config.include_guard();
        self.line("// Generated by nodegen. Do not edit.");
        self.line(format!("#ifndef {guard}"));
        self.line(format!("#define {guard}"));
        self.blank();
        for header in STD_INCLUDES {
            self.line(format!("#include <{header}>"));
        }
        for header in &config.includes {
            let include = if header.starts_with('"') {
                format!("#include {header}")
            } else {
                format!("#include <{header}>")
            };
            self.line(include);
        }
        self.blank();
        if let Some(ns) = self.namespace() {
            self.line(format!("namespace {ns} {{"));
            self.blank();
        }
    }

    fn forward_declarations(&mut self, schema: &Schema) {
        for name in schema.names() {
            self.line(format!("class {name};"));
        }
        if !schema.is_empty() {
            self.blank();
        }
    }

    fn union_alias(&mut self, schema: &Schema) {
        // `std::variant<>` is ill-formed, an empty schema gets a placeholder alternative
        let alternatives = if schema.is_empty() {
            String::from("std::monostate")
        } else {
            schema.names().collect::<Vec<_>>().join(", ")
        };
        self.line(format!("using {} = std::variant<{alternatives}>;", self.config.union_name));
        self.blank();
    }

    fn visitor(&mut self, schema: &Schema) {
        let config = self.config;
        let visitor = &config.visitor_name;
        self.line(format!("template <typename {RESULT_PARAM}>"));
        self.line(format!("class {visitor} {{"));
        self.line("public:");
        self.line(format!("{INDENT}virtual ~{visitor}() = default;"));
        if !schema.is_empty() {
            self.blank();
        }
        for name in schema.names() {
            self.line(format!(
                "{INDENT}virtual {RESULT_PARAM} visit(const {name}&) {{ return {RESULT_PARAM}(); }}"
            ));
        }
        self.line("};");
        self.blank();
    }

    fn definition(&mut self, schema: &Schema, node: &NodeDefinition) {
        let name = node.name();
        self.line(format!("class {name} {{"));
        self.line("public:");
        match node.fields() {
            [] => {
                self.line(format!("{INDENT}{name}() = default;"));
            }
            fields => {
                let params = fields.iter()
                    .map(|f| format!("{} {}", self.field_type(schema, f), f.name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let inits = fields.iter()
                    .map(|f| format!("{0}(std::move({0}))", f.name()))
                    .collect::<Vec<_>>()
                    .join(", ");
                let explicit = if fields.len() == 1 { "explicit " } else { "" };
                self.line(format!("{INDENT}{explicit}{name}({params})"));
                self.line(format!("{INDENT}{INDENT}: {inits} {{}}"));
                self.blank();
                for field in fields {
                    let member = format!("{INDENT}{} {};", self.field_type(schema, field), field.name());
                    self.line(member);
                }
            }
        }
        self.line("};");
        self.blank();
    }

    fn dispatch(&mut self, schema: &Schema) {
        if schema.is_empty() {
            return
        }
        let config = self.config;
        let (union_name, visitor_name) = (&config.union_name, &config.visitor_name);
        let r = RESULT_PARAM;
        self.line(format!("template <typename {r}>"));
        self.line(format!("{r} {DISPATCH_NAME}({visitor_name}<{r}>& v, const {union_name}& value) {{"));
        self.line(format!(
            "{INDENT}return std::visit([&v](const auto& alternative) -> {r} {{ return v.visit(alternative); }}, value);"
        ));
        self.line("}");
        self.blank();
    }

    fn trailer(&mut self) {
        if let Some(ns) = self.namespace() {
            self.line(format!("}} // namespace {ns}"));
            self.blank();
        }
        self.line(format!("#endif // {}", self.config.include_guard()));
    }

    // ————————————————————————————————————————————————————————————————————————
    // HELPERS
    // ————————————————————————————————————————————————————————————————————————

    /// Fields holding the union or another node are recursive shapes and go
    /// through a uniquely owning pointer; everything else is stored by value.
    fn field_type<'f>(&self, schema: &Schema, field: &'f FieldDescriptor) -> Cow<'f, str> {
        let ty = field.ty();
        if ty == self.config.union_name || schema.contains(ty) {
            Cow::Owned(format!("std::unique_ptr<{ty}>"))
        } else {
            Cow::Borrowed(ty)
        }
    }

    fn namespace(&self) -> Option<String> {
        let segments = self.config.namespace_segments().collect::<Vec<_>>();
        if segments.is_empty() { None } else { Some(segments.join("::")) }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_schema, parse_schema_with};

    const EXAMPLE: &str = "\
negation | expression operand
binary | expression lhs, token op, expression rhs
empty
";

    const EXAMPLE_HPP: &str = r#"// Generated by nodegen. Do not edit.
#ifndef AST_HPP
#define AST_HPP

#include <memory>
#include <utility>
#include <variant>

namespace ast {

class negation;
class binary;
class empty;

using expression = std::variant<negation, binary, empty>;

template <typename R>
class visitor {
public:
    virtual ~visitor() = default;

    virtual R visit(const negation&) { return R(); }
    virtual R visit(const binary&) { return R(); }
    virtual R visit(const empty&) { return R(); }
};

class negation {
public:
    explicit negation(std::unique_ptr<expression> operand)
        : operand(std::move(operand)) {}

    std::unique_ptr<expression> operand;
};

class binary {
public:
    binary(std::unique_ptr<expression> lhs, token op, std::unique_ptr<expression> rhs)
        : lhs(std::move(lhs)), op(std::move(op)), rhs(std::move(rhs)) {}

    std::unique_ptr<expression> lhs;
    token op;
    std::unique_ptr<expression> rhs;
};

class empty {
public:
    empty() = default;
};

template <typename R>
R dispatch(visitor<R>& v, const expression& value) {
    return std::visit([&v](const auto& alternative) -> R { return v.visit(alternative); }, value);
}

} // namespace ast

#endif // AST_HPP
"#;

    fn emit(source: &str) -> String {
        emit_declarations(&parse_schema(source).unwrap(), &Config::default())
    }

    fn position(haystack: &str, needle: &str) -> usize {
        haystack.find(needle).unwrap_or_else(|| panic!("missing {needle:?} in:\n{haystack}"))
    }

    #[test]
    fn three_node_example_matches_expected_header() {
        assert_eq!(emit(EXAMPLE), EXAMPLE_HPP);
    }

    #[test]
    fn output_is_deterministic() {
        let schema = parse_schema(EXAMPLE).unwrap();
        let config = Config::default();
        let first = emit_declarations(&schema, &config);
        let second = emit_declarations(&parse_schema(EXAMPLE).unwrap(), &config);
        assert_eq!(first, second);
        assert_eq!(first, emit_declarations(&schema, &config));
    }

    #[test]
    fn sections_follow_schema_order() {
        let out = emit(EXAMPLE);
        let forward = position(&out, "class negation;");
        let alias = position(&out, "using expression");
        let visitor = position(&out, "class visitor {");
        let first_def = position(&out, "class negation {");
        assert!(forward < alias && alias < visitor && visitor < first_def);

        for section in ["class {};", "visit(const {}&)", "class {} {{"] {
            let offsets = ["negation", "binary", "empty"]
                .map(|name| position(&out, &section.replace("{}", name).replace("{{", "{")));
            assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{section}: {offsets:?}");
        }
    }

    #[test]
    fn every_node_appears_exactly_once_per_section() {
        let out = emit(EXAMPLE);
        for name in ["negation", "binary", "empty"] {
            assert_eq!(out.matches(&format!("class {name};")).count(), 1);
            assert_eq!(out.matches(&format!("class {name} {{")).count(), 1);
            assert_eq!(out.matches(&format!("visit(const {name}&)")).count(), 1);
        }
        assert_eq!(out.matches("virtual R visit(").count(), 3);
    }

    #[test]
    fn zero_field_node_gets_default_constructor_only() {
        let out = emit("empty");
        assert!(out.contains("class empty {\npublic:\n    empty() = default;\n};\n"), "{out}");
        assert!(out.contains("using expression = std::variant<empty>;"));
    }

    #[test]
    fn node_typed_fields_are_owned_pointers() {
        let out = emit("literal | token value\ngroup | literal first, std::vector<expression> rest, group inner");
        assert!(out.contains(
            "group(std::unique_ptr<literal> first, std::vector<expression> rest, std::unique_ptr<group> inner)"
        ), "{out}");
        assert!(out.contains("    explicit literal(token value)\n"), "{out}");
        assert!(!out.contains("std::shared_ptr"));
    }

    #[test]
    fn constructor_arity_matches_field_count() {
        let out = emit(EXAMPLE);
        assert!(out.contains("explicit negation(std::unique_ptr<expression> operand)"));
        assert!(out.contains("binary(std::unique_ptr<expression> lhs, token op, std::unique_ptr<expression> rhs)"));
        assert!(out.contains("empty() = default;"));
    }

    #[test]
    fn configured_names_flow_through() {
        let config = Config {
            separator: '=',
            namespace: "pierogi::ast".into(),
            union_name: "node".into(),
            visitor_name: "walker".into(),
            includes: vec!["string".into(), "\"token.hpp\"".into()],
            ..Config::default()
        };
        let schema = parse_schema_with("call = std::string name, node callee", &config).unwrap();
        let out = emit_declarations(&schema, &config);
        assert!(out.starts_with("// Generated by nodegen. Do not edit.\n#ifndef PIEROGI_AST_HPP\n"));
        assert!(out.contains("#include <variant>\n#include <string>\n#include \"token.hpp\"\n"));
        assert!(out.contains("namespace pierogi::ast {"));
        assert!(out.contains("using node = std::variant<call>;"));
        assert!(out.contains("class walker {"));
        assert!(out.contains("R dispatch(walker<R>& v, const node& value)"));
        assert!(out.contains("call(std::string name, std::unique_ptr<node> callee)"));
        assert!(out.ends_with("} // namespace pierogi::ast\n\n#endif // PIEROGI_AST_HPP\n"));
    }

    #[test]
    fn global_namespace_has_no_namespace_block() {
        let config = Config { namespace: String::new(), ..Config::default() };
        let out = emit_declarations(&parse_schema("empty").unwrap(), &config);
        assert!(!out.contains("namespace"));
        assert!(out.contains("#include <variant>\n\nclass empty;\n"), "{out}");
        assert!(out.ends_with("}\n\n#endif // AST_HPP\n"));
    }

    #[test]
    fn empty_schema_still_renders_a_valid_header() {
        let out = emit("");
        assert!(out.contains("using expression = std::variant<std::monostate>;"));
        assert!(out.contains("class visitor {\npublic:\n    virtual ~visitor() = default;\n};\n"), "{out}");
        assert!(!out.contains("dispatch"));
    }
}
