//! Schema model: the ordered set of node types parsed from a `.nodes` file.
//!
//! Built once by the parser and read by the code generator. Nothing outside this
//! crate can construct or mutate a `Schema`, so every instance has passed
//! validation.
use indexmap::IndexMap;
use serde::Serialize;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One `<type> <name>` member of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    name: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDefinition {
    name: String,
    fields: Vec<FieldDescriptor>, // declaration order == constructor order
    #[serde(skip)]
    line: usize,
}

/// Node definitions keyed by name, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Schema {
    nodes: IndexMap<String, NodeDefinition>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FieldDescriptor {
    pub(crate) fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into() }
    }
    pub fn name(&self) -> &str { &self.name }
    /// The declared type, verbatim.
    pub fn ty(&self) -> &str { &self.ty }
}

impl NodeDefinition {
    pub(crate) fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>, line: usize) -> Self {
        Self { name: name.into(), fields, line }
    }
    pub fn name(&self) -> &str { &self.name }
    pub fn fields(&self) -> &[FieldDescriptor] { &self.fields }
    /// 1-based line of the definition in the schema source.
    pub fn line(&self) -> usize { self.line }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl Schema {
    /// Append a node. Hands the node back if its name is already taken.
    pub(crate) fn push(&mut self, node: NodeDefinition) -> Result<(), NodeDefinition> {
        if self.nodes.contains_key(&node.name) {
            return Err(node)
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NodeDefinition> {
        self.nodes.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &NodeDefinition> {
        self.nodes.values()
    }
    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
