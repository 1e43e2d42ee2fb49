//! Parse-tree nodes consumed by the evaluator.
//!
//! Nodes are produced once (by a parser, by deserializing a JSON/YAML
//! document, or with the builder helpers below) and are read-only
//! afterwards. The meaning of each slot depends on the [`NodeKind`]:
//!
//! | kind | name | value | related | args | children |
//! |---|---|---|---|---|---|
//! | `root` / `sequence` | | | | | statements |
//! | `import` | script path | | | | |
//! | `entity` | formal name (optional) | | parent identifier | primary key | fields |
//! | `field` | field name | | field expression | | |
//! | `builtin` | builtin type | | | arguments | |
//! | `generation` | | | entity expression | count | |
//! | `declaration` / `assignment` | symbol | | expression | | |
//! | `identifier` | symbol | | | | |
//! | `literal` | | scalar | | | |
//! | `collection` | | | | | elements |
//! | `distribution` | distribution kind | | | | intervals |
//! | `weighted` | | weight | interval | | |
//! | `range` | | | | 0..=2 bounds | |
//! | `primary_key` | key name | key kind | | | |
//! | `binary` | operator | | | | lhs, rhs |
//! | `lambda` | | | | parameters | body |
//! | `call` | | | callee | arguments | |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Sequence,
    Import,
    Entity,
    Field,
    Builtin,
    Generation,
    Declaration,
    Assignment,
    Identifier,
    Literal,
    Collection,
    Distribution,
    Weighted,
    Range,
    PrimaryKey,
    Binary,
    Lambda,
    Call,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Sequence => "sequence",
            NodeKind::Import => "import",
            NodeKind::Entity => "entity",
            NodeKind::Field => "field",
            NodeKind::Builtin => "builtin",
            NodeKind::Generation => "generation",
            NodeKind::Declaration => "declaration",
            NodeKind::Assignment => "assignment",
            NodeKind::Identifier => "identifier",
            NodeKind::Literal => "literal",
            NodeKind::Collection => "collection",
            NodeKind::Distribution => "distribution",
            NodeKind::Weighted => "weighted",
            NodeKind::Range => "range",
            NodeKind::PrimaryKey => "primary_key",
            NodeKind::Binary => "binary",
            NodeKind::Lambda => "lambda",
            NodeKind::Call => "call",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar payload of a literal node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(DateTime<Utc>),
}

/// Source position of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub col: u32,
    #[serde(default)]
    pub offset: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, col: u32, offset: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col,
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{} [byte {}]", self.file, self.line, self.col, self.offset)
    }
}

/// A single parse-tree unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NodeValue>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Node>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Box<Node>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_range: Option<Box<Node>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            value: None,
            args: Vec::new(),
            children: Vec::new(),
            related: None,
            count_range: None,
            unique: false,
            location: None,
        }
    }

    pub fn root(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Root).with_children(children)
    }

    pub fn sequence(children: Vec<Node>) -> Self {
        Self::new(NodeKind::Sequence).with_children(children)
    }

    /// Import of another script, relative to the importing script's directory.
    pub fn import(path: &str) -> Self {
        Self::new(NodeKind::Import).with_name(path)
    }

    /// Entity declaration. An empty `name` declares an anonymous entity.
    pub fn entity(name: &str, fields: Vec<Node>) -> Self {
        let node = Self::new(NodeKind::Entity).with_children(fields);
        if name.is_empty() {
            node
        } else {
            node.with_name(name)
        }
    }

    pub fn field(name: &str, expr: Node) -> Self {
        Self::new(NodeKind::Field)
            .with_name(name)
            .with_related(expr)
    }

    pub fn builtin(type_name: &str, args: Vec<Node>) -> Self {
        Self::new(NodeKind::Builtin)
            .with_name(type_name)
            .with_args(args)
    }

    pub fn generation(target: Node, count: Node) -> Self {
        Self::new(NodeKind::Generation)
            .with_related(target)
            .with_args(vec![count])
    }

    pub fn declaration(name: &str, expr: Node) -> Self {
        Self::new(NodeKind::Declaration)
            .with_name(name)
            .with_related(expr)
    }

    pub fn assignment(name: &str, expr: Node) -> Self {
        Self::new(NodeKind::Assignment)
            .with_name(name)
            .with_related(expr)
    }

    pub fn identifier(name: &str) -> Self {
        Self::new(NodeKind::Identifier).with_name(name)
    }

    pub fn literal(value: NodeValue) -> Self {
        let mut node = Self::new(NodeKind::Literal);
        node.value = Some(value);
        node
    }

    pub fn null() -> Self {
        Self::literal(NodeValue::Null)
    }

    pub fn int(value: i64) -> Self {
        Self::literal(NodeValue::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::literal(NodeValue::Float(value))
    }

    pub fn string(value: &str) -> Self {
        Self::literal(NodeValue::Str(value.to_string()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(NodeValue::Bool(value))
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Self::literal(NodeValue::Date(value))
    }

    pub fn collection(elements: Vec<Node>) -> Self {
        Self::new(NodeKind::Collection).with_children(elements)
    }

    pub fn distribution(kind: &str, intervals: Vec<Node>) -> Self {
        Self::new(NodeKind::Distribution)
            .with_name(kind)
            .with_children(intervals)
    }

    pub fn weighted(weight: f64, interval: Node) -> Self {
        let mut node = Self::new(NodeKind::Weighted).with_related(interval);
        node.value = Some(NodeValue::Float(weight));
        node
    }

    pub fn range(bounds: Vec<Node>) -> Self {
        Self::new(NodeKind::Range).with_args(bounds)
    }

    pub fn primary_key(name: &str, kind: &str) -> Self {
        let mut node = Self::new(NodeKind::PrimaryKey).with_name(name);
        node.value = Some(NodeValue::Str(kind.to_string()));
        node
    }

    pub fn binary(operator: &str, lhs: Node, rhs: Node) -> Self {
        Self::new(NodeKind::Binary)
            .with_name(operator)
            .with_children(vec![lhs, rhs])
    }

    pub fn lambda(params: &[&str], body: Vec<Node>) -> Self {
        let params = params.iter().map(|p| Self::identifier(p)).collect();
        Self::new(NodeKind::Lambda)
            .with_args(params)
            .with_children(body)
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Self {
        Self::new(NodeKind::Call).with_related(callee).with_args(args)
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_args(mut self, args: Vec<Node>) -> Self {
        self.args = args;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_related(mut self, related: Node) -> Self {
        self.related = Some(Box::new(related));
        self
    }

    /// Attach a count range `[min, max]` to a field node.
    pub fn with_count(mut self, min: i64, max: i64) -> Self {
        self.count_range = Some(Box::new(Self::range(vec![
            Self::int(min),
            Self::int(max),
        ])));
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Declare the entity this entity node extends.
    pub fn extending(self, parent: &str) -> Self {
        self.with_related(Self::identifier(parent))
    }

    /// Attach a primary key declaration to an entity node.
    pub fn with_primary_key(mut self, name: &str, kind: &str) -> Self {
        self.args.push(Self::primary_key(name, kind));
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn related_node(&self) -> Option<&Node> {
        self.related.as_deref()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ Kind: {:?}", self.kind.as_str())?;
        if let Some(location) = &self.location {
            write!(f, ", Ref: \"{location}\"")?;
        }
        if let Some(name) = &self.name {
            write!(f, ", Name: {name:?}")?;
        }
        if let Some(value) = &self.value {
            write!(f, ", Value: {value:?}")?;
        }
        write!(f, " }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_fill_expected_slots() {
        let field = Node::field("age", Node::builtin("integer", vec![Node::int(1), Node::int(10)]))
            .with_count(2, 4)
            .with_unique();

        assert_eq!(field.kind, NodeKind::Field);
        assert_eq!(field.name.as_deref(), Some("age"));
        assert!(field.unique);

        let expr = field.related_node().unwrap();
        assert_eq!(expr.kind, NodeKind::Builtin);
        assert_eq!(expr.args.len(), 2);

        let range = field.count_range.as_deref().unwrap();
        assert_eq!(range.kind, NodeKind::Range);
        assert_eq!(range.args[1].value, Some(NodeValue::Int(4)));
    }

    #[test]
    fn test_import_keeps_path_in_name() {
        let node = Node::import("shared/people.yaml");
        assert_eq!(node.kind, NodeKind::Import);
        assert_eq!(node.name_or_empty(), "shared/people.yaml");
        assert_eq!(node.kind.to_string(), "import");
    }

    #[test]
    fn test_anonymous_entity_has_no_name() {
        assert_eq!(Node::entity("", vec![]).name, None);
        assert_eq!(Node::entity("Person", vec![]).name_or_empty(), "Person");
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let yaml = r#"
kind: root
children:
  - kind: entity
    name: Person
    children:
      - kind: field
        name: name
        related:
          kind: builtin
          name: string
          args:
            - kind: literal
              value: { int: 5 }
  - kind: generation
    related: { kind: identifier, name: Person }
    args:
      - kind: literal
        value: { int: 3 }
"#;
        let tree: Node = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(tree.kind, NodeKind::Root);
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].children[0].name.as_deref(), Some("name"));
        assert_eq!(tree.children[1].args[0].value, Some(NodeValue::Int(3)));
    }

    #[test]
    fn test_location_display() {
        let location = Location::new("person.lang", 3, 7, 42);
        assert_eq!(location.to_string(), "person.lang:3:7 [byte 42]");
    }
}
