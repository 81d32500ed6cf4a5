//! Schema: the fixed set of node and mark types a document may use.
//!
//! A [`Schema`] is compiled once from a serializable [`SchemaSpec`] and then
//! shared by every node created from it. Node types keep their compiled
//! [`ContentMatch`] automaton; the automaton refers to other types by id so
//! that types can recursively contain each other without reference cycles.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{ContentMatch, NameTable};
use crate::error::{ModelError, SchemaError};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;

/// Attribute values keyed by attribute name.
pub type Attrs = BTreeMap<String, Value>;

/// Role a node type plays inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    Table,
    Row,
    Cell,
    HeaderCell,
}

impl TableRole {
    /// Cells and header cells.
    pub fn is_cell(self) -> bool {
        match self {
            TableRole::Cell | TableRole::HeaderCell => true,
            TableRole::Table | TableRole::Row => false,
        }
    }
}

/// Declaration of one attribute. Attributes without a default are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Declaration of a node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    /// Content expression, e.g. `"block+"`. Empty for leaf nodes.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Space separated list of groups this type belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub atom: bool,
    /// Allowed marks: `"_"` for all, `""` for none, or space separated
    /// names. Unset means "all" for inline content and "none" otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttributeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_role: Option<TableRole>,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content = expr.into();
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    pub fn atom(mut self) -> Self {
        self.atom = true;
        self
    }

    pub fn marks(mut self, marks: impl Into<String>) -> Self {
        self.marks = Some(marks.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, default: Option<Value>) -> Self {
        self.attrs.insert(name.into(), AttributeSpec { default });
        self
    }

    pub fn table_role(mut self, role: TableRole) -> Self {
        self.table_role = Some(role);
        self
    }
}

/// Declaration of a mark type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttributeSpec>,
}

impl MarkSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }
}

/// Serializable description of a whole schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    /// Node types, in priority order.
    pub nodes: Vec<NodeSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<MarkSpec>,
    /// Name of the document node type. Defaults to `doc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_node: Option<String>,
}

fn compute_attrs(
    owner: &str,
    specs: &BTreeMap<String, AttributeSpec>,
    given: Option<&Attrs>,
) -> Result<Attrs, ModelError> {
    let mut attrs = Attrs::new();
    for (name, spec) in specs {
        let value = given
            .and_then(|g| g.get(name))
            .cloned()
            .or_else(|| spec.default.clone())
            .ok_or_else(|| ModelError::MissingAttribute {
                attr: name.clone(),
                owner: owner.to_string(),
            })?;
        attrs.insert(name.clone(), value);
    }
    Ok(attrs)
}

struct NodeTypeInner {
    id: usize,
    name: String,
    groups: Vec<String>,
    inline: bool,
    atom: bool,
    is_text: bool,
    is_top: bool,
    attrs: BTreeMap<String, AttributeSpec>,
    /// `None` allows every mark.
    mark_set: Option<Vec<String>>,
    table_role: Option<TableRole>,
    content: ContentMatch,
}

/// A node type. Cheap to clone; all nodes of a type share it.
#[derive(Clone)]
pub struct NodeType {
    inner: Arc<NodeTypeInner>,
}

impl NodeType {
    /// Index of this type in its schema.
    pub fn id(&self) -> usize {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn groups(&self) -> &[String] {
        &self.inner.groups
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.inner.groups.iter().any(|g| g == group)
    }

    pub fn is_inline(&self) -> bool {
        self.inner.inline
    }

    pub fn is_block(&self) -> bool {
        !self.inner.inline && !self.inner.is_text
    }

    pub fn is_text(&self) -> bool {
        self.inner.is_text
    }

    /// The schema's top (document) node type.
    pub fn is_top(&self) -> bool {
        self.inner.is_top
    }

    /// Leaf types accept no content.
    pub fn is_leaf(&self) -> bool {
        self.inner.content.edge_count() == 0 && self.inner.content.valid_end()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.inner.atom
    }

    pub fn inline_content(&self) -> bool {
        self.inner.content.inline_content()
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content()
    }

    pub fn table_role(&self) -> Option<TableRole> {
        self.inner.table_role
    }

    pub fn attr_specs(&self) -> &BTreeMap<String, AttributeSpec> {
        &self.inner.attrs
    }

    /// Start state of this type's content automaton.
    pub fn content_match(&self) -> &ContentMatch {
        &self.inner.content
    }

    /// Build a node of this type. Attributes are completed from their
    /// defaults; content is not checked (see [`create_checked`]).
    ///
    /// [`create_checked`]: NodeType::create_checked
    pub fn create(
        &self,
        attrs: Option<&Attrs>,
        content: impl Into<Fragment>,
        marks: &[Mark],
    ) -> Result<Node, ModelError> {
        if self.is_text() {
            return Err(ModelError::TextViaCreate);
        }
        let attrs = compute_attrs(self.name(), &self.inner.attrs, attrs)?;
        Ok(Node::new_branch(
            self.clone(),
            attrs,
            content.into(),
            Mark::set_from(marks),
        ))
    }

    /// Like [`create`](NodeType::create), but rejects content that does
    /// not satisfy this type's content expression.
    pub fn create_checked(
        &self,
        attrs: Option<&Attrs>,
        content: impl Into<Fragment>,
        marks: &[Mark],
    ) -> Result<Node, ModelError> {
        let content = content.into();
        self.check_content(&content)?;
        self.create(attrs, content, marks)
    }

    /// True when `content` is a complete, valid child sequence for this
    /// type, including the marks on the children.
    pub fn valid_content(&self, content: &Fragment) -> bool {
        let complete = self
            .inner
            .content
            .match_fragment(content)
            .is_some_and(|m| m.valid_end());
        complete && content.iter().all(|child| self.allows_marks(child.marks()))
    }

    pub fn check_content(&self, content: &Fragment) -> Result<(), ModelError> {
        if self.valid_content(content) {
            Ok(())
        } else {
            Err(ModelError::InvalidContent {
                node: self.name().to_string(),
                content: content.to_string(),
            })
        }
    }

    /// Whether nodes of `other` could be joined onto nodes of this type.
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        self == other || self.inner.content.compatible(&other.inner.content)
    }

    pub fn allows_mark_type(&self, mark_type: &MarkType) -> bool {
        match &self.inner.mark_set {
            None => true,
            Some(names) => names.iter().any(|n| n == mark_type.name()),
        }
    }

    pub fn allows_marks(&self, marks: &[Mark]) -> bool {
        marks.iter().all(|m| self.allows_mark_type(m.mark_type()))
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.id == other.inner.id && self.inner.name == other.inner.name)
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name())
    }
}

struct MarkTypeInner {
    name: String,
    rank: usize,
    attrs: BTreeMap<String, AttributeSpec>,
}

/// A mark type. Marks in a set are ordered by rank.
#[derive(Clone)]
pub struct MarkType {
    inner: Arc<MarkTypeInner>,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn rank(&self) -> usize {
        self.inner.rank
    }

    pub fn create(&self, attrs: Option<&Attrs>) -> Result<Mark, ModelError> {
        let attrs = compute_attrs(self.name(), &self.inner.attrs, attrs)?;
        Ok(Mark::new(self.clone(), attrs))
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.rank == other.inner.rank && self.inner.name == other.inner.name)
    }
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.name())
    }
}

struct SchemaInner {
    spec: SchemaSpec,
    nodes: Vec<NodeType>,
    node_ids: HashMap<String, usize>,
    marks: Vec<MarkType>,
    top_node: usize,
    text: usize,
}

/// A compiled schema. Cheap to clone.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
        let mut node_ids = HashMap::new();
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        let mut inline = Vec::with_capacity(spec.nodes.len());

        for (id, node) in spec.nodes.iter().enumerate() {
            if node_ids.insert(node.name.clone(), id).is_some() {
                return Err(SchemaError::DuplicateNodeType(node.name.clone()));
            }
            for group in node.group.iter().flat_map(|g| g.split_whitespace()) {
                groups.entry(group.to_string()).or_default().push(id);
            }
            inline.push(node.inline || node.name == "text");
        }

        let top_name = spec.top_node.clone().unwrap_or_else(|| "doc".to_string());
        let top_node = *node_ids
            .get(&top_name)
            .ok_or_else(|| SchemaError::MissingTopNode(top_name.clone()))?;
        let text = *node_ids.get("text").ok_or(SchemaError::MissingTextType)?;

        let mut mark_names = HashMap::new();
        let mut marks = Vec::with_capacity(spec.marks.len());
        for (rank, mark) in spec.marks.iter().enumerate() {
            if mark_names.insert(mark.name.clone(), rank).is_some() {
                return Err(SchemaError::DuplicateMarkType(mark.name.clone()));
            }
            marks.push(MarkType {
                inner: Arc::new(MarkTypeInner {
                    name: mark.name.clone(),
                    rank,
                    attrs: mark.attrs.clone(),
                }),
            });
        }

        let names = NameTable {
            types: &node_ids,
            groups: &groups,
            inline: &inline,
        };

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        for (id, node) in spec.nodes.iter().enumerate() {
            let content = ContentMatch::parse(&node.content, &names)?;
            let mark_set = match node.marks.as_deref() {
                Some("_") => None,
                Some(list) => {
                    let mut allowed = Vec::new();
                    for name in list.split_whitespace() {
                        if !mark_names.contains_key(name) {
                            return Err(SchemaError::UnknownMark {
                                name: name.to_string(),
                                node: node.name.clone(),
                            });
                        }
                        allowed.push(name.to_string());
                    }
                    Some(allowed)
                }
                None if content.inline_content() => None,
                None => Some(Vec::new()),
            };

            nodes.push(NodeType {
                inner: Arc::new(NodeTypeInner {
                    id,
                    name: node.name.clone(),
                    groups: node
                        .group
                        .iter()
                        .flat_map(|g| g.split_whitespace())
                        .map(str::to_string)
                        .collect(),
                    inline: inline[id],
                    atom: node.atom,
                    is_text: id == text,
                    is_top: id == top_node,
                    attrs: node.attrs.clone(),
                    mark_set,
                    table_role: node.table_role,
                    content,
                }),
            });
        }

        log::debug!(
            "compiled schema with {} node types and {} mark types",
            nodes.len(),
            marks.len()
        );

        Ok(Self {
            inner: Arc::new(SchemaInner {
                spec,
                nodes,
                node_ids,
                marks,
                top_node,
                text,
            }),
        })
    }

    pub fn spec(&self) -> &SchemaSpec {
        &self.inner.spec
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.inner
            .node_ids
            .get(name)
            .map(|&id| &self.inner.nodes[id])
    }

    pub fn node_type_by_id(&self, id: usize) -> Option<&NodeType> {
        self.inner.nodes.get(id)
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.inner.nodes
    }

    pub fn mark_type(&self, name: &str) -> Option<&MarkType> {
        self.inner.marks.iter().find(|m| m.name() == name)
    }

    pub fn top_node_type(&self) -> &NodeType {
        &self.inner.nodes[self.inner.top_node]
    }

    pub fn text_type(&self) -> &NodeType {
        &self.inner.nodes[self.inner.text]
    }

    /// Create a node by type name, checking its content.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<&Attrs>,
        content: impl Into<Fragment>,
        marks: &[Mark],
    ) -> Result<Node, ModelError> {
        self.node_type(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))?
            .create_checked(attrs, content, marks)
    }

    /// Create a text node. Empty text is rejected.
    pub fn text(&self, text: impl Into<String>, marks: &[Mark]) -> Result<Node, ModelError> {
        let text = text.into();
        if text.is_empty() {
            return Err(ModelError::EmptyText);
        }
        Ok(Node::new_text(
            self.text_type().clone(),
            text,
            Mark::set_from(marks),
        ))
    }

    /// Create a mark by type name.
    pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> Result<Mark, ModelError> {
        self.mark_type(name)
            .ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))?
            .create(attrs)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.inner.nodes)
            .field("marks", &self.inner.marks)
            .finish()
    }
}
