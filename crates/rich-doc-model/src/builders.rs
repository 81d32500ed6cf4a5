//! Test fixtures over [`basic_schema`].
//!
//! ```
//! use rich_doc_model::{doc, p, strong};
//!
//! let d = doc![p![strong!["zero"], "o<a>ne"]];
//! assert_eq!(d.tag("a"), 6);
//! assert_eq!(d.node().to_string(), r#"doc(paragraph(strong("zero"), "one"))"#);
//! ```
//!
//! Text arguments may contain `<name>` tags. They are stripped from the
//! text and their positions, relative to the start of the built node's
//! content, are available through [`Tagged::tag`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::basic::basic_schema;
use crate::fragment::Fragment;
use crate::node::Node;

/// A built node with the positions of the tags found in its text.
#[derive(Debug, Clone)]
pub struct Tagged {
    node: Node,
    tags: BTreeMap<String, usize>,
}

impl Tagged {
    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn into_node(self) -> Node {
        self.node
    }

    pub fn tags(&self) -> &BTreeMap<String, usize> {
        &self.tags
    }

    /// Position of tag `name`. Panics if the fixture has no such tag.
    pub fn tag(&self, name: &str) -> usize {
        match self.tags.get(name) {
            Some(&pos) => pos,
            None => panic!("fixture has no tag <{name}>"),
        }
    }
}

/// Children for a builder: plain text, built nodes, or marked runs.
#[derive(Debug, Clone, Default)]
pub struct Content {
    nodes: Vec<Node>,
    tags: BTreeMap<String, usize>,
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| match Regex::new(r"<(\w+)>") {
        Ok(re) => re,
        Err(err) => unreachable!("tag pattern: {err}"),
    })
}

impl From<&str> for Content {
    fn from(source: &str) -> Self {
        let mut text = String::new();
        let mut tags = BTreeMap::new();
        let mut last = 0;
        for caps in tag_pattern().captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            text.push_str(&source[last..whole.start()]);
            tags.insert(name.as_str().to_string(), text.chars().count());
            last = whole.end();
        }
        text.push_str(&source[last..]);

        let nodes = basic_schema().text(text, &[]).into_iter().collect();
        Self { nodes, tags }
    }
}

impl From<Tagged> for Content {
    fn from(tagged: Tagged) -> Self {
        // tags inside a node sit after its opening token
        let tags = tagged.tags.into_iter().map(|(k, v)| (k, v + 1)).collect();
        Self {
            nodes: vec![tagged.node],
            tags,
        }
    }
}

impl From<Node> for Content {
    fn from(node: Node) -> Self {
        Self {
            nodes: vec![node],
            tags: BTreeMap::new(),
        }
    }
}

fn flatten(children: Vec<Content>) -> Content {
    let mut out = Content::default();
    let mut pos = 0;
    for child in children {
        for (name, offset) in child.tags {
            out.tags.insert(name, pos + offset);
        }
        pos += child.nodes.iter().map(Node::node_size).sum::<usize>();
        out.nodes.extend(child.nodes);
    }
    out
}

/// Build a node of the basic schema. Panics on content the schema rejects.
pub fn node(name: &str, children: Vec<Content>) -> Tagged {
    let Content { nodes, tags } = flatten(children);
    match basic_schema().node(name, None, Fragment::from_nodes(nodes), &[]) {
        Ok(node) => Tagged { node, tags },
        Err(err) => panic!("invalid {name} fixture: {err}"),
    }
}

/// Add mark `name` to every child.
pub fn mark(name: &str, children: Vec<Content>) -> Content {
    let mark = match basic_schema().mark(name, None) {
        Ok(mark) => mark,
        Err(err) => panic!("invalid mark fixture: {err}"),
    };
    let Content { nodes, tags } = flatten(children);
    let nodes = nodes
        .into_iter()
        .map(|n| {
            let marks = mark.add_to_set(n.marks());
            n.mark(marks)
        })
        .collect();
    Content { nodes, tags }
}

/// A table cell holding one empty paragraph.
pub fn td_empty() -> Tagged {
    node("table_cell", vec![node("paragraph", vec![]).into()])
}

pub fn atom_inline() -> Node {
    node("atom_inline", vec![]).into_node()
}

pub fn atom_block() -> Node {
    node("atom_block", vec![]).into_node()
}

#[macro_export]
macro_rules! doc {
    ($($child:expr),* $(,)?) => {
        $crate::builders::node("doc", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! p {
    ($($child:expr),* $(,)?) => {
        $crate::builders::node("paragraph", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! table {
    ($($child:expr),* $(,)?) => {
        $crate::builders::node("table", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! tr {
    ($($child:expr),* $(,)?) => {
        $crate::builders::node("table_row", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! td {
    ($($child:expr),* $(,)?) => {
        $crate::builders::node("table_cell", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! th {
    ($($child:expr),* $(,)?) => {
        $crate::builders::node("table_header", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! strong {
    ($($child:expr),* $(,)?) => {
        $crate::builders::mark("strong", vec![$($crate::builders::Content::from($child)),*])
    };
}

#[macro_export]
macro_rules! em {
    ($($child:expr),* $(,)?) => {
        $crate::builders::mark("em", vec![$($crate::builders::Content::from($child)),*])
    };
}
