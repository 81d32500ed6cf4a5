use std::fmt;

use crate::error::ModelError;
use crate::node::Node;

/// An ordered, immutable sequence of sibling nodes.
///
/// Adjacent text nodes with the same marks are merged when a fragment is
/// built, so `[text("a"), text("b")]` becomes a single `"ab"` node.
#[derive(Clone, Default, PartialEq)]
pub struct Fragment {
    nodes: Vec<Node>,
    size: usize,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a fragment, merging adjacent text nodes with equal marks.
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut joined: Vec<Node> = Vec::new();
        for node in nodes {
            push_joined(&mut joined, node);
        }
        let size = joined.iter().map(Node::node_size).sum();
        Self {
            nodes: joined,
            size,
        }
    }

    /// Total size of the fragment's content.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The child at `index`. Panics when out of bounds, like slice indexing;
    /// use [`maybe_child`](Fragment::maybe_child) when unsure.
    pub fn child(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Concatenate, joining text at the seam when possible.
    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut nodes = self.nodes.clone();
        for node in other.iter() {
            push_joined(&mut nodes, node.clone());
        }
        let size = nodes.iter().map(Node::node_size).sum();
        Fragment { nodes, size }
    }

    pub fn add_to_start(&self, node: Node) -> Fragment {
        Fragment::from(node).append(self)
    }

    pub fn add_to_end(&self, node: Node) -> Fragment {
        self.append(&Fragment::from(node))
    }

    /// Replace the child at `index`.
    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        if self.nodes.get(index).is_some_and(|current| *current == node) {
            return self.clone();
        }
        let mut nodes = self.nodes.clone();
        let size = self.size + node.node_size() - nodes[index].node_size();
        nodes[index] = node;
        Fragment { nodes, size }
    }

    /// The fragment between the two content offsets, cutting partially
    /// covered children.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to >= self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        let mut pos = 0;
        if to > from {
            for child in &self.nodes {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let piece = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), (to - pos).min(child.text_len()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to - pos - 1).min(child.content().size()),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    result.push(piece);
                }
                pos = end;
            }
        }
        let size = result.iter().map(Node::node_size).sum();
        Fragment {
            nodes: result,
            size,
        }
    }

    /// The children with index in `from..to`.
    pub fn cut_by_index(&self, from: usize, to: usize) -> Fragment {
        if from == 0 && to >= self.nodes.len() {
            return self.clone();
        }
        let nodes: Vec<Node> = self.nodes[from..to.min(self.nodes.len())].to_vec();
        let size = nodes.iter().map(Node::node_size).sum();
        Fragment { nodes, size }
    }

    /// Find the child containing `pos`, returning its index and start
    /// offset. A position on a boundary resolves to the child after it.
    pub fn find_index(&self, pos: usize) -> Result<(usize, usize), ModelError> {
        if pos == 0 {
            return Ok((0, 0));
        }
        if pos == self.size {
            return Ok((self.nodes.len(), pos));
        }
        if pos > self.size {
            return Err(ModelError::PositionOutOfRange {
                pos,
                size: self.size,
            });
        }
        let mut cur = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos {
                    return Ok((i + 1, end));
                }
                return Ok((i, cur));
            }
            cur = end;
        }
        Err(ModelError::PositionOutOfRange {
            pos,
            size: self.size,
        })
    }

    pub(crate) fn to_string_inner(&self) -> String {
        self.nodes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn push_joined(nodes: &mut Vec<Node>, node: Node) {
    if let Some(last) = nodes.last_mut()
        && last.is_text()
        && node.is_text()
        && last.same_markup(&node)
    {
        let joined = format!("{}{}", last.text().unwrap_or(""), node.text().unwrap_or(""));
        *last = last.with_text(joined);
        return;
    }
    nodes.push(node);
}

impl From<Node> for Fragment {
    fn from(node: Node) -> Self {
        let size = node.node_size();
        Fragment {
            nodes: vec![node],
            size,
        }
    }
}

impl From<&Node> for Fragment {
    fn from(node: &Node) -> Self {
        Fragment::from(node.clone())
    }
}

impl From<Vec<Node>> for Fragment {
    fn from(nodes: Vec<Node>) -> Self {
        Fragment::from_nodes(nodes)
    }
}

impl From<Option<Node>> for Fragment {
    fn from(node: Option<Node>) -> Self {
        node.map(Fragment::from).unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.to_string_inner())
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
