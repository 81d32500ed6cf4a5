//! Resolved positions.
//!
//! A position is a single integer counting tokens in the document's
//! flattened content: every character of text is one token, a leaf node is
//! one token and every other node contributes an opening and a closing
//! token around its content.
//!
//! ```text
//!   0   1 2 3 4    5
//!    <p> O n e </p>
//! ```
//!
//! [`ResolvedPos`] turns such an integer into the path of ancestors that
//! contain it, so callers can ask which node a position is in, at what
//! index, and where that node starts and ends.

use std::fmt;

use crate::error::ModelError;
use crate::node::Node;

#[derive(Clone)]
struct PathEntry {
    node: Node,
    /// Index of the child the position points into (or before).
    index: usize,
    /// Absolute position of the start of that child.
    offset: usize,
}

/// A position together with the chain of nodes containing it.
///
/// Depth 0 is the document itself; [`depth`](ResolvedPos::depth) is the
/// depth of the innermost node whose content holds the position.
#[derive(Clone)]
pub struct ResolvedPos {
    pos: usize,
    path: Vec<PathEntry>,
    parent_offset: usize,
}

impl ResolvedPos {
    pub(crate) fn resolve(doc: &Node, pos: usize) -> Result<Self, ModelError> {
        let size = doc.content().size();
        if pos > size {
            return Err(ModelError::PositionOutOfRange { pos, size });
        }

        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc.clone();
        loop {
            let (index, offset) = node.content().find_index(parent_offset)?;
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node: node.clone(),
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            let child = node.child(index).clone();
            if child.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
            node = child;
        }

        log::trace!("resolved {pos} to depth {}", path.len() - 1);
        Ok(Self {
            pos,
            path,
            parent_offset,
        })
    }

    /// The position that was resolved.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Offset of the position inside its parent's content.
    pub fn parent_offset(&self) -> usize {
        self.parent_offset
    }

    /// The ancestor at `depth`. Panics when `depth > self.depth()`.
    pub fn node(&self, depth: usize) -> &Node {
        &self.path[depth].node
    }

    /// The innermost node whose content holds the position.
    pub fn parent(&self) -> &Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &Node {
        self.node(0)
    }

    /// Index of the child the position points into, within the ancestor
    /// at `depth`.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Index pointing after this position in the ancestor at `depth`.
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Absolute position where the content of the ancestor at `depth`
    /// starts.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    /// Absolute position where the content of the ancestor at `depth`
    /// ends.
    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// Position directly before the ancestor at `depth`. The document has
    /// no position before it, so depth 0 yields `None`.
    pub fn before(&self, depth: usize) -> Option<usize> {
        match depth {
            0 => None,
            d if d == self.depth() + 1 => Some(self.pos),
            d => Some(self.path[d - 1].offset),
        }
    }

    /// Position directly after the ancestor at `depth`.
    pub fn after(&self, depth: usize) -> Option<usize> {
        match depth {
            0 => None,
            d if d == self.depth() + 1 => {
                Some(self.pos + self.node_after().map_or(0, |n| n.node_size()))
            }
            d => Some(self.path[d - 1].offset + self.node(d).node_size()),
        }
    }

    /// Distance into a text node when the position points into one.
    pub fn text_offset(&self) -> usize {
        self.path.last().map_or(0, |entry| self.pos - entry.offset)
    }

    /// The node directly after the position, cut if the position is
    /// inside a text node.
    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let child = parent.maybe_child(index)?;
        match self.text_offset() {
            0 => Some(child.clone()),
            off => Some(child.cut(off, child.node_size())),
        }
    }

    /// The node directly before the position, cut if the position is
    /// inside a text node.
    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        match self.text_offset() {
            0 => index.checked_sub(1).map(|i| parent.child(i).clone()),
            off => Some(parent.child(index).cut(0, off)),
        }
    }

    /// Absolute position of the child at `index` of the ancestor at
    /// `depth`.
    pub fn pos_at_index(&self, index: usize, depth: usize) -> usize {
        let node = self.node(depth);
        node.content()
            .iter()
            .take(index)
            .fold(self.start(depth), |pos, child| pos + child.node_size())
    }

    /// Deepest depth whose node contains both this position and `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        (1..=self.depth())
            .rev()
            .find(|&depth| self.start(depth) <= pos && self.end(depth) >= pos)
            .unwrap_or(0)
    }

    pub fn same_parent(&self, other: &ResolvedPos) -> bool {
        self.pos - self.parent_offset == other.pos - other.parent_offset
    }
}

impl fmt::Display for ResolvedPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for depth in 1..=self.depth() {
            if depth > 1 {
                f.write_str("/")?;
            }
            write!(
                f,
                "{}_{}",
                self.node(depth).node_type().name(),
                self.index(depth - 1)
            )?;
        }
        write!(f, ":{}", self.parent_offset)
    }
}

impl fmt::Debug for ResolvedPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolvedPos({} {self})", self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{atom_inline, td_empty};
    use crate::{doc, p, strong, table, td, tr};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn rejects_positions_past_the_end() {
        let d = doc![p!["one"]];
        assert_eq!(
            d.node().resolve(6).unwrap_err(),
            ModelError::PositionOutOfRange { pos: 6, size: 5 }
        );
        assert!(d.node().resolve(5).is_ok());
    }

    #[rstest]
    #[case(0, 0, 0, 0)]
    #[case(1, 1, 0, 0)]
    #[case(3, 1, 0, 2)]
    #[case(4, 1, 1, 3)]
    #[case(5, 0, 1, 5)]
    fn resolves_depth_index_and_offset(
        #[case] pos: usize,
        #[case] depth: usize,
        #[case] index: usize,
        #[case] parent_offset: usize,
    ) {
        let d = doc![p!["one"]];
        let rp = d.node().resolve(pos).unwrap();
        assert_eq!(rp.depth(), depth);
        assert_eq!(rp.index(depth), index);
        assert_eq!(rp.parent_offset(), parent_offset);
    }

    #[test]
    fn ancestors_are_the_document_nodes() {
        let d = doc![p!["x"], p![strong!["zero"], "o<a>ne"]];
        let rp = d.node().resolve(d.tag("a")).unwrap();
        assert_eq!(rp.depth(), 1);
        assert_eq!(*rp.doc(), *d.node());
        assert_eq!(*rp.parent(), *d.node().child(1));
        assert_eq!(rp.start(1), 4);
        assert_eq!(rp.end(1), 11);
        assert_eq!(rp.before(1), Some(3));
        assert_eq!(rp.after(1), Some(12));
        assert_eq!(rp.before(0), None);
        assert_eq!(rp.text_offset(), 1);
        assert_eq!(rp.index(1), 1);
        assert_eq!(rp.index_after(1), 2);
    }

    #[test]
    fn nodes_around_a_position_are_cut_from_text() {
        let d = doc![p!["o<a>ne", atom_inline()]];
        let rp = d.node().resolve(d.tag("a")).unwrap();
        assert_eq!(rp.node_before().unwrap().text(), Some("o"));
        assert_eq!(rp.node_after().unwrap().text(), Some("ne"));

        let rp = d.node().resolve(4).unwrap();
        assert_eq!(rp.node_before().unwrap().text(), Some("one"));
        assert_eq!(rp.node_after().unwrap().node_type().name(), "atom_inline");

        let rp = d.node().resolve(1).unwrap();
        assert!(rp.node_before().is_none());
    }

    #[test]
    fn resolves_inside_table_cells() {
        let d = doc![table![tr![td![p!["<a>"]], td_empty()], tr![td_empty(), td_empty()]]];
        let rp = d.node().resolve(d.tag("a")).unwrap();
        assert_eq!(d.tag("a"), 4);
        assert_eq!(rp.depth(), 4);
        assert_eq!(rp.node(3).node_type().name(), "table_cell");
        assert_eq!(rp.before(3), Some(2));
        assert_eq!(rp.start(3), 3);
        assert_eq!(rp.to_string(), "table_0/table_row_0/table_cell_0/paragraph_0:0");
    }

    #[test]
    fn shared_depth_and_pos_at_index() {
        let d = doc![p!["ab"], p!["cd"]];
        let rp = d.node().resolve(2).unwrap();
        assert_eq!(rp.shared_depth(3), 1);
        assert_eq!(rp.shared_depth(5), 0);
        assert_eq!(rp.pos_at_index(1, 0), 4);
        assert!(rp.same_parent(&d.node().resolve(1).unwrap()));
        assert!(!rp.same_parent(&d.node().resolve(5).unwrap()));
    }
}
