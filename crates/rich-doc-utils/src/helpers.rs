//! Insertion checks, node removal and cell lookup.

use rich_doc_model::{Fragment, Node, ResolvedPos, TableRole};
use rich_doc_transform::{Transaction, TransformError};

use crate::parent::{ParentNodeWithPos, find_parent_node_closest_to_pos};

/// A table cell found around a position.
pub type CellWithPos = ParentNodeWithPos;

/// Content offered for insertion: a single node or a fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Insertable {
    Node(Node),
    Fragment(Fragment),
}

impl Insertable {
    pub fn into_fragment(self) -> Fragment {
        match self {
            Insertable::Node(node) => Fragment::from(node),
            Insertable::Fragment(fragment) => fragment,
        }
    }
}

impl From<Node> for Insertable {
    fn from(node: Node) -> Self {
        Insertable::Node(node)
    }
}

impl From<&Node> for Insertable {
    fn from(node: &Node) -> Self {
        Insertable::Node(node.clone())
    }
}

impl From<Fragment> for Insertable {
    fn from(fragment: Fragment) -> Self {
        Insertable::Fragment(fragment)
    }
}

impl From<&Fragment> for Insertable {
    fn from(fragment: &Fragment) -> Self {
        Insertable::Fragment(fragment.clone())
    }
}

/// Can `content` be inserted at `pos`?
///
/// The position's parent is asked first. When it refuses and the position
/// sits at the very start or end of the parent's content, the grandparent
/// is asked about the slot before or after the parent, and so on toward
/// the document. A position strictly inside some node's content never
/// reaches past that node.
pub fn can_insert(pos: &ResolvedPos, content: impl Into<Insertable>) -> bool {
    insertion_point(pos, &content.into().into_fragment()).is_some()
}

/// The document position at which [`can_insert`] would accept `content`.
pub(crate) fn insertion_point(pos: &ResolvedPos, content: &Fragment) -> Option<usize> {
    let mut depth = pos.depth();
    let mut index = pos.index(depth);
    let mut at = pos.pos();
    let mut at_start = pos.parent_offset() == 0;
    let mut at_end = pos.parent_offset() == pos.parent().content().size();

    loop {
        let parent = pos.node(depth);
        if parent.can_replace(index, index, content) {
            log::trace!("{} accepts {content} at index {index}", parent.node_type().name());
            return Some(at);
        }
        if depth == 0 {
            return None;
        }
        if at_start {
            at = pos.before(depth)?;
            depth -= 1;
            index = pos.index(depth);
            at_start = index == 0;
            at_end = false;
        } else if at_end {
            at = pos.after(depth)?;
            depth -= 1;
            index = pos.index(depth) + 1;
            at_start = false;
            at_end = index == pos.node(depth).child_count();
        } else {
            log::trace!("{content} rejected inside {}", parent.node_type().name());
            return None;
        }
    }
}

/// The node starting exactly at `pos`, preferring the shallowest one: a
/// block between blocks wins over the first child inside it.
pub(crate) fn node_starting_at(pos: &ResolvedPos) -> Option<Node> {
    if pos.text_offset() > 0 {
        return None;
    }
    pos.node_after()
}

/// A transform removing the node that starts at `pos`.
///
/// Both block boundaries (`doc(p("x"), |p("one"))`) and inline leaves
/// (`p("one", |atom)`) are handled. An offset at the start of a text run
/// removes the whole run: `doc(p("x"), p(|"one"))` becomes
/// `doc(p("x"), p())`. When no node starts at `pos` (inside a text run or
/// at the end of a node's content) the transaction is returned unchanged.
pub fn remove_node_at_pos(
    pos: usize,
) -> impl Fn(Transaction) -> Result<Transaction, TransformError> {
    move |mut tr| {
        let resolved = tr.doc().resolve(pos)?;
        let Some(node) = node_starting_at(&resolved) else {
            log::debug!("no node starts at {pos}, nothing to remove");
            return Ok(tr);
        };
        tr.delete(pos, pos + node.node_size())?;
        Ok(tr)
    }
}

/// The table cell (or header cell) closest to `pos`.
pub fn find_cell_closest_to_pos(pos: &ResolvedPos) -> Option<CellWithPos> {
    find_parent_node_closest_to_pos(pos, |node| {
        node.node_type().table_role().is_some_and(TableRole::is_cell)
    })
}
