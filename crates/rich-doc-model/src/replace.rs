//! Slices and the replace algorithm.
//!
//! A [`Slice`] is a piece of document content that may be "open" on either
//! side: `open_start` and `open_end` count how many levels of nodes at the
//! edges were cut through. Replacing a range with a slice stitches the open
//! sides of the slice onto the nodes around the range, so that copying
//! `"ne</p><p>t"` into the middle of `<p>ab</p>` yields two paragraphs,
//! `ane` and `tb`.
//!
//! The algorithm never repairs content. When the stitched result violates a
//! content expression the replace fails with a [`ReplaceError`].

use std::fmt;

use crate::error::{ModelError, ReplaceError};
use crate::fragment::Fragment;
use crate::node::Node;
use crate::resolved_pos::ResolvedPos;

/// A fragment with open depths at its start and end.
#[derive(Clone, Default, PartialEq)]
pub struct Slice {
    content: Fragment,
    open_start: usize,
    open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A slice that is as open as the fragment allows: every non-leaf
    /// first (and last) child is cut through.
    pub fn max_open(content: Fragment) -> Self {
        let open_start = open_depth(&content, Fragment::first_child, Node::first_child);
        let open_end = open_depth(&content, Fragment::last_child, Node::last_child);
        Self::new(content, open_start, open_end)
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn open_start(&self) -> usize {
        self.open_start
    }

    pub fn open_end(&self) -> usize {
        self.open_end
    }

    /// Number of positions this slice occupies once inserted.
    pub fn size(&self) -> usize {
        self.content
            .size()
            .saturating_sub(self.open_start + self.open_end)
    }

    /// Both open depths must be reachable through the content's edge nodes.
    fn check_open_depths(&self) -> Result<(), ReplaceError> {
        let max_start = open_depth(&self.content, Fragment::first_child, Node::first_child);
        let max_end = open_depth(&self.content, Fragment::last_child, Node::last_child);
        if self.open_start > max_start || self.open_end > max_end {
            return Err(ReplaceError::OpenDepthExceedsContent {
                open_start: self.open_start,
                open_end: self.open_end,
            });
        }
        Ok(())
    }
}

/// How many non-leaf nodes can be cut through along one edge of `content`.
fn open_depth(
    content: &Fragment,
    edge: fn(&Fragment) -> Option<&Node>,
    child_edge: fn(&Node) -> Option<&Node>,
) -> usize {
    let mut depth = 0;
    let mut node = edge(content);
    while let Some(n) = node.filter(|n| !n.is_leaf() && !n.is_text()) {
        depth += 1;
        node = child_edge(n);
    }
    depth
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.content, self.open_start, self.open_end)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub(crate) fn replace(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
) -> Result<Node, ModelError> {
    slice.check_open_depths()?;
    if slice.open_start > from.depth() {
        return Err(ReplaceError::TooDeep.into());
    }
    if from.depth() + slice.open_end != to.depth() + slice.open_start {
        return Err(ReplaceError::InconsistentOpenDepths.into());
    }
    replace_outer(from, to, slice, 0)
}

fn replace_outer(
    from: &ResolvedPos,
    to: &ResolvedPos,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ModelError> {
    let index = from.index(depth);
    let node = from.node(depth);

    if index == to.index(depth) && depth < from.depth() - slice.open_start {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        return Ok(node.copy(node.content().replace_child(index, inner)));
    }

    if slice.content.size() == 0 {
        return close(node, replace_two_way(from, to, depth)?);
    }

    if slice.open_start == 0 && slice.open_end == 0 && from.depth() == depth && to.depth() == depth
    {
        // flat: both ends in the same parent, nothing to stitch
        let parent = from.parent();
        let content = parent.content();
        let joined = content
            .cut(0, from.parent_offset())
            .append(&slice.content)
            .append(&content.cut(to.parent_offset(), content.size()));
        return close(parent, joined);
    }

    let (start, end) = prepare_slice_for_replace(slice, from)?;
    close(node, replace_three_way(from, &start, &end, to, depth)?)
}

fn check_join(main: &Node, sub: &Node) -> Result<(), ReplaceError> {
    if sub.node_type().compatible_content(main.node_type()) {
        Ok(())
    } else {
        Err(ReplaceError::CannotJoin {
            sub: sub.node_type().name().to_string(),
            main: main.node_type().name().to_string(),
        })
    }
}

fn joinable(before: &ResolvedPos, after: &ResolvedPos, depth: usize) -> Result<Node, ReplaceError> {
    let node = before.node(depth);
    check_join(node, after.node(depth))?;
    Ok(node.clone())
}

/// Push the children of the node at `depth` lying between `start` and
/// `end`. A missing bound means the edge of the node.
fn add_range(
    start: Option<&ResolvedPos>,
    end: Option<&ResolvedPos>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let Some(node) = end.or(start).map(|p| p.node(depth)) else {
        return;
    };
    let end_index = end.map_or(node.child_count(), |e| e.index(depth));
    let mut start_index = 0;
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            target.extend(start.node_after());
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        target.push(node.child(i).clone());
    }
    if let Some(end) = end
        && end.depth() == depth
        && end.text_offset() > 0
    {
        target.extend(end.node_before());
    }
}

fn close(node: &Node, content: Fragment) -> Result<Node, ModelError> {
    if !node.node_type().valid_content(&content) {
        return Err(ReplaceError::InvalidContent {
            node: node.node_type().name().to_string(),
            content: content.to_string(),
        }
        .into());
    }
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos,
    start: &ResolvedPos,
    end: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ModelError> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (&open_start, &open_end) {
        (Some(open_start), Some(open_end)) if start.index(depth) == end.index(depth) => {
            check_join(open_start, open_end)?;
            let inner = replace_three_way(from, start, end, to, depth + 1)?;
            content.push(close(open_start, inner)?);
        }
        _ => {
            if let Some(open_start) = &open_start {
                content.push(close(open_start, replace_two_way(from, start, depth + 1)?)?);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(open_end) = &open_end {
                content.push(close(open_end, replace_two_way(end, to, depth + 1)?)?);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

fn replace_two_way(
    from: &ResolvedPos,
    to: &ResolvedPos,
    depth: usize,
) -> Result<Fragment, ModelError> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let node = joinable(from, to, depth + 1)?;
        content.push(close(&node, replace_two_way(from, to, depth + 1)?)?);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

/// Wrap the slice in copies of the nodes above `along` so that its open
/// edges can be resolved like positions in a document.
fn prepare_slice_for_replace(
    slice: &Slice,
    along: &ResolvedPos,
) -> Result<(ResolvedPos, ResolvedPos), ModelError> {
    let extra = along.depth() - slice.open_start;
    let mut node = along.node(extra).copy(slice.content.clone());
    for depth in (0..extra).rev() {
        node = along.node(depth).copy(Fragment::from(node));
    }
    let start = node.resolve(slice.open_start + extra)?;
    let end = node.resolve(node.content().size() - slice.open_end - extra)?;
    Ok((start, end))
}
