use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::content::ContentMatch;
use crate::error::ModelError;
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::replace::{Slice, replace};
use crate::resolved_pos::ResolvedPos;
use crate::schema::{Attrs, NodeType};

struct NodeInner {
    node_type: NodeType,
    attrs: Attrs,
    content: Fragment,
    marks: Vec<Mark>,
    text: Option<String>,
    /// Cached: `char` count for text, 1 for leaves, content + 2 otherwise.
    size: usize,
}

/// An immutable document node.
///
/// Nodes are reference counted, so cloning one (or a whole subtree) is
/// cheap and every edit builds new nodes that share unchanged children
/// with the old tree.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    pub(crate) fn new_branch(
        node_type: NodeType,
        attrs: Attrs,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> Self {
        let size = if node_type.is_leaf() {
            1
        } else {
            content.size() + 2
        };
        Self {
            inner: Arc::new(NodeInner {
                node_type,
                attrs,
                content,
                marks,
                text: None,
                size,
            }),
        }
    }

    pub(crate) fn new_text(node_type: NodeType, text: String, marks: Vec<Mark>) -> Self {
        let size = text.chars().count();
        Self {
            inner: Arc::new(NodeInner {
                node_type,
                attrs: Attrs::new(),
                content: Fragment::empty(),
                marks,
                text: Some(text),
                size,
            }),
        }
    }

    pub fn node_type(&self) -> &NodeType {
        &self.inner.node_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.inner.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.inner.attrs.get(name)
    }

    pub fn content(&self) -> &Fragment {
        &self.inner.content
    }

    pub fn marks(&self) -> &[Mark] {
        &self.inner.marks
    }

    /// Text of a text node, `None` for every other node.
    pub fn text(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    /// Length of a text node's text in positions; 0 for other nodes.
    pub fn text_len(&self) -> usize {
        if self.is_text() { self.inner.size } else { 0 }
    }

    pub fn node_size(&self) -> usize {
        self.inner.size
    }

    pub fn child_count(&self) -> usize {
        self.inner.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.inner.content.child(index)
    }

    pub fn maybe_child(&self, index: usize) -> Option<&Node> {
        self.inner.content.maybe_child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.inner.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.inner.content.last_child()
    }

    pub fn is_text(&self) -> bool {
        self.inner.text.is_some()
    }

    pub fn is_inline(&self) -> bool {
        self.inner.node_type.is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.inner.node_type.is_block()
    }

    pub fn is_textblock(&self) -> bool {
        self.inner.node_type.is_textblock()
    }

    pub fn is_leaf(&self) -> bool {
        self.inner.node_type.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.inner.node_type.is_atom()
    }

    pub fn inline_content(&self) -> bool {
        self.inner.node_type.inline_content()
    }

    /// Concatenated text of every text node in this subtree.
    pub fn text_content(&self) -> String {
        if let Some(text) = self.text() {
            return text.to_string();
        }
        let mut out = String::new();
        self.descendants(|node, _, _, _| {
            if let Some(text) = node.text() {
                out.push_str(text);
            }
            true
        });
        out
    }

    /// Same type, attributes and marks.
    pub fn same_markup(&self, other: &Node) -> bool {
        self.has_markup(other.node_type(), other.attrs(), other.marks())
    }

    pub fn has_markup(&self, node_type: &NodeType, attrs: &Attrs, marks: &[Mark]) -> bool {
        self.inner.node_type == *node_type
            && self.inner.attrs == *attrs
            && Mark::same_set(&self.inner.marks, marks)
    }

    /// Same markup with different content.
    pub fn copy(&self, content: Fragment) -> Node {
        if content == self.inner.content {
            return self.clone();
        }
        Node::new_branch(
            self.inner.node_type.clone(),
            self.inner.attrs.clone(),
            content,
            self.inner.marks.clone(),
        )
    }

    /// Same node with a different mark set.
    pub fn mark(&self, marks: Vec<Mark>) -> Node {
        if Mark::same_set(&marks, &self.inner.marks) {
            return self.clone();
        }
        Self {
            inner: Arc::new(NodeInner {
                node_type: self.inner.node_type.clone(),
                attrs: self.inner.attrs.clone(),
                content: self.inner.content.clone(),
                marks,
                text: self.inner.text.clone(),
                size: self.inner.size,
            }),
        }
    }

    pub(crate) fn with_text(&self, text: String) -> Node {
        if self.inner.text.as_deref() == Some(text.as_str()) {
            return self.clone();
        }
        Node::new_text(self.inner.node_type.clone(), text, self.inner.marks.clone())
    }

    /// The part of this node between two offsets into its content (or its
    /// text, for text nodes).
    pub fn cut(&self, from: usize, to: usize) -> Node {
        if let Some(text) = self.text() {
            if from == 0 && to >= self.inner.size {
                return self.clone();
            }
            let piece: String = text.chars().skip(from).take(to.saturating_sub(from)).collect();
            return self.with_text(piece);
        }
        if from == 0 && to >= self.inner.content.size() {
            return self.clone();
        }
        self.copy(self.inner.content.cut(from, to))
    }

    /// Cut out the content between two document positions.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice, ModelError> {
        if from > to {
            return Err(ModelError::ReversedRange { from, to });
        }
        if from == to {
            return Ok(Slice::empty());
        }
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        let depth = from.shared_depth(to.pos());
        let start = from.start(depth);
        let content = from
            .node(depth)
            .content()
            .cut(from.pos() - start, to.pos() - start);
        Ok(Slice::new(content, from.depth() - depth, to.depth() - depth))
    }

    /// Replace the range `from..to` with `slice`, returning the new tree.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Node, ModelError> {
        if from > to {
            return Err(ModelError::ReversedRange { from, to });
        }
        let from = self.resolve(from)?;
        let to = self.resolve(to)?;
        replace(&from, &to, slice)
    }

    /// Resolve a position in this node's content.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos, ModelError> {
        ResolvedPos::resolve(self, pos)
    }

    /// The node directly after `pos`, descending into children until a
    /// node starting exactly at `pos` (or a text node covering it) is
    /// found.
    pub fn node_at(&self, pos: usize) -> Option<Node> {
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.content().find_index(pos).ok()?;
            let child = node.maybe_child(index)?;
            if offset == pos || child.is_text() {
                return Some(child.clone());
            }
            pos -= offset + 1;
            node = child;
        }
    }

    /// Call `f` for every descendant whose range overlaps `from..to`,
    /// with the node, its position, its parent and its index. Returning
    /// `false` skips the node's children.
    pub fn nodes_between<F>(&self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between_inner(from, to, 0, &mut f);
    }

    fn nodes_between_inner<F>(&self, from: usize, to: usize, node_start: usize, f: &mut F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        let mut pos = 0;
        for (i, child) in self.content().iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from && f(child, node_start + pos, self, i) && child.content().size() > 0 {
                let start = pos + 1;
                child.nodes_between_inner(
                    from.saturating_sub(start),
                    child.content().size().min(to.saturating_sub(start)),
                    node_start + start,
                    f,
                );
            }
            pos = end;
        }
    }

    /// Call `f` for every descendant. Returning `false` skips the node's
    /// children.
    pub fn descendants<F>(&self, f: F)
    where
        F: FnMut(&Node, usize, &Node, usize) -> bool,
    {
        self.nodes_between(0, self.content().size(), f);
    }

    /// Content match state after the first `index` children.
    pub fn content_match_at(&self, index: usize) -> Option<ContentMatch> {
        self.node_type()
            .content_match()
            .match_fragment_range(self.content(), 0, index)
    }

    /// Would replacing children `from..to` with `replacement` leave valid
    /// content?
    pub fn can_replace(&self, from: usize, to: usize, replacement: &Fragment) -> bool {
        self.can_replace_range(from, to, replacement, 0, replacement.child_count())
    }

    /// [`can_replace`](Node::can_replace) using only the children
    /// `start..end` of `replacement`.
    pub fn can_replace_range(
        &self,
        from: usize,
        to: usize,
        replacement: &Fragment,
        start: usize,
        end: usize,
    ) -> bool {
        let Some(one) = self
            .content_match_at(from)
            .and_then(|m| m.match_fragment_range(replacement, start, end))
        else {
            return false;
        };
        let Some(two) = one.match_fragment_range(self.content(), to, self.child_count()) else {
            return false;
        };
        if !two.valid_end() {
            return false;
        }
        replacement
            .iter()
            .take(end)
            .skip(start)
            .all(|child| self.node_type().allows_marks(child.marks()))
    }

    /// Would replacing children `from..to` with a node of `node_type`
    /// leave valid content?
    pub fn can_replace_with(&self, from: usize, to: usize, node_type: &NodeType) -> bool {
        let Some(one) = self
            .content_match_at(from)
            .and_then(|m| m.match_type(node_type))
        else {
            return false;
        };
        one.match_fragment_range(self.content(), to, self.child_count())
            .is_some_and(|m| m.valid_end())
    }

    /// Check the whole subtree against the schema.
    pub fn check(&self) -> Result<(), ModelError> {
        self.node_type().check_content(self.content())?;
        for child in self.content() {
            if let Some(mark) = child
                .marks()
                .iter()
                .find(|m| !self.node_type().allows_mark_type(m.mark_type()))
            {
                return Err(ModelError::MarkNotAllowed {
                    mark: mark.mark_type().name().to_string(),
                    node: self.node_type().name().to_string(),
                });
            }
            child.check()?;
        }
        Ok(())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.same_markup(other)
                && self.inner.text == other.inner.text
                && self.inner.content == other.inner.content)
    }
}

fn wrap_marks(marks: &[Mark], inner: String) -> String {
    marks
        .iter()
        .rev()
        .fold(inner, |acc, mark| format!("{}({acc})", mark.mark_type().name()))
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match self.text() {
            Some(text) => format!("{text:?}"),
            None if self.content().size() > 0 => {
                format!("{}({})", self.node_type().name(), self.content().to_string_inner())
            }
            None => self.node_type().name().to_string(),
        };
        f.write_str(&wrap_marks(self.marks(), body))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::basic_schema;
    use crate::builders::{atom_inline, td_empty};
    use crate::{doc, p, strong, table, td, tr};
    use pretty_assertions::assert_eq;

    #[test]
    fn sizes_count_tokens() {
        let d = doc![p!["one", atom_inline()]];
        let para = d.node().child(0);
        assert_eq!(para.child(0).node_size(), 3);
        assert_eq!(para.child(1).node_size(), 1);
        assert_eq!(para.node_size(), 6);
        assert_eq!(d.node().content().size(), 6);
    }

    #[test]
    fn text_size_counts_chars_not_bytes() {
        let text = basic_schema().text("héllo", &[]).unwrap();
        assert_eq!(text.node_size(), 5);
        assert_eq!(text.cut(1, 3).text(), Some("él"));
    }

    #[test]
    fn display_matches_builder_shape() {
        let d = doc![p![strong!["zero"], "one"], p![]];
        assert_eq!(
            d.node().to_string(),
            r#"doc(paragraph(strong("zero"), "one"), paragraph)"#
        );
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(doc![p!["x"]].into_node(), doc![p!["x"]].into_node());
        assert_ne!(doc![p!["x"]].into_node(), doc![p!["y"]].into_node());
        assert_ne!(p![strong!["x"]].into_node(), p!["x"].into_node());
    }

    #[test]
    fn node_at_descends_to_the_node_starting_there() {
        let d = doc![p!["one", atom_inline()], p!["x"]];
        let node = d.node();
        assert_eq!(node.node_at(0).unwrap().node_type().name(), "paragraph");
        assert_eq!(node.node_at(1).unwrap().text(), Some("one"));
        assert_eq!(node.node_at(2).unwrap().text(), Some("one"));
        assert_eq!(node.node_at(4).unwrap().node_type().name(), "atom_inline");
        assert_eq!(node.node_at(6).unwrap().to_string(), r#"paragraph("x")"#);
        assert!(node.node_at(9).is_none());
    }

    #[test]
    fn nodes_between_reports_positions_and_parents() {
        let d = doc![p!["ab"], p!["cd"]];
        let mut seen = Vec::new();
        d.node().nodes_between(5, 7, |node, pos, parent, index| {
            seen.push((node.to_string(), pos, parent.node_type().name().to_string(), index));
            true
        });
        assert_eq!(
            seen,
            vec![
                (r#"paragraph("cd")"#.to_string(), 4, "doc".to_string(), 1),
                (r#""cd""#.to_string(), 5, "paragraph".to_string(), 0),
            ]
        );
    }

    #[test]
    fn text_content_concatenates_text() {
        let d = doc![table![tr![td![p!["one"]], td_empty()]], p!["two"]];
        assert_eq!(d.node().text_content(), "onetwo");
    }

    #[test]
    fn can_replace_consults_the_content_expression() {
        let d = doc![p!["one"]];
        let schema = basic_schema();
        let para = d.node().child(0);
        let atom = Fragment::from(atom_inline());
        let block = Fragment::from(p!["two"].into_node());
        assert!(para.can_replace(1, 1, &atom));
        assert!(!para.can_replace(1, 1, &block));
        assert!(d.node().can_replace(1, 1, &block));
        // removing the only block leaves `block+` unsatisfied
        assert!(!d.node().can_replace(0, 1, &Fragment::empty()));
        assert!(para.can_replace_with(0, 1, schema.text_type()));
    }

    #[test]
    fn slice_of_whole_sibling_is_closed() {
        let d = doc![p!["x"], p!["one"]];
        let slice = d.node().slice(3, 8).unwrap();
        assert_eq!((slice.open_start(), slice.open_end()), (0, 0));
        assert_eq!(slice.content().to_string(), r#"<paragraph("one")>"#);

        let slice = d.node().slice(1, 5).unwrap();
        assert_eq!((slice.open_start(), slice.open_end()), (1, 1));
        assert_eq!(slice.size(), 4);
    }

    #[test]
    fn check_flags_invalid_nesting() {
        let schema = basic_schema();
        let inner = p!["x"].into_node();
        let bad = schema
            .node_type("paragraph")
            .unwrap()
            .create(None, inner, &[])
            .unwrap();
        assert!(bad.check().is_err());
        assert!(doc![p!["x"]].node().check().is_ok());
    }
}
