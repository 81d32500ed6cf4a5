//! Collecting descendants of a node.
//!
//! Positions are relative to the start of the searched node's content, so
//! for a document they are plain document positions.

use rich_doc_model::{Attrs, MarkType, Node, NodeType};

/// A descendant and its position.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWithPos {
    pub node: Node,
    pub pos: usize,
}

/// Every child of `node`, and with `descend` every descendant, in document
/// order.
pub fn flatten(node: &Node, descend: bool) -> Vec<NodeWithPos> {
    let mut result = Vec::new();
    node.descendants(|child, pos, _, _| {
        result.push(NodeWithPos {
            node: child.clone(),
            pos,
        });
        descend
    });
    result
}

pub fn find_children<F>(node: &Node, predicate: F, descend: bool) -> Vec<NodeWithPos>
where
    F: Fn(&Node) -> bool,
{
    flatten(node, descend)
        .into_iter()
        .filter(|child| predicate(&child.node))
        .collect()
}

pub fn find_text_nodes(node: &Node, descend: bool) -> Vec<NodeWithPos> {
    find_children(node, Node::is_text, descend)
}

pub fn find_inline_nodes(node: &Node, descend: bool) -> Vec<NodeWithPos> {
    find_children(node, Node::is_inline, descend)
}

pub fn find_block_nodes(node: &Node, descend: bool) -> Vec<NodeWithPos> {
    find_children(node, Node::is_block, descend)
}

pub fn find_children_by_type(node: &Node, node_type: &NodeType, descend: bool) -> Vec<NodeWithPos> {
    find_children(node, |child| child.node_type() == node_type, descend)
}

pub fn find_children_by_attr<F>(node: &Node, predicate: F, descend: bool) -> Vec<NodeWithPos>
where
    F: Fn(&Attrs) -> bool,
{
    find_children(node, |child| predicate(child.attrs()), descend)
}

pub fn find_children_by_mark(node: &Node, mark_type: &MarkType, descend: bool) -> Vec<NodeWithPos> {
    find_children(
        node,
        |child| child.marks().iter().any(|mark| mark.mark_type() == mark_type),
        descend,
    )
}

/// Number of descendants of `node` of the given type.
pub fn contains(node: &Node, node_type: &NodeType) -> usize {
    find_children_by_type(node, node_type, true).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rich_doc_model::builders::{atom_inline, td_empty};
    use rich_doc_model::{basic_schema, doc, em, p, strong, table, td, tr};
    use serde_json::json;

    fn positions(found: &[NodeWithPos]) -> Vec<(String, usize)> {
        found
            .iter()
            .map(|f| (f.node.node_type().name().to_string(), f.pos))
            .collect()
    }

    #[test]
    fn flatten_lists_children_or_all_descendants() {
        let d = doc![p!["one"], p![atom_inline()]];
        assert_eq!(
            positions(&flatten(d.node(), false)),
            vec![("paragraph".into(), 0), ("paragraph".into(), 5)]
        );
        assert_eq!(
            positions(&flatten(d.node(), true)),
            vec![
                ("paragraph".into(), 0),
                ("text".into(), 1),
                ("paragraph".into(), 5),
                ("atom_inline".into(), 6),
            ]
        );
    }

    #[test]
    fn filters_by_kind() {
        let d = doc![p!["one", atom_inline()], table![tr![td_empty()]]];
        assert_eq!(find_text_nodes(d.node(), true).len(), 1);
        assert_eq!(find_inline_nodes(d.node(), true).len(), 2);
        assert_eq!(
            positions(&find_block_nodes(d.node(), false)),
            vec![("paragraph".into(), 0), ("table".into(), 6)]
        );
    }

    #[test]
    fn filters_by_type_attr_and_mark() {
        let schema = basic_schema();
        let d = doc![
            p![strong!["a"], em!["b"], "c"],
            table![tr![td![p!["x"]], td_empty()]]
        ];
        let cell = schema.node_type("table_cell").unwrap();
        assert_eq!(contains(d.node(), cell), 2);
        assert_eq!(find_children_by_type(d.node(), cell, false).len(), 0);

        let cells = find_children_by_attr(d.node(), |attrs| attrs.get("colspan") == Some(&json!(1)), true);
        assert_eq!(positions(&cells), vec![("table_cell".into(), 7), ("table_cell".into(), 12)]);

        let strong = schema.mark_type("strong").unwrap();
        let marked = find_children_by_mark(d.node(), strong, true);
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].node.text(), Some("a"));
        assert_eq!(marked[0].pos, 1);
    }

    #[test]
    fn positions_are_relative_to_the_searched_node() {
        let d = doc![p!["x"], p!["one", atom_inline()]];
        let para = d.node().child(1);
        assert_eq!(positions(&flatten(para, false)), vec![("text".into(), 0), ("atom_inline".into(), 3)]);
    }
}
