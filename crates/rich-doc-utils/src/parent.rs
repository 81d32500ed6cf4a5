//! Finding ancestors of a resolved position.

use rich_doc_model::{Node, NodeType, ResolvedPos, TableRole};

/// An ancestor of a position.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentNodeWithPos {
    pub node: Node,
    /// Position directly before the node.
    pub pos: usize,
    /// Position where the node's content starts.
    pub start: usize,
    pub depth: usize,
}

/// The closest ancestor matching `predicate`, searching from the position's
/// parent up to (but excluding) the document node.
pub fn find_parent_node_closest_to_pos<F>(pos: &ResolvedPos, predicate: F) -> Option<ParentNodeWithPos>
where
    F: Fn(&Node) -> bool,
{
    for depth in (1..=pos.depth()).rev() {
        let node = pos.node(depth);
        if predicate(node) {
            return Some(ParentNodeWithPos {
                node: node.clone(),
                pos: pos.before(depth)?,
                start: pos.start(depth),
                depth,
            });
        }
    }
    None
}

pub fn find_parent_node_of_type_closest_to_pos(
    pos: &ResolvedPos,
    types: &[&NodeType],
) -> Option<ParentNodeWithPos> {
    find_parent_node_closest_to_pos(pos, |node| types.contains(&node.node_type()))
}

pub fn has_parent_node_of_type_closest_to_pos(pos: &ResolvedPos, types: &[&NodeType]) -> bool {
    find_parent_node_of_type_closest_to_pos(pos, types).is_some()
}

/// The closest ancestor whose type has the given table role.
pub fn find_parent_node_with_role(pos: &ResolvedPos, role: TableRole) -> Option<ParentNodeWithPos> {
    find_parent_node_closest_to_pos(pos, |node| node.node_type().table_role() == Some(role))
}

pub fn find_table_closest_to_pos(pos: &ResolvedPos) -> Option<ParentNodeWithPos> {
    find_parent_node_with_role(pos, TableRole::Table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rich_doc_model::builders::td_empty;
    use rich_doc_model::{basic_schema, doc, p, table, td, tr};

    #[test]
    fn finds_the_nearest_matching_ancestor() {
        let d = doc![p!["x"], table![tr![td![p!["o<a>ne"]], td_empty()]]];
        let rp = d.node().resolve(d.tag("a")).unwrap();

        let table = find_table_closest_to_pos(&rp).unwrap();
        assert_eq!(table.pos, 3);
        assert_eq!(table.start, 4);
        assert_eq!(table.depth, 1);

        let row = find_parent_node_with_role(&rp, TableRole::Row).unwrap();
        assert_eq!(row.pos, 4);

        let para = find_parent_node_closest_to_pos(&rp, Node::is_textblock).unwrap();
        assert_eq!(para.depth, 4);
        assert_eq!(para.node.text_content(), "one");
    }

    #[test]
    fn never_reports_the_document_itself() {
        let d = doc![p!["one"]];
        let rp = d.node().resolve(0).unwrap();
        assert!(find_parent_node_closest_to_pos(&rp, |_| true).is_none());
    }

    #[test]
    fn matches_by_node_type() {
        let schema = basic_schema();
        let paragraph = schema.node_type("paragraph").unwrap();
        let table = schema.node_type("table").unwrap();
        let d = doc![p!["o<a>ne"]];
        let rp = d.node().resolve(d.tag("a")).unwrap();
        assert!(has_parent_node_of_type_closest_to_pos(&rp, &[table, paragraph]));
        assert!(!has_parent_node_of_type_closest_to_pos(&rp, &[table]));
        assert_eq!(
            find_parent_node_of_type_closest_to_pos(&rp, &[paragraph]).map(|found| found.pos),
            Some(0)
        );
    }
}
