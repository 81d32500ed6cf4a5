//! Transforms that replace or insert content at a position.

use rich_doc_model::Node;
use rich_doc_transform::{Transaction, TransformError};

use crate::helpers::{Insertable, insertion_point, node_starting_at};

/// A transform replacing the node that starts at `pos` with `node`.
/// Returns the transaction unchanged when no node starts there.
pub fn replace_node_at_pos(
    pos: usize,
    node: Node,
) -> impl Fn(Transaction) -> Result<Transaction, TransformError> {
    move |mut tr| {
        let resolved = tr.doc().resolve(pos)?;
        let Some(current) = node_starting_at(&resolved) else {
            log::debug!("no node starts at {pos}, nothing to replace");
            return Ok(tr);
        };
        tr.replace_with(pos, pos + current.node_size(), node.clone())?;
        Ok(tr)
    }
}

/// A transform inserting `content` at `pos`, or at the nearest boundary
/// above it that accepts the content (see
/// [`can_insert`](crate::can_insert)). Returns the transaction unchanged
/// when nowhere accepts it.
pub fn insert_at_pos(
    pos: usize,
    content: impl Into<Insertable>,
) -> impl Fn(Transaction) -> Result<Transaction, TransformError> {
    let content = content.into().into_fragment();
    move |mut tr| {
        let resolved = tr.doc().resolve(pos)?;
        let Some(at) = insertion_point(&resolved, &content) else {
            log::debug!("{content} cannot be inserted at {pos}");
            return Ok(tr);
        };
        tr.insert(at, content.clone())?;
        Ok(tr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rich_doc_model::builders::{atom_block, atom_inline};
    use rich_doc_model::{Fragment, doc, p, table, td, tr};

    #[test]
    fn replaces_a_block() {
        let d = doc![p!["x"], p!["one"]];
        let tr = replace_node_at_pos(3, atom_block())(Transaction::new(d.into_node())).unwrap();
        assert_snapshot!(tr.doc(), @r#"doc(paragraph("x"), atom_block)"#);
    }

    #[test]
    fn replaces_an_inline_leaf() {
        let d = doc![p!["one", atom_inline()]];
        let text = rich_doc_model::basic_schema().text("!", &[]).unwrap();
        let tr = replace_node_at_pos(4, text)(Transaction::new(d.into_node())).unwrap();
        assert_snapshot!(tr.doc(), @r#"doc(paragraph("one!"))"#);
    }

    #[test]
    fn replacing_mid_text_is_a_no_op() {
        let d = doc![p!["one"]];
        let tr = replace_node_at_pos(2, atom_inline())(Transaction::new(d.into_node())).unwrap();
        assert!(!tr.doc_changed());
    }

    #[test]
    fn inserts_in_place_or_at_the_nearest_accepting_boundary() {
        let d = doc![p!["one<a>"]].into_node();
        let tr = insert_at_pos(4, atom_inline())(Transaction::new(d.clone())).unwrap();
        assert_snapshot!(tr.doc(), @r#"doc(paragraph("one", atom_inline))"#);

        let tr = insert_at_pos(4, p!["two"].into_node())(Transaction::new(d)).unwrap();
        assert_snapshot!(tr.doc(), @r#"doc(paragraph("one"), paragraph("two"))"#);
    }

    #[test]
    fn refused_insertions_leave_the_transaction_alone() {
        let d = doc![table![tr![td![p!["o<a>ne"]]]]];
        let pos = d.tag("a");
        let row = Fragment::from(tr![td![p!["x"]]].into_node());
        let tr = insert_at_pos(pos, row)(Transaction::new(d.into_node())).unwrap();
        assert!(!tr.doc_changed());
    }
}
