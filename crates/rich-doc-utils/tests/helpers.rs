use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rich_doc_model::builders::{Tagged, atom_inline, td_empty};
use rich_doc_model::{Fragment, Node, basic_schema, doc, p, strong, table, td, tr};
use rich_doc_transform::{Transaction, TransformError};
use rich_doc_utils::{can_insert, find_cell_closest_to_pos, insert_at_pos, remove_node_at_pos};
use rstest::rstest;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn two_by_two() -> Tagged {
    doc![table![
        tr![td![p!["one one"]], td_empty()],
        tr![td![p!["two two"]], td_empty()]
    ]]
}

fn paragraph(text: &str) -> Node {
    let schema = basic_schema();
    schema
        .node("paragraph", None, schema.text(text, &[]).unwrap(), &[])
        .unwrap()
}

mod insertion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn accepts_an_inline_atom_at_the_end_of_a_paragraph() {
        init_logging();
        let d = doc![p!["one<cursor>"]];
        let pos = d.node().resolve(d.tag("cursor")).unwrap();
        let node = basic_schema()
            .node("atom_inline", None, Fragment::empty(), &[])
            .unwrap();
        assert!(can_insert(&pos, node.clone()));
        assert!(can_insert(&pos, Fragment::from(node)));
    }

    #[test]
    fn refuses_a_paragraph_inside_marked_text() {
        init_logging();
        let d = doc![p![strong!["zero"], "o<cursor>ne"], p!["three"]];
        let pos = d.node().resolve(d.tag("cursor")).unwrap();
        let node = paragraph("two");
        assert!(!can_insert(&pos, &node));
        assert!(!can_insert(&pos, Fragment::from(node)));
    }

    #[test]
    fn resolving_does_not_change_the_document() {
        let d = doc![p![strong!["zero"], "o<cursor>ne"], p!["three"]];
        let before = d.node().clone();
        let pos = d.node().resolve(d.tag("cursor")).unwrap();
        let _ = can_insert(&pos, paragraph("two"));
        assert_eq!(*d.node(), before);
        for depth in 0..=pos.depth() {
            assert_eq!(*pos.node(depth), *nth_ancestor(d.node(), &pos, depth));
        }
    }

    fn nth_ancestor<'a>(doc: &'a Node, pos: &rich_doc_model::ResolvedPos, depth: usize) -> &'a Node {
        (0..depth).fold(doc, |node, d| node.child(pos.index(d)))
    }
}

mod removal {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_a_top_level_block() {
        init_logging();
        let d = doc![p!["x"], p!["one"]];
        let tr = remove_node_at_pos(3)(Transaction::new(d.into_node())).unwrap();
        assert!(tr.doc_changed());
        assert_eq!(*tr.doc(), doc![p!["x"]].into_node());
    }

    #[test]
    fn removes_a_nested_inline_node() {
        init_logging();
        let d = doc![p!["one", atom_inline()]];
        let tr = remove_node_at_pos(4)(Transaction::new(d.into_node())).unwrap();
        assert!(tr.doc_changed());
        assert_eq!(*tr.doc(), doc![p!["one"]].into_node());
    }

    #[rstest]
    #[case::block_boundary(3, r#"doc(paragraph("x"))"#)]
    #[case::start_of_a_text_run(4, r#"doc(paragraph("x"), paragraph)"#)]
    fn removes_the_shallowest_node_starting_there(#[case] pos: usize, #[case] expected: &str) {
        let d = doc![p!["x"], p!["one"]];
        let tr = remove_node_at_pos(pos)(Transaction::new(d.into_node())).unwrap();
        assert_eq!(tr.doc().to_string(), expected);
    }

    #[rstest]
    #[case::inside_text(2)]
    #[case::end_of_paragraph(4)]
    #[case::end_of_document(5)]
    fn leaves_the_transaction_alone_when_nothing_starts_there(#[case] pos: usize) {
        let d = doc![p!["one"]].into_node();
        let tr = remove_node_at_pos(pos)(Transaction::new(d.clone())).unwrap();
        assert!(!tr.doc_changed());
        assert_eq!(*tr.doc(), d);
    }

    #[test]
    fn out_of_range_positions_are_errors() {
        let d = doc![p!["one"]];
        let err = remove_node_at_pos(6)(Transaction::new(d.into_node())).unwrap_err();
        assert!(matches!(err, TransformError::Model(_)));
        assert_snapshot!(err, @"position 6 out of range (content size 5)");
    }

    #[test]
    fn removing_the_only_block_is_rejected_by_the_schema() {
        let d = doc![p!["one"]];
        let err = remove_node_at_pos(0)(Transaction::new(d.into_node())).unwrap_err();
        assert!(matches!(err, TransformError::StepFailed { index: 0, .. }));
    }

    #[test]
    fn is_deterministic_and_sees_earlier_changes() {
        let d = doc![p!["x"], p!["one"], p!["two"]].into_node();
        let remove = remove_node_at_pos(3);
        let once = remove(Transaction::new(d.clone())).unwrap();
        assert_eq!(*once.doc(), *remove(Transaction::new(d.clone())).unwrap().doc());

        let twice = remove(once).unwrap();
        assert_snapshot!(twice.doc(), @r#"doc(paragraph("x"))"#);
        assert_eq!(twice.steps().len(), 2);
        assert_eq!(*twice.doc_before(), d);
    }

    #[test]
    fn reinserting_the_removed_node_restores_the_document() {
        let d = doc![p!["x"], p!["one"], p!["two"]].into_node();
        let removed = d.child(1).clone();
        let tr = remove_node_at_pos(3)(Transaction::new(d.clone())).unwrap();
        let tr = insert_at_pos(3, removed)(tr).unwrap();
        assert_eq!(*tr.doc(), d);
    }

    #[test]
    fn inverse_restores_the_starting_document() {
        let d = doc![p!["one", atom_inline()], p!["x"]].into_node();
        let tr = remove_node_at_pos(4)(Transaction::new(d.clone())).unwrap();
        assert_eq!(*tr.inverse().unwrap().doc(), d);
    }
}

mod cell_lookup {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_the_first_cell() {
        let d = two_by_two();
        let pos = d.node().resolve(4).unwrap();
        let cell = find_cell_closest_to_pos(&pos).unwrap();
        assert_eq!(cell.node.node_type().name(), "table_cell");
        assert_eq!(cell.pos, 2);
        assert_eq!(cell.start, 3);
        assert_eq!(cell.depth, 3);
        assert_snapshot!(cell.node, @r#"table_cell(paragraph("one one"))"#);
    }

    #[test]
    fn none_outside_a_table() {
        let d = doc![p!["one"]];
        let pos = d.node().resolve(4).unwrap();
        assert!(find_cell_closest_to_pos(&pos).is_none());
    }

    #[rstest]
    #[case(0, None)]
    #[case(1, None)]
    #[case(2, None)]
    #[case(3, Some(2))]
    #[case(13, None)]
    #[case(14, Some(13))]
    #[case(20, Some(19))]
    #[case(31, Some(30))]
    fn finds_the_cell_around_each_position(#[case] pos: usize, #[case] expected: Option<usize>) {
        let d = two_by_two();
        let pos = d.node().resolve(pos).unwrap();
        assert_eq!(find_cell_closest_to_pos(&pos).map(|cell| cell.pos), expected);
    }
}
