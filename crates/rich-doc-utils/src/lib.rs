//! Helpers for position-addressed queries and structural edits.
//!
//! The three core helpers:
//!
//! - [`can_insert`]: can a node or fragment go at a resolved position?
//! - [`remove_node_at_pos`]: a transform deleting the node starting at a
//!   position
//! - [`find_cell_closest_to_pos`]: the table cell around a position
//!
//! Transforms are plain functions from a [`Transaction`] to a new
//! transaction, so they compose:
//!
//! ```
//! use rich_doc_model::{doc, p};
//! use rich_doc_transform::Transaction;
//! use rich_doc_utils::remove_node_at_pos;
//!
//! let d = doc![p!["x"], p!["one"]];
//! let tr = remove_node_at_pos(3)(Transaction::new(d.into_node())).unwrap();
//! assert_eq!(tr.doc().to_string(), r#"doc(paragraph("x"))"#);
//! ```
//!
//! [`Transaction`]: rich_doc_transform::Transaction

pub mod children;
pub mod helpers;
pub mod parent;
pub mod transforms;

pub use children::{
    NodeWithPos, contains, find_block_nodes, find_children, find_children_by_attr,
    find_children_by_mark, find_children_by_type, find_inline_nodes, find_text_nodes, flatten,
};
pub use helpers::{CellWithPos, Insertable, can_insert, find_cell_closest_to_pos, remove_node_at_pos};
pub use parent::{
    ParentNodeWithPos, find_parent_node_closest_to_pos, find_parent_node_of_type_closest_to_pos,
    find_parent_node_with_role, find_table_closest_to_pos, has_parent_node_of_type_closest_to_pos,
};
pub use transforms::{insert_at_pos, replace_node_at_pos};
