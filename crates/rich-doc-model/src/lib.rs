//! Document model for rich-doc.
//!
//! Documents are immutable trees of [`Node`]s checked against a [`Schema`].
//! Every position in a document is a single integer (see
//! [`ResolvedPos`]), and every edit produces a new tree that shares
//! unchanged subtrees with the old one.
//!
//! ## Modules
//!
//! - [`schema`]: node and mark types compiled from a serializable spec
//! - [`content`]: content expressions and the automaton matching them
//! - [`node`], [`fragment`], [`mark`]: the tree itself
//! - [`resolved_pos`]: integer positions resolved into ancestor paths
//! - [`replace`]: slices and the replace algorithm
//! - [`basic`]: a small built-in schema with tables and atom nodes
//! - `builders` (feature `builders`): fixture macros over the basic schema

pub mod basic;
#[cfg(any(test, feature = "builders"))]
pub mod builders;
pub mod content;
pub mod error;
pub mod fragment;
mod json;
pub mod mark;
pub mod node;
pub mod replace;
pub mod resolved_pos;
pub mod schema;

pub use basic::{basic_schema, basic_spec};
pub use content::ContentMatch;
pub use error::{ModelError, ReplaceError, SchemaError};
pub use fragment::Fragment;
pub use mark::Mark;
pub use node::Node;
pub use replace::Slice;
pub use resolved_pos::ResolvedPos;
pub use schema::{
    AttributeSpec, Attrs, MarkSpec, MarkType, NodeSpec, NodeType, Schema, SchemaSpec, TableRole,
};
