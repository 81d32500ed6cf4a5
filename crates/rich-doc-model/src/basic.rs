//! A small built-in schema with paragraphs, tables and atom nodes.

use std::sync::OnceLock;

use serde_json::json;

use crate::schema::{MarkSpec, NodeSpec, Schema, SchemaSpec, TableRole};

/// Spec of the basic schema. Also the default schema configuration.
pub fn basic_spec() -> SchemaSpec {
    SchemaSpec {
        nodes: vec![
            NodeSpec::new("doc").content("block+"),
            NodeSpec::new("paragraph").content("inline*").group("block"),
            NodeSpec::new("atom_block").group("block").atom(),
            NodeSpec::new("table")
                .content("table_row+")
                .group("block")
                .table_role(TableRole::Table),
            NodeSpec::new("table_row")
                .content("(table_cell | table_header)*")
                .table_role(TableRole::Row),
            NodeSpec::new("table_cell")
                .content("block+")
                .attr("colspan", Some(json!(1)))
                .attr("rowspan", Some(json!(1)))
                .table_role(TableRole::Cell),
            NodeSpec::new("table_header")
                .content("block+")
                .attr("colspan", Some(json!(1)))
                .attr("rowspan", Some(json!(1)))
                .table_role(TableRole::HeaderCell),
            NodeSpec::new("text").group("inline"),
            NodeSpec::new("atom_inline").inline().atom().group("inline"),
        ],
        marks: vec![MarkSpec::new("strong"), MarkSpec::new("em")],
        top_node: None,
    }
}

/// The compiled basic schema, shared by the whole process.
pub fn basic_schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| match Schema::new(basic_spec()) {
        Ok(schema) => schema,
        Err(err) => unreachable!("basic schema failed to compile: {err}"),
    })
}
