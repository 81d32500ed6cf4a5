//! JSON form of documents: `{"type", "attrs"?, "content"?, "marks"?, "text"?}`.

use serde_json::{Map, Value, json};

use crate::error::ModelError;
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::schema::{Attrs, Schema};

impl Mark {
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), json!(self.mark_type().name()));
        if !self.attrs().is_empty() {
            obj.insert("attrs".into(), json!(self.attrs()));
        }
        Value::Object(obj)
    }

    pub fn from_json(schema: &Schema, value: &Value) -> Result<Mark, ModelError> {
        let name = type_name(value)?;
        let attrs = attrs(value)?;
        schema.mark(name, attrs.as_ref())
    }
}

impl Node {
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), json!(self.node_type().name()));
        if !self.attrs().is_empty() {
            obj.insert("attrs".into(), json!(self.attrs()));
        }
        if self.content().size() > 0 {
            let content: Vec<Value> = self.content().iter().map(Node::to_json).collect();
            obj.insert("content".into(), Value::Array(content));
        }
        if !self.marks().is_empty() {
            let marks: Vec<Value> = self.marks().iter().map(Mark::to_json).collect();
            obj.insert("marks".into(), Value::Array(marks));
        }
        if let Some(text) = self.text() {
            obj.insert("text".into(), json!(text));
        }
        Value::Object(obj)
    }

    /// Build a node from its JSON form, checking content against the
    /// schema.
    pub fn from_json(schema: &Schema, value: &Value) -> Result<Node, ModelError> {
        let name = type_name(value)?;

        let marks = match value.get("marks") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|m| Mark::from_json(schema, m))
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(ModelError::InvalidJson("`marks` must be an array".into())),
        };

        if name == schema.text_type().name() {
            let text = value
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ModelError::InvalidJson("text node without `text`".into()))?;
            return schema.text(text, &marks);
        }

        let content = match value.get("content") {
            None => Fragment::empty(),
            Some(Value::Array(items)) => Fragment::from_nodes(
                items
                    .iter()
                    .map(|c| Node::from_json(schema, c))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(_) => return Err(ModelError::InvalidJson("`content` must be an array".into())),
        };

        schema
            .node_type(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))?
            .create_checked(attrs(value)?.as_ref(), content, &marks)
    }
}

fn type_name(value: &Value) -> Result<&str, ModelError> {
    value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ModelError::InvalidJson(format!("missing `type` in {value}")))
}

fn attrs(value: &Value) -> Result<Option<Attrs>, ModelError> {
    match value.get("attrs") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        Some(other) => Err(ModelError::InvalidJson(format!(
            "`attrs` must be an object, got {other}"
        ))),
    }
}
