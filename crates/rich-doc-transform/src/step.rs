//! Atomic, invertible document changes.

use std::fmt;

use rich_doc_model::{Fragment, Node, Slice};
use serde_json::Value;

use crate::error::StepError;
use crate::map::StepMap;

/// The document a step produced, or why it could not apply.
pub type StepResult = Result<Node, StepError>;

/// Replace the range `from..to` with a slice.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub slice: Slice,
}

impl ReplaceStep {
    pub fn new(from: usize, to: usize, slice: Slice) -> Self {
        Self { from, to, slice }
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        Ok(doc.replace(self.from, self.to, &self.slice)?)
    }

    pub fn get_map(&self) -> StepMap {
        StepMap::replaced(self.from, self.to.saturating_sub(self.from), self.slice.size())
    }

    /// The step that undoes this one. `doc` is the document this step was
    /// applied to.
    pub fn invert(&self, doc: &Node) -> Result<ReplaceStep, StepError> {
        Ok(ReplaceStep {
            from: self.from,
            to: self.from + self.slice.size(),
            slice: doc.slice(self.from, self.to)?,
        })
    }
}

/// Set one attribute of the node starting at `pos`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrStep {
    pub pos: usize,
    pub attr: String,
    pub value: Value,
}

impl AttrStep {
    pub fn new(pos: usize, attr: impl Into<String>, value: Value) -> Self {
        Self {
            pos,
            attr: attr.into(),
            value,
        }
    }

    fn target(&self, doc: &Node) -> Result<Node, StepError> {
        let node = doc.node_at(self.pos).ok_or(StepError::NoNodeAt(self.pos))?;
        if !node.node_type().attr_specs().contains_key(&self.attr) {
            return Err(StepError::UnknownAttribute {
                node: node.node_type().name().to_string(),
                attr: self.attr.clone(),
            });
        }
        Ok(node)
    }

    pub fn apply(&self, doc: &Node) -> StepResult {
        let node = self.target(doc)?;
        let mut attrs = node.attrs().clone();
        attrs.insert(self.attr.clone(), self.value.clone());
        // an empty copy with an open end picks the old content back up
        let updated = node
            .node_type()
            .create(Some(&attrs), Fragment::empty(), node.marks())?;
        let open_end = if node.is_leaf() { 0 } else { 1 };
        let slice = Slice::new(Fragment::from(updated), 0, open_end);
        Ok(doc.replace(self.pos, self.pos + 1, &slice)?)
    }

    pub fn get_map(&self) -> StepMap {
        StepMap::empty()
    }

    pub fn invert(&self, doc: &Node) -> Result<AttrStep, StepError> {
        let node = self.target(doc)?;
        let old = node.attr(&self.attr).cloned().unwrap_or(Value::Null);
        Ok(AttrStep::new(self.pos, self.attr.clone(), old))
    }
}

/// A document change.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Replace(ReplaceStep),
    Attr(AttrStep),
}

impl Step {
    pub fn apply(&self, doc: &Node) -> StepResult {
        match self {
            Step::Replace(step) => step.apply(doc),
            Step::Attr(step) => step.apply(doc),
        }
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace(step) => step.get_map(),
            Step::Attr(step) => step.get_map(),
        }
    }

    pub fn invert(&self, doc: &Node) -> Result<Step, StepError> {
        match self {
            Step::Replace(step) => step.invert(doc).map(Step::Replace),
            Step::Attr(step) => step.invert(doc).map(Step::Attr),
        }
    }
}

impl From<ReplaceStep> for Step {
    fn from(step: ReplaceStep) -> Self {
        Step::Replace(step)
    }
}

impl From<AttrStep> for Step {
    fn from(step: AttrStep) -> Self {
        Step::Attr(step)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Replace(step) => write!(f, "replace {}..{} with {}", step.from, step.to, step.slice),
            Step::Attr(step) => write!(f, "set {}={} at {}", step.attr, step.value, step.pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rich_doc_model::builders::{atom_inline, td_empty};
    use rich_doc_model::{ModelError, doc, p, table, td, tr};
    use serde_json::json;

    #[test]
    fn replace_step_applies_and_inverts() {
        let d = doc![p!["x"], p!["one"]].into_node();
        let step = ReplaceStep::new(3, 8, Slice::empty());
        let after = step.apply(&d).unwrap();
        assert_snapshot!(after, @r#"doc(paragraph("x"))"#);

        let inverse = step.invert(&d).unwrap();
        assert_eq!((inverse.from, inverse.to), (3, 3));
        assert_eq!(inverse.apply(&after).unwrap(), d);
    }

    #[test]
    fn replace_step_map_covers_the_range() {
        let step = ReplaceStep::new(4, 5, Slice::empty());
        assert_eq!(step.get_map(), StepMap::replaced(4, 1, 0));
    }

    #[test]
    fn reversed_replace_step_is_rejected() {
        let d = doc![p!["abcdef"]].into_node();
        let step = ReplaceStep::new(5, 3, Slice::empty());
        assert_eq!(
            step.apply(&d),
            Err(StepError::Model(ModelError::ReversedRange { from: 5, to: 3 }))
        );
        assert_eq!(step.get_map(), StepMap::replaced(5, 0, 0));
    }

    #[test]
    fn failing_replace_reports_the_model_error() {
        let d = doc![p!["x"]].into_node();
        let step = ReplaceStep::new(0, 3, Slice::empty());
        assert!(matches!(
            step.apply(&d),
            Err(StepError::Model(ModelError::Replace(_)))
        ));
    }

    #[test]
    fn attr_step_keeps_content_and_inverts() {
        let d = doc![table![tr![td![p!["a"]], td_empty()]]].into_node();
        let step = AttrStep::new(2, "colspan", json!(2));
        let after = step.apply(&d).unwrap();
        assert_eq!(after.child(0).child(0).child(0).attr("colspan"), Some(&json!(2)));
        assert_eq!(after.text_content(), "a");
        assert_eq!(after.content().size(), d.content().size());

        let inverse = step.invert(&d).unwrap();
        assert_eq!(inverse.value, json!(1));
        assert_eq!(inverse.apply(&after).unwrap(), d);
    }

    #[test]
    fn attr_step_rejects_unknown_attributes_and_empty_positions() {
        let d = doc![p!["one", atom_inline()]].into_node();
        assert_eq!(
            AttrStep::new(0, "align", json!("left")).apply(&d).unwrap_err(),
            StepError::UnknownAttribute {
                node: "paragraph".into(),
                attr: "align".into()
            }
        );
        assert_eq!(
            AttrStep::new(6, "x", json!(1)).apply(&d).unwrap_err(),
            StepError::NoNodeAt(6)
        );
    }

    #[test]
    fn steps_display_compactly() {
        let step = Step::from(ReplaceStep::new(1, 2, Slice::empty()));
        assert_snapshot!(step, @"replace 1..2 with <>(0,0)");
    }
}
