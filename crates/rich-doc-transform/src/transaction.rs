use rich_doc_model::{Fragment, Node, Slice};
use serde_json::Value;

use crate::error::{StepError, TransformError};
use crate::map::Mapping;
use crate::step::{AttrStep, ReplaceStep, Step};

/// Accumulates steps against a starting document.
///
/// The starting document is never modified: every step produces a new
/// document, available through [`doc`](Transaction::doc), and the steps,
/// intermediate documents and position maps are recorded so the change can
/// be inspected or undone. A transaction is owned by one caller at a time;
/// transforms take it by value and hand it back.
#[derive(Debug, Clone)]
pub struct Transaction {
    doc_before: Node,
    doc: Node,
    steps: Vec<Step>,
    docs: Vec<Node>,
    mapping: Mapping,
}

impl Transaction {
    pub fn new(doc: Node) -> Self {
        Self {
            doc_before: doc.clone(),
            doc,
            steps: Vec::new(),
            docs: Vec::new(),
            mapping: Mapping::new(),
        }
    }

    /// The current document, after all steps so far.
    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The document the transaction started from.
    pub fn doc_before(&self) -> &Node {
        &self.doc_before
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The document before each step.
    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Apply a step, failing if it does not apply to the current document.
    pub fn step(&mut self, step: impl Into<Step>) -> Result<&mut Self, TransformError> {
        let index = self.steps.len();
        self.maybe_step(step)
            .map_err(|source| TransformError::StepFailed { index, source })?;
        Ok(self)
    }

    /// Try a step. On failure the transaction is left as it was.
    pub fn maybe_step(&mut self, step: impl Into<Step>) -> Result<(), StepError> {
        let step = step.into();
        match step.apply(&self.doc) {
            Ok(doc) => {
                log::trace!("applied {step}");
                let before = std::mem::replace(&mut self.doc, doc);
                self.docs.push(before);
                self.mapping.append_map(step.get_map());
                self.steps.push(step);
                Ok(())
            }
            Err(err) => {
                log::debug!("step {step} rejected: {err}");
                Err(err)
            }
        }
    }

    /// Replace `from..to` with a slice. Replacing an empty range with an
    /// empty slice adds no step.
    pub fn replace(
        &mut self,
        from: usize,
        to: usize,
        slice: Slice,
    ) -> Result<&mut Self, TransformError> {
        if from == to && slice == Slice::empty() {
            return Ok(self);
        }
        self.step(ReplaceStep::new(from, to, slice))
    }

    /// Replace `from..to` with closed content.
    pub fn replace_with(
        &mut self,
        from: usize,
        to: usize,
        content: impl Into<Fragment>,
    ) -> Result<&mut Self, TransformError> {
        self.replace(from, to, Slice::new(content.into(), 0, 0))
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, TransformError> {
        self.replace(from, to, Slice::empty())
    }

    pub fn insert(
        &mut self,
        pos: usize,
        content: impl Into<Fragment>,
    ) -> Result<&mut Self, TransformError> {
        self.replace_with(pos, pos, content)
    }

    pub fn set_node_attribute(
        &mut self,
        pos: usize,
        attr: &str,
        value: Value,
    ) -> Result<&mut Self, TransformError> {
        self.step(AttrStep::new(pos, attr, value))
    }

    /// Steps that undo this transaction, newest first, ready to apply to
    /// [`doc`](Transaction::doc).
    pub fn inverted_steps(&self) -> Result<Vec<Step>, StepError> {
        self.steps
            .iter()
            .zip(&self.docs)
            .rev()
            .map(|(step, doc)| step.invert(doc))
            .collect()
    }

    /// A transaction over the current document that restores
    /// [`doc_before`](Transaction::doc_before).
    pub fn inverse(&self) -> Result<Transaction, TransformError> {
        let mut tr = Transaction::new(self.doc.clone());
        for step in self.inverted_steps().map_err(TransformError::Invert)? {
            tr.step(step)?;
        }
        Ok(tr)
    }
}
