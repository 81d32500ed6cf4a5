//! Document changes for rich-doc.
//!
//! Edits are expressed as [`Step`]s. A [`Transaction`] applies steps one by
//! one to an immutable starting document, recording each intermediate
//! document and the [`StepMap`] describing how positions moved, so a whole
//! transaction can be mapped through or inverted.

pub mod error;
pub mod map;
pub mod step;
pub mod transaction;

pub use error::{StepError, TransformError};
pub use map::{Assoc, ChangedRange, MapResult, Mapping, StepMap};
pub use step::{AttrStep, ReplaceStep, Step, StepResult};
pub use transaction::Transaction;
