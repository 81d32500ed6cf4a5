use rich_doc_model::ModelError;
use thiserror::Error;

/// Why a single step could not be applied to a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("no node at position {0}")]
    NoNodeAt(usize),

    #[error("node type `{node}` has no attribute `{attr}`")]
    UnknownAttribute { node: String, attr: String },
}

/// Errors surfaced by [`Transaction`](crate::Transaction) methods and the
/// transforms built on them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("step {index} failed: {source}")]
    StepFailed {
        index: usize,
        #[source]
        source: StepError,
    },

    #[error("cannot invert transaction: {0}")]
    Invert(StepError),

    #[error(transparent)]
    Model(#[from] ModelError),
}
