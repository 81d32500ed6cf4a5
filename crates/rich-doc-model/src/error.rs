use thiserror::Error;

/// Errors raised while building a [`Schema`](crate::Schema) from its spec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("duplicate node type `{0}`")]
    DuplicateNodeType(String),

    #[error("duplicate mark type `{0}`")]
    DuplicateMarkType(String),

    #[error("schema is missing its top node type `{0}`")]
    MissingTopNode(String),

    #[error("every schema needs a `text` node type")]
    MissingTextType,

    #[error("no node type or group `{name}` found (in content expression `{expr}`)")]
    UnknownName { name: String, expr: String },

    #[error("unknown mark type `{name}` in marks of node type `{node}`")]
    UnknownMark { name: String, node: String },

    #[error("invalid content expression `{expr}`: {message}")]
    InvalidContentExpression { expr: String, message: String },

    #[error("mixing inline and block content in `{0}`")]
    MixedContent(String),
}

/// Errors raised by the replace algorithm.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplaceError {
    #[error("inserted content deeper than insertion position")]
    TooDeep,

    #[error("inconsistent open depths")]
    InconsistentOpenDepths,

    #[error("slice open depths ({open_start}, {open_end}) exceed its content")]
    OpenDepthExceedsContent { open_start: usize, open_end: usize },

    #[error("cannot join {sub} onto {main}")]
    CannotJoin { sub: String, main: String },

    #[error("invalid content for node {node}: {content}")]
    InvalidContent { node: String, content: String },
}

/// Errors raised by the document model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("position {pos} out of range (content size {size})")]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("range {from}..{to} ends before it starts")]
    ReversedRange { from: usize, to: usize },

    #[error("invalid content for node {node}: {content}")]
    InvalidContent { node: String, content: String },

    #[error("mark {mark} is not allowed in node {node}")]
    MarkNotAllowed { mark: String, node: String },

    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    #[error("unknown mark type `{0}`")]
    UnknownMarkType(String),

    #[error("no value supplied for attribute `{attr}` of `{owner}`")]
    MissingAttribute { attr: String, owner: String },

    #[error("empty text nodes are not allowed")]
    EmptyText,

    #[error("text nodes must be created through Schema::text")]
    TextViaCreate,

    #[error("invalid JSON input: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Replace(#[from] ReplaceError),
}
