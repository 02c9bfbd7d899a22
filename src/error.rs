use thiserror::Error;

/// Failures reported by the link mutation engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("position is not part of the document")]
    UnknownPosition,

    #[error("cannot insert a link without a target at a collapsed selection")]
    EmptyTarget,

    #[error("links are not supported inside code blocks")]
    UnsupportedContext,
}
