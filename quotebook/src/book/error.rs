use thiserror::Error;
use uuid::Uuid;

/// Failure modes of the quote manager.
///
/// Every error is local to the call that raised it. An empty best-quote
/// result and a zero or partial fill are ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("no active quote found for id {0}")]
    NotFound(Uuid),

    #[error("cannot add or update an expired quote")]
    Expired,
}
