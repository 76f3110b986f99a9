use thiserror::Error;

#[derive(Debug, Error)]
pub enum QcError {
    /// A rule's trigger/valid-values field could not be normalized into a
    /// value set. Indicates a malformed rule definition, not a data issue.
    #[error("invalid value set: {0}")]
    InvalidValueSet(String),
    /// A rule record is missing a field its kind requires.
    #[error("rule \"{comment}\" is malformed: {reason}")]
    MalformedRule { comment: String, reason: String },
    /// Internal row/column bookkeeping invariant violated. Always a bug in
    /// column add/remove code, never tolerated.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),
}

pub type Result<T> = std::result::Result<T, QcError>;
