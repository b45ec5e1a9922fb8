use thiserror::Error;

/// Fatal precondition violations surfaced by this crate's containers.
///
/// None of these are recoverable inside the engine: every variant names a
/// precondition the caller violated, and the container's invariants are
/// assumed intact on both sides of the call that returned the error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("key not found")]
    KeyNotFound,

    #[error("duplicate key: container does not allow duplicates")]
    DuplicateKey,

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("mutation attempted on a read-only container")]
    ImmutableMutation,

    #[error("invalid node capacity {0}: must be greater than 2")]
    InvalidCapacity(usize),

    #[error("cannot disable allow_duplicates on a non-empty container")]
    AllowDuplicatesTransition,

    #[error("invalid range: hi ({hi}) is less than lo ({lo})")]
    InvalidRange { lo: String, hi: String },

    #[error("unsupported operation on this view: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
