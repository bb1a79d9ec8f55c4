//! Error types for reel planning.

use thiserror::Error;

use crate::types::{BoxId, ReelId};

/// Result type alias for planner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that reject an input before any optimization starts.
///
/// Boxes that fit on no reel and plans cut short by the pass limit are not
/// errors; they are reported inside the plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A zero folded or plate dimension, or a reel with no usable width.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// Machine limits outside what the cutting line supports.
    #[error("invalid machine config: {0}")]
    InvalidConfig(String),

    /// A production request names a box that was not supplied.
    #[error("unknown box '{0}'")]
    UnknownBox(BoxId),

    /// Two box specs share an identifier.
    #[error("duplicate box '{0}'")]
    DuplicateBox(BoxId),

    /// Two reel profiles share an identifier.
    #[error("duplicate reel '{0}'")]
    DuplicateReel(ReelId),

    /// A forced reel is not among the configured profiles.
    #[error("unknown reel '{0}'")]
    UnknownReel(ReelId),
}
