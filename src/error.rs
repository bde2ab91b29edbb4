//! Error types for the annealing core.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PamcError {
    /// A caller-supplied value is outside its documented domain (sequential
    /// Wolff, out-of-range spin value or site index, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A resample produced more copies than the population can ever hold.
    #[error("resample target {requested} exceeds population bound {max}")]
    CapacityExceeded { requested: usize, max: usize },

    /// A neighbor or bond table file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A neighbor or bond table file was read but could not be parsed.
    #[error("malformed table: {0}")]
    MalformedTable(String),

    /// An internal invariant was violated by the caller (e.g. reassigning a
    /// replica family). Indicates a bug in the calling code.
    #[error("logic error: {0}")]
    Logic(String),
}

pub type Result<T> = std::result::Result<T, PamcError>;
