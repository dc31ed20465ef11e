//! Error types and handling

use crate::fourcc::FourCc;
use thiserror::Error;

/// Why a conversion between two formats could not be carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionFailure {
    /// The source tag has no entry in the format table
    UnknownSource,
    /// The target tag has no entry in the format table
    UnknownTarget,
    /// Requested target size has a zero dimension
    EmptyTarget,
    /// Target size cannot be rounded up to the target's chroma blocks
    SizeOverflow,
}

impl std::fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnknownSource => "unsupported source format",
            Self::UnknownTarget => "unsupported target format",
            Self::EmptyTarget => "empty target size",
            Self::SizeOverflow => "target size overflows when aligned",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Sample or metadata allocation failed
    #[error("out of memory allocating {requested} bytes")]
    Allocation { requested: usize },

    /// A required input was null, empty or inconsistent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The format pair (or resize request) has no defined transform
    #[error("cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: FourCc,
        to: FourCc,
        reason: ConversionFailure,
    },

    /// Data was requested from an image that has none bound
    #[error("image has no sample data bound")]
    NullResult,

    /// A format tag was not exactly four single-byte characters
    #[error("invalid fourcc {0:?}: expected exactly four single-byte characters")]
    InvalidFourCc(String),

    /// The markup writer failed
    #[error("markup serialization failed: {0}")]
    Markup(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Allocate a filled buffer, reporting exhaustion instead of aborting.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Allocation {
        requested: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    buf.resize(len, value);
    Ok(buf)
}
