use thiserror::Error;

/// Errors that can occur while building a partition.
///
/// All of them are detected before anything is installed, so a failed build
/// never leaves a half-constructed structure behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// Non-positive counts or sizes, or values outside their legal range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The structure needs more groups, rings or cells than the fixed layout holds.
    #[error("capacity exceeded: {what} needs {requested}, limit is {limit}")]
    CapacityExceeded {
        what: &'static str,
        requested: u64,
        limit: u64,
    },

    /// Zero-radius or zero-span shells, or shells that do not tile space.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl BuildError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    pub(crate) fn capacity(what: &'static str, requested: u64, limit: u64) -> Self {
        Self::CapacityExceeded {
            what,
            requested,
            limit,
        }
    }
}
