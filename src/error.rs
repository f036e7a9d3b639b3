//! Error types for the tickboard core.

use thiserror::Error;

/// Errors surfaced by the board.
///
/// Element-level failures (bad sensor reads, timeouts) are deliberately *not*
/// represented here: they are handled inside the element, logged, and leave
/// the element inactive. The scheduler keeps running.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration tree had the wrong shape (not an object, etc.)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An element with this id already exists on the board
    #[error("duplicate element id '{0}'")]
    DuplicateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Config("root must be an object".to_string());
        assert!(err.to_string().contains("root must be an object"));

        let err = Error::DuplicateId("value/v1".to_string());
        assert!(err.to_string().contains("value/v1"));
    }
}
