//! Error types for lazyrun.

use thiserror::Error;

/// Top-level result type for lazyrun operations.
pub type Result<T> = std::result::Result<T, LazyrunError>;

/// Top-level error type for lazyrun.
#[derive(Debug, Error)]
pub enum LazyrunError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("invalid shortcut name '{0}'")]
    InvalidName(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store lock error: {0}")]
    Lock(String),
}

impl LazyrunError {
    /// True for errors the caller is expected to report as a message
    /// rather than fail on.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// An operation targeted a shortcut, tag, or group membership that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("No shortcut found with the name '{name}'.")]
    Shortcut { name: String },

    #[error("Shortcut '{name}' has no tag '{tag}'.")]
    Tag { name: String, tag: String },

    #[error("Shortcut '{name}' is not a member of group '{group}'.")]
    GroupMember { name: String, group: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_name_the_target() {
        let err = LazyrunError::from(NotFound::Tag {
            name: "build".to_string(),
            tag: "ci".to_string(),
        });
        let msg = err.to_string();
        assert!(msg.contains("build"));
        assert!(msg.contains("ci"));
        assert!(err.is_not_found());

        let err = LazyrunError::InvalidName("_meta".to_string());
        assert!(err.to_string().contains("_meta"));
        assert!(!err.is_not_found());
    }
}
