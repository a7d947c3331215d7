//! Conversion errors
//!
//! Only [`ConvertError::MalformedInput`] and [`ConvertError::Io`] abort the
//! conversion of a file. Every other variant is recorded as a warning and the
//! conversion continues with the affected property, resource or clip left out.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while converting a scene or prefab file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConvertError {
    /// The record array is not well formed (fatal for the file)
    #[error("malformed input{}: {message}", index.map(|i| format!(" at record {}", i)).unwrap_or_default())]
    MalformedInput { index: Option<usize>, message: String },

    /// The asset index has no entry for a uuid
    #[error("unknown asset '{uuid}'")]
    UnknownAsset { uuid: String },

    /// A sidecar document exists but could not be read or understood
    #[error("malformed metadata for asset '{uuid}': {message}")]
    MalformedSidecar { uuid: String, message: String },

    /// A node lacks a component or reference its variant needs
    #[error("{variant} node at record {index} is incomplete: {what}")]
    IncompleteNode { index: usize, variant: &'static str, what: String },

    /// An animation clip document could not be normalized
    #[error("malformed animation clip '{uuid}': {message}")]
    MalformedClip { uuid: String, message: String },

    /// Reading the input file failed
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn malformed(index: impl Into<Option<usize>>, message: impl Into<String>) -> Self {
        ConvertError::MalformedInput { index: index.into(), message: message.into() }
    }

    pub(crate) fn unknown_asset(uuid: &str) -> Self {
        ConvertError::UnknownAsset { uuid: uuid.to_string() }
    }

    pub(crate) fn sidecar(uuid: &str, message: impl Into<String>) -> Self {
        ConvertError::MalformedSidecar { uuid: uuid.to_string(), message: message.into() }
    }

    pub(crate) fn incomplete(index: usize, variant: &'static str, what: impl Into<String>) -> Self {
        ConvertError::IncompleteNode { index, variant, what: what.into() }
    }

    pub(crate) fn clip(uuid: &str, message: impl Into<String>) -> Self {
        ConvertError::MalformedClip { uuid: uuid.to_string(), message: message.into() }
    }

    /// Whether this error stops the conversion of the current file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConvertError::MalformedInput { .. } | ConvertError::Io { .. })
    }
}

/// Result alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_with_index() {
        let err = ConvertError::malformed(4, "reference out of bounds");
        assert_eq!(err.to_string(), "malformed input at record 4: reference out of bounds");
    }

    #[test]
    fn test_malformed_display_without_index() {
        let err = ConvertError::malformed(None, "expected a JSON array");
        assert_eq!(err.to_string(), "malformed input: expected a JSON array");
    }

    #[test]
    fn test_fatality() {
        assert!(ConvertError::malformed(None, "x").is_fatal());
        assert!(!ConvertError::unknown_asset("abc").is_fatal());
        assert!(!ConvertError::incomplete(3, "Sprite", "missing sprite frame").is_fatal());
        assert!(!ConvertError::clip("c1", "bad").is_fatal());
    }

    #[test]
    fn test_incomplete_display() {
        let err = ConvertError::incomplete(7, "ScrollView", "content node reference missing");
        assert!(err.to_string().contains("ScrollView node at record 7"));
    }
}
