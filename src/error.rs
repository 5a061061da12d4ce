//! Global error handling for concatfs
//!
//! One error type covers listing, reading and concatenation so callers can
//! tell a policy veto from a missing path or an unreadable file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`ConcatError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input (empty root path, empty selection)
    Validation,
    /// Policy veto or OS permission error
    AccessDenied,
    /// Path does not exist
    NotFound,
    /// OS-level I/O failure or undecodable content
    NotReadable,
    /// Path exists but is the wrong kind of entry
    Unsupported,
    /// Anything else
    Internal,
}

/// Global error type for concatfs operations
#[derive(Error, Debug)]
pub enum ConcatError {
    /// Invalid user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Access refused. The message is deliberately generic.
    #[error("Access not allowed for security reasons")]
    AccessDenied(PathBuf),

    /// Path not found
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O failure while reading a path
    #[error("Cannot read {}: {source}", path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File name is not recognized as text
    #[error("Not a valid text file: {}", .0.display())]
    NotText(PathBuf),

    /// A directory was given where a file is required
    #[error("Cannot read a directory as a file: {}", .0.display())]
    IsDirectory(PathBuf),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regular expression errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ConcatError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotReadable { .. } => ErrorKind::NotReadable,
            Self::NotText(_) | Self::IsDirectory(_) => ErrorKind::Unsupported,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Regex(_) => ErrorKind::Internal,
        }
    }

    /// Map an OS error on `path` onto the taxonomy
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::AccessDenied(path),
            _ => Self::NotReadable { path, source },
        }
    }
}

/// Specialized Result type for concatfs operations
pub type Result<T> = std::result::Result<T, ConcatError>;

/// Creates a ConcatError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::ConcatError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

// Allow converting ConcatError to io::Error for the binary's main signature
impl From<ConcatError> for io::Error {
    fn from(err: ConcatError) -> Self {
        let kind = match err.kind() {
            ErrorKind::NotFound => io::ErrorKind::NotFound,
            ErrorKind::AccessDenied => io::ErrorKind::PermissionDenied,
            ErrorKind::Validation => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_distinct_kinds() {
        let missing = ConcatError::from_io("/a", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let denied = ConcatError::from_io("/a", io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(denied.kind(), ErrorKind::AccessDenied);

        let other = ConcatError::from_io("/a", io::Error::from(io::ErrorKind::InvalidData));
        assert_eq!(other.kind(), ErrorKind::NotReadable);
    }

    #[test]
    fn access_denied_message_does_not_leak_path() {
        let err = ConcatError::AccessDenied(PathBuf::from("/home/me/.ssh/id_rsa"));
        let message = err.to_string();
        assert!(!message.contains(".ssh"));
        assert!(!message.contains("id_rsa"));
    }

    #[test]
    fn macros_build_variants() {
        fn check(value: usize) -> Result<usize> {
            ensure!(value > 0, Validation, "value must be positive, got {}", value);
            Ok(value)
        }
        assert!(check(1).is_ok());
        let err = check(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("got 0"));
    }
}
