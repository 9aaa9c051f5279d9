use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee the error is not, for example,
    /// due to a user error - merely that it cannot be confidently determined
    /// by the code.
    Internal,

    /// The user provided invalid input, a broken environment, or asked for
    /// something that cannot be completed.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Command-line arguments were missing, unknown or malformed.
    Usage,
    /// A required external program (gpg, tar, sha256sum/shasum) is not installed.
    MissingTool,
    /// The password file is missing, not a regular file, or unreadable.
    PasswordFile,
    /// An input file (archive or ciphertext) does not exist as a regular file.
    InputNotFound,
    /// The archive's filename suffix is not one of the supported tar flavors.
    UnsupportedFormat,
    /// The archive failed its tar listing check.
    ArchiveCorrupt,
    /// A computed SHA-256 did not match the expected one.
    HashMismatch,
    /// Hash verification was requested but no sidecar file exists.
    SidecarMissing,
    /// The sidecar file exists but carries no usable hash.
    SidecarInvalid,
    /// No SHA-256 could be produced for a file.
    DigestFailed,
    /// The cipher tool failed to encrypt or decrypt (e.g. wrong passphrase).
    CipherFailed,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Interaction with the filesystem, stdin/stdout, or child processes failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct TarcryptError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl TarcryptError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// Renders the message followed by every source in the chain, `: ` separated.
    pub fn chain_message(&self) -> String {
        let mut out = self.msg.clone();
        let mut next = StdError::source(self);
        while let Some(err) = next {
            out.push_str(": ");
            out.push_str(&err.to_string());
            next = err.source();
        }
        out
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TarcryptError>;
