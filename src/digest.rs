//! SHA-256 digests via the system hashing utilities
//!
//! `sha256sum` is preferred; `shasum -a 256` is used when it is missing.

use std::path::Path;
use std::process::Command;

use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};
use crate::tool;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Computes SHA-256 digests of files.
pub trait Digester {
    /// Whether a digest can be computed at all in this environment.
    fn is_available(&self) -> bool;

    /// Lowercase hex SHA-256 of the file at `path`.
    fn sha256(&self, path: &Path) -> Result<String>;
}

/// One of the interchangeable SHA-256 command-line utilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sha256Tool {
    /// GNU coreutils `sha256sum`
    Sha256sum,
    /// Perl `shasum`, as shipped on macOS
    Shasum,
}

impl Sha256Tool {
    pub fn program(self) -> &'static str {
        match self {
            Self::Sha256sum => "sha256sum",
            Self::Shasum => "shasum",
        }
    }

    fn command(self, path: &Path) -> Command {
        let mut cmd = Command::new(self.program());
        if self == Self::Shasum {
            cmd.args(["-a", "256"]);
        }
        cmd.arg(path);
        cmd
    }
}

/// Digester backed by whichever [`Sha256Tool`] is installed, in preference order.
#[derive(Debug, Clone)]
pub struct ExternalDigester {
    preference: Vec<Sha256Tool>,
}

impl ExternalDigester {
    pub fn new() -> Self {
        Self::with_preference(vec![Sha256Tool::Sha256sum, Sha256Tool::Shasum])
    }

    pub fn with_preference(preference: Vec<Sha256Tool>) -> Self {
        Self { preference }
    }

    /// The first tool in preference order that can be run.
    pub fn select_tool(&self) -> Option<Sha256Tool> {
        self.preference
            .iter()
            .copied()
            .find(|t| tool::is_available(t.program()))
    }
}

impl Default for ExternalDigester {
    fn default() -> Self {
        Self::new()
    }
}

impl Digester for ExternalDigester {
    fn is_available(&self) -> bool {
        self.select_tool().is_some()
    }

    fn sha256(&self, path: &Path) -> Result<String> {
        let selected = self.select_tool().ok_or_else(|| {
            let names: Vec<&str> = self.preference.iter().map(|t| t.program()).collect();
            TarcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::MissingTool,
                format!("no SHA-256 utility found (tried {})", names.join(", ")),
            )
        })?;

        let output = tool::run_checked(
            &mut selected.command(path),
            None,
            ErrorKind::DigestFailed,
            selected.program(),
        )?;
        parse_digest_output(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| e.with_context(format!("failed to hash {}", path.display())))
    }
}

/// Extract the digest from `<hex>  <name>` style output.
///
/// A leading backslash, which both utilities emit when the file name needed
/// escaping, is ignored.
pub fn parse_digest_output(output: &str) -> Result<String> {
    let token = output
        .split_whitespace()
        .next()
        .map(|t| t.strip_prefix('\\').unwrap_or(t))
        .unwrap_or("");
    if token.is_empty() {
        return Err(TarcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::DigestFailed,
            "hash utility produced no output",
        ));
    }
    if !is_sha256_hex(token) {
        return Err(TarcryptError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::DigestFailed,
            format!("hash utility produced an unexpected digest: {}", token),
        ));
    }
    Ok(token.to_ascii_lowercase())
}

/// True for exactly 64 hex digits, either case.
pub fn is_sha256_hex(s: &str) -> bool {
    s.len() == SHA256_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}
