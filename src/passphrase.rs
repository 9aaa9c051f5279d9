//! Passphrase sources and password file validation

use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};
use std::fs::{self, File};
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as arbitrary bytes (not necessarily UTF-8)
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads the first line of any io::Read source as the passphrase
///
/// Everything from the first `\n` on is discarded, along with a `\r`
/// directly before it. This is how gpg treats `--passphrase-file`.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            data.truncate(pos);
        }
        if data.last() == Some(&b'\r') {
            data.pop();
        }
        Ok(data)
    }
}

/// Reads the passphrase from a password file each time it is asked
pub struct PasswordFileReader {
    path: PathBuf,
}

impl PasswordFileReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PassphraseReader for PasswordFileReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let file = File::open(&self.path).map_err(|e| password_file_error(&self.path, e))?;
        ReaderPassphraseReader::new(Box::new(file))
            .read_passphrase()
            .map_err(|e| e.with_context(format!("failed to read {}", self.path.display())))
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader {
    confirm: bool,
}

impl TerminalPassphraseReader {
    /// Prompt once.
    pub fn new() -> Self {
        Self { confirm: false }
    }

    /// Prompt twice and require both entries to match.
    pub fn confirming() -> Self {
        Self { confirm: true }
    }

    fn prompt(&self, label: &str) -> Result<Zeroizing<Vec<u8>>> {
        io::stderr().write_all(label.as_bytes()).map_err(|e| {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to write prompt: {}", e),
                e,
            )
        })?;
        io::stderr().flush().map_err(|e| {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        // rpassword returns String (UTF-8 only), not zeroized
        let passphrase = rpassword::read_password().map_err(|e| {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;
        Ok(Zeroizing::new(passphrase.into_bytes()))
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Note: Terminal input is limited to UTF-8 due to rpassword library constraints.
    /// For non-UTF-8 passphrases, use --password-file instead.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(TarcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal; use --password-file",
            ));
        }

        let passphrase = self.prompt("Passphrase: ")?;
        if self.confirm {
            let repeated = self.prompt("Repeat passphrase: ")?;
            if *repeated != *passphrase {
                return Err(TarcryptError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::PassphraseUnavailable,
                    "passphrases do not match",
                ));
            }
        }
        Ok(passphrase)
    }
}

/// A password file that has been checked to exist and be readable
#[derive(Debug, Clone)]
pub struct PasswordFile {
    path: PathBuf,
    mode: Option<u32>,
}

impl PasswordFile {
    /// Permission modes that do not trigger a warning.
    pub const RECOMMENDED_MODES: [u32; 2] = [0o400, 0o600];

    /// Validate that `path` is an existing, readable regular file.
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| password_file_error(path, e))?;
        if !metadata.is_file() {
            return Err(TarcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PasswordFile,
                format!("password file is not a regular file: {}", path.display()),
            ));
        }
        // Opening is the only reliable readability check (ACLs, root, etc).
        File::open(path).map_err(|e| password_file_error(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            mode: permission_bits(&metadata),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Permission bits (`0o777` mask). `None` on platforms without Unix modes.
    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    /// True when the mode is 400 or 600, or cannot be determined.
    pub fn has_recommended_mode(&self) -> bool {
        match self.mode {
            Some(mode) => Self::RECOMMENDED_MODES.contains(&mode),
            None => true,
        }
    }

    /// A reader producing the passphrase stored in this file.
    pub fn reader(&self) -> PasswordFileReader {
        PasswordFileReader::new(&self.path)
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

fn password_file_error(path: &Path, err: io::Error) -> TarcryptError {
    let msg = match err.kind() {
        io::ErrorKind::NotFound => format!("password file not found: {}", path.display()),
        io::ErrorKind::PermissionDenied => {
            format!("password file is not readable: {}", path.display())
        }
        _ => format!("failed to access password file {}", path.display()),
    };
    TarcryptError::with_kind_and_source(ErrorCategory::User, ErrorKind::PasswordFile, msg, err)
}
