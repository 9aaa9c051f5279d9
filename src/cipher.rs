//! Symmetric encryption through GnuPG
//!
//! gpg runs in batch mode with loopback pinentry and reads the passphrase
//! from its stdin (`--passphrase-fd 0`), so the secret never shows up in a
//! process listing and gpg never opens its own prompt.

use std::path::{Path, PathBuf};
use std::process::Command;

use zeroize::Zeroizing;

use crate::error::{ErrorKind, Result};
use crate::tool;

/// Cipher algorithm handed to `gpg --cipher-algo`.
pub const CIPHER_ALGO: &str = "AES256";

/// File-to-file passphrase-based encryption.
pub trait SymmetricCipher {
    /// Whether the underlying tool can be run.
    fn is_available(&self) -> bool;

    /// Encrypt `input` into `output`, replacing `output` if present.
    fn encrypt(&self, input: &Path, output: &Path, passphrase: &[u8]) -> Result<()>;

    /// Decrypt `input` into `output`, replacing `output` if present.
    fn decrypt(&self, input: &Path, output: &Path, passphrase: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct GpgCipher {
    program: String,
    homedir: Option<PathBuf>,
}

impl GpgCipher {
    pub fn new() -> Self {
        Self::with_program("gpg")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            homedir: None,
        }
    }

    /// Use `homedir` instead of the caller's `~/.gnupg`.
    pub fn with_homedir(mut self, homedir: impl Into<PathBuf>) -> Self {
        self.homedir = Some(homedir.into());
        self
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(homedir) = &self.homedir {
            cmd.arg("--homedir").arg(homedir);
        }
        cmd.args([
            "--batch",
            "--yes",
            "--quiet",
            "--no-symkey-cache",
            "--pinentry-mode",
            "loopback",
            "--passphrase-fd",
            "0",
        ]);
        cmd
    }

    fn run(&self, mut cmd: Command, passphrase: &[u8], what: &str) -> Result<()> {
        let mut stdin = Zeroizing::new(Vec::with_capacity(passphrase.len() + 1));
        stdin.extend_from_slice(passphrase);
        stdin.push(b'\n');
        tool::run_checked(
            &mut cmd,
            Some(stdin.as_slice()),
            ErrorKind::CipherFailed,
            &format!("{} {}", self.program, what),
        )?;
        Ok(())
    }
}

impl Default for GpgCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl SymmetricCipher for GpgCipher {
    fn is_available(&self) -> bool {
        tool::is_available(&self.program)
    }

    fn encrypt(&self, input: &Path, output: &Path, passphrase: &[u8]) -> Result<()> {
        let mut cmd = self.base_command();
        cmd.args(["--symmetric", "--cipher-algo", CIPHER_ALGO, "--output"])
            .arg(output)
            .arg(input);
        self.run(cmd, passphrase, "encryption")
    }

    fn decrypt(&self, input: &Path, output: &Path, passphrase: &[u8]) -> Result<()> {
        let mut cmd = self.base_command();
        cmd.args(["--decrypt", "--output"]).arg(output).arg(input);
        self.run(cmd, passphrase, "decryption")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn gpg_or_skip(home: &TempDir) -> Option<GpgCipher> {
        let gpg = GpgCipher::new().with_homedir(home.path());
        if gpg.is_available() {
            Some(gpg)
        } else {
            eprintln!("skipping: gpg not installed");
            None
        }
    }

    #[test]
    fn test_missing_program() {
        let gpg = GpgCipher::with_program("tarcrypt-no-such-gpg");
        assert!(!gpg.is_available());
        let err = gpg
            .encrypt(Path::new("in"), Path::new("out"), b"pw")
            .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::MissingTool));
    }

    #[test]
    fn test_gpg_roundtrip() {
        let home = TempDir::new().unwrap();
        let Some(gpg) = gpg_or_skip(&home) else { return };
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("data.tar");
        let crypt = temp_dir.path().join("data.tar.gpg");
        let back = temp_dir.path().join("back.tar");
        fs::write(&plain, b"not really a tarball, gpg does not care").unwrap();

        gpg.encrypt(&plain, &crypt, b"secret").unwrap();
        assert_ne!(fs::read(&crypt).unwrap(), fs::read(&plain).unwrap());

        gpg.decrypt(&crypt, &back, b"secret").unwrap();
        assert_eq!(fs::read(&back).unwrap(), fs::read(&plain).unwrap());
    }

    #[test]
    fn test_gpg_wrong_passphrase() {
        let home = TempDir::new().unwrap();
        let Some(gpg) = gpg_or_skip(&home) else { return };
        let temp_dir = TempDir::new().unwrap();
        let plain = temp_dir.path().join("data.tar");
        let crypt = temp_dir.path().join("data.tar.gpg");
        let back = temp_dir.path().join("back.tar");
        fs::write(&plain, b"payload").unwrap();

        gpg.encrypt(&plain, &crypt, b"correct").unwrap();
        let err = gpg.decrypt(&crypt, &back, b"wrong").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::CipherFailed));
    }
}
