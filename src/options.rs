//! Parsed, immutable options for the two workflows

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Appended to an archive path to name its ciphertext.
pub const CIPHERTEXT_SUFFIX: &str = ".gpg";

/// Appended to a ciphertext path that lacks [`CIPHERTEXT_SUFFIX`] to name the plaintext.
pub const DECRYPTED_SUFFIX: &str = ".decrypted";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptOptions {
    /// Tarball to encrypt.
    pub archive: PathBuf,
    /// SHA-256 the archive must have, as lowercase hex.
    pub expected_hash: Option<String>,
    /// File holding the passphrase; prompt on the terminal when absent.
    pub password_file: Option<PathBuf>,
}

impl EncryptOptions {
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            expected_hash: None,
            password_file: None,
        }
    }

    pub fn with_expected_hash(mut self, hash: impl Into<String>) -> Self {
        self.expected_hash = Some(hash.into());
        self
    }

    pub fn with_password_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.password_file = Some(path.into());
        self
    }

    /// `<archive>.gpg`
    pub fn ciphertext_path(&self) -> PathBuf {
        append_suffix(&self.archive, CIPHERTEXT_SUFFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptOptions {
    /// Ciphertext to decrypt.
    pub encrypted: PathBuf,
    /// Where to write the plaintext; derived from `encrypted` when absent.
    pub output: Option<PathBuf>,
    /// File holding the passphrase; prompt on the terminal when absent.
    pub password_file: Option<PathBuf>,
    /// Check the plaintext against `<encrypted>.sha256` after decrypting.
    pub verify_hash: bool,
}

impl DecryptOptions {
    pub fn new(encrypted: impl Into<PathBuf>) -> Self {
        Self {
            encrypted: encrypted.into(),
            output: None,
            password_file: None,
            verify_hash: false,
        }
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_password_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.password_file = Some(path.into());
        self
    }

    pub fn with_verify_hash(mut self, verify: bool) -> Self {
        self.verify_hash = verify;
        self
    }

    /// The explicit output path, or one derived from the ciphertext name.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.encrypted),
        }
    }
}

/// Strip a trailing `.gpg`, or append `.decrypted` when there is none.
///
/// A file named exactly `.gpg` has nothing left to strip to and is treated
/// as lacking the suffix.
pub fn default_output_path(encrypted: &Path) -> PathBuf {
    let has_stem = encrypted
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > CIPHERTEXT_SUFFIX.len() && n.ends_with(CIPHERTEXT_SUFFIX));

    match encrypted.to_str() {
        Some(s) if has_stem => PathBuf::from(&s[..s.len() - CIPHERTEXT_SUFFIX.len()]),
        _ => append_suffix(encrypted, DECRYPTED_SUFFIX),
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ciphertext_path() {
        let opts = EncryptOptions::new("build/data.tar.gz");
        assert_eq!(opts.ciphertext_path(), PathBuf::from("build/data.tar.gz.gpg"));
    }

    #[test]
    fn test_encrypt_builder() {
        let opts = EncryptOptions::new("a.tar")
            .with_expected_hash("abc")
            .with_password_file("pw");
        assert_eq!(opts.expected_hash.as_deref(), Some("abc"));
        assert_eq!(opts.password_file, Some(PathBuf::from("pw")));
    }

    #[test]
    fn test_output_strips_gpg() {
        let opts = DecryptOptions::new("dir/data.tar.gz.gpg");
        assert_eq!(opts.output_path(), PathBuf::from("dir/data.tar.gz"));
    }

    #[test]
    fn test_output_appends_decrypted() {
        assert_eq!(
            DecryptOptions::new("data.bin").output_path(),
            PathBuf::from("data.bin.decrypted")
        );
        assert_eq!(
            DecryptOptions::new("data.GPG").output_path(),
            PathBuf::from("data.GPG.decrypted")
        );
        assert_eq!(
            DecryptOptions::new("dir/.gpg").output_path(),
            PathBuf::from("dir/.gpg.decrypted")
        );
    }

    #[test]
    fn test_explicit_output_wins() {
        let opts = DecryptOptions::new("data.tar.gpg").with_output("/tmp/x.tar");
        assert_eq!(opts.output_path(), PathBuf::from("/tmp/x.tar"));
    }
}
