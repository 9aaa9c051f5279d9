//! Tarball encryption/decryption workflows
//!
//! Both workflows are a fixed sequence of checks followed by a single cipher
//! invocation. Every failure aborts the whole operation; the only early exit
//! that is not an error is the operator declining to overwrite an output file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveFormat, ArchiveLister};
use crate::cipher::{CIPHER_ALGO, SymmetricCipher};
use crate::digest::Digester;
use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};
use crate::options::{DecryptOptions, EncryptOptions};
use crate::passphrase::{PassphraseReader, PasswordFile};
use crate::prompt::Confirm;
use crate::sidecar;
use crate::status::Reporter;

/// The external services a workflow runs against.
pub struct Collaborators<'a> {
    pub lister: &'a dyn ArchiveLister,
    pub cipher: &'a dyn SymmetricCipher,
    pub digester: &'a dyn Digester,
    pub passphrase: &'a mut dyn PassphraseReader,
    pub confirm: &'a mut dyn Confirm,
    pub reporter: &'a mut dyn Reporter,
}

/// Result of a workflow that the operator may cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// The operator declined to overwrite an existing output file.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptReport {
    pub ciphertext: PathBuf,
    pub sidecar: PathBuf,
    /// Lowercase hex SHA-256 of the plaintext archive.
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub expected: String,
    pub calculated: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptReport {
    pub output: PathBuf,
    /// Present when hash verification was requested (and passed).
    pub verification: Option<Verification>,
}

/// Validate, hash and encrypt a tarball, then write its hash sidecar.
///
/// Writes `<archive>.gpg` and `<archive>.gpg.sha256`. The archive itself is
/// never modified.
pub fn encrypt_tarball(
    opts: &EncryptOptions,
    c: &mut Collaborators<'_>,
) -> Result<Outcome<EncryptReport>> {
    tracing::info!(archive = %opts.archive.display(), "encrypting tarball");

    if let Some(path) = &opts.password_file {
        let password_file = PasswordFile::open(path)?;
        if !password_file.has_recommended_mode() {
            let mode = password_file.mode().unwrap_or_default();
            tracing::warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "loose password file permissions"
            );
            c.reporter.warn(&format!(
                "password file {} has permissions {:o}; 400 or 600 is recommended",
                path.display(),
                mode
            ));
        }
    }

    require_cipher(c.cipher)?;
    if !c.digester.is_available() {
        return Err(TarcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::MissingTool,
            "neither sha256sum nor shasum is installed",
        ));
    }

    require_regular_file(&opts.archive, "tarball")?;

    let format = ArchiveFormat::from_path(&opts.archive)?;
    c.reporter.info(&format!("Verifying {} archive integrity...", format));
    c.lister.verify(&opts.archive, format)?;
    c.reporter.success("Archive integrity verified");

    c.reporter.info("Calculating SHA-256 hash...");
    let sha256 = c
        .digester
        .sha256(&opts.archive)
        .map_err(|e| e.with_context("failed to calculate SHA-256 hash"))?;
    c.reporter.info(&format!("SHA-256: {}", sha256));

    if let Some(expected) = &opts.expected_hash {
        if *expected != sha256 {
            return Err(hash_mismatch(expected, &sha256));
        }
    }

    let ciphertext = opts.ciphertext_path();
    if !confirm_overwrite(&ciphertext, c)? {
        return Ok(Outcome::Cancelled);
    }

    let passphrase = read_passphrase(c.passphrase)?;
    c.reporter.info(&format!("Encrypting with {}...", CIPHER_ALGO));
    c.cipher
        .encrypt(&opts.archive, &ciphertext, &passphrase)
        .map_err(|e| e.with_context("encryption failed"))?;
    c.reporter.success(&format!("Encrypted file: {}", ciphertext.display()));

    let sidecar = sidecar::sidecar_path(&ciphertext);
    sidecar::write(&sidecar, &sha256, &opts.archive)
        .map_err(|e| e.with_context(format!("failed to write to {}", sidecar.display())))?;
    c.reporter.success(&format!("Hash file: {}", sidecar.display()));

    tracing::info!(ciphertext = %ciphertext.display(), "tarball encrypted");
    Ok(Outcome::Completed(EncryptReport {
        ciphertext,
        sidecar,
        sha256,
    }))
}

/// Decrypt a ciphertext and, on request, check the result against its sidecar.
///
/// When verification fails the decrypted file is left in place.
pub fn decrypt_tarball(
    opts: &DecryptOptions,
    c: &mut Collaborators<'_>,
) -> Result<Outcome<DecryptReport>> {
    tracing::info!(encrypted = %opts.encrypted.display(), "decrypting tarball");

    if let Some(path) = &opts.password_file {
        PasswordFile::open(path)?;
    }

    require_cipher(c.cipher)?;
    require_regular_file(&opts.encrypted, "encrypted file")?;

    let output = opts.output_path();
    if !confirm_overwrite(&output, c)? {
        return Ok(Outcome::Cancelled);
    }

    let passphrase = read_passphrase(c.passphrase)?;
    c.reporter.info("Decrypting...");
    c.cipher
        .decrypt(&opts.encrypted, &output, &passphrase)
        .map_err(|e| e.with_context("decryption failed"))?;
    c.reporter.success(&format!("Decrypted file: {}", output.display()));

    if !opts.verify_hash {
        c.reporter.info(
            "Tip: pass --verify-hash to check the decrypted file against its .sha256 file",
        );
        return Ok(Outcome::Completed(DecryptReport {
            output,
            verification: None,
        }));
    }

    let sidecar = sidecar::sidecar_path(&opts.encrypted);
    let expected = sidecar::read_expected_hash(&sidecar)
        .map_err(|e| e.with_context("cannot verify hash"))?;
    c.reporter.info("Verifying SHA-256 hash...");
    let calculated = c
        .digester
        .sha256(&output)
        .map_err(|e| e.with_context("failed to calculate SHA-256 hash"))?;
    c.reporter.info(&format!("Expected:   {}", expected));
    c.reporter.info(&format!("Calculated: {}", calculated));

    if expected != calculated {
        tracing::warn!(output = %output.display(), "decrypted file failed hash verification");
        return Err(hash_mismatch(&expected, &calculated));
    }
    c.reporter.success("Hash verification passed");

    Ok(Outcome::Completed(DecryptReport {
        output,
        verification: Some(Verification {
            expected,
            calculated,
        }),
    }))
}

fn require_cipher(cipher: &dyn SymmetricCipher) -> Result<()> {
    if cipher.is_available() {
        Ok(())
    } else {
        Err(TarcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::MissingTool,
            "gpg is not installed",
        ))
    }
}

fn require_regular_file(path: &Path, what: &str) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(TarcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::InputNotFound,
            format!("{} is not a regular file: {}", what, path.display()),
        )),
        Err(e) => {
            let category = if e.kind() == io::ErrorKind::NotFound {
                ErrorCategory::User
            } else {
                ErrorCategory::Internal
            };
            Err(TarcryptError::with_kind_and_source(
                category,
                ErrorKind::InputNotFound,
                format!("{} not found: {}", what, path.display()),
                e,
            ))
        }
    }
}

/// True if `path` is free or the operator agreed to replace it.
fn confirm_overwrite(path: &Path, c: &mut Collaborators<'_>) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    let question = format!("{} already exists. Overwrite?", path.display());
    if c.confirm.confirm(&question)? {
        Ok(true)
    } else {
        tracing::info!(path = %path.display(), "overwrite declined");
        c.reporter.info("Operation cancelled");
        Ok(false)
    }
}

fn read_passphrase(reader: &mut dyn PassphraseReader) -> Result<zeroize::Zeroizing<Vec<u8>>> {
    let passphrase = reader.read_passphrase()?;
    if passphrase.is_empty() {
        return Err(TarcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::PassphraseUnavailable,
            "passphrase is empty",
        ));
    }
    Ok(passphrase)
}

fn hash_mismatch(expected: &str, calculated: &str) -> TarcryptError {
    TarcryptError::with_kind(
        ErrorCategory::User,
        ErrorKind::HashMismatch,
        format!(
            "SHA-256 mismatch: expected {}, calculated {}",
            expected, calculated
        ),
    )
}
