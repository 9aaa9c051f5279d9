//! Command-line surface shared by the `encrypt-tarball` and `decrypt-tarball` binaries

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::file_ops::Outcome;
use crate::options::{DecryptOptions, EncryptOptions};
use crate::passphrase::{PassphraseReader, PasswordFileReader, TerminalPassphraseReader};
use crate::status::Reporter;

#[derive(Parser, Debug)]
#[command(name = "encrypt-tarball")]
#[command(version)]
#[command(
    about = "Verify, hash and GPG-encrypt a tarball (AES-256), writing <file>.gpg and <file>.gpg.sha256",
    long_about = None
)]
pub struct EncryptArgs {
    /// Tarball to encrypt (.tar, .tar.gz, .tgz, .tar.bz2, .tbz2)
    #[arg(value_name = "TARBALL_FILE")]
    pub tarball_file: PathBuf,

    /// Expected SHA-256 of the tarball, lowercase hex; encryption aborts on mismatch
    #[arg(value_name = "SHA256_HASH")]
    pub sha256_hash: Option<String>,

    /// Read the passphrase from this file instead of prompting (mode 400 or 600 recommended)
    #[arg(long, value_name = "FILE")]
    pub password_file: Option<PathBuf>,
}

impl EncryptArgs {
    pub fn into_options(self) -> EncryptOptions {
        EncryptOptions {
            archive: self.tarball_file,
            expected_hash: self.sha256_hash,
            password_file: self.password_file,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "decrypt-tarball")]
#[command(version)]
#[command(
    about = "Decrypt a GPG-encrypted tarball and optionally verify its SHA-256",
    long_about = None
)]
pub struct DecryptArgs {
    /// Encrypted file to decrypt
    #[arg(value_name = "ENCRYPTED_FILE")]
    pub encrypted_file: PathBuf,

    /// Read the passphrase from this file instead of prompting
    #[arg(long, value_name = "FILE")]
    pub password_file: Option<PathBuf>,

    /// Where to write the decrypted file (default: input without .gpg, or input + .decrypted)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Check the decrypted file against <ENCRYPTED_FILE>.sha256
    #[arg(long)]
    pub verify_hash: bool,
}

impl DecryptArgs {
    pub fn into_options(self) -> DecryptOptions {
        DecryptOptions {
            encrypted: self.encrypted_file,
            output: self.output,
            password_file: self.password_file,
            verify_hash: self.verify_hash,
        }
    }
}

/// Install the stderr diagnostics subscriber. `RUST_LOG` overrides the default `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

/// Parse the process arguments, exiting 0 for help/version and 1 for usage errors.
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            process::exit(usage_exit_code(e.kind()));
        }
    }
}

/// Exit code for a clap parse failure.
pub fn usage_exit_code(kind: ClapErrorKind) -> i32 {
    match kind {
        ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// The password file reader when one was given, otherwise a terminal prompt.
pub fn passphrase_reader(
    password_file: Option<&Path>,
    confirm_on_terminal: bool,
) -> Box<dyn PassphraseReader> {
    match password_file {
        Some(path) => Box::new(PasswordFileReader::new(path)),
        None if confirm_on_terminal => Box::new(TerminalPassphraseReader::confirming()),
        None => Box::new(TerminalPassphraseReader::new()),
    }
}

/// Report a workflow's failure, if any, and turn it into the process exit status.
///
/// A cancelled workflow is a success.
pub fn finish<T>(result: Result<Outcome<T>>, reporter: &mut dyn Reporter) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            tracing::debug!(error = ?e, "workflow failed");
            reporter.error(&e.chain_message());
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, ErrorKind, TarcryptError};
    use crate::status::{Level, RecordingReporter};

    #[test]
    fn test_encrypt_args_minimal() {
        let args = EncryptArgs::try_parse_from(["encrypt-tarball", "data.tar.gz"]).unwrap();
        let opts = args.into_options();
        assert_eq!(opts, EncryptOptions::new("data.tar.gz"));
    }

    #[test]
    fn test_encrypt_args_full() {
        let args = EncryptArgs::try_parse_from([
            "encrypt-tarball",
            "--password-file",
            "secret.txt",
            "data.tar",
            "abc123",
        ])
        .unwrap();
        let opts = args.into_options();
        assert_eq!(
            opts,
            EncryptOptions::new("data.tar")
                .with_expected_hash("abc123")
                .with_password_file("secret.txt")
        );
    }

    #[test]
    fn test_encrypt_args_usage_errors() {
        let bad: [&[&str]; 4] = [
            &["encrypt-tarball"],
            &["encrypt-tarball", "a.tar", "hash", "extra"],
            &["encrypt-tarball", "a.tar", "--bogus"],
            &["encrypt-tarball", "a.tar", "--password-file"],
        ];
        for argv in bad {
            let err = EncryptArgs::try_parse_from(argv.iter().copied()).unwrap_err();
            assert_eq!(usage_exit_code(err.kind()), 1, "{:?}", argv);
        }
    }

    #[test]
    fn test_decrypt_args() {
        let args = DecryptArgs::try_parse_from([
            "decrypt-tarball",
            "data.tar.gz.gpg",
            "--output",
            "out.tar.gz",
            "--verify-hash",
            "--password-file",
            "pw",
        ])
        .unwrap();
        assert_eq!(
            args.into_options(),
            DecryptOptions::new("data.tar.gz.gpg")
                .with_output("out.tar.gz")
                .with_password_file("pw")
                .with_verify_hash(true)
        );
    }

    #[test]
    fn test_decrypt_args_usage_errors() {
        let bad: [&[&str]; 4] = [
            &["decrypt-tarball"],
            &["decrypt-tarball", "x.gpg", "--output"],
            &["decrypt-tarball", "x.gpg", "--verify-hash=yes"],
            &["decrypt-tarball", "x.gpg", "y.gpg"],
        ];
        for argv in bad {
            let err = DecryptArgs::try_parse_from(argv.iter().copied()).unwrap_err();
            assert_eq!(usage_exit_code(err.kind()), 1, "{:?}", argv);
        }
    }

    #[test]
    fn test_help_exits_zero() {
        let err = DecryptArgs::try_parse_from(["decrypt-tarball", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(err.kind()), 0);
    }

    #[test]
    fn test_finish() {
        let mut reporter = RecordingReporter::new();
        assert_eq!(finish::<()>(Ok(Outcome::Cancelled), &mut reporter), 0);
        assert!(reporter.lines.is_empty());

        let err =
            TarcryptError::with_kind(ErrorCategory::User, ErrorKind::HashMismatch, "bad hash")
                .with_context("verification failed");
        assert_eq!(finish::<()>(Err(err), &mut reporter), 1);
        assert!(reporter.contains(Level::Error, "verification failed: bad hash"));
    }

    #[test]
    fn test_clap_definitions() {
        use clap::CommandFactory;
        EncryptArgs::command().debug_assert();
        DecryptArgs::command().debug_assert();
    }
}
