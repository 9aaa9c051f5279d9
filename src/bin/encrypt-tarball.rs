//! encrypt-tarball - verify, hash and GPG-encrypt a test-data tarball
//!
//! Usage: encrypt-tarball <tarball_file> [sha256_hash] [--password-file <file>]

use std::process::ExitCode;

use tarcrypt::archive::TarLister;
use tarcrypt::cipher::GpgCipher;
use tarcrypt::cli::{self, EncryptArgs};
use tarcrypt::digest::ExternalDigester;
use tarcrypt::file_ops::{self, Collaborators};
use tarcrypt::prompt::StdinConfirm;
use tarcrypt::status::ConsoleReporter;

fn main() -> ExitCode {
    cli::init_logging();
    let opts = cli::parse_or_exit::<EncryptArgs>().into_options();

    let lister = TarLister::new();
    let cipher = GpgCipher::new();
    let digester = ExternalDigester::new();
    let mut passphrase = cli::passphrase_reader(opts.password_file.as_deref(), true);
    let mut confirm = StdinConfirm::stdin();
    let mut reporter = ConsoleReporter::new();

    let result = file_ops::encrypt_tarball(
        &opts,
        &mut Collaborators {
            lister: &lister,
            cipher: &cipher,
            digester: &digester,
            passphrase: &mut *passphrase,
            confirm: &mut confirm,
            reporter: &mut reporter,
        },
    );
    ExitCode::from(cli::finish(result, &mut reporter))
}
