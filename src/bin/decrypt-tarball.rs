//! decrypt-tarball - decrypt a GPG-encrypted tarball and optionally verify its hash
//!
//! Usage: decrypt-tarball <encrypted_file> [--password-file <file>] [--output <file>] [--verify-hash]

use std::process::ExitCode;

use tarcrypt::archive::TarLister;
use tarcrypt::cipher::GpgCipher;
use tarcrypt::cli::{self, DecryptArgs};
use tarcrypt::digest::ExternalDigester;
use tarcrypt::file_ops::{self, Collaborators};
use tarcrypt::prompt::StdinConfirm;
use tarcrypt::status::ConsoleReporter;

fn main() -> ExitCode {
    cli::init_logging();
    let opts = cli::parse_or_exit::<DecryptArgs>().into_options();

    // Decryption never lists archives; the lister only completes the collaborator set.
    let lister = TarLister::new();
    let cipher = GpgCipher::new();
    let digester = ExternalDigester::new();
    let mut passphrase = cli::passphrase_reader(opts.password_file.as_deref(), false);
    let mut confirm = StdinConfirm::stdin();
    let mut reporter = ConsoleReporter::new();

    let result = file_ops::decrypt_tarball(
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
