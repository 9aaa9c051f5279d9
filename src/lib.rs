//! tarcrypt - GPG-encrypted test-data tarballs with SHA-256 sidecars

#![forbid(unsafe_code)]

pub mod archive;
pub mod cipher;
pub mod cli;
pub mod digest;
pub mod error;
pub mod file_ops;
pub mod options;
pub mod passphrase;
pub mod prompt;
pub mod sidecar;
pub mod status;
pub mod tool;
