//! Tar archive formats and integrity checking
//!
//! An archive is considered intact when `tar` can list its contents with the
//! decompression flag matching its filename suffix. Nothing is extracted.

use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};
use crate::tool;

/// Suffixes accepted for plaintext archives, in the order they are matched.
pub const SUPPORTED_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar"];

/// The compression flavor of a tar archive, as implied by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Uncompressed `.tar`
    Tar,
    /// `.tar.gz` or `.tgz`
    Gzip,
    /// `.tar.bz2` or `.tbz2`
    Bzip2,
}

impl ArchiveFormat {
    /// Determine the format from a path's file name. Matching is case-sensitive.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        let format = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::Gzip)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Some(Self::Bzip2)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        };

        format.ok_or_else(|| {
            TarcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::UnsupportedFormat,
                format!(
                    "unsupported archive format for {}; supported: {}",
                    path.display(),
                    SUPPORTED_SUFFIXES.join(", ")
                ),
            )
        })
    }

    /// The `tar` flags that list an archive of this format.
    pub fn list_flags(self) -> &'static str {
        match self {
            Self::Tar => "-tf",
            Self::Gzip => "-tzf",
            Self::Bzip2 => "-tjf",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tar => "tar",
            Self::Gzip => "tar.gz",
            Self::Bzip2 => "tar.bz2",
        };
        f.write_str(name)
    }
}

/// Proves an archive is well-formed without extracting it.
pub trait ArchiveLister {
    /// Succeeds if the archive at `path` can be listed as `format`.
    fn verify(&self, path: &Path, format: ArchiveFormat) -> Result<()>;
}

/// Lists archives with the system `tar`.
#[derive(Debug, Clone)]
pub struct TarLister {
    program: String,
}

impl TarLister {
    pub fn new() -> Self {
        Self {
            program: "tar".to_string(),
        }
    }
}

impl Default for TarLister {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveLister for TarLister {
    fn verify(&self, path: &Path, format: ArchiveFormat) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(format.list_flags()).arg(path);
        tool::run_checked(
            &mut cmd,
            None,
            ErrorKind::ArchiveCorrupt,
            &format!("{} listing", self.program),
        )
        .map_err(|e| match e.kind {
            Some(ErrorKind::ArchiveCorrupt) => e.with_context(format!(
                "{} is not a valid {} archive",
                path.display(),
                format
            )),
            _ => e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_suffix() {
        let cases = [
            ("data.tar", ArchiveFormat::Tar),
            ("data.tar.gz", ArchiveFormat::Gzip),
            ("data.tgz", ArchiveFormat::Gzip),
            ("data.tar.bz2", ArchiveFormat::Bzip2),
            ("dir/data.tbz2", ArchiveFormat::Bzip2),
        ];
        for (name, expected) in cases {
            assert_eq!(
                ArchiveFormat::from_path(Path::new(name)).unwrap(),
                expected,
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_unsupported_suffix_names_supported_set() {
        for name in ["plain.txt", "data.tar.xz", "data.TAR", "data.zip"] {
            let err = ArchiveFormat::from_path(Path::new(name)).unwrap_err();
            assert_eq!(err.kind, Some(ErrorKind::UnsupportedFormat));
            assert!(err.message().contains(".tar.gz"));
            assert!(err.message().contains(".tbz2"));
        }
    }

    #[test]
    fn test_list_flags() {
        assert_eq!(ArchiveFormat::Tar.list_flags(), "-tf");
        assert_eq!(ArchiveFormat::Gzip.list_flags(), "-tzf");
        assert_eq!(ArchiveFormat::Bzip2.list_flags(), "-tjf");
    }

    #[test]
    fn test_tar_lister_rejects_garbage() {
        if !tool::is_available("tar") {
            eprintln!("skipping: tar not installed");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("junk.tar.gz");
        fs::write(&path, b"this is not gzip data").unwrap();

        let err = TarLister::new()
            .verify(&path, ArchiveFormat::Gzip)
            .unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::ArchiveCorrupt));
    }

    #[test]
    fn test_tar_lister_accepts_real_archive() {
        if !tool::is_available("tar") {
            eprintln!("skipping: tar not installed");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("member.txt"), b"member").unwrap();
        let archive = temp_dir.path().join("good.tar.gz");
        let status = Command::new("tar")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(temp_dir.path())
            .arg("member.txt")
            .status()
            .unwrap();
        assert!(status.success());

        TarLister::new()
            .verify(&archive, ArchiveFormat::Gzip)
            .unwrap();
    }
}
