//! Hash sidecar files
//!
//! A sidecar sits next to a ciphertext as `<ciphertext>.sha256` and holds a
//! single line: `<sha256hex>  <original name>`.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};

/// Suffix appended to a ciphertext path to locate its sidecar.
pub const SIDECAR_SUFFIX: &str = ".sha256";

/// Where the sidecar for `ciphertext` lives.
pub fn sidecar_path(ciphertext: &Path) -> PathBuf {
    let mut name = OsString::from(ciphertext.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// The sidecar line for `sha256` of the archive named `name`, newline included.
pub fn format_line(sha256: &str, name: &Path) -> String {
    format!("{}  {}\n", sha256, name.display())
}

/// Write the sidecar, replacing any previous one.
///
/// The contents go to a temporary file in the same directory first, which is
/// then renamed over `path`.
pub fn write(path: &Path, sha256: &str, name: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        TarcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to create tempfile",
            e,
        )
    })?;
    temp_file
        .write_all(format_line(sha256, name).as_bytes())
        .map_err(|e| {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to write to tempfile",
                e,
            )
        })?;
    temp_file.as_file().sync_all().map_err(|e| {
        TarcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    // NamedTempFile is created 0600; sidecars are not secret.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| {
                TarcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to set tempfile permissions",
                    e,
                )
            })?;
    }

    temp_file.persist(path).map_err(|e| {
        TarcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Read the expected hash: the first whitespace-delimited token of the first line.
pub fn read_expected_hash(path: &Path) -> Result<String> {
    let contents = fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TarcryptError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::SidecarMissing,
                format!("hash file not found: {}", path.display()),
                e,
            )
        } else {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to read from {}", path.display()),
                e,
            )
        }
    })?;
    let contents = String::from_utf8_lossy(&contents);
    parse_expected_hash(&contents).ok_or_else(|| {
        TarcryptError::with_kind(
            ErrorCategory::User,
            ErrorKind::SidecarInvalid,
            format!("hash file {} contains no hash", path.display()),
        )
    })
}

fn parse_expected_hash(contents: &str) -> Option<String> {
    contents
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().next())
        .map(str::to_string)
}
