//! Plumbing for the external programs tarcrypt drives (gpg, tar, sha256sum, shasum).

use std::io::{self, Write};
use std::process::{Command, ExitStatus, Output, Stdio};

use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};

/// Returns true if `program --version` can be run and exits successfully.
pub fn is_available(program: &str) -> bool {
    let status = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::debug!(program, error = %e, "tool probe failed");
            false
        }
    }
}

/// Runs `cmd` to completion with captured stdout/stderr.
///
/// When `input` is given it is written to the child's stdin, which is then
/// closed. The exit status is not inspected; see [`run_checked`].
pub fn run(cmd: &mut Command, input: Option<&[u8]>) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    tracing::debug!(
        program = %program,
        args = ?cmd.get_args().collect::<Vec<_>>(),
        "running external command"
    );

    let stdin = if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    };
    let mut child = cmd
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&program, e))?;

    if let (Some(bytes), Some(mut pipe)) = (input, child.stdin.take()) {
        // The child may exit before draining stdin; its exit status is what matters then.
        match pipe.write_all(bytes) {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(TarcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write to {} stdin", program),
                    e,
                ));
            }
            _ => {}
        }
    }

    child.wait_with_output().map_err(|e| {
        TarcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed waiting for {}", program),
            e,
        )
    })
}

/// Like [`run`], but a non-zero exit becomes an error tagged with `kind`.
pub fn run_checked(
    cmd: &mut Command,
    input: Option<&[u8]>,
    kind: ErrorKind,
    what: &str,
) -> Result<Output> {
    let output = run(cmd, input)?;
    if !output.status.success() {
        return Err(TarcryptError::with_kind(
            ErrorCategory::User,
            kind,
            failure_message(what, output.status, &output.stderr),
        ));
    }
    Ok(output)
}

fn failure_message(what: &str, status: ExitStatus, stderr: &[u8]) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    let stderr = stderr.trim();
    let code = match status.code() {
        Some(code) => format!("exit {}", code),
        None => "terminated by signal".to_string(),
    };
    if stderr.is_empty() {
        format!("{} failed ({})", what, code)
    } else {
        format!("{} failed ({}): {}", what, code, stderr)
    }
}

fn spawn_error(program: &str, err: io::Error) -> TarcryptError {
    if err.kind() == io::ErrorKind::NotFound {
        TarcryptError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::MissingTool,
            format!("required tool '{}' is not installed or not on PATH", program),
            err,
        )
    } else {
        TarcryptError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to start {}", program),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: &str = "tarcrypt-definitely-not-a-real-program";

    #[test]
    fn test_missing_program_is_unavailable() {
        assert!(!is_available(MISSING));
    }

    #[test]
    fn test_spawning_missing_program_reports_missing_tool() {
        let err = run(&mut Command::new(MISSING), None).unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::MissingTool));
        assert!(err.message().contains(MISSING));
    }

    #[test]
    #[cfg(unix)]
    fn test_run_feeds_stdin() {
        let output = run(&mut Command::new("cat"), Some(&b"hello"[..])).unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"hello");
    }

    #[test]
    #[cfg(unix)]
    fn test_run_checked_reports_stderr() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run_checked(&mut cmd, None, ErrorKind::CipherFailed, "sh").unwrap_err();
        assert_eq!(err.kind, Some(ErrorKind::CipherFailed));
        assert_eq!(err.message(), "sh failed (exit 3): broken");
    }

    #[test]
    #[cfg(unix)]
    fn test_run_checked_without_stderr() {
        let err = run_checked(&mut Command::new("false"), None, ErrorKind::ArchiveCorrupt, "tar")
            .unwrap_err();
        assert_eq!(err.message(), "tar failed (exit 1)");
    }
}
