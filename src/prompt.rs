//! Overwrite confirmation

use std::io::{self, BufRead, Write};

use crate::error::{ErrorCategory, ErrorKind, Result, TarcryptError};

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Always answers yes, for unattended runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Prints the question and reads one answer line from a reader.
///
/// Only an answer whose first character is `y` or `Y` counts as yes; an empty line or
/// end of input is a no.
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{} (y/N) ", question)
            .and_then(|()| self.output.flush())
            .map_err(|e| {
                TarcryptError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        let mut answer = String::new();
        self.input.read_line(&mut answer).map_err(|e| {
            TarcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to read answer: {}", e),
                e,
            )
        })?;
        Ok(is_yes(&answer))
    }
}

/// Confirmation on the process's stdin, prompting on stdout.
pub type StdinConfirm = LineConfirm<io::StdinLock<'static>, io::Stdout>;

impl StdinConfirm {
    pub fn stdin() -> Self {
        LineConfirm::new(io::stdin().lock(), io::stdout())
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.chars().next(), Some('y' | 'Y'))
}
