//! Shared error utilities used across the compilation pipeline.
//!
//! Two layers live here. [`ErrorContext`] is the diagnostic sink the lexer and
//! parser report into; it only ever grows and is inspected once a pass has
//! finished. [`CompileError`] is what the public API hands back when a
//! compilation cannot produce assembly.

use std::fmt;
use std::io;
use std::path::PathBuf;

use snafu::Snafu;

use crate::tokenizer::Token;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  #[snafu(display("{diagnostics}"))]
  Diagnostics { diagnostics: ErrorContext },

  #[snafu(display("use of undeclared variable `{name}` in function `{function}`"))]
  UnboundVariable { name: String, function: String },

  #[snafu(display("failed to read {}: {source}", path.display()))]
  ReadSource { path: PathBuf, source: io::Error },

  #[snafu(display(
    "{} is {size} bytes, larger than the {limit} byte source limit",
    path.display()
  ))]
  SourceTooLarge { path: PathBuf, size: u64, limit: u64 },

  #[snafu(display("failed to write {}: {source}", path.display()))]
  WriteOutput { path: PathBuf, source: io::Error },
}

impl CompileError {
  /// The accumulated diagnostics, if this error came from the front-end.
  pub fn diagnostics(&self) -> Option<&ErrorContext> {
    match self {
      Self::Diagnostics { diagnostics } => Some(diagnostics),
      _ => None,
    }
  }
}

/// One reported problem, anchored at a file position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub message: String,
  pub filename: String,
  pub line: usize,
  pub column: usize,
  pub token: Option<Token>,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}:{}: error: {}",
      self.filename, self.line, self.column, self.message
    )
  }
}

/// Insertion-ordered collection of diagnostics for one compilation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
  diagnostics: Vec<Diagnostic>,
}

impl ErrorContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn report(
    &mut self,
    message: impl Into<String>,
    filename: &str,
    line: usize,
    column: usize,
  ) {
    self.diagnostics.push(Diagnostic {
      message: message.into(),
      filename: filename.to_string(),
      line,
      column,
      token: None,
    });
  }

  /// Report a problem at `token`, keeping a copy of it for later inspection.
  pub fn report_with_token(&mut self, message: impl Into<String>, token: &Token, filename: &str) {
    self.diagnostics.push(Diagnostic {
      message: message.into(),
      filename: filename.to_string(),
      line: token.line,
      column: token.column,
      token: Some(token.clone()),
    });
  }

  pub fn has_errors(&self) -> bool {
    !self.diagnostics.is_empty()
  }

  pub fn len(&self) -> usize {
    self.diagnostics.len()
  }

  pub fn is_empty(&self) -> bool {
    self.diagnostics.is_empty()
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
    self.diagnostics.iter()
  }

  /// Render every diagnostic as `file:line:column: error: message`.
  pub fn lines(&self) -> Vec<String> {
    self.diagnostics.iter().map(ToString::to_string).collect()
  }

  pub fn print(&self, out: &mut impl io::Write) -> io::Result<()> {
    for diagnostic in &self.diagnostics {
      writeln!(out, "{diagnostic}")?;
    }
    Ok(())
  }
}

impl fmt::Display for ErrorContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, diagnostic) in self.diagnostics.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{diagnostic}")?;
    }
    Ok(())
  }
}

impl<'a> IntoIterator for &'a ErrorContext {
  type Item = &'a Diagnostic;
  type IntoIter = std::slice::Iter<'a, Diagnostic>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
