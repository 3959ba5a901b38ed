//! Crate root: wires together the compilation pipeline.
//!
//! The stages are small and composable so they can be evolved independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and builds the `ast`.
//! - `codegen` lowers the parsed program into x86-64 NASM assembly.
//! - `error` holds the diagnostic sink and the crate-wide error type.
//! - `source` loads source files and writes assembly back out.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod parser;
pub mod source;
pub mod tokenizer;

pub use ast::Program;
pub use codegen::Assembly;
pub use error::{CompileError, CompileResult, Diagnostic, ErrorContext};
pub use tokenizer::{Token, TokenKind};

/// Lex `source`, reporting unknown characters into `errors`.
pub fn tokenize(source: &str, filename: &str, errors: &mut ErrorContext) -> Vec<Token> {
  tokenizer::Lexer::new(source, filename).lex(errors)
}

/// Parse a token stream, reporting syntax errors into `errors`.
pub fn parse(tokens: Vec<Token>, filename: &str, errors: &mut ErrorContext) -> Program {
  parser::parse(tokens, filename, errors)
}

/// Run the front-end only, returning the AST or every diagnostic found.
pub fn parse_source(source: &str, filename: &str) -> CompileResult<Program> {
  let mut errors = ErrorContext::new();
  let tokens = tokenize(source, filename, &mut errors);
  let program = parse(tokens, filename, &mut errors);

  if errors.has_errors() {
    program.release();
    return error::DiagnosticsSnafu {
      diagnostics: errors,
    }
    .fail();
  }
  Ok(program)
}

/// Compile a source string into NASM assembly.
pub fn generate_assembly(source: &str, filename: &str) -> CompileResult<Assembly> {
  let program = parse_source(source, filename)?;
  codegen::generate(&program)
}
