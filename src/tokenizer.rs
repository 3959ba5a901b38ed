//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The lexer knows nothing about grammar. It recognises single-character
//! punctuators, integer literals, identifiers and the handful of reserved
//! words, tracking a 1-based line/column for every token. Unknown characters
//! are reported into the [`ErrorContext`] and skipped so a single pass can
//! surface every lexical problem in the file.

use std::fmt;

use crate::error::ErrorContext;

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Identifier,
  IntegerLiteral,

  // Keywords
  Int,
  Void,
  Return,

  // Punctuation
  LParen,
  RParen,
  LBrace,
  RBrace,
  Semicolon,
  Assign,

  // Operators
  Plus,
  Minus,
  Asterisk,
  Slash,

  Eof,
}

impl TokenKind {
  /// Map an identifier spelling to its keyword kind, if it is reserved.
  pub fn keyword(word: &str) -> Option<Self> {
    match word {
      "int" => Some(Self::Int),
      "void" => Some(Self::Void),
      "return" => Some(Self::Return),
      _ => None,
    }
  }

  fn punctuator(c: char) -> Option<Self> {
    let kind = match c {
      '(' => Self::LParen,
      ')' => Self::RParen,
      '{' => Self::LBrace,
      '}' => Self::RBrace,
      ';' => Self::Semicolon,
      '=' => Self::Assign,
      '+' => Self::Plus,
      '-' => Self::Minus,
      '*' => Self::Asterisk,
      '/' => Self::Slash,
      _ => return None,
    };
    Some(kind)
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      TokenKind::Identifier => "identifier",
      TokenKind::IntegerLiteral => "integer literal",
      TokenKind::Int => "int",
      TokenKind::Void => "void",
      TokenKind::Return => "return",
      TokenKind::LParen => "(",
      TokenKind::RParen => ")",
      TokenKind::LBrace => "{",
      TokenKind::RBrace => "}",
      TokenKind::Semicolon => ";",
      TokenKind::Assign => "=",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Asterisk => "*",
      TokenKind::Slash => "/",
      TokenKind::Eof => "end of file",
    };
    f.write_str(text)
  }
}

/// A lexed token together with the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  /// Source text for identifiers, keywords and literals; `None` otherwise.
  pub text: Option<String>,
  pub line: usize,
  pub column: usize,
}

impl Token {
  pub fn new(kind: TokenKind, text: Option<String>, line: usize, column: usize) -> Self {
    Self {
      kind,
      text,
      line,
      column,
    }
  }

  pub fn text(&self) -> Option<&str> {
    self.text.as_deref()
  }

  pub fn is(&self, kind: TokenKind) -> bool {
    self.kind == kind
  }

  /// Human-friendly description used in diagnostics.
  pub fn describe(&self) -> String {
    match (&self.text, self.kind) {
      (_, TokenKind::Eof) => "end of file".to_string(),
      (Some(text), _) => text.clone(),
      (None, kind) => kind.to_string(),
    }
  }
}

fn is_whitespace(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Single-pass scanner over a borrowed source buffer.
pub struct Lexer<'a> {
  source: &'a str,
  filename: &'a str,
  position: usize,
  current: Option<char>,
  line: usize,
  column: usize,
  start_line: usize,
  start_column: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a str, filename: &'a str) -> Self {
    Self {
      source,
      filename,
      position: 0,
      current: source.chars().next(),
      line: 1,
      column: 1,
      start_line: 1,
      start_column: 1,
    }
  }

  /// Move one character forward. Returns `false` once the buffer is exhausted.
  pub fn advance(&mut self) -> bool {
    let Some(c) = self.current else {
      return false;
    };

    if c == '\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }

    self.position += c.len_utf8();
    self.current = self.source[self.position..].chars().next();
    true
  }

  pub fn is_at_end(&self) -> bool {
    self.current.is_none()
  }

  fn skip_whitespace(&mut self) {
    while self.current.is_some_and(is_whitespace) {
      self.advance();
    }
  }

  fn start_token(&mut self) {
    self.start_line = self.line;
    self.start_column = self.column;
  }

  fn make_token(&self, kind: TokenKind, text: Option<String>) -> Token {
    Token::new(kind, text, self.start_line, self.start_column)
  }

  /// Consume the longest run of characters satisfying `accept` and return it.
  fn consume_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
    let start = self.position;
    while self.current.is_some_and(&accept) {
      self.advance();
    }
    &self.source[start..self.position]
  }

  fn lex_number(&mut self) -> Token {
    let digits = self.consume_while(|c| c.is_ascii_digit());
    self.make_token(TokenKind::IntegerLiteral, Some(digits.to_string()))
  }

  fn lex_identifier_or_keyword(&mut self) -> Token {
    let word = self.consume_while(|c| c.is_ascii_alphanumeric());
    let kind = TokenKind::keyword(word).unwrap_or(TokenKind::Identifier);
    self.make_token(kind, Some(word.to_string()))
  }

  /// Lex the whole buffer into tokens terminated by a single `Eof` marker.
  ///
  /// Unknown characters are reported into `errors` and skipped.
  pub fn lex(mut self, errors: &mut ErrorContext) -> Vec<Token> {
    let mut tokens = Vec::new();

    loop {
      self.skip_whitespace();
      self.start_token();

      let Some(c) = self.current else {
        break;
      };

      if let Some(kind) = TokenKind::punctuator(c) {
        tokens.push(self.make_token(kind, None));
        self.advance();
        continue;
      }

      if c.is_ascii_digit() {
        tokens.push(self.lex_number());
        continue;
      }

      if c.is_ascii_alphabetic() {
        tokens.push(self.lex_identifier_or_keyword());
        continue;
      }

      errors.report(
        format!("unknown character '{}'", c.escape_default()),
        self.filename,
        self.start_line,
        self.start_column,
      );
      self.advance();
    }

    tokens.push(self.make_token(TokenKind::Eof, None));
    tokens
  }
}
