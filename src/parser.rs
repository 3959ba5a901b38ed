//! Recursive-descent parser producing the program AST.
//!
//! Statements and declarations are handled by plain recursive descent while
//! expressions go through a precedence-climbing (Pratt) loop driven by a
//! binding-power table, so adding an operator tier is a one-line change.
//!
//! Parse functions never abort. On a structural mismatch they report into the
//! [`ErrorContext`] with the offending token and return `None`; the caller then
//! resynchronises at the nearest statement or declaration boundary, which lets
//! one pass surface every syntax error in the file.

use crate::ast::{BinaryOp, Block, Expression, FunctionDeclaration, Program, Statement};
use crate::error::ErrorContext;
use crate::tokenizer::{Token, TokenKind};

/// Deepest `{ ... }` nesting accepted, counting the function body.
pub const MAX_BLOCK_DEPTH: usize = 256;

/// Most binary operators accepted in a single expression.
pub const MAX_EXPRESSION_NODES: usize = 256;

/// Left/right binding power of an infix operator. Higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingPower {
  pub left: u8,
  pub right: u8,
}

pub fn infix_binding_power(kind: TokenKind) -> BindingPower {
  let (left, right) = match kind {
    TokenKind::Plus | TokenKind::Minus => (1, 2),
    TokenKind::Asterisk | TokenKind::Slash => (3, 4),
    _ => (0, 0),
  };
  BindingPower { left, right }
}

/// Parse a token vector into a program, reporting problems into `errors`.
pub fn parse(tokens: Vec<Token>, filename: &str, errors: &mut ErrorContext) -> Program {
  Parser::new(tokens, errors, filename).parse()
}

/// Cursor over the token vector plus the sink diagnostics go to.
pub struct Parser<'a> {
  tokens: Vec<Token>,
  pos: usize,
  errors: &'a mut ErrorContext,
  filename: &'a str,
  block_depth: usize,
  expression_nodes: usize,
}

impl<'a> Parser<'a> {
  /// Take ownership of the token stream; the parser advances `pos` as it consumes input.
  pub fn new(mut tokens: Vec<Token>, errors: &'a mut ErrorContext, filename: &'a str) -> Self {
    if tokens.is_empty() {
      errors.report("Got empty token list", filename, 1, 1);
    }
    if !tokens.last().is_some_and(|token| token.is(TokenKind::Eof)) {
      let (line, column) = tokens
        .last()
        .map_or((1, 1), |token| (token.line, token.column));
      tokens.push(Token::new(TokenKind::Eof, None, line, column));
    }

    Self {
      tokens,
      pos: 0,
      errors,
      filename,
      block_depth: 0,
      expression_nodes: 0,
    }
  }

  fn token_at(&self, index: usize) -> &Token {
    // The constructor guarantees a trailing `Eof`, which absorbs overruns.
    let last = self.tokens.len() - 1;
    &self.tokens[index.min(last)]
  }

  pub fn current(&self) -> &Token {
    self.token_at(self.pos)
  }

  pub fn peek(&self) -> &Token {
    self.token_at(self.pos + 1)
  }

  pub fn peek_ahead(&self) -> &Token {
    self.token_at(self.pos + 2)
  }

  pub fn advance(&mut self) {
    if self.pos < self.tokens.len() - 1 {
      self.pos += 1;
    }
  }

  pub fn is_eof(&self) -> bool {
    self.current().is(TokenKind::Eof)
  }

  fn at(&self, kind: TokenKind) -> bool {
    self.current().is(kind)
  }

  fn error_at_current(&mut self, message: &str) {
    let token = self.token_at(self.pos).clone();
    self.errors.report_with_token(message, &token, self.filename);
  }

  /// Consume the current token if it has `kind`, otherwise report `message`.
  fn expect(&mut self, kind: TokenKind, message: &str) -> Option<()> {
    if self.at(kind) {
      self.advance();
      Some(())
    } else {
      self.error_at_current(message);
      None
    }
  }

  /// Consume an identifier and return its text, otherwise report `message`.
  fn expect_identifier(&mut self, message: &str) -> Option<String> {
    if let Some(name) = self
      .current()
      .text()
      .filter(|_| self.at(TokenKind::Identifier))
    {
      let name = name.to_string();
      self.advance();
      return Some(name);
    }
    self.error_at_current(message);
    None
  }

  /// Parse the whole token stream into a program.
  pub fn parse(mut self) -> Program {
    let mut program = Program::default();

    while !self.is_eof() {
      if self.at(TokenKind::Int) {
        match self.parse_function_declaration() {
          Some(func) => program.functions.push(func),
          None => self.synchronize_to_declaration(),
        }
        continue;
      }

      self.error_at_current("Unexpected token - expected function declaration");
      self.advance();
    }

    program
  }

  /// `int name ( ) { ... }`
  pub fn parse_function_declaration(&mut self) -> Option<FunctionDeclaration> {
    self.expect(TokenKind::Int, "Expected 'int' return type")?;
    let name = self.expect_identifier("Expected function name after type")?;
    self.expect(TokenKind::LParen, "Expected '(' after function name")?;
    self.expect(TokenKind::RParen, "Expected ')' after function parameters")?;
    let body = self.parse_block()?;
    Some(FunctionDeclaration { name, body })
  }

  pub fn parse_block(&mut self) -> Option<Block> {
    if self.at(TokenKind::LBrace) && self.block_depth >= MAX_BLOCK_DEPTH {
      self.error_at_current("Blocks nested too deeply");
      self.skip_nested_block();
      return None;
    }
    self.expect(TokenKind::LBrace, "Expected '{' to start block")?;

    self.block_depth += 1;
    let block = self.parse_block_body();
    self.block_depth -= 1;
    Some(block)
  }

  fn parse_block_body(&mut self) -> Block {
    let mut block = Block::default();
    while !self.at(TokenKind::RBrace) && !self.is_eof() {
      let start = self.pos;
      match self.parse_statement() {
        Some(stmt) => block.statements.push(stmt),
        None => {
          self.synchronize();
          if self.pos == start {
            self.advance();
          }
        }
      }
    }

    // A missing brace is reported but the block is kept; the sink being
    // non-empty already rules out code generation.
    if self.at(TokenKind::RBrace) {
      self.advance();
    } else {
      self.error_at_current("Expected '}' to end block");
    }

    block
  }

  /// Consume a `{` and everything up to its matching `}`.
  fn skip_nested_block(&mut self) {
    let mut depth = 0usize;
    while !self.is_eof() {
      let kind = self.current().kind;
      self.advance();
      match kind {
        TokenKind::LBrace => depth += 1,
        TokenKind::RBrace => {
          depth = depth.saturating_sub(1);
          if depth == 0 {
            return;
          }
        }
        _ => {}
      }
    }
  }

  pub fn parse_statement(&mut self) -> Option<Statement> {
    let kind = self.current().kind;
    match kind {
      TokenKind::Int
        if self.peek().is(TokenKind::Identifier) && self.peek_ahead().is(TokenKind::LParen) =>
      {
        self
          .parse_function_declaration()
          .map(Statement::FunctionDeclaration)
      }
      TokenKind::Int => self.parse_variable_assignment(),
      TokenKind::LBrace => self.parse_block().map(Statement::Block),
      TokenKind::Return => self.parse_return(),
      TokenKind::Semicolon => {
        self.advance();
        Some(Statement::Noop)
      }
      _ => {
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after expression")?;
        Some(Statement::Expression(expr))
      }
    }
  }

  /// `int name = expr ;`
  pub fn parse_variable_assignment(&mut self) -> Option<Statement> {
    self.expect(TokenKind::Int, "Expected 'int' before variable name")?;
    let name = self.expect_identifier("Expected identifier after type")?;
    self.expect(TokenKind::Assign, "Expected '=' after variable name")?;
    let value = self.parse_expression()?;
    self.expect(TokenKind::Semicolon, "Expected ';' after assignment")?;
    Some(Statement::Assignment { name, value })
  }

  /// `return expr ;`
  pub fn parse_return(&mut self) -> Option<Statement> {
    self.expect(TokenKind::Return, "Expected 'return' keyword")?;
    let value = self.parse_expression()?;
    self.expect(TokenKind::Semicolon, "Expected ';' after return statement")?;
    Some(Statement::Return(value))
  }

  pub fn parse_expression(&mut self) -> Option<Expression> {
    self.expression_nodes = 0;
    self.parse_expression_with_precedence(0)
  }

  pub fn parse_expression_with_precedence(&mut self, min_bp: u8) -> Option<Expression> {
    let mut lhs = self.parse_primary()?;

    loop {
      let kind = self.current().kind;
      let Some(op) = BinaryOp::from_token(kind) else {
        break;
      };

      let power = infix_binding_power(kind);
      if power.left < min_bp {
        break;
      }

      // Later passes recurse over the tree, so its size is capped here.
      self.expression_nodes += 1;
      if self.expression_nodes > MAX_EXPRESSION_NODES {
        self.error_at_current("Expression nested too deeply");
        return None;
      }

      self.advance();
      let rhs = self.parse_expression_with_precedence(power.right)?;
      lhs = Expression::binary(op, lhs, rhs);
    }

    Some(lhs)
  }

  fn parse_primary(&mut self) -> Option<Expression> {
    let kind = self.current().kind;
    match kind {
      TokenKind::IntegerLiteral => self.parse_constant(),
      TokenKind::Identifier if self.peek().is(TokenKind::LParen) => self.parse_function_call(),
      TokenKind::Identifier => {
        let name = self.expect_identifier("Expected identifier")?;
        Some(Expression::Variable(name))
      }
      _ => {
        self.error_at_current("Expected expression");
        None
      }
    }
  }

  fn parse_constant(&mut self) -> Option<Expression> {
    let value = self
      .current()
      .text()
      .and_then(|text| text.parse::<i64>().ok());
    let Some(value) = value else {
      self.error_at_current("Integer literal out of range");
      return None;
    };
    self.advance();
    Some(Expression::Constant(value))
  }

  /// `name ( )`
  fn parse_function_call(&mut self) -> Option<Expression> {
    let name = self.expect_identifier("Expected function name")?;
    self.expect(TokenKind::LParen, "Expected '(' after function name")?;
    self.expect(TokenKind::RParen, "Expected ')' after function call")?;
    Some(Expression::FunctionCall(name))
  }

  /// Skip to the next token a statement can safely resume from.
  pub fn synchronize(&mut self) {
    while !self.is_eof() {
      let kind = self.current().kind;
      match kind {
        TokenKind::Semicolon
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::Return
        | TokenKind::Int => return,
        _ => self.advance(),
      }
    }
  }

  /// Skip to the next `int name (` sequence, the start of a function.
  pub fn synchronize_to_declaration(&mut self) {
    while !self.is_eof() {
      if self.at(TokenKind::Int)
        && self.peek().is(TokenKind::Identifier)
        && self.peek_ahead().is(TokenKind::LParen)
      {
        return;
      }
      self.advance();
    }
  }
}
