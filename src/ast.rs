//! Syntax tree produced by the parser.
//!
//! Every parent owns its children outright (`Box`/`Vec`), so the tree has no
//! sharing and no back-references. Dropping the root releases everything.

use std::fmt;

use crate::tokenizer::TokenKind;

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  pub fn from_token(kind: TokenKind) -> Option<Self> {
    match kind {
      TokenKind::Plus => Some(Self::Add),
      TokenKind::Minus => Some(Self::Sub),
      TokenKind::Asterisk => Some(Self::Mul),
      TokenKind::Slash => Some(Self::Div),
      _ => None,
    }
  }

  pub fn symbol(self) -> char {
    match self {
      Self::Add => '+',
      Self::Sub => '-',
      Self::Mul => '*',
      Self::Div => '/',
    }
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
  Constant(i64),
  Variable(String),
  FunctionCall(String),
  Binary {
    op: BinaryOp,
    lhs: Box<Expression>,
    rhs: Box<Expression>,
  },
}

impl Expression {
  pub fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
  pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
  pub name: String,
  pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
  Block(Block),
  Return(Expression),
  FunctionDeclaration(FunctionDeclaration),
  Expression(Expression),
  Assignment { name: String, value: Expression },
  Noop,
}

/// Top-level function declarations in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  pub functions: Vec<FunctionDeclaration>,
}

impl Program {
  /// Release the whole tree. Taking `self` by value means a program can only
  /// be released once.
  pub fn release(self) {
    drop(self);
  }

  pub fn function(&self, name: &str) -> Option<&FunctionDeclaration> {
    self.functions.iter().find(|func| func.name == name)
  }
}

// --- Pretty printing ---

const INDENT: &str = "  ";

impl fmt::Display for Expression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Expression::Constant(value) => write!(f, "{value}"),
      Expression::Variable(name) => write!(f, "{name}"),
      Expression::FunctionCall(name) => write!(f, "{name}()"),
      Expression::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
    }
  }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
  writeln!(f, "{}{{", INDENT.repeat(depth))?;
  for stmt in &block.statements {
    write_statement(f, stmt, depth + 1)?;
  }
  writeln!(f, "{}}}", INDENT.repeat(depth))
}

fn write_function(f: &mut fmt::Formatter<'_>, func: &FunctionDeclaration, depth: usize) -> fmt::Result {
  writeln!(f, "{}fn {}", INDENT.repeat(depth), func.name)?;
  write_block(f, &func.body, depth)
}

fn write_statement(f: &mut fmt::Formatter<'_>, stmt: &Statement, depth: usize) -> fmt::Result {
  let pad = INDENT.repeat(depth);
  match stmt {
    Statement::Block(block) => write_block(f, block, depth),
    Statement::Return(value) => writeln!(f, "{pad}return {value}"),
    Statement::FunctionDeclaration(func) => write_function(f, func, depth),
    Statement::Expression(expr) => writeln!(f, "{pad}expr {expr}"),
    Statement::Assignment { name, value } => writeln!(f, "{pad}let {name} = {value}"),
    Statement::Noop => writeln!(f, "{pad}noop"),
  }
}

impl fmt::Display for Statement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write_statement(f, self, 0)
  }
}

impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for func in &self.functions {
      write_function(f, func, 0)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn binary_display_is_fully_parenthesised() {
    let expr = Expression::binary(
      BinaryOp::Add,
      Expression::Constant(1),
      Expression::binary(
        BinaryOp::Mul,
        Expression::Variable("x".into()),
        Expression::FunctionCall("f".into()),
      ),
    );
    assert_eq!(expr.to_string(), "(1 + (x * f()))");
  }

  #[test]
  fn program_display_nests_blocks() {
    let program = Program {
      functions: vec![FunctionDeclaration {
        name: "main".into(),
        body: Block {
          statements: vec![
            Statement::Assignment {
              name: "a".into(),
              value: Expression::Constant(2),
            },
            Statement::Block(Block {
              statements: vec![Statement::Noop],
            }),
            Statement::Return(Expression::Variable("a".into())),
          ],
        },
      }],
    };

    assert_eq!(
      program.to_string(),
      "fn main\n{\n  let a = 2\n  {\n    noop\n  }\n  return a\n}\n"
    );
  }

  #[test]
  fn release_consumes_the_tree() {
    let program = Program {
      functions: vec![FunctionDeclaration {
        name: "main".into(),
        body: Block::default(),
      }],
    };
    let copy = program.clone();
    program.release();
    // The clone owns its own nodes and is unaffected by the release above.
    assert_eq!(copy.function("main").map(|f| f.name.as_str()), Some("main"));
    copy.release();
  }
}
