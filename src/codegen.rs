//! Code generation: lower the parsed AST into x86-64 NASM assembly.
//!
//! The emitter uses a single accumulator: every expression leaves its value in
//! `rax`, and binary operators park the left operand on the stack while the
//! right one is evaluated. Locals get an 8-byte slot each, addressed relative
//! to `rbp`. Names are resolved through a stack of block scopes so an inner
//! declaration shadows an outer one instead of aliasing its slot.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{BinaryOp, Block, Expression, FunctionDeclaration, Program, Statement};
use crate::error::{CompileResult, UnboundVariableSnafu};

/// Bytes reserved for every local variable.
const SLOT_SIZE: i64 = 8;

/// Entry point: call `main` and hand its result to the `exit` syscall.
const PROLOGUE: [&str; 10] = [
  "global _start",
  "",
  "section .text",
  "_start:",
  "    call main",
  "",
  "    mov rdi, rax",
  "    mov rax, 60",
  "    syscall",
  "",
];

/// A complete translation unit as an ordered list of text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
  lines: Vec<String>,
}

impl Assembly {
  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  pub fn into_lines(self) -> Vec<String> {
    self.lines
  }

  pub fn len(&self) -> usize {
    self.lines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }
}

impl fmt::Display for Assembly {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for line in &self.lines {
      writeln!(f, "{line}")?;
    }
    Ok(())
  }
}

/// Emit assembly for a whole program. The AST must come from an error-free parse.
pub fn generate(program: &Program) -> CompileResult<Assembly> {
  let mut lines: Vec<String> = PROLOGUE.iter().map(|line| line.to_string()).collect();

  for func in &program.functions {
    lines.extend(emit_function(func)?);
  }

  Ok(Assembly { lines })
}

/// Emit one function followed by any functions declared inside its body.
fn emit_function(func: &FunctionDeclaration) -> CompileResult<Vec<String>> {
  let mut frame = Frame::new(&func.name);

  frame.push(format!("{}:", func.name));
  frame.push("    push rbp");
  frame.push("    mov rbp, rsp");

  frame.emit_block(&func.body)?;

  frame.push("");
  frame.push("    mov rsp, rbp");
  frame.push("    pop rbp");
  frame.push("    ret");
  frame.push("");

  let Frame {
    mut lines, nested, ..
  } = frame;
  for inner in nested {
    lines.extend(emit_function(inner)?);
  }
  Ok(lines)
}

/// Per-function emission state.
struct Frame<'a> {
  function: &'a str,
  lines: Vec<String>,
  /// Bytes of local storage allocated so far in this function.
  current_stack_offset: i64,
  scopes: Vec<HashMap<&'a str, i64>>,
  /// Function declarations met inside the body, emitted after this one.
  nested: Vec<&'a FunctionDeclaration>,
}

impl<'a> Frame<'a> {
  fn new(function: &'a str) -> Self {
    Self {
      function,
      lines: Vec::new(),
      current_stack_offset: 0,
      scopes: Vec::new(),
      nested: Vec::new(),
    }
  }

  fn push(&mut self, line: impl Into<String>) {
    self.lines.push(line.into());
  }

  fn lookup(&self, name: &str) -> CompileResult<i64> {
    self
      .scopes
      .iter()
      .rev()
      .find_map(|scope| scope.get(name).copied())
      .ok_or_else(|| {
        UnboundVariableSnafu {
          name,
          function: self.function,
        }
        .build()
      })
  }

  fn bind(&mut self, name: &'a str) -> i64 {
    self.current_stack_offset += SLOT_SIZE;
    let offset = self.current_stack_offset;
    if let Some(scope) = self.scopes.last_mut() {
      scope.insert(name, offset);
    }
    offset
  }

  fn emit_block(&mut self, block: &'a Block) -> CompileResult<()> {
    self.scopes.push(HashMap::new());
    for stmt in &block.statements {
      self.emit_statement(stmt)?;
    }
    self.scopes.pop();
    Ok(())
  }

  fn emit_statement(&mut self, stmt: &'a Statement) -> CompileResult<()> {
    match stmt {
      Statement::Block(block) => self.emit_block(block)?,
      Statement::Return(value) => self.emit_expression(value)?,
      Statement::FunctionDeclaration(func) => self.nested.push(func),
      Statement::Expression(expr) => self.emit_expression(expr)?,
      Statement::Assignment { name, value } => {
        self.push("");
        self.push(format!("    sub rsp, {SLOT_SIZE}"));
        // The name is in scope for its own initialiser, as in C.
        let offset = self.bind(name);
        self.emit_expression(value)?;
        self.push(format!("    mov qword [rbp-{offset}], rax"));
      }
      Statement::Noop => {}
    }
    Ok(())
  }

  fn emit_expression(&mut self, expr: &Expression) -> CompileResult<()> {
    match expr {
      Expression::Constant(value) => self.push(format!("    mov rax, {value}")),
      Expression::Variable(name) => {
        let offset = self.lookup(name)?;
        self.push(format!("    mov rax, qword [rbp-{offset}]"));
      }
      Expression::FunctionCall(name) => self.push(format!("    call {name}")),
      Expression::Binary { op, lhs, rhs } => {
        self.emit_expression(lhs)?;
        self.push("    push rax");
        self.emit_expression(rhs)?;
        self.push("    mov rdi, rax");
        self.push("    pop rax");
        match op {
          BinaryOp::Add => self.push("    add rax, rdi"),
          BinaryOp::Sub => self.push("    sub rax, rdi"),
          BinaryOp::Mul => self.push("    imul rax, rdi"),
          BinaryOp::Div => {
            self.push("    cqo");
            self.push("    idiv rdi");
          }
        }
      }
    }
    Ok(())
  }
}
