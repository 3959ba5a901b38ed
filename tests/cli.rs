use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::{self, Command, Output};

use rcc::generate_assembly;

const RETURN_ZERO: &str = "int main() { return 0; }";

/// A source file in the temp dir that is removed when dropped.
struct Scratch {
  path: PathBuf,
}

impl Scratch {
  fn new(name: &str, contents: &str) -> Self {
    let path = env::temp_dir().join(format!("rcc-cli-{}-{name}", process::id()));
    fs::write(&path, contents).expect("write scratch file");
    Self { path }
  }

  fn display(&self) -> String {
    self.path.display().to_string()
  }
}

impl Drop for Scratch {
  fn drop(&mut self) {
    fs::remove_file(&self.path).ok();
  }
}

fn rcc(args: &[&str]) -> Output {
  Command::new(env!("CARGO_BIN_EXE_rcc"))
    .args(args)
    .output()
    .expect("spawn rcc")
}

fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn compiles_to_stdout() {
  let input = Scratch::new("stdout.c", RETURN_ZERO);
  let output = rcc(&[&input.display()]);

  assert_eq!(output.status.code(), Some(0));
  let expected = generate_assembly(RETURN_ZERO, "stdout.c").expect("compiles");
  assert_eq!(stdout(&output), expected.to_string());
  assert!(stdout(&output).starts_with("global _start\n"));
  assert_eq!(stderr(&output), "");
}

#[test]
fn output_flag_writes_the_file() {
  let input = Scratch::new("out.c", RETURN_ZERO);
  let target = Scratch::new("out.asm", "");
  let output = rcc(&[&input.display(), "-o", &target.display()]);

  assert_eq!(output.status.code(), Some(0));
  assert_eq!(stdout(&output), "");
  let written = fs::read_to_string(&target.path).expect("read output");
  let expected = generate_assembly(RETURN_ZERO, "out.c").expect("compiles");
  assert_eq!(written, expected.to_string());
}

#[test]
fn diagnostics_go_to_stderr_with_status_one() {
  let input = Scratch::new("bad.c", "int main() { int lol = 8 + ; return 1; }");
  let target = Scratch::new("bad.asm", "untouched");
  let output = rcc(&[&input.display(), "-o", &target.display()]);

  assert_eq!(output.status.code(), Some(1));
  assert_eq!(stdout(&output), "");
  assert_eq!(
    stderr(&output),
    format!("{}:1:28: error: Expected expression\n", input.display())
  );
  assert_eq!(fs::read_to_string(&target.path).expect("read output"), "untouched");
}

#[test]
fn every_diagnostic_is_printed_in_order() {
  let input = Scratch::new("two.c", "int main() { return @; }");
  let output = rcc(&[&input.display()]);

  assert_eq!(output.status.code(), Some(1));
  let name = input.display();
  assert_eq!(
    stderr(&output),
    format!(
      "{name}:1:21: error: unknown character '@'\n{name}:1:22: error: Expected expression\n"
    )
  );
}

#[test]
fn missing_input_is_reported() {
  let missing = env::temp_dir().join(format!("rcc-cli-{}-missing.c", process::id()));
  let output = rcc(&[&missing.display().to_string()]);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).starts_with("rcc: "));
}

#[test]
fn dump_tokens_lists_positions_and_kinds() {
  let input = Scratch::new("tokens.c", RETURN_ZERO);
  let output = rcc(&["--dump-tokens", &input.display()]);

  assert_eq!(output.status.code(), Some(0));
  let lines: Vec<String> = stdout(&output).lines().map(str::to_string).collect();
  assert_eq!(
    lines,
    [
      "1:1 Int int",
      "1:5 Identifier main",
      "1:9 LParen (",
      "1:10 RParen )",
      "1:12 LBrace {",
      "1:14 Return return",
      "1:21 IntegerLiteral 0",
      "1:22 Semicolon ;",
      "1:24 RBrace }",
      "1:25 Eof end of file",
    ]
  );
}

#[test]
fn dump_tokens_still_fails_on_lexical_errors() {
  let input = Scratch::new("dollar.c", "int main() { return $1; }");
  let output = rcc(&["--dump-tokens", &input.display()]);

  assert_eq!(output.status.code(), Some(1));
  assert!(stdout(&output).contains("1:22 IntegerLiteral 1\n"));
  assert_eq!(
    stderr(&output),
    format!("{}:1:21: error: unknown character '$'\n", input.display())
  );
}

#[test]
fn dump_ast_prints_the_tree() {
  let input = Scratch::new("ast.c", RETURN_ZERO);
  let output = rcc(&["--dump-ast", &input.display()]);

  assert_eq!(output.status.code(), Some(0));
  assert_eq!(stdout(&output), "fn main\n{\n  return 0\n}\n");
}

#[test]
fn verbose_reports_each_stage() {
  let input = Scratch::new("verbose.c", RETURN_ZERO);
  let output = rcc(&["-v", &input.display()]);

  assert_eq!(output.status.code(), Some(0));
  let log = stderr(&output);
  assert!(log.contains(&format!("parsed 1 function(s) from {}", input.display())));
  assert!(log.contains("generated "));
  assert!(stdout(&output).starts_with("global _start\n"));
}

#[test]
fn huge_expression_fails_cleanly() {
  let source = format!("int main() {{ return 1{}; }}", " + 1".repeat(150_000));
  let input = Scratch::new("huge.c", &source);
  let output = rcc(&[&input.display()]);

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("error: Expression nested too deeply"));
}
