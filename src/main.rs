use std::io;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use rcc::{CompileError, ErrorContext, source};

#[derive(Parser, Debug)]
#[command(name = "rcc", version, about = "Compile a tiny C subset to x86-64 NASM assembly")]
struct Cli {
  /// Source file to compile
  input: PathBuf,

  /// Write the assembly here instead of stdout
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Print the token stream and exit
  #[arg(long, conflicts_with = "dump_ast")]
  dump_tokens: bool,

  /// Print the parsed syntax tree and exit
  #[arg(long)]
  dump_ast: bool,

  /// Report what each stage produced on stderr
  #[arg(short, long)]
  verbose: bool,
}

fn dump_tokens(text: &str, filename: &str) -> Result<(), CompileError> {
  let mut errors = ErrorContext::new();
  let tokens = rcc::tokenize(text, filename, &mut errors);
  for token in &tokens {
    println!("{}:{} {:?} {}", token.line, token.column, token.kind, token.describe());
  }

  if errors.has_errors() {
    return Err(CompileError::Diagnostics {
      diagnostics: errors,
    });
  }
  Ok(())
}

fn run(cli: &Cli) -> Result<(), CompileError> {
  let text = source::read_source(&cli.input)?;
  let filename = cli.input.display().to_string();

  if cli.dump_tokens {
    return dump_tokens(&text, &filename);
  }

  let program = rcc::parse_source(&text, &filename)?;
  if cli.verbose {
    eprintln!("parsed {} function(s) from {filename}", program.functions.len());
  }

  if cli.dump_ast {
    print!("{program}");
    return Ok(());
  }

  let asm = rcc::codegen::generate(&program)?;
  program.release();
  if cli.verbose {
    eprintln!("generated {} line(s) of assembly", asm.len());
  }

  match &cli.output {
    Some(path) => source::write_assembly(path, &asm),
    None => {
      print!("{asm}");
      Ok(())
    }
  }
}

fn main() {
  let cli = Cli::parse();

  if let Err(err) = run(&cli) {
    match err.diagnostics() {
      Some(diagnostics) => {
        if diagnostics.print(&mut io::stderr()).is_err() {
          process::exit(2);
        }
      }
      None => eprintln!("rcc: {err}"),
    }
    process::exit(1);
  }
}
