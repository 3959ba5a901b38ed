//! File I/O around the pipeline: loading source text and saving assembly.

use std::fs;
use std::path::Path;

use snafu::{ResultExt, ensure};

use crate::codegen::Assembly;
use crate::error::{CompileResult, ReadSourceSnafu, SourceTooLargeSnafu, WriteOutputSnafu};

/// Largest source file the compiler will load.
pub const MAX_SOURCE_SIZE: u64 = 1024 * 1024;

/// Read a source file, refusing anything over [`MAX_SOURCE_SIZE`] bytes.
pub fn read_source(path: &Path) -> CompileResult<String> {
  let size = fs::metadata(path).context(ReadSourceSnafu { path })?.len();
  ensure!(
    size <= MAX_SOURCE_SIZE,
    SourceTooLargeSnafu {
      path,
      size,
      limit: MAX_SOURCE_SIZE,
    }
  );
  fs::read_to_string(path).context(ReadSourceSnafu { path })
}

pub fn write_assembly(path: &Path, asm: &Assembly) -> CompileResult<()> {
  fs::write(path, asm.to_string()).context(WriteOutputSnafu { path })
}
