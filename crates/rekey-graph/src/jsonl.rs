//! JSONL storage: one line per statement.
//!
//! The portable on-disk form of a graph. Lines starting with `#` and blank
//! lines are ignored on read.

use crate::term::Statement;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Errors from JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    #[error("line {line}: invalid statement: {message}")]
    Parse { line: usize, message: String },

    #[error("failed to encode statement: {0}")]
    Encode(String),

    #[error("corrupted graph file {path}: {reason}")]
    Corrupt { path: String, reason: &'static str },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> JsonlError + '_ {
    move |e| JsonlError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Read statements from a JSONL reader.
pub fn read_statements(reader: impl BufRead) -> Result<Vec<Statement>, JsonlError> {
    let mut statements = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| JsonlError::Io {
            path: format!("<line {line_no}>"),
            message: e.to_string(),
        })?;
        let body = line.trim();
        if body.is_empty() || body.starts_with('#') {
            continue;
        }
        statements.push(serde_json::from_str(body).map_err(|e| JsonlError::Parse {
            line: line_no,
            message: e.to_string(),
        })?);
    }
    Ok(statements)
}

/// Write statements to a JSONL writer, one per line.
pub fn write_statements<'a>(
    writer: &mut impl Write,
    statements: impl IntoIterator<Item = &'a Statement>,
) -> Result<(), JsonlError> {
    for statement in statements {
        serde_json::to_writer(&mut *writer, statement)
            .map_err(|e| JsonlError::Encode(e.to_string()))?;
        writer.write_all(b"\n").map_err(|e| JsonlError::Io {
            path: "<writer>".to_string(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Read statements from a JSONL file.
///
/// The whole file is checked first: NUL bytes or invalid UTF-8 anywhere make
/// it `Corrupt` rather than a per-line parse error.
pub fn read_statements_from_path(path: impl AsRef<Path>) -> Result<Vec<Statement>, JsonlError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(io_error(path))?;
    let corrupt = |reason| JsonlError::Corrupt {
        path: path.display().to_string(),
        reason,
    };
    if bytes.contains(&0) {
        return Err(corrupt("contains NUL bytes"));
    }
    let text = std::str::from_utf8(&bytes).map_err(|_| corrupt("not valid UTF-8"))?;
    read_statements(text.as_bytes())
}

/// Replace the file at `path` with `statements`.
///
/// Writes a sibling temp file, fsyncs it, renames it over `path` and fsyncs
/// the parent directory. On failure the previous file is left untouched.
pub fn write_statements_to_path<'a>(
    path: impl AsRef<Path>,
    statements: impl IntoIterator<Item = &'a Statement>,
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(io_error(dir))?;
    }

    let staged = StagedFile::create(path)?;
    let mut writer = BufWriter::new(&staged.file);
    write_statements(&mut writer, statements)?;
    writer.flush().map_err(io_error(&staged.path))?;
    drop(writer);
    staged.persist(path)?;

    if let Some(dir) = parent {
        File::open(dir)
            .and_then(|handle| handle.sync_all())
            .map_err(io_error(dir))?;
    }
    Ok(())
}

/// Temp file next to the target; removed on drop unless persisted.
struct StagedFile {
    path: PathBuf,
    file: File,
    persisted: bool,
}

impl StagedFile {
    fn create(target: &Path) -> Result<Self, JsonlError> {
        let mut name: OsString = target.as_os_str().to_os_string();
        name.push(format!(".tmp.{}", std::process::id()));
        let path = PathBuf::from(name);
        let file = File::create(&path).map_err(io_error(&path))?;
        Ok(Self {
            path,
            file,
            persisted: false,
        })
    }

    fn persist(mut self, target: &Path) -> Result<(), JsonlError> {
        self.file.sync_all().map_err(io_error(&self.path))?;
        fs::rename(&self.path, target).map_err(|e| JsonlError::Io {
            path: format!("{} -> {}", self.path.display(), target.display()),
            message: e.to_string(),
        })?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}
