//! Where results go: output files, and the terminal

use crate::output::OutputSchema;
use crewcraft_error::{Error, Result};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

pub use crate::markdown::render_markdown;

/// Write a task output file, creating parent directories as needed
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::from(e)
                .with_operation("sink::write_output")
                .with_context("path", parent.display().to_string())
        })?;
    }
    std::fs::write(path, contents).map_err(|e| {
        Error::from(e)
            .with_operation("sink::write_output")
            .with_context("path", path.display().to_string())
    })
}

pub fn load_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::from(e)
            .with_operation("sink::load_json")
            .with_context("path", path.display().to_string())
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::parse_failed(format!("{} is not valid JSON: {}", path.display(), e))
            .with_operation("sink::load_json")
            .set_source(e)
    })
}

/// Load a result file and check it against a schema
pub fn check_file(path: &Path, schema: &OutputSchema) -> Result<Value> {
    let value = load_json(path)?;
    schema
        .validate(&value)
        .map_err(|e| e.with_context("path", path.display().to_string()))
}

pub fn print_json(out: &mut impl Write, value: &Value) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)
        .map_err(|e| Error::serialization_failed(e.to_string()).set_source(e))?;
    writeln!(out, "{}", pretty)?;
    Ok(())
}
