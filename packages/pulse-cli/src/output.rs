use std::io::Write;
use std::path::Path;

use crate::exit_codes;

/// Write JSON string to stdout or a file.
pub fn write_output(json: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(Path::new(path), json)
            .map_err(|e| format!("Failed to write output file '{}': {}", path, e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, String> {
    if compact {
        serde_json::to_string(value).map_err(|e| format!("JSON serialization failed: {}", e))
    } else {
        serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {}", e))
    }
}

/// Write one CSV record per item, with a header row taken from the field
/// names of `T`.
pub fn write_csv<T: serde::Serialize>(rows: &[T], path: &str) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .from_path(Path::new(path))
        .map_err(|e| format!("Failed to create CSV file '{}': {}", path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| format!("Failed to write CSV row to '{}': {}", path, e))?;
    }
    writer
        .flush()
        .map_err(|e| format!("Failed to write CSV file '{}': {}", path, e))
}

/// Serialize and write `value`, returning the process exit code.
pub fn emit<T: serde::Serialize>(value: &T, compact: bool, output_path: Option<&str>) -> i32 {
    match to_json(value, compact).and_then(|json| write_output(&json, output_path)) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}
