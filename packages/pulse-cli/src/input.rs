use std::path::Path;

/// Parse a matrix: one row per line, values separated by commas and/or
/// whitespace. Blank lines and lines starting with `#` are skipped.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<f64>>, String> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|tok| !tok.is_empty())
                .map(|tok| {
                    tok.parse::<f64>().map_err(|_| {
                        format!("Line {}: '{}' is not a valid number", line_no, tok)
                    })
                })
                .collect()
        })
        .collect()
}

fn read_text(path: &str) -> Result<String, String> {
    if !Path::new(path).is_file() {
        return Err(format!("File not found: {}", path));
    }
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))
}

/// Read a 2-D input file. Rows must all have the same number of columns.
pub fn read_matrix(path: &str) -> Result<Vec<Vec<f64>>, String> {
    let rows = parse_rows(&read_text(path)?)?;
    if rows.is_empty() {
        return Err(format!("No samples in '{}'", path));
    }
    let cols = rows[0].len();
    if let Some(i) = rows.iter().position(|r| r.len() != cols) {
        return Err(format!(
            "Row {} of '{}' has {} columns, expected {}",
            i + 1,
            path,
            rows[i].len(),
            cols
        ));
    }
    Ok(rows)
}

/// Read a 1-D input file; all values in file order.
pub fn read_samples(path: &str) -> Result<Vec<f64>, String> {
    let samples: Vec<f64> = parse_rows(&read_text(path)?)?.into_iter().flatten().collect();
    if samples.is_empty() {
        return Err(format!("No samples in '{}'", path));
    }
    Ok(samples)
}
