use std::fs;
use std::num::ParseFloatError;
use std::path::Path;

/// Space-separated rendering of a numeric array for spreadsheet cells.
/// `{}` formatting is the shortest round-tripping representation.
pub fn format_space_separated(values: &[f64]) -> String {
    let mut rendered = String::with_capacity(values.len() * 8);
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            rendered.push(' ');
        }
        rendered.push_str(&value.to_string());
    }
    rendered
}

pub fn parse_space_separated(cell: &str) -> Result<Vec<f64>, ParseFloatError> {
    cell.split_whitespace().map(str::parse::<f64>).collect()
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}

pub fn write_binary_artifact(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    fs::write(path, bytes)
}
