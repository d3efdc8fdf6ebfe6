use crate::domain::{XpsError, XpsResult};
use std::fs;
use std::path::Path;

pub const DEFAULT_HEADER_LINES: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TwoColumnSamples {
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
}

pub(super) fn read_reference_source(path: &Path, id: &str) -> XpsResult<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            XpsError::missing_reference(
                "INPUT.REFERENCE_NOT_FOUND",
                format!("reference '{}' not found at '{}'", id, path.display()),
            )
        } else {
            XpsError::missing_reference(
                "INPUT.REFERENCE_READ",
                format!(
                    "failed to read reference '{}' from '{}': {}",
                    id,
                    path.display(),
                    source
                ),
            )
        }
    })
}

/// Parse a lab text export: `header_lines` free-form lines followed by
/// whitespace-separated `energy intensity` rows. Blank lines are ignored;
/// columns after the second are ignored.
pub(crate) fn parse_two_column_source(
    id: &str,
    source: &str,
    header_lines: usize,
) -> XpsResult<TwoColumnSamples> {
    let mut x = Vec::new();
    let mut y = Vec::new();

    for (line_index, line) in source.lines().enumerate().skip(header_lines) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let energy = tokens.next().and_then(|token| token.parse::<f64>().ok());
        let intensity = tokens.next().and_then(|token| token.parse::<f64>().ok());
        match (energy, intensity) {
            (Some(energy), Some(intensity)) => {
                x.push(energy);
                y.push(intensity);
            }
            _ => {
                return Err(XpsError::irregular_grid(
                    "INPUT.REFERENCE_PARSE",
                    format!(
                        "reference '{}' line {} is not an 'energy intensity' pair: '{}'",
                        id,
                        line_index + 1,
                        trimmed
                    ),
                ));
            }
        }
    }

    Ok(TwoColumnSamples { x, y })
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_HEADER_LINES, parse_two_column_source};
    use crate::domain::XpsErrorCategory;

    #[test]
    fn header_lines_are_skipped() {
        let mut source = String::new();
        for line in 0..DEFAULT_HEADER_LINES {
            source.push_str(&format!("header {line}\n"));
        }
        source.push_str("710.0 12.5\n\n710.5\t13.0 extra\n");

        let samples = parse_two_column_source("FeO", &source, DEFAULT_HEADER_LINES).expect("parse");
        assert_eq!(samples.x, vec![710.0, 710.5]);
        assert_eq!(samples.y, vec![12.5, 13.0]);
    }

    #[test]
    fn malformed_rows_report_their_line() {
        let error = parse_two_column_source("FeO", "710.0 1.0\n710.5 abc\n", 0)
            .expect_err("malformed row");
        assert_eq!(error.category(), XpsErrorCategory::IrregularGridError);
        assert!(error.message().contains("line 2"), "{}", error.message());
    }
}
