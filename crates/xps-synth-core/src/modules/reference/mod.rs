mod parser;

use super::ReferenceSource;
use crate::domain::{ReferenceSpectrum, XpsError, XpsResult};
use crate::numerics::regularize_samples;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, info};

pub use parser::DEFAULT_HEADER_LINES;
use parser::{parse_two_column_source, read_reference_source};

pub const REFERENCE_EXTENSION: &str = "txt";

/// Reference spectra stored as `<directory>/<id>.txt` lab text exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReferenceStore {
    directory: PathBuf,
    header_lines: usize,
}

impl TextReferenceStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            header_lines: DEFAULT_HEADER_LINES,
        }
    }

    pub fn with_header_lines(mut self, header_lines: usize) -> Self {
        self.header_lines = header_lines;
        self
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.{REFERENCE_EXTENSION}"))
    }
}

impl ReferenceSource for TextReferenceStore {
    fn load(&self, ids: &[String]) -> XpsResult<Vec<ReferenceSpectrum>> {
        validate_ids(ids)?;

        let mut references = Vec::with_capacity(ids.len());
        for id in ids {
            let path = self.path_for(id);
            let source = read_reference_source(&path, id)?;
            let samples = parse_two_column_source(id, &source, self.header_lines)?;
            debug!(reference = %id, path = %path.display(), samples = samples.x.len(), "reference parsed");
            references.push(regularize_reference(id, &samples.x, &samples.y)?);
        }

        ensure_shared_grid(&references)?;
        Ok(references)
    }
}

/// Raw samples held in memory, regularized on load exactly like file-backed ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryReferenceStore {
    samples: BTreeMap<String, (Vec<f64>, Vec<f64>)>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, x: Vec<f64>, y: Vec<f64>) {
        self.samples.insert(id.into(), (x, y));
    }

    pub fn with_reference(mut self, id: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        self.insert(id, x, y);
        self
    }
}

impl ReferenceSource for InMemoryReferenceStore {
    fn load(&self, ids: &[String]) -> XpsResult<Vec<ReferenceSpectrum>> {
        validate_ids(ids)?;

        let references = ids
            .iter()
            .map(|id| {
                let (x, y) = self.samples.get(id).ok_or_else(|| {
                    XpsError::missing_reference(
                        "INPUT.REFERENCE_NOT_FOUND",
                        format!("reference '{id}' is not registered in the in-memory store"),
                    )
                })?;
                regularize_reference(id, x, y)
            })
            .collect::<XpsResult<Vec<_>>>()?;

        ensure_shared_grid(&references)?;
        Ok(references)
    }
}

pub fn regularize_reference(id: &str, x: &[f64], y: &[f64]) -> XpsResult<ReferenceSpectrum> {
    let samples = regularize_samples(x, y).map_err(|source| {
        XpsError::irregular_grid(
            "INPUT.REFERENCE_GRID",
            format!("reference '{id}' cannot be placed on a uniform grid: {source}"),
        )
    })?;
    if samples.interpolated_points > 0 {
        info!(
            reference = %id,
            interpolated = samples.interpolated_points,
            step = samples.grid.step(),
            "reference grid regularized"
        );
    }

    ReferenceSpectrum::new(id, samples.x(), samples.y).map_err(|source| {
        XpsError::irregular_grid(
            "INPUT.REFERENCE_GRID",
            format!("reference '{id}' produced an inconsistent grid: {source}"),
        )
    })
}

/// Every reference of a run has to sit on the first reference's grid.
pub fn ensure_shared_grid(references: &[ReferenceSpectrum]) -> XpsResult<()> {
    let Some(first) = references.first() else {
        return Ok(());
    };

    for reference in &references[1..] {
        if !reference.grid().matches(first.grid()) {
            return Err(XpsError::irregular_grid(
                "INPUT.REFERENCE_GRID_MISMATCH",
                format!(
                    "reference '{}' spans {}..{} in {} points but '{}' spans {}..{} in {} points",
                    reference.label(),
                    reference.grid().start(),
                    reference.grid().stop(),
                    reference.grid().len(),
                    first.label(),
                    first.grid().start(),
                    first.grid().stop(),
                    first.grid().len()
                ),
            ));
        }
    }

    Ok(())
}

fn validate_ids(ids: &[String]) -> XpsResult<()> {
    if ids.is_empty() {
        return Err(XpsError::configuration(
            "CONFIG.REFERENCES_EMPTY",
            "at least one reference identifier is required",
        ));
    }

    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(XpsError::configuration(
                "CONFIG.REFERENCE_DUPLICATE",
                format!("reference '{id}' is listed more than once"),
            ));
        }
    }
    Ok(())
}
