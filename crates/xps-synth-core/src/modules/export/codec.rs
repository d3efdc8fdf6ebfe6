use crate::domain::{ExportResult, ReducedRecord, SimulatedSpectrumRecord, XpsError};
use crate::modules::export::ExportFormat;
use crate::modules::serialization::{format_space_separated, parse_space_separated};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(super) enum Artifact {
    Text(String),
    Binary(Vec<u8>),
}

/// A record type with a flat spreadsheet row. Arrays become space-separated
/// cells and the label map a JSON object cell.
pub(super) trait TabularRecord: Serialize + DeserializeOwned {
    type Row: Serialize + DeserializeOwned;

    fn to_row(&self) -> ExportResult<Self::Row>;

    fn from_row(row: Self::Row, line: usize) -> ExportResult<Self>;
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct FullRow {
    label: String,
    shift_x: Option<f64>,
    scale_y: f64,
    noise: Option<f64>,
    #[serde(rename = "FWHM")]
    fwhm: Option<f64>,
    x: String,
    y: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct ReducedRow {
    x: String,
    y: String,
    label: String,
}

impl TabularRecord for SimulatedSpectrumRecord {
    type Row = FullRow;

    fn to_row(&self) -> ExportResult<FullRow> {
        Ok(FullRow {
            label: label_cell(&self.label)?,
            shift_x: self.shift_x,
            scale_y: self.scale_y,
            noise: self.noise,
            fwhm: self.fwhm,
            x: format_space_separated(&self.x),
            y: format_space_separated(&self.y),
        })
    }

    fn from_row(row: FullRow, line: usize) -> ExportResult<Self> {
        Ok(Self {
            label: parse_label_cell(&row.label, line)?,
            shift_x: row.shift_x,
            scale_y: row.scale_y,
            noise: row.noise,
            fwhm: row.fwhm,
            x: parse_array_cell(&row.x, "x", line)?,
            y: parse_array_cell(&row.y, "y", line)?,
        })
    }
}

impl TabularRecord for ReducedRecord {
    type Row = ReducedRow;

    fn to_row(&self) -> ExportResult<ReducedRow> {
        Ok(ReducedRow {
            x: format_space_separated(&self.x),
            y: format_space_separated(&self.y),
            label: label_cell(&self.label)?,
        })
    }

    fn from_row(row: ReducedRow, line: usize) -> ExportResult<Self> {
        Ok(Self {
            x: parse_array_cell(&row.x, "x", line)?,
            y: parse_array_cell(&row.y, "y", line)?,
            label: parse_label_cell(&row.label, line)?,
        })
    }
}

/// JSON holds either a list (combined) or one object (per-record artifact).
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// `single` encodes one record the way per-record artifacts are stored.
pub(super) fn encode<T: TabularRecord>(
    records: &[T],
    format: ExportFormat,
    single: bool,
) -> ExportResult<Artifact> {
    match format {
        ExportFormat::Json => {
            let encoded = match records {
                [record] if single => serde_json::to_string_pretty(record),
                _ => serde_json::to_string_pretty(records),
            };
            encoded.map(Artifact::Text).map_err(serialize_error)
        }
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for record in records {
                writer.serialize(record.to_row()?).map_err(serialize_error)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|source| serialize_error(source.error()))?;
            String::from_utf8(bytes)
                .map(Artifact::Text)
                .map_err(serialize_error)
        }
        ExportFormat::Bincode => {
            let mut bytes = Vec::new();
            bincode::serialize_into(&mut bytes, records).map_err(serialize_error)?;
            Ok(Artifact::Binary(bytes))
        }
    }
}

pub(super) fn decode<T: TabularRecord>(bytes: &[u8], format: ExportFormat) -> ExportResult<Vec<T>> {
    match format {
        ExportFormat::Json => match serde_json::from_slice::<OneOrMany<T>>(bytes).map_err(parse_error)? {
            OneOrMany::Many(records) => Ok(records),
            OneOrMany::One(record) => Ok(vec![record]),
        },
        ExportFormat::Csv => {
            let mut reader = csv::Reader::from_reader(bytes);
            let mut records = Vec::new();
            for (row_index, row) in reader.deserialize::<T::Row>().enumerate() {
                let row = row.map_err(parse_error)?;
                records.push(T::from_row(row, row_index + 2)?);
            }
            Ok(records)
        }
        ExportFormat::Bincode => bincode::deserialize_from(bytes).map_err(parse_error),
    }
}

fn label_cell(label: &BTreeMap<String, f64>) -> ExportResult<String> {
    serde_json::to_string(label).map_err(serialize_error)
}

fn parse_label_cell(cell: &str, line: usize) -> ExportResult<BTreeMap<String, f64>> {
    serde_json::from_str(cell).map_err(|source| {
        XpsError::export(
            "EXPORT.PARSE",
            format!("line {line}: label cell is not a JSON object: {source}"),
        )
    })
}

fn parse_array_cell(cell: &str, column: &str, line: usize) -> ExportResult<Vec<f64>> {
    parse_space_separated(cell).map_err(|source| {
        XpsError::export(
            "EXPORT.PARSE",
            format!("line {line}: column '{column}' is not a number list: {source}"),
        )
    })
}

fn serialize_error(source: impl std::fmt::Display) -> XpsError {
    XpsError::export("EXPORT.SERIALIZE", format!("failed to encode records: {source}"))
}

fn parse_error(source: impl std::fmt::Display) -> XpsError {
    XpsError::export("EXPORT.PARSE", format!("failed to decode records: {source}"))
}
