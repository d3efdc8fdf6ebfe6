//! Bulk storage of generated records in a document store.
//!
//! Documents carry the energy axis rounded to two decimals and single
//! precision intensities. What happens when the target collection already
//! exists is decided up-front by an [`OverwritePolicy`], before anything is
//! written.

mod directory;

pub use directory::{COLLECTION_EXTENSION, DirectoryDocumentStore};

use crate::domain::{SimulatedSpectrumRecord, XpsError, XpsResult};
use crate::modules::DocumentStore;
use crate::modules::dataset::Dataset;
use crate::modules::export::ExportView;
use crate::numerics::round_to_decimals;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{debug, info};

pub const STORED_X_DECIMALS: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredParameters {
    pub shift_x: Option<f64>,
    pub scale_y: f64,
    pub noise: Option<f64>,
    #[serde(rename = "FWHM")]
    pub fwhm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub label: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<StoredParameters>,
    pub x: Vec<f64>,
    pub y: Vec<f32>,
}

impl StoredDocument {
    pub fn from_record(record: &SimulatedSpectrumRecord, view: ExportView) -> Self {
        let parameters = match view {
            ExportView::Full => Some(StoredParameters {
                shift_x: record.shift_x,
                scale_y: record.scale_y,
                noise: record.noise,
                fwhm: record.fwhm,
            }),
            ExportView::Reduced => None,
        };

        Self {
            label: record.label.clone(),
            parameters,
            x: record
                .x
                .iter()
                .map(|value| round_to_decimals(*value, STORED_X_DECIMALS))
                .collect(),
            y: record.y.iter().map(|value| *value as f32).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    #[default]
    Fail,
    Overwrite,
    Append,
    Rename,
}

impl OverwritePolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Overwrite => "overwrite",
            Self::Append => "append",
            Self::Rename => "rename",
        }
    }
}

impl Display for OverwritePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for OverwritePolicy {
    type Err = XpsError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "overwrite" | "replace" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            "rename" => Ok(Self::Rename),
            other => Err(XpsError::configuration(
                "CONFIG.OVERWRITE_POLICY",
                format!(
                    "unknown overwrite policy '{other}'; expected fail, overwrite, append or rename"
                ),
            )),
        }
    }
}

/// Store every record of `dataset` in the collection `name`.
///
/// Returns the collection actually written, which differs from `name` only
/// under [`OverwritePolicy::Rename`].
pub fn upload(
    store: &mut impl DocumentStore,
    name: &str,
    dataset: &Dataset,
    view: ExportView,
    policy: OverwritePolicy,
) -> XpsResult<String> {
    validate_collection_name(name)?;

    let documents: Vec<StoredDocument> = dataset
        .full_view()
        .iter()
        .map(|record| StoredDocument::from_record(record, view))
        .collect();

    let exists = store.collection_exists(name)?;
    let target = match (exists, policy) {
        (false, _) => name.to_string(),
        (true, OverwritePolicy::Fail) => {
            return Err(XpsError::export(
                "STORE.COLLECTION_EXISTS",
                format!("collection '{name}' already exists"),
            ));
        }
        (true, OverwritePolicy::Overwrite | OverwritePolicy::Append) => name.to_string(),
        (true, OverwritePolicy::Rename) => free_collection_name(store, name)?,
    };

    if exists && policy == OverwritePolicy::Append {
        store.append(&target, &documents)?;
    } else {
        store.replace_collection(&target, &documents)?;
    }

    info!(
        collection = %target,
        documents = documents.len(),
        %policy,
        %view,
        "dataset uploaded"
    );
    Ok(target)
}

/// Remove the collection `name`. Dropping an absent collection is not an
/// error; the returned flag tells whether anything was removed.
pub fn drop_collection(store: &mut impl DocumentStore, name: &str) -> XpsResult<bool> {
    validate_collection_name(name)?;
    let dropped = store.drop_collection(name)?;
    if dropped {
        info!(collection = %name, "collection dropped");
    } else {
        debug!(collection = %name, "collection to drop does not exist");
    }
    Ok(dropped)
}

fn free_collection_name(store: &impl DocumentStore, name: &str) -> XpsResult<String> {
    for suffix in 1_usize.. {
        let candidate = format!("{name}_{suffix}");
        if !store.collection_exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(XpsError::internal(
        "SYS.COLLECTION_NAMES",
        format!("no free collection name derived from '{name}'"),
    ))
}

pub(crate) fn validate_collection_name(name: &str) -> XpsResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-' | '.'))
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(XpsError::configuration(
            "CONFIG.COLLECTION_NAME",
            format!("collection name '{name}' must be non-empty ASCII letters, digits, '_', '-' or '.'"),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryDocumentStore {
    collections: BTreeMap<String, Vec<StoredDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn collection_exists(&self, name: &str) -> XpsResult<bool> {
        Ok(self.collections.contains_key(name))
    }

    fn replace_collection(&mut self, name: &str, documents: &[StoredDocument]) -> XpsResult<()> {
        self.collections.insert(name.to_string(), documents.to_vec());
        Ok(())
    }

    fn append(&mut self, name: &str, documents: &[StoredDocument]) -> XpsResult<()> {
        self.collections
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(documents);
        Ok(())
    }

    fn documents(&self, name: &str) -> XpsResult<Vec<StoredDocument>> {
        self.collections.get(name).cloned().ok_or_else(|| {
            XpsError::export(
                "STORE.COLLECTION_MISSING",
                format!("collection '{name}' does not exist"),
            )
        })
    }

    fn drop_collection(&mut self, name: &str) -> XpsResult<bool> {
        Ok(self.collections.remove(name).is_some())
    }
}
