use super::{StoredDocument, validate_collection_name};
use crate::domain::{XpsError, XpsResult};
use crate::modules::DocumentStore;
use crate::modules::serialization::write_text_artifact;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const COLLECTION_EXTENSION: &str = "jsonl";

/// One JSON-lines file per collection under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDocumentStore {
    root: PathBuf,
}

impl DirectoryDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{COLLECTION_EXTENSION}"))
    }

    fn ensure_root(&self) -> XpsResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| {
            XpsError::export(
                "STORE.CREATE_DIR",
                format!(
                    "failed to create store directory '{}': {}",
                    self.root.display(),
                    source
                ),
            )
        })
    }
}

fn render_lines(documents: &[StoredDocument]) -> XpsResult<String> {
    let mut content = String::new();
    for document in documents {
        let line = serde_json::to_string(document).map_err(|source| {
            XpsError::export(
                "STORE.SERIALIZE",
                format!("failed to encode document: {source}"),
            )
        })?;
        content.push_str(&line);
        content.push('\n');
    }
    Ok(content)
}

fn write_error(path: &Path, source: std::io::Error) -> XpsError {
    XpsError::export(
        "STORE.WRITE",
        format!("failed to write collection '{}': {}", path.display(), source),
    )
}

impl DocumentStore for DirectoryDocumentStore {
    fn collection_exists(&self, name: &str) -> XpsResult<bool> {
        validate_collection_name(name)?;
        Ok(self.collection_path(name).is_file())
    }

    fn replace_collection(&mut self, name: &str, documents: &[StoredDocument]) -> XpsResult<()> {
        validate_collection_name(name)?;
        self.ensure_root()?;
        let path = self.collection_path(name);
        write_text_artifact(&path, &render_lines(documents)?).map_err(|source| write_error(&path, source))
    }

    fn append(&mut self, name: &str, documents: &[StoredDocument]) -> XpsResult<()> {
        validate_collection_name(name)?;
        self.ensure_root()?;
        let path = self.collection_path(name);
        let content = render_lines(documents)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| write_error(&path, source))?;
        file.write_all(content.as_bytes())
            .map_err(|source| write_error(&path, source))
    }

    fn documents(&self, name: &str) -> XpsResult<Vec<StoredDocument>> {
        validate_collection_name(name)?;
        let path = self.collection_path(name);
        let content = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                XpsError::export(
                    "STORE.COLLECTION_MISSING",
                    format!("collection '{name}' does not exist in '{}'", self.root.display()),
                )
            } else {
                XpsError::export(
                    "STORE.READ",
                    format!("failed to read collection '{}': {}", path.display(), source),
                )
            }
        })?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| {
                    XpsError::export(
                        "STORE.PARSE",
                        format!("'{}' line {}: {}", path.display(), index + 1, source),
                    )
                })
            })
            .collect()
    }

    fn drop_collection(&mut self, name: &str) -> XpsResult<bool> {
        validate_collection_name(name)?;
        let path = self.collection_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(XpsError::export(
                "STORE.DROP",
                format!("failed to remove collection '{}': {}", path.display(), source),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DirectoryDocumentStore;
    use crate::modules::DocumentStore;
    use crate::modules::storage::StoredDocument;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn document(weight: f64) -> StoredDocument {
        StoredDocument {
            label: BTreeMap::from([("FeO".to_string(), weight)]),
            parameters: None,
            x: vec![709.5, 709.6],
            y: vec![0.25, 1.0],
        }
    }

    #[test]
    fn collections_are_json_lines_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut store = DirectoryDocumentStore::new(temp.path().join("store"));

        assert!(!store.collection_exists("iron").expect("exists check"));
        store
            .replace_collection("iron", &[document(1.0), document(0.5)])
            .expect("replace");
        store.append("iron", &[document(0.25)]).expect("append");

        let content = fs::read_to_string(store.collection_path("iron")).expect("collection file");
        assert_eq!(content.lines().count(), 3);

        let documents = store.documents("iron").expect("documents");
        assert_eq!(documents.len(), 3);
        assert_eq!(documents[2].label["FeO"], 0.25);

        store.replace_collection("iron", &[document(0.75)]).expect("replace again");
        assert_eq!(store.documents("iron").expect("documents").len(), 1);
    }

    #[test]
    fn missing_and_corrupt_collections_are_export_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        let store = DirectoryDocumentStore::new(temp.path());

        let error = store.documents("absent").expect_err("missing collection");
        assert_eq!(error.placeholder(), "STORE.COLLECTION_MISSING");

        fs::write(store.collection_path("broken"), "{not json}\n").expect("corrupt file");
        let error = store.documents("broken").expect_err("corrupt collection");
        assert_eq!(error.placeholder(), "STORE.PARSE");
        assert!(error.message().contains("line 1"));
    }

    #[test]
    fn dropping_removes_the_collection_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut store = DirectoryDocumentStore::new(temp.path());
        store.replace_collection("iron", &[document(1.0)]).expect("replace");

        assert!(store.drop_collection("iron").expect("drop"));
        assert!(!store.collection_path("iron").exists());
        assert!(!store.drop_collection("iron").expect("drop absent"));

        let error = store.drop_collection("../iron").expect_err("path-like name");
        assert_eq!(error.placeholder(), "CONFIG.COLLECTION_NAME");
    }
}
