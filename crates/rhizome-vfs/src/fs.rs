use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{VfsError, VfsResult};

/// The flat JSON-document trees under the store root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tree {
    /// Record envelopes, one per record id.
    Objects,
    /// File-metadata documents, one per file id.
    Files,
}

impl Tree {
    fn dirname(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Files => "files",
        }
    }
}

/// Name of the payload tree under the store root.
const DATA_DIR: &str = "data";

/// Filesystem handle for one store directory.
///
/// Opening a `StoreFs` ensures the three trees exist. Document names in the
/// flat trees are bare stems (the `.json` suffix is added here); payload
/// paths are relative to `data/` and may contain subdirectories, which are
/// created on write.
#[derive(Debug)]
pub struct StoreFs {
    root: PathBuf,
}

impl StoreFs {
    /// Open (or create) a store directory, ensuring all three trees exist.
    pub fn open(root: &Path) -> VfsResult<Self> {
        fs::create_dir_all(root.join(Tree::Objects.dirname()))?;
        fs::create_dir_all(root.join(Tree::Files.dirname()))?;
        fs::create_dir_all(root.join(DATA_DIR))?;
        debug!(root = %root.display(), "store directory opened");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The store's base directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the document names (stems, without `.json`) in a flat tree.
    ///
    /// The order is unspecified; callers must not rely on it.
    pub fn list(&self, tree: Tree) -> VfsResult<Vec<String>> {
        let dir = self.root.join(tree.dirname());
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }

    /// Read one JSON document from a flat tree.
    pub fn read_document(&self, tree: Tree, name: &str) -> VfsResult<Value> {
        let path = self.document_path(tree, name);
        let text = fs::read_to_string(&path).map_err(|e| not_found_or(e, &path))?;
        serde_json::from_str(&text).map_err(|source| VfsError::Malformed { path, source })
    }

    /// Write one JSON document into a flat tree, replacing any previous
    /// version. Documents are pretty-printed for hand inspection.
    pub fn write_document(&self, tree: Tree, name: &str, value: &Value) -> VfsResult<()> {
        let path = self.document_path(tree, name);
        let text = serde_json::to_string_pretty(value).map_err(|source| VfsError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, text)?;
        debug!(tree = tree.dirname(), name, "document written");
        Ok(())
    }

    /// Whether a document exists in a flat tree.
    pub fn document_exists(&self, tree: Tree, name: &str) -> bool {
        self.document_path(tree, name).is_file()
    }

    /// Read raw payload bytes from `data/<relpath>`.
    pub fn read_payload(&self, relpath: &str) -> VfsResult<Vec<u8>> {
        let path = self.payload_path(relpath)?;
        fs::read(&path).map_err(|e| not_found_or(e, &path))
    }

    /// Read a UTF-8 text payload from `data/<relpath>`.
    pub fn read_payload_text(&self, relpath: &str) -> VfsResult<String> {
        let path = self.payload_path(relpath)?;
        fs::read_to_string(&path).map_err(|e| not_found_or(e, &path))
    }

    /// Write raw payload bytes to `data/<relpath>`, creating missing parent
    /// directories.
    pub fn write_payload(&self, relpath: &str, data: &[u8]) -> VfsResult<()> {
        let path = self.payload_path(relpath)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, data)?;
        debug!(relpath, len = data.len(), "payload written");
        Ok(())
    }

    /// Write a UTF-8 text payload to `data/<relpath>`.
    pub fn write_payload_text(&self, relpath: &str, text: &str) -> VfsResult<()> {
        self.write_payload(relpath, text.as_bytes())
    }

    /// Whether a payload exists at `data/<relpath>`.
    pub fn payload_exists(&self, relpath: &str) -> bool {
        match self.payload_path(relpath) {
            Ok(path) => path.is_file(),
            Err(_) => false,
        }
    }

    fn document_path(&self, tree: Tree, name: &str) -> PathBuf {
        self.root
            .join(tree.dirname())
            .join(format!("{name}.json"))
    }

    /// Resolve a payload path, rejecting anything that would escape `data/`.
    fn payload_path(&self, relpath: &str) -> VfsResult<PathBuf> {
        let rel = Path::new(relpath);
        let escapes = rel.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if relpath.is_empty() || escapes {
            return Err(VfsError::InvalidPath(relpath.to_string()));
        }
        Ok(self.root.join(DATA_DIR).join(rel))
    }
}

fn not_found_or(err: io::Error, path: &Path) -> VfsError {
    if err.kind() == io::ErrorKind::NotFound {
        VfsError::NotFound(path.to_path_buf())
    } else {
        VfsError::Io(err)
    }
}
