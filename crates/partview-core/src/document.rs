//! Document references and the storage-service seam.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::loader::LoadError;

/// Opaque reference to a 3D document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentRef {
    /// Document stored in the PDM backend.
    Remote { id: u64 },
    /// File on the local filesystem.
    Local { path: PathBuf },
}

impl DocumentRef {
    /// Parse a command-line style reference: a bare number is a document id,
    /// anything else is a path.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.parse::<u64>() {
            Ok(id) => DocumentRef::Remote { id },
            Err(_) => DocumentRef::Local {
                path: PathBuf::from(value),
            },
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        DocumentRef::Local { path: path.into() }
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentRef::Remote { id } => write!(f, "document {}", id),
            DocumentRef::Local { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Server-side conversion state of an uploaded CAD file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionStatus {
    /// Not a CAD file; served as uploaded.
    #[default]
    #[serde(rename = "N_A")]
    NotApplicable,
    Pending,
    Converting,
    Done,
    Failed,
}

/// Document metadata as returned by the PDM backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: u64,
    #[serde(default)]
    pub revision_id: Option<u64>,
    pub file_name: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub gltf_path: Option<String>,
    #[serde(default)]
    pub conversion_status: ConversionStatus,
}

impl DocumentInfo {
    /// Name shown to the user; STEP files are served as their converted GLB.
    pub fn display_name(&self) -> String {
        if self.gltf_path.is_none() {
            return self.file_name.clone();
        }
        let lower = self.file_name.to_lowercase();
        for ext in [".step", ".stp"] {
            if lower.ends_with(ext) {
                let stem = &self.file_name[..self.file_name.len() - ext.len()];
                return format!("{}.glb", stem);
            }
        }
        self.file_name.clone()
    }

    /// Fail early for documents whose payload cannot be viewed yet.
    pub fn check_viewable(&self) -> Result<(), LoadError> {
        match self.conversion_status {
            ConversionStatus::Pending | ConversionStatus::Converting => Err(LoadError::Transport(
                format!("{} is still being converted, try again shortly", self.file_name),
            )),
            ConversionStatus::Failed => Err(LoadError::UnsupportedFormat(format!(
                "conversion of {} failed on the server",
                self.file_name
            ))),
            ConversionStatus::NotApplicable | ConversionStatus::Done => Ok(()),
        }
    }
}

/// A reference resolved to something fetchable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub reference: DocumentRef,
    /// URL or filesystem path of the payload.
    pub location: String,
    /// Name shown in the status display and used as the graph root name.
    pub display_name: String,
}

/// Storage/retrieval service for documents.
///
/// Implementations are called from loader threads and must not touch viewer
/// state.
pub trait DocumentSource: Send + Sync {
    /// Resolve a reference to a fetchable location.
    fn resolve(&self, reference: &DocumentRef) -> Result<ResolvedDocument, LoadError>;

    /// Retrieve the payload bytes.
    fn fetch(&self, document: &ResolvedDocument) -> Result<Vec<u8>, LoadError>;
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentSource {
    base_dir: Option<PathBuf>,
}

impl FileDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl DocumentSource for FileDocumentSource {
    fn resolve(&self, reference: &DocumentRef) -> Result<ResolvedDocument, LoadError> {
        let DocumentRef::Local { path } = reference else {
            return Err(LoadError::Transport(format!(
                "{} cannot be opened from the local filesystem",
                reference
            )));
        };
        let full_path = self.full_path(path);
        if !full_path.is_file() {
            return Err(LoadError::Transport(format!(
                "file not found: {}",
                full_path.display()
            )));
        }
        let display_name = full_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("model")
            .to_string();
        Ok(ResolvedDocument {
            reference: reference.clone(),
            location: full_path.to_string_lossy().to_string(),
            display_name,
        })
    }

    fn fetch(&self, document: &ResolvedDocument) -> Result<Vec<u8>, LoadError> {
        std::fs::read(&document.location)
            .map_err(|e| LoadError::Transport(format!("{}: {}", document.location, e)))
    }
}
