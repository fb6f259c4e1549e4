//! Asset loading: format detection, parsing and document retrieval.

mod gltf;
mod stl;

#[cfg(test)]
pub(crate) mod fixtures;

use uuid::Uuid;

use crate::document::{DocumentRef, DocumentSource};
use crate::graph::{GraphError, RenderGraph};

/// Asset loading errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Network, filesystem or service failure; the request may be retried.
    #[error("Failed to retrieve document: {0}")]
    Transport(String),
    /// Payload could not be interpreted as a supported 3D format.
    #[error("Unsupported or malformed model: {0}")]
    UnsupportedFormat(String),
    /// Payload parsed but contains nothing to draw.
    #[error("Model contains no renderable geometry")]
    EmptyGeometry,
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Transport(_))
    }

    /// Short message for the status display.
    pub fn user_message(&self) -> String {
        match self {
            LoadError::Transport(_) => {
                "Failed to load model. Check the connection and try again.".to_string()
            }
            LoadError::UnsupportedFormat(_) => {
                "Failed to load model. Ensure it is a valid glTF, GLB or STL file.".to_string()
            }
            LoadError::EmptyGeometry => "The model contains no geometry to display.".to_string(),
        }
    }
}

impl From<GraphError> for LoadError {
    fn from(e: GraphError) -> Self {
        LoadError::UnsupportedFormat(format!("inconsistent node hierarchy: {}", e))
    }
}

/// Payload formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetFormat {
    /// Binary glTF container.
    Glb,
    /// glTF JSON with embedded (data URI) buffers.
    Gltf,
    /// Binary or ASCII STL.
    Stl,
}

impl AssetFormat {
    /// Detect the payload format from its content, falling back to the name.
    pub fn detect(name: &str, bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::UnsupportedFormat(format!("{} is empty", name)));
        }
        if bytes.starts_with(b"glTF") {
            return Ok(AssetFormat::Glb);
        }
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace()).copied();
        if first == Some(b'{') {
            return Ok(AssetFormat::Gltf);
        }
        let lower = name.to_lowercase();
        if lower.ends_with(".stl") || bytes.trim_ascii_start().starts_with(b"solid") {
            return Ok(AssetFormat::Stl);
        }
        Err(LoadError::UnsupportedFormat(format!(
            "unrecognized content in {}",
            name
        )))
    }

    pub fn name(&self) -> &'static str {
        match self {
            AssetFormat::Glb => "GLB",
            AssetFormat::Gltf => "glTF",
            AssetFormat::Stl => "STL",
        }
    }
}

/// A parsed asset ready to be handed to the viewer.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub id: Uuid,
    pub name: String,
    pub format: AssetFormat,
    pub graph: RenderGraph,
}

impl LoadedAsset {
    pub fn new(name: impl Into<String>, format: AssetFormat, graph: RenderGraph) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            graph,
        }
    }
}

/// Parse a payload into a render graph rooted at a node named `name`.
pub fn parse_asset(name: &str, bytes: &[u8]) -> Result<LoadedAsset, LoadError> {
    let format = AssetFormat::detect(name, bytes)?;
    let graph = match format {
        AssetFormat::Glb | AssetFormat::Gltf => gltf::parse_gltf(name, bytes)?,
        AssetFormat::Stl => stl::parse_stl(name, bytes)?,
    };

    if graph.renderable_count() == 0 {
        return Err(LoadError::EmptyGeometry);
    }

    tracing::debug!(
        "Parsed {} asset {}: {} nodes, {} renderables, {} materials",
        format.name(),
        name,
        graph.len(),
        graph.renderable_count(),
        graph.materials().len()
    );

    Ok(LoadedAsset::new(name, format, graph))
}

/// Resolve, fetch and parse a document.
pub fn load_document(
    source: &dyn DocumentSource,
    reference: &DocumentRef,
) -> Result<LoadedAsset, LoadError> {
    let resolved = source.resolve(reference)?;
    tracing::info!("Fetching {} from {}", resolved.display_name, resolved.location);
    let bytes = source.fetch(&resolved)?;
    tracing::debug!("Fetched {} bytes for {}", bytes.len(), resolved.display_name);
    parse_asset(&resolved.display_name, &bytes)
}
