//! partview core data structures
//!
//! This crate contains everything the viewer needs that does not touch a
//! window or a GPU:
//! - Render graph: positioned node hierarchy with meshes and shared materials
//! - Scene tree: the navigable subset of the render graph shown to users
//! - Loader: glTF/GLB/STL parsing and document retrieval
//! - Load tracking: last-issued-wins bookkeeping for asynchronous loads

pub mod bounds;
pub mod document;
pub mod graph;
pub mod loader;
pub mod loading;
pub mod material;
pub mod mesh;
pub mod tree;

pub use bounds::BoundingBox;
pub use document::*;
pub use graph::{GraphError, NodeHandle, RenderGraph, RenderNode, Renderable};
pub use loader::{AssetFormat, LoadError, LoadedAsset, load_document, parse_asset};
pub use loading::{LoadTicket, LoadTracker, RequestId};
pub use material::{Material, MaterialHandle, MaterialLibrary};
pub use mesh::MeshData;
pub use tree::{SceneNode, SceneNodeId, SceneTree, TreeError};
