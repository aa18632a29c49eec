//! Asset pipeline: room import from glTF plus a content-addressed registry.
//!
//! Meshes are identified by content-addressed hashes. The renderer and the
//! physics setup consume [`MeshData`]; the registry only keeps summaries and
//! can be persisted to disk as JSON for inspection.
//!
//! # Naming
//! Imported meshes follow the room's node names. A node whose mesh has several
//! primitives yields one mesh per primitive named `<node>_primitive<N>`, with
//! the node itself as parent. Top-level meshes have the parent [`ROOT_NODE`].

pub mod import;
pub mod store;

pub use import::{AlphaMode, MaterialInfo, MeshData, ROOT_NODE, RoomAsset, import_room};
pub use store::{AssetRecord, AssetStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(AssetId),
    #[error("glTF import error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("{0} contains no triangle meshes")]
    Empty(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
