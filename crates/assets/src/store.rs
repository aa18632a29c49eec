use crate::import::{AlphaMode, MeshData, RoomAsset};
use crate::{AssetError, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Summary of an imported mesh, as kept in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub name: String,
    pub parent: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub alpha_mode: AlphaMode,
}

impl From<&MeshData> for AssetRecord {
    fn from(mesh: &MeshData) -> Self {
        Self {
            name: mesh.name.clone(),
            parent: mesh.parent.clone(),
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            alpha_mode: mesh.material.alpha_mode,
        }
    }
}

/// Content-addressed asset registry.
///
/// Assets are indexed by their content hash. The registry can be persisted
/// to disk as JSON for inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    source: Option<String>,
    assets: BTreeMap<AssetId, AssetRecord>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry describing every mesh of `room`.
    pub fn from_room(room: &RoomAsset) -> Self {
        let mut store = Self {
            source: Some(room.source.display().to_string()),
            ..Self::default()
        };
        for mesh in &room.meshes {
            store.register_mesh(mesh);
        }
        store
    }

    /// Register a mesh and return its asset ID. Identical content dedups.
    pub fn register_mesh(&mut self, mesh: &MeshData) -> AssetId {
        self.assets.insert(mesh.id, AssetRecord::from(mesh));
        mesh.id
    }

    pub fn get(&self, id: AssetId) -> Option<&AssetRecord> {
        self.assets.get(&id)
    }

    pub fn require(&self, id: AssetId) -> Result<&AssetRecord, AssetError> {
        self.get(id).ok_or(AssetError::NotFound(id))
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn records(&self) -> impl Iterator<Item = (AssetId, &AssetRecord)> {
        self.assets.iter().map(|(id, r)| (*id, r))
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Save the asset registry to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load an asset registry from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let store: Self = serde_json::from_reader(file)?;
        Ok(store)
    }
}
