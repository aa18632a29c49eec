use crate::{AssetError, AssetId};
use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Parent name given to meshes that sit directly under the scene.
pub const ROOT_NODE: &str = "__root__";

/// How a material's alpha channel is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

impl From<gltf::material::AlphaMode> for AlphaMode {
    fn from(mode: gltf::material::AlphaMode) -> Self {
        match mode {
            gltf::material::AlphaMode::Opaque => Self::Opaque,
            gltf::material::AlphaMode::Mask => Self::Mask,
            gltf::material::AlphaMode::Blend => Self::Blend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub name: Option<String>,
    pub alpha_mode: AlphaMode,
    pub base_color: [f32; 4],
    pub has_base_color_texture: bool,
}

impl Default for MaterialInfo {
    fn default() -> Self {
        Self {
            name: None,
            alpha_mode: AlphaMode::Opaque,
            base_color: [0.8, 0.8, 0.8, 1.0],
            has_base_color_texture: false,
        }
    }
}

/// One renderable, collidable piece of the room.
///
/// Vertices are in the mesh's local frame with the node's world scale already
/// applied, so `translation` and `rotation` fully place them in the world.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub id: AssetId,
    pub name: String,
    pub parent: String,
    pub material: MaterialInfo,
    pub translation: DVec3,
    pub rotation: DQuat,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangle indices grouped per face.
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect()
    }
}

/// Every mesh imported from one room file, in document order.
#[derive(Debug, Clone)]
pub struct RoomAsset {
    pub source: PathBuf,
    pub meshes: Vec<MeshData>,
}

impl RoomAsset {
    pub fn mesh(&self, name: &str) -> Option<&MeshData> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn mesh_names(&self) -> impl Iterator<Item = &str> {
        self.meshes.iter().map(|m| m.name.as_str())
    }
}

/// Import every triangle mesh of the file's default scene.
pub fn import_room(path: impl AsRef<Path>) -> Result<RoomAsset, AssetError> {
    let path = path.as_ref();
    let (doc, buffers, _images) = gltf::import(path)?;

    let mut meshes = Vec::new();
    let scene = doc.default_scene().or_else(|| doc.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            visit_node(&node, ROOT_NODE, DMat4::IDENTITY, &buffers, &mut meshes);
        }
    }

    if meshes.is_empty() {
        return Err(AssetError::Empty(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), meshes = meshes.len(), "room imported");
    Ok(RoomAsset {
        source: path.to_path_buf(),
        meshes,
    })
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()))
}

fn visit_node(
    node: &gltf::Node,
    parent: &str,
    parent_world: DMat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshData>,
) {
    let (t, r, s) = node.transform().decomposed();
    let local = DMat4::from_scale_rotation_translation(
        DVec3::new(s[0] as f64, s[1] as f64, s[2] as f64),
        DQuat::from_xyzw(r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64),
        DVec3::new(t[0] as f64, t[1] as f64, t[2] as f64),
    );
    let world = parent_world * local;
    let name = node_name(node);

    if let Some(mesh) = node.mesh() {
        let (scale, rotation, translation) = world.to_scale_rotation_translation();
        let count = mesh.primitives().len();
        for (i, prim) in mesh.primitives().enumerate() {
            let (mesh_name, mesh_parent) = if count == 1 {
                (name.clone(), parent.to_string())
            } else {
                (format!("{name}_primitive{i}"), name.clone())
            };
            match read_primitive(&prim, buffers, scale) {
                Some((positions, normals, indices)) => {
                    let material = read_material(&prim.material());
                    let id = content_hash(&mesh_name, &positions, &indices);
                    out.push(MeshData {
                        id,
                        name: mesh_name,
                        parent: mesh_parent,
                        material,
                        translation,
                        rotation: rotation.normalize(),
                        positions,
                        normals,
                        indices,
                    });
                }
                None => tracing::warn!(mesh = %mesh_name, "primitive skipped: not a triangle list"),
            }
        }
    }

    for child in node.children() {
        visit_node(&child, &name, world, buffers, out);
    }
}

type PrimitiveBuffers = (Vec<[f32; 3]>, Vec<[f32; 3]>, Vec<u32>);

fn read_primitive(
    prim: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    scale: DVec3,
) -> Option<PrimitiveBuffers> {
    if prim.mode() != gltf::mesh::Mode::Triangles {
        return None;
    }
    let reader = prim.reader(|b| buffers.get(b.index()).map(|bb| bb.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()?
        .map(|p| {
            [
                (p[0] as f64 * scale.x) as f32,
                (p[1] as f64 * scale.y) as f32,
                (p[2] as f64 * scale.z) as f32,
            ]
        })
        .collect();

    let uniform_safe = scale.min_element() > 0.0;
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(it) => it
            .map(|n| {
                let n = DVec3::new(n[0] as f64, n[1] as f64, n[2] as f64);
                let n = if uniform_safe { (n / scale).normalize_or_zero() } else { n };
                n.as_vec3().to_array()
            })
            .collect(),
        None => vec![[0.0, 1.0, 0.0]; positions.len()],
    };

    let indices: Vec<u32> = match reader.read_indices() {
        Some(it) => it.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if indices.len() < 3 {
        return None;
    }
    Some((positions, normals, indices))
}

fn read_material(material: &gltf::Material) -> MaterialInfo {
    let pbr = material.pbr_metallic_roughness();
    MaterialInfo {
        name: material.name().map(str::to_string),
        alpha_mode: material.alpha_mode().into(),
        base_color: pbr.base_color_factor(),
        has_base_color_texture: pbr.base_color_texture().is_some(),
    }
}

fn content_hash(name: &str, positions: &[[f32; 3]], indices: &[u32]) -> AssetId {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    for p in positions {
        for c in p {
            hasher.update(c.to_le_bytes());
        }
    }
    for i in indices {
        hasher.update(i.to_le_bytes());
    }
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    AssetId(u64::from_le_bytes(bytes))
}
