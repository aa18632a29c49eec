use crimescene_hud::InfoTable;
use crimescene_kernel::PlayerConfig;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Errors from reading the scene configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed scene config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Edge length of the square ground.
    pub size: f64,
    /// Height of the ground's top face.
    pub top: f64,
    pub thickness: f64,
    pub restitution: f64,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 100.0,
            top: -1.0,
            thickness: 1.0,
            restitution: 0.5,
        }
    }
}

/// Hemispheric sky light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientLight {
    pub direction: DVec3,
    pub intensity: f64,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            direction: DVec3::Y,
            intensity: 0.25,
        }
    }
}

/// Config keys that name no imported mesh, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmatchedKeys {
    pub info: Vec<String>,
    pub masses: Vec<String>,
    pub alpha_blend: Vec<String>,
}

impl UnmatchedKeys {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.info.len() + self.masses.len() + self.alpha_blend.len()
    }
}

/// Everything the scene bootstrap needs. Every field has a default, so a
/// partial YAML file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Room model, relative to the assets directory unless absolute.
    pub room: PathBuf,
    pub gravity: DVec3,
    pub ground: GroundConfig,
    pub ambient: AmbientLight,
    pub friction: f64,
    /// Meshes with a positive mass here become free dynamic bodies.
    pub masses: BTreeMap<String, f64>,
    /// Meshes rendered with alpha blending.
    pub alpha_blend: BTreeSet<String>,
    pub info: InfoTable,
    pub player: PlayerConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            room: PathBuf::from("models/full_room.gltf"),
            gravity: DVec3::new(0.0, -9.81, 0.0),
            ground: GroundConfig::default(),
            ambient: AmbientLight::default(),
            friction: 0.6,
            masses: BTreeMap::from([("chair".to_string(), 10.0)]),
            alpha_blend: BTreeSet::from([
                "inner_window_primitive1".to_string(),
                "outer_window_primitive1".to_string(),
            ]),
            info: InfoTable::default(),
            player: PlayerConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read `path`; a missing file yields the built-in defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_yaml_str(&text)?;
                tracing::info!(path = %path.display(), "scene config loaded");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no scene config, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Room path resolved against `assets_dir`.
    pub fn room_path(&self, assets_dir: impl AsRef<Path>) -> PathBuf {
        if self.room.is_absolute() {
            self.room.clone()
        } else {
            assets_dir.as_ref().join(&self.room)
        }
    }

    pub fn mass_of(&self, mesh: &str) -> f64 {
        self.masses.get(mesh).copied().unwrap_or(0.0)
    }

    pub fn unmatched_keys<'a>(
        &self,
        mesh_names: impl IntoIterator<Item = &'a str>,
    ) -> UnmatchedKeys {
        let known: BTreeSet<&str> = mesh_names.into_iter().collect();
        UnmatchedKeys {
            info: self.info.validate(known.iter().copied()),
            masses: self
                .masses
                .keys()
                .filter(|k| !known.contains(k.as_str()))
                .cloned()
                .collect(),
            alpha_blend: self
                .alpha_blend
                .iter()
                .filter(|k| !known.contains(k.as_str()))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_crime_scene() {
        let cfg = SceneConfig::default();
        assert_eq!(cfg.mass_of("chair"), 10.0);
        assert_eq!(cfg.mass_of("bed"), 0.0);
        assert!(cfg.alpha_blend.contains("outer_window_primitive1"));
        assert_eq!(cfg.ground.top, -1.0);
        assert_eq!(cfg.ambient.intensity, 0.25);
        assert_eq!(cfg.info.len(), 24);
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let cfg = SceneConfig::default();
        let text = cfg.to_yaml().unwrap();
        assert_eq!(SceneConfig::from_yaml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg = SceneConfig::from_yaml_str(
            "friction: 0.9\nplayer:\n  walk_speed: 2.0\nmasses:\n  desk: 40.0\n",
        )
        .unwrap();
        assert_eq!(cfg.friction, 0.9);
        assert_eq!(cfg.player.walk_speed, 2.0);
        assert_eq!(cfg.player.sprint_speed, 7.5);
        assert_eq!(cfg.mass_of("desk"), 40.0);
        assert_eq!(cfg.mass_of("chair"), 0.0);
        assert_eq!(cfg.info, InfoTable::default());
    }

    #[test]
    fn unmatched_keys_are_grouped_by_table() {
        let mut cfg = SceneConfig::default();
        cfg.masses.insert("ghost".into(), 1.0);
        let names = ["chair", "inner_window_primitive1", "knife"];
        let unmatched = cfg.unmatched_keys(names);
        assert_eq!(unmatched.masses, vec!["ghost".to_string()]);
        assert_eq!(unmatched.alpha_blend, vec!["outer_window_primitive1".to_string()]);
        assert_eq!(unmatched.info.len(), 21);
        assert!(!unmatched.info.contains(&"knife".to_string()));
        assert_eq!(unmatched.total(), 23);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = SceneConfig::from_yaml_str("friction: [not, a, number]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SceneConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(cfg, SceneConfig::default());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        std::fs::write(&path, "room: rooms/other.gltf\n").unwrap();
        let cfg = SceneConfig::load(&path).unwrap();
        assert_eq!(cfg.room_path("/data"), PathBuf::from("/data/rooms/other.gltf"));
    }
}
