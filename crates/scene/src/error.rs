use crate::config::ConfigError;
use crimescene_assets::AssetError;
use crimescene_common::PhysicsError;

/// Errors raised while bootstrapping the scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start room loader: {0}")]
    Io(#[from] std::io::Error),
    #[error("room loader exited without a result")]
    LoaderDisconnected,
}
