//! Scene bootstrap for the crime-scene walkthrough.
//!
//! A [`Scene`] is built in two phases. [`Scene::new`] creates the physics
//! world, the ground and the ambient light. [`Scene::start_loading`] then
//! imports the room model on a worker thread, and [`Scene::poll`] finishes
//! setup once the import lands: every room mesh gets a body and the player is
//! spawned. Until the scene reports [`Readiness::Ready`] the per-frame hooks
//! do nothing.

pub mod config;
pub mod error;
pub mod loader;
pub mod scene;

pub use config::{AmbientLight, ConfigError, GroundConfig, SceneConfig, UnmatchedKeys};
pub use error::SceneError;
pub use loader::RoomLoader;
pub use scene::{DrawItem, Readiness, Scene};
