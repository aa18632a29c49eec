//! Player kernel: the first-person character, its camera and flashlight, and
//! session-wide state.
//!
//! # Invariants
//! - Movement is integrated only in [`BeforeStep::before_step`], never per frame.
//! - Vertical velocity is owned by physics; the player only rewrites X and Z.
//! - Jumping requires the grounded flag from the most recent rendered frame.
//!
//! [`BeforeStep::before_step`]: crimescene_common::BeforeStep::before_step

pub mod camera;
pub mod flashlight;
pub mod player;
pub mod session;

pub use camera::{CameraConfig, FirstPersonCamera};
pub use flashlight::{Flashlight, FlashlightConfig};
pub use player::{Player, PlayerConfig, horizontal_velocity};
pub use session::{Session, SessionCommand};
