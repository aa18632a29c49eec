//! Head-up display: contextual descriptions, debug telemetry, crosshair.
//!
//! # Invariants
//! - The info panel is visible iff the looked-at mesh has an info-table entry.
//! - The debug panel is hidden whenever the session's debug flag is off.
//! - The FPS figure changes at most once per [`fps::FPS_REFRESH_INTERVAL`].

pub mod fps;
pub mod hud;
pub mod info;
pub mod overlay;

pub use fps::{FPS_REFRESH_INTERVAL, FpsCounter};
pub use hud::{DebugSnapshot, Hud, TextPanel, format_debug_report};
pub use info::InfoTable;
