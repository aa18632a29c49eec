use crate::fps::FpsCounter;
use crate::info::InfoTable;
use crimescene_common::TargetDescriptor;
use glam::{DQuat, DVec3, EulerRot};
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// A text element that can be shown or hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPanel {
    pub visible: bool,
    pub text: String,
}

/// Live kinematic state shown by the debug panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugSnapshot {
    pub position: DVec3,
    /// Camera pitch in radians, positive looking up.
    pub camera_pitch: f64,
    /// Camera yaw in radians.
    pub camera_yaw: f64,
    pub character_orientation: DQuat,
    pub linear_velocity: DVec3,
    pub target: Option<TargetDescriptor>,
}

/// On-screen state: contextual info panel, debug panel, crosshair.
#[derive(Debug, Clone)]
pub struct Hud {
    info_table: InfoTable,
    info: TextPanel,
    debug: TextPanel,
    fps: FpsCounter,
    crosshair_visible: bool,
}

impl Hud {
    pub fn new(info_table: InfoTable) -> Self {
        Self {
            info_table,
            info: TextPanel::default(),
            debug: TextPanel::default(),
            fps: FpsCounter::new(),
            crosshair_visible: true,
        }
    }

    pub fn info_table(&self) -> &InfoTable {
        &self.info_table
    }

    pub fn info_panel(&self) -> &TextPanel {
        &self.info
    }

    pub fn debug_panel(&self) -> &TextPanel {
        &self.debug
    }

    pub fn crosshair_visible(&self) -> bool {
        self.crosshair_visible
    }

    /// Show the description of the looked-at mesh, or hide the panel.
    pub fn update_context_info(&mut self, identifier: Option<&str>) {
        match identifier.and_then(|id| self.info_table.get(id)) {
            Some(description) => {
                self.info.visible = true;
                if self.info.text != description {
                    tracing::debug!(target_mesh = identifier, "context info changed");
                    self.info.text = description.to_string();
                }
            }
            None => self.info.visible = false,
        }
    }

    /// Refresh the debug report. Hidden and untouched while debug is off.
    pub fn update_debug_info(
        &mut self,
        snapshot: &DebugSnapshot,
        debug_enabled: bool,
        now: Instant,
        frame_delta: Duration,
    ) {
        if !debug_enabled {
            self.debug.visible = false;
            return;
        }
        self.debug.visible = true;
        let fps = self.fps.sample(now, frame_delta);
        self.debug.text = format_debug_report(snapshot, fps);
    }
}

/// `{:.2}` prints -0.0 as "-0.00"; adding +0.0 clears the sign.
fn unsigned_zero(v: f64) -> f64 {
    v + 0.0
}

fn fmt_vec(v: DVec3) -> String {
    format!(
        "{:.2},{:.2},{:.2}",
        unsigned_zero(v.x),
        unsigned_zero(v.y),
        unsigned_zero(v.z)
    )
}

fn fmt_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "Null".to_string(), |v| v.to_string())
}

/// Fixed-format multi-line debug report. The `Rotation` line reports pitch
/// positive looking down.
pub fn format_debug_report(snapshot: &DebugSnapshot, fps: u32) -> String {
    let (yaw, pitch, roll) = snapshot.character_orientation.to_euler(EulerRot::YXZ);
    let character_rotation = DVec3::new(pitch, yaw, roll);

    let target = snapshot.target.as_ref();
    let mut out = String::new();
    let _ = writeln!(out, "Position: {}", fmt_vec(snapshot.position));
    let _ = writeln!(
        out,
        "Rotation: {:.2}, {:.2}",
        unsigned_zero(-snapshot.camera_pitch.to_degrees()),
        unsigned_zero(snapshot.camera_yaw.to_degrees())
    );
    let _ = writeln!(out, "Character Rotation: {}", fmt_vec(character_rotation));
    let _ = writeln!(out, "Velocity: {}", fmt_vec(snapshot.linear_velocity));
    let _ = writeln!(out, "Looking At: {{");
    let _ = writeln!(out, "  Name: {}", fmt_optional(target.map(|t| &t.name)));
    let _ = writeln!(
        out,
        "  Parent Name: {}",
        fmt_optional(target.and_then(|t| t.parent.as_ref()))
    );
    let _ = writeln!(out, "  Mass: {}", fmt_optional(target.and_then(|t| t.mass)));
    let _ = writeln!(out, "}}");
    let _ = write!(out, "FPS: {fps}");
    out
}
