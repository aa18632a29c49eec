//! egui rendering of the [`Hud`] state.

use crate::hud::Hud;
use egui::{Align2, Color32, Context, Id, LayerId, Order, RichText, Stroke, pos2, vec2};

/// Edge length of the centre crosshair, in points.
pub const CROSSHAIR_SIZE: f32 = 16.0;

const DEBUG_FONT_SIZE: f32 = 12.0;
const INFO_FONT_SIZE: f32 = 24.0;
const INFO_COLOR: Color32 = Color32::from_rgb(0, 0, 255);

/// Paint crosshair, debug panel and info panel for one frame.
pub fn draw(ctx: &Context, hud: &Hud) {
    let screen = ctx.screen_rect();

    if hud.crosshair_visible() {
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("crosshair")));
        let c = screen.center();
        let half = CROSSHAIR_SIZE / 2.0;
        let stroke = Stroke::new(2.0, Color32::WHITE);
        painter.line_segment([pos2(c.x - half, c.y), pos2(c.x + half, c.y)], stroke);
        painter.line_segment([pos2(c.x, c.y - half), pos2(c.x, c.y + half)], stroke);
    }

    // Both areas are shown every frame, empty while hidden: egui skips
    // painting an area on the first frame it appears.
    let debug = hud.debug_panel();
    egui::Area::new(Id::new("debug_panel"))
        .anchor(Align2::LEFT_TOP, vec2(8.0, 8.0))
        .interactable(false)
        .show(ctx, |ui| {
            if debug.visible {
                ui.set_max_width(screen.width() * 0.25);
                ui.label(
                    RichText::new(&debug.text)
                        .size(DEBUG_FONT_SIZE)
                        .color(Color32::WHITE),
                );
            }
        });

    let info = hud.info_panel();
    egui::Area::new(Id::new("info_panel"))
        .anchor(Align2::CENTER_BOTTOM, vec2(0.0, -24.0))
        .interactable(false)
        .show(ctx, |ui| {
            if info.visible {
                ui.set_max_width(screen.width() * 0.75);
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new(&info.text)
                            .size(INFO_FONT_SIZE)
                            .color(INFO_COLOR),
                    );
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::InfoTable;

    #[test]
    fn draws_crosshair_without_panels() {
        let ctx = Context::default();
        let hud = Hud::new(InfoTable::default());
        let output = ctx.run(egui::RawInput::default(), |ctx| draw(ctx, &hud));
        assert!(!output.shapes.is_empty());
    }

    fn shape_count(ctx: &Context, hud: &Hud) -> usize {
        ctx.run(egui::RawInput::default(), |ctx| draw(ctx, hud))
            .shapes
            .len()
    }

    #[test]
    fn info_panel_paints_on_the_frame_it_appears() {
        let ctx = Context::default();
        let mut hud = Hud::new(InfoTable::default());
        let bare = shape_count(&ctx, &hud);

        hud.update_context_info(Some("knife"));
        let with_info = shape_count(&ctx, &hud);
        assert!(with_info > bare);

        hud.update_context_info(None);
        assert_eq!(shape_count(&ctx, &hud), bare);
    }
}
