use crate::core::{ControlPanelState, ControlValue};
use crate::math::Color;

/// Numbers shown in the overlay's corner readout
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub fps: f32,
    pub ticks: u64,
    pub picked: usize,
    pub pending_loads: usize,
}

/// Draws the FPS readout and one widget per control.
///
/// Edits are collected while the widgets are borrowed and written back
/// through [`ControlPanelState::set`] afterwards, so they get the same
/// clamping and pending tracking as any other write.
pub fn draw_panel(ctx: &egui::Context, panel: &mut ControlPanelState, stats: &FrameStats) {
    egui::Window::new("FPS")
        .title_bar(false)
        .resizable(false)
        .fixed_pos(egui::pos2(10.0, 10.0))
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!("{:.0}", stats.fps))
                    .size(48.0)
                    .color(egui::Color32::from_rgb(74, 158, 255)),
            );
            ui.label(
                egui::RichText::new(format!("FPS  tick {}  picked {}", stats.ticks, stats.picked))
                    .size(12.0)
                    .color(egui::Color32::GRAY),
            );
            if stats.pending_loads > 0 {
                ui.label(
                    egui::RichText::new(format!("loading {} asset(s)", stats.pending_loads))
                        .size(12.0)
                        .color(egui::Color32::GRAY),
                );
            }
        });

    if panel.is_empty() {
        return;
    }

    let mut edits: Vec<(String, ControlValue)> = Vec::new();
    egui::Window::new("Controls")
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            for control in panel.controls() {
                match control.value {
                    ControlValue::Number(mut value) => {
                        let mut slider = egui::Slider::new(&mut value, control.min..=control.max).text(control.name.as_str());
                        if let Some(step) = control.step {
                            slider = slider.step_by(step as f64);
                        }
                        if ui.add(slider).changed() {
                            edits.push((control.name.clone(), ControlValue::Number(value)));
                        }
                    }
                    ControlValue::Toggle(mut value) => {
                        if ui.checkbox(&mut value, control.name.as_str()).changed() {
                            edits.push((control.name.clone(), ControlValue::Toggle(value)));
                        }
                    }
                    ControlValue::Color(color) => {
                        let mut rgb = color.to_array();
                        ui.horizontal(|ui| {
                            if ui.color_edit_button_rgb(&mut rgb).changed() {
                                edits.push((control.name.clone(), ControlValue::Color(Color::from_array(rgb))));
                            }
                            ui.label(control.name.as_str());
                        });
                    }
                }
            }
        });

    for (name, value) in edits {
        if let Err(err) = panel.set(&name, value) {
            log::warn!("Panel edit rejected: {}", err);
        }
    }
}
