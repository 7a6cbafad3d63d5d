//! Heads-up display drawn with egui on top of the point pass.

use crate::stream::ConnectionState;
use egui::{Align2, Color32};

/// What the HUD shows for one frame.
pub struct HudStats<'a> {
    pub state: &'a ConnectionState,
    pub points: usize,
    pub messages: u64,
    /// Times the cloud has been replaced, by stream or file.
    pub generation: u64,
    pub camera_distance: f32,
}

fn state_color(state: &ConnectionState) -> Color32 {
    match state {
        ConnectionState::Connecting | ConnectionState::Open => Color32::YELLOW,
        ConnectionState::Streaming => Color32::GREEN,
        ConnectionState::Closed => Color32::GRAY,
        ConnectionState::Failed(_) => Color32::RED,
    }
}

pub fn draw_hud(ctx: &egui::Context, stats: &HudStats<'_>) {
    egui::Window::new("Stream")
        .anchor(Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .collapsible(true)
        .show(ctx, |ui| {
            ui.colored_label(state_color(stats.state), stats.state.to_string());
            ui.label(format!("points: {}", stats.points));
            ui.label(format!("messages: {}", stats.messages));
            ui.label(format!("updates: {}", stats.generation));
            ui.label(format!("distance: {:.2}", stats.camera_distance));
        });
}
