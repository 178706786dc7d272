use crate::{demo::DemoState, frame_loop::FrameTick, markers};

pub fn update(state: &mut DemoState, tick: FrameTick, ui: &mut imgui::Ui) {
    state.scene.early_update();
    state.update(tick.delta);
    state.scene.late_update();

    if state.markers_enabled {
        markers::draw_markers(ui, &state.marker_state());
    }
}
