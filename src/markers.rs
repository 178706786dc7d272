use std::fmt;

use imgui::Condition;

use crate::animation::TriggerRange;

const TRACK_MARGIN: f32 = 24.0;
const START_COLOR: [f32; 4] = [0.1, 0.7, 0.2, 1.0];
const END_COLOR: [f32; 4] = [0.85, 0.15, 0.15, 1.0];
const TRACK_COLOR: [f32; 4] = [0.3, 0.3, 0.3, 0.8];
const TICK_COLOR: [f32; 4] = [0.2, 0.4, 0.9, 1.0];
const RAW_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];
const SMOOTHED_COLOR: [f32; 4] = [0.95, 0.55, 0.1, 1.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadStatus {
    Loading { reported: usize, total: usize },
    Ready,
    Static { failed: usize },
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStatus::Loading { reported, total } => {
                write!(f, "loading ({}/{})", reported, total)
            }
            LoadStatus::Ready => write!(f, "ready"),
            LoadStatus::Static { failed: 0 } => write!(f, "static"),
            LoadStatus::Static { failed } => write!(f, "static, {} failed", failed),
        }
    }
}

/// Snapshot of the scroll binding for the overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerState {
    pub scroll_offset: f32,
    pub max_offset: f32,
    pub range: TriggerRange,
    pub raw_progress: f32,
    pub progress: f32,
    pub section: Option<usize>,
    /// Progress at which each section starts.
    pub boundaries: Vec<f32>,
    pub load_status: LoadStatus,
}

impl MarkerState {
    /// Maps a scroll offset onto the track, 0 at the top and 1 at the bottom.
    pub fn track_position(&self, scroll_offset: f32) -> f32 {
        if self.max_offset <= 0.0 {
            return 0.0;
        }

        (scroll_offset / self.max_offset).clamp(0.0, 1.0)
    }

    pub fn section_offsets(&self) -> impl Iterator<Item = f32> + '_ {
        self.boundaries
            .iter()
            .map(|&boundary| self.range.offset_at(boundary))
    }
}

pub fn draw_markers(ui: &imgui::Ui, state: &MarkerState) {
    ui.window("Scroll")
        .position([16.0, 16.0], Condition::FirstUseEver)
        .size([240.0, 170.0], Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("offset    {:.0} / {:.0}", state.scroll_offset, state.max_offset));
            ui.text(format!("start     {:.0}", state.range.start));
            ui.text(format!("end       {:.0}", state.range.end));
            ui.text(format!("progress  {:.3}", state.raw_progress));
            ui.text(format!("smoothed  {:.3}", state.progress));
            match state.section {
                Some(section) => ui.text(format!("section   {}", section)),
                None => ui.text("section   -"),
            }
            ui.text(format!("models    {}", state.load_status));
        });

    let [width, height] = ui.io().display_size;
    let x = width - TRACK_MARGIN;
    let top = TRACK_MARGIN;
    let length = (height - 2.0 * TRACK_MARGIN).max(0.0);
    let y_at = |offset: f32| top + state.track_position(offset) * length;

    let draw_list = ui.get_foreground_draw_list();

    draw_list
        .add_line([x, top], [x, top + length], TRACK_COLOR)
        .thickness(2.0)
        .build();

    for offset in state.section_offsets() {
        let y = y_at(offset);
        draw_list
            .add_line([x - 6.0, y], [x + 6.0, y], TICK_COLOR)
            .thickness(2.0)
            .build();
    }

    for (offset, color, label) in [
        (state.range.start, START_COLOR, "start"),
        (state.range.end, END_COLOR, "end"),
    ] {
        let y = y_at(offset);
        draw_list
            .add_line([x - 10.0, y], [x + 10.0, y], color)
            .thickness(2.0)
            .build();
        draw_list.add_text([x - 48.0, y - 7.0], color, label);
    }

    let raw_y = y_at(state.range.offset_at(state.raw_progress));
    draw_list
        .add_circle([x, raw_y], 6.0, RAW_COLOR)
        .thickness(2.0)
        .build();

    let smoothed_y = y_at(state.range.offset_at(state.progress));
    draw_list
        .add_circle([x, smoothed_y], 4.0, SMOOTHED_COLOR)
        .filled(true)
        .build();
}
