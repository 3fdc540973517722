use crate::controls::{ControlEvent, ControlId};
use crate::scene::Lights;
use imgui::{Condition, Ui};

const INPUT_WIDTH: f32 = 70.0;

/// Slider range for a numeric control. Typed values may fall outside it.
pub fn slider_range(id: ControlId) -> (f32, f32) {
    match id {
        ControlId::AmbientIntensity | ControlId::DirectionalIntensity | ControlId::PointIntensity => {
            (0.0, 2.0)
        }
        _ => (-10.0, 10.0),
    }
}

/// The control panel: the point light toggle and, per numeric control, a
/// slider next to a text field.
///
/// The panel never writes to the lights. It only reports what the user did,
/// so the caller decides how input is applied.
#[derive(Debug, Default)]
pub struct LightPanel {
    texts: [String; ControlId::NUMERIC.len()],
    /// The text field being typed into; its buffer is left alone.
    editing: Option<ControlId>,
}

impl LightPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, ui: &Ui, lights: &Lights) -> Vec<ControlEvent> {
        let mut events = Vec::new();
        ui.window("Lights")
            .position([10.0, 10.0], Condition::FirstUseEver)
            .always_auto_resize(true)
            .build(|| {
                let label = if lights.point.visible {
                    "Hide point light"
                } else {
                    "Show point light"
                };
                if ui.button(label) {
                    events.push(ControlEvent::Click(ControlId::TogglePointLight));
                }

                let mut editing = None;
                for (id, text) in ControlId::NUMERIC.into_iter().zip(self.texts.iter_mut()) {
                    let Some(mut value) = id.value(lights) else {
                        continue;
                    };
                    let _id = ui.push_id(id.element_id());

                    let (min, max) = slider_range(id);
                    if ui.slider(id.element_id(), min, max, &mut value) {
                        events.push(ControlEvent::Slider { id, value });
                    }

                    if self.editing != Some(id) {
                        *text = value.to_string();
                    }
                    ui.same_line();
                    ui.set_next_item_width(INPUT_WIDTH);
                    if ui.input_text("##text", text).enter_returns_true(true).build() {
                        events.push(ControlEvent::Text {
                            id,
                            text: text.clone(),
                        });
                    }
                    if ui.is_item_active() {
                        editing = Some(id);
                    }
                }
                self.editing = editing;
            });
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensities_and_positions_have_separate_ranges() {
        assert_eq!(slider_range(ControlId::PointIntensity), (0.0, 2.0));
        assert_eq!(slider_range(ControlId::DirectionalY), (-10.0, 10.0));
    }

    #[test]
    fn idle_panel_reports_nothing() {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);
        imgui.io_mut().display_size = [800.0, 800.0];
        imgui.fonts().build_rgba32_texture();

        let mut panel = LightPanel::new();
        let lights = Lights::default();
        for _ in 0..2 {
            let ui = imgui.new_frame();
            assert!(panel.draw(ui, &lights).is_empty());
            imgui.render();
        }
        assert_eq!(panel.texts[0], lights.ambient.intensity.to_string());
    }
}
