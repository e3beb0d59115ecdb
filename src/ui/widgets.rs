//! Small composite widgets shared by the editor windows

use imgui::{AngleSlider, Drag, StyleColor, StyleVar, Ui};

const LABEL_COLUMN_WIDTH: f32 = 100.0;

const AXIS_COLORS: [([f32; 4], [f32; 4]); 3] = [
    ([0.8, 0.1, 0.15, 1.0], [0.9, 0.3, 0.2, 1.0]),
    ([0.2, 0.7, 0.2, 1.0], [0.3, 0.8, 0.3, 1.0]),
    ([0.1, 0.25, 0.8, 1.0], [0.2, 0.35, 0.9, 1.0]),
];

/// Options for [`vec3_control`]
#[derive(Debug, Clone, Copy)]
pub struct Vec3Control {
    /// Value restored by the axis buttons
    pub reset: f32,
    pub speed: f32,
    pub min: Option<f32>,
}

impl Default for Vec3Control {
    fn default() -> Self {
        Self {
            reset: 0.0,
            speed: 0.1,
            min: None,
        }
    }
}

/// Labelled row of three drag fields, each preceded by a colored X/Y/Z
/// button that resets that component
///
/// Returns true when any component changed.
pub fn vec3_control(ui: &Ui, label: &str, values: [&mut f32; 3], options: Vec3Control) -> bool {
    let mut changed = false;
    let _id = ui.push_id(label);

    ui.columns(2, "##vec3", false);
    ui.set_column_width(0, LABEL_COLUMN_WIDTH);
    ui.text(label);
    ui.next_column();

    let line_height = ui.current_font_size() + ui.clone_style().frame_padding[1] * 2.0;
    let button_size = [line_height + 3.0, line_height];
    let field_width = ((ui.calc_item_width() - 3.0 * button_size[0]) / 3.0).max(20.0);

    {
        let _spacing = ui.push_style_var(StyleVar::ItemSpacing([0.0, 0.0]));
        for (i, (value, (base, hovered))) in values.into_iter().zip(AXIS_COLORS).enumerate() {
            let axis = ["X", "Y", "Z"][i];
            {
                let _button = ui.push_style_color(StyleColor::Button, base);
                let _hovered = ui.push_style_color(StyleColor::ButtonHovered, hovered);
                let _active = ui.push_style_color(StyleColor::ButtonActive, base);
                if ui.button_with_size(axis, button_size) {
                    *value = options.reset;
                    changed = true;
                }
            }

            ui.same_line();
            let _width = ui.push_item_width(field_width);
            let mut drag = Drag::new(format!("##{axis}")).speed(options.speed);
            if let Some(min) = options.min {
                drag = drag.range(min, f32::MAX);
            }
            changed |= drag.build(ui, value);
            if i < 2 {
                ui.same_line();
            }
        }
    }

    ui.columns(1, "##vec3", false);
    changed
}

/// Slider over an angle stored in radians, displayed in degrees
pub fn angle_slider(ui: &Ui, label: &str, radians: &mut f32, min_degrees: f32, max_degrees: f32) -> bool {
    AngleSlider::new(label)
        .min_degrees(min_degrees)
        .max_degrees(max_degrees)
        .build(ui, radians)
}
