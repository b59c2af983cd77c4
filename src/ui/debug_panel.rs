//! Parameter debug panel
//!
//! One control per registered parameter, in definition order. Edits are
//! collected while the window is built and pushed through
//! [`ParamRegistry::update`] afterwards.

use log::debug;

use crate::{
    gfx::color::Color,
    params::{ParamRegistry, ParamValue, ParamView, Parameter},
};

/// Widget used for a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    Slider { min: f32, max: f32 },
    Drag { speed: f32 },
    Checkbox,
    Color,
    Text,
}

/// Picks a control from the parameter's value type and presentation hints
pub fn control_for(param: &Parameter) -> Control {
    let view = param.options.view;
    match &param.value {
        ParamValue::Bool(_) => Control::Checkbox,
        ParamValue::Text(_) => match view {
            Some(ParamView::Color) => Control::Color,
            _ => Control::Text,
        },
        ParamValue::Number(_) => match (param.options.min, param.options.max, view) {
            (_, _, Some(ParamView::Drag)) => Control::Drag {
                speed: param.options.step.unwrap_or(0.01),
            },
            (Some(min), Some(max), _) => Control::Slider { min, max },
            _ => Control::Drag {
                speed: param.options.step.unwrap_or(0.01),
            },
        },
    }
}

/// Draws `param` with `control` and returns the new value if it was edited
pub fn edit_parameter(ui: &imgui::Ui, param: &Parameter, control: Control) -> Option<ParamValue> {
    let label = param.label();
    match (control, &param.value) {
        (Control::Checkbox, ParamValue::Bool(current)) => {
            let mut value = *current;
            ui.checkbox(label, &mut value).then_some(ParamValue::Bool(value))
        }
        (Control::Slider { min, max }, ParamValue::Number(current)) => {
            let mut value = *current;
            ui.slider_config(label, min, max)
                .display_format("%.3f")
                .build(&mut value)
                .then_some(ParamValue::Number(value))
        }
        (Control::Drag { speed }, ParamValue::Number(current)) => {
            let mut value = *current;
            imgui::Drag::new(label)
                .speed(speed)
                .build(ui, &mut value)
                .then_some(ParamValue::Number(value))
        }
        (Control::Color, ParamValue::Text(current)) => {
            let mut rgb = current.parse::<Color>().unwrap_or_default().to_array();
            ui.color_edit3(label, &mut rgb)
                .then(|| ParamValue::Text(Color::from_array(rgb).to_css()))
        }
        (Control::Text, ParamValue::Text(current)) => {
            let mut value = current.clone();
            ui.input_text(label, &mut value)
                .enter_returns_true(true)
                .build()
                .then_some(ParamValue::Text(value))
        }
        _ => {
            ui.text(format!("{}: {}", label, param.value));
            None
        }
    }
}

enum PanelAction {
    Update(String, ParamValue),
    ResetAll,
}

/// Draws the debug window and applies any edits to `registry`
pub fn debug_panel(ui: &imgui::Ui, registry: &mut ParamRegistry) {
    let mut actions = Vec::new();

    ui.window("Parameters")
        .size([360.0, 420.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            if registry.is_empty() {
                ui.text_disabled("No parameters defined");
                return;
            }
            for param in registry.parameters() {
                let _id = ui.push_id(param.name.as_str());
                if let Some(value) = edit_parameter(ui, param, control_for(param)) {
                    actions.push(PanelAction::Update(param.name.clone(), value));
                }
            }
            ui.separator();
            if ui.button("Reset all") {
                actions.push(PanelAction::ResetAll);
            }
        });

    for action in actions {
        match action {
            PanelAction::Update(name, value) => {
                if let Err(e) = registry.update(&name, value) {
                    debug!("Debug panel edit dropped: {}", e);
                }
            }
            PanelAction::ResetAll => {
                debug!("Resetting every parameter");
                registry.reset_all();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamOptions;

    fn param(value: impl Into<ParamValue>, options: ParamOptions) -> Parameter {
        let value = value.into();
        Parameter {
            name: "p".into(),
            value: value.clone(),
            default: value,
            options,
        }
    }

    #[test]
    fn bounded_numbers_get_sliders() {
        let p = param(0.5, ParamOptions::range(0.0, 1.0, 0.01));
        assert_eq!(control_for(&p), Control::Slider { min: 0.0, max: 1.0 });
    }

    #[test]
    fn unbounded_numbers_drag_by_step() {
        let p = param(
            2.0,
            ParamOptions {
                step: Some(0.5),
                ..Default::default()
            },
        );
        assert_eq!(control_for(&p), Control::Drag { speed: 0.5 });

        let forced = param(
            0.5,
            ParamOptions::range(0.0, 1.0, 0.1).with_view(ParamView::Drag),
        );
        assert_eq!(control_for(&forced), Control::Drag { speed: 0.1 });
    }

    #[test]
    fn strings_and_bools() {
        let color = param("#ff0000", ParamOptions::default().with_view(ParamView::Color));
        assert_eq!(control_for(&color), Control::Color);
        assert_eq!(control_for(&param("label", ParamOptions::default())), Control::Text);
        assert_eq!(control_for(&param(true, ParamOptions::default())), Control::Checkbox);
    }
}
