//! Material editor for the customizable parts of the shoe
//!
//! Every control writes through the registry, so the panel never touches
//! materials directly.

use log::debug;

use crate::{
    gfx::color::Color,
    params::{ParamRegistry, ParamValue},
    showroom::{param_name, Showroom, DEFAULT_FOCUS_DURATION, OVERVIEW},
};

/// Display label for an element name
pub fn format_element_name(name: &str) -> String {
    match name {
        "shoelace" => "Laces".to_string(),
        _ => {
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Update(String, ParamValue),
    Reset(String),
    Focus(String),
}

pub struct CustomizationPanel {
    pub focus_duration: f32,
    /// Element the camera was last sent to, highlighted in the navigation list
    focused: Option<String>,
}

impl Default for CustomizationPanel {
    fn default() -> Self {
        Self {
            focus_duration: DEFAULT_FOCUS_DURATION,
            focused: None,
        }
    }
}

impl CustomizationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    /// Draws the panel, then applies whatever the user changed
    pub fn draw(&mut self, ui: &imgui::Ui, showroom: &mut Showroom, registry: &mut ParamRegistry) {
        let actions = self.build(ui, showroom, registry);
        self.apply(actions, showroom, registry);
    }

    fn build(&self, ui: &imgui::Ui, showroom: &Showroom, registry: &ParamRegistry) -> Vec<PanelAction> {
        let mut actions = Vec::new();
        let display_size = ui.io().display_size;
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return actions;
        }
        let width = (display_size[0] * 0.25).clamp(280.0, 420.0);

        ui.window("Customize")
            .size([width, 0.0], imgui::Condition::FirstUseEver)
            .position(
                [display_size[0] - width - 20.0, 20.0],
                imgui::Condition::FirstUseEver,
            )
            .always_auto_resize(true)
            .collapsible(true)
            .build(|| {
                if !showroom.is_ready() {
                    ui.text_disabled("Loading model...");
                    return;
                }

                for element in showroom.customizable_elements() {
                    let _id = ui.push_id(element.as_str());
                    if !ui.collapsing_header(
                        format_element_name(&element),
                        imgui::TreeNodeFlags::DEFAULT_OPEN,
                    ) {
                        continue;
                    }
                    element_controls(ui, &element, registry, &mut actions);
                    if ui.button("Reset") {
                        actions.push(PanelAction::Reset(element.clone()));
                    }
                    ui.spacing();
                }

                if ui.collapsing_header("Camera", imgui::TreeNodeFlags::DEFAULT_OPEN) {
                    for (name, _) in showroom.camera_targets() {
                        let label = format!("Focus {}", format_element_name(name));
                        if ui.button(label) {
                            actions.push(PanelAction::Focus(name.clone()));
                        }
                    }
                    if ui.button("Overview") {
                        actions.push(PanelAction::Focus(OVERVIEW.to_string()));
                    }
                    if let Some(focused) = &self.focused {
                        ui.text_disabled(format!("Looking at {}", format_element_name(focused)));
                    }
                }
            });

        actions
    }

    /// Applies panel actions; also usable without a UI frame
    pub fn apply(
        &mut self,
        actions: Vec<PanelAction>,
        showroom: &mut Showroom,
        registry: &mut ParamRegistry,
    ) {
        for action in actions {
            match action {
                PanelAction::Update(name, value) => {
                    if let Err(e) = registry.update(&name, value) {
                        debug!("Customization edit dropped: {}", e);
                    }
                }
                PanelAction::Reset(element) => showroom.reset_element(&element, registry),
                PanelAction::Focus(target) => {
                    if showroom.focus_on_element(&target, self.focus_duration) {
                        self.focused = Some(target);
                    }
                }
            }
        }
    }
}

fn element_controls(
    ui: &imgui::Ui,
    element: &str,
    registry: &ParamRegistry,
    actions: &mut Vec<PanelAction>,
) {
    let color = param_name(element, "color");
    if let Some(current) = registry.get(&color).and_then(ParamValue::as_str) {
        let mut rgb = current.parse::<Color>().unwrap_or_default().to_array();
        if ui.color_edit3("Color", &mut rgb) {
            actions.push(PanelAction::Update(
                color,
                ParamValue::Text(Color::from_array(rgb).to_css()),
            ));
        }
    }

    for (property, label) in [("metalness", "Metalness"), ("roughness", "Roughness")] {
        let name = param_name(element, property);
        let Some(mut value) = registry.get(&name).and_then(ParamValue::as_f32) else {
            continue;
        };
        if ui
            .slider_config(label, 0.0, 1.0)
            .display_format("%.2f")
            .build(&mut value)
        {
            actions.push(PanelAction::Update(name, ParamValue::Number(value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_names_are_formatted() {
        assert_eq!(format_element_name("shoe"), "Shoe");
        assert_eq!(format_element_name("shoelace"), "Laces");
        assert_eq!(format_element_name("sole"), "Sole");
        assert_eq!(format_element_name(""), "");
    }

    #[test]
    fn actions_without_a_model_change_nothing() {
        let mut panel = CustomizationPanel::new();
        let mut showroom = Showroom::new(Default::default());
        let mut registry = ParamRegistry::new();

        panel.apply(
            vec![
                PanelAction::Update("shoe.color".into(), ParamValue::from("#000000")),
                PanelAction::Reset("shoe".into()),
                PanelAction::Focus("shoe".into()),
            ],
            &mut showroom,
            &mut registry,
        );

        assert!(registry.is_empty());
        assert_eq!(panel.focused(), None);
        assert!(!showroom.is_animating());
    }
}
