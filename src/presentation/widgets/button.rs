use serde_json::json;

use crate::{
    core::{
        model::WidgetModel,
        view::{Interaction, UiEvent, ViewBase, WidgetView},
    },
    presentation::element::Element,
};

pub struct ButtonView {
    base: ViewBase,
}

impl ButtonView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        base.set_element(Element::new("button").with_class("btn"));
        Box::new(Self { base })
    }
}

/// Spaces become `&nbsp;` and newlines `<br>`; an empty description keeps a
/// single `&nbsp;` to preserve the button height.
pub fn button_label(description: &str) -> String {
    if description.is_empty() {
        return "&nbsp;".to_string();
    }
    description.replace(' ', "&nbsp;").replace('\n', "<br>\n")
}

impl WidgetView for ButtonView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn refresh(&mut self, model: &WidgetModel) {
        let label = button_label(&super::description_html(model));
        let element = self.base.element_mut();
        element.set_html(&label);
        element.set_flag("disabled", super::is_disabled(model));
        self.base.refresh(model);
    }

    fn handle_event(&mut self, event: &UiEvent, model: &WidgetModel) -> Option<Interaction> {
        match event {
            UiEvent::Click if !super::is_disabled(model) => {
                Some(Interaction::Custom(json!({"event": "click"})))
            }
            _ => None,
        }
    }
}
