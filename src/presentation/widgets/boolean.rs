use crate::{
    core::{
        model::WidgetModel,
        view::{Interaction, UiEvent, ViewBase, WidgetView},
    },
    domain::attributes::Attributes,
    presentation::element::Element,
};

fn value(model: &WidgetModel) -> bool {
    model.attributes().get_bool("value").unwrap_or(false)
}

fn toggle(model: &WidgetModel) -> Option<Interaction> {
    if super::is_disabled(model) {
        return None;
    }
    Some(Interaction::Sync(
        Attributes::new().with("value", !value(model)),
    ))
}

/// Label plus checkbox.
pub struct CheckboxView {
    base: ViewBase,
}

impl CheckboxView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        base.set_element(
            Element::new("div")
                .with_class("widget-hbox-single")
                .with_child(Element::new("div").with_class("widget-hlabel"))
                .with_child(Element::new("input").with_attr("type", "checkbox")),
        );
        Box::new(Self { base })
    }

    fn render_checked(&mut self, checked: bool) {
        if let Some(input) = self.base.element_mut().child_mut(1) {
            input.set_flag("checked", checked);
        }
    }
}

impl WidgetView for CheckboxView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn refresh(&mut self, model: &WidgetModel) {
        let description = super::description_html(model);
        if let Some(label) = self.base.element_mut().child_mut(0) {
            label.set_html(&description);
            label.set_hidden(description.is_empty());
        }
        if let Some(input) = self.base.element_mut().child_mut(1) {
            input.set_flag("disabled", super::is_disabled(model));
        }
        self.render_checked(value(model));
        self.base.refresh(model);
    }

    fn handle_event(&mut self, event: &UiEvent, model: &WidgetModel) -> Option<Interaction> {
        if *event != UiEvent::Click {
            return None;
        }
        let interaction = toggle(model)?;
        self.render_checked(!value(model));
        Some(interaction)
    }
}

/// Button that shows the value as its `active` state.
pub struct ToggleButtonView {
    base: ViewBase,
}

impl ToggleButtonView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        base.set_element(
            Element::new("div").with_child(Element::new("button").with_class("btn")),
        );
        base.set_style_target("button");
        Box::new(Self { base })
    }

    fn render_active(&mut self, active: bool) {
        if let Some(button) = self.base.element_mut().child_mut(0) {
            button.toggle_class("active", active);
        }
    }
}

impl WidgetView for ToggleButtonView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn refresh(&mut self, model: &WidgetModel) {
        let description = super::description_html(model);
        if let Some(button) = self.base.element_mut().child_mut(0) {
            button.set_html(&description);
            button.set_flag("disabled", super::is_disabled(model));
        }
        self.render_active(value(model));
        self.base.refresh(model);
    }

    fn handle_event(&mut self, event: &UiEvent, model: &WidgetModel) -> Option<Interaction> {
        if *event != UiEvent::Click {
            return None;
        }
        let interaction = toggle(model)?;
        self.render_active(!value(model));
        Some(interaction)
    }
}
