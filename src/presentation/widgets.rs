//! Built-in widgets
//!
//! Model types carry default attributes; view types render a model into an
//! [`Element`](crate::presentation::element::Element) tree and turn clicks and
//! edits into syncs.

pub mod boolean;
pub mod button;
pub mod container;
pub mod int;

use color_eyre::eyre::Result;
use serde_json::json;

use crate::{
    core::{manager::WidgetManager, model::WidgetModel, view::BaseView},
    domain::attributes::Attributes,
    infrastructure::comm::Comm,
};

fn defaults(value: serde_json::Value) -> Attributes {
    Attributes::from_value(value).unwrap_or_default()
}

pub fn widget_model(comm: Box<dyn Comm>) -> WidgetModel {
    WidgetModel::new("WidgetModel", comm)
}

pub fn button_model(comm: Box<dyn Comm>) -> WidgetModel {
    WidgetModel::new("ButtonWidgetModel", comm)
        .with_defaults(defaults(json!({"description": "", "disabled": false})))
}

pub fn bool_model(comm: Box<dyn Comm>) -> WidgetModel {
    WidgetModel::new("BoolWidgetModel", comm).with_defaults(defaults(
        json!({"value": false, "description": "", "disabled": false}),
    ))
}

pub fn int_model(comm: Box<dyn Comm>) -> WidgetModel {
    WidgetModel::new("IntWidgetModel", comm).with_defaults(defaults(
        json!({"value": 0, "description": "", "disabled": false}),
    ))
}

pub fn bounded_int_model(comm: Box<dyn Comm>) -> WidgetModel {
    WidgetModel::new("BoundedIntWidgetModel", comm).with_defaults(defaults(json!({
        "value": 0,
        "description": "",
        "disabled": false,
        "min": 0,
        "max": 100,
        "step": 1,
        "readout": true
    })))
}

pub fn container_model(comm: Box<dyn Comm>) -> WidgetModel {
    WidgetModel::new("ContainerWidgetModel", comm)
}

pub fn register_defaults(manager: &mut WidgetManager) -> Result<()> {
    manager.register_model_type("WidgetModel", widget_model)?;
    manager.register_model_type("ButtonWidgetModel", button_model)?;
    manager.register_model_type("BoolWidgetModel", bool_model)?;
    manager.register_model_type("IntWidgetModel", int_model)?;
    manager.register_model_type("BoundedIntWidgetModel", bounded_int_model)?;
    manager.register_model_type("ContainerWidgetModel", container_model)?;

    manager.register_view_type("WidgetView", BaseView::create)?;
    manager.register_view_type("ButtonView", button::ButtonView::create)?;
    manager.register_view_type("CheckboxView", boolean::CheckboxView::create)?;
    manager.register_view_type("ToggleButtonView", boolean::ToggleButtonView::create)?;
    manager.register_view_type("IntTextView", int::IntTextView::create)?;
    manager.register_view_type("IntSliderView", int::IntSliderView::create)?;
    manager.register_view_type("ProgressView", int::ProgressView::create)?;
    manager.register_view_type("ContainerView", container::ContainerView::create)?;
    Ok(())
}

/// Description text as markup.
pub(crate) fn description_html(model: &WidgetModel) -> String {
    model
        .attributes()
        .get_str("description")
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn is_disabled(model: &WidgetModel) -> bool {
    model.attributes().get_bool("disabled").unwrap_or(false)
}
