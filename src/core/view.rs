//! Widget views and the base refresh behavior shared by all of them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    core::{
        model::WidgetModel,
        msg::{CommId, GroupKey, ViewId},
    },
    domain::attributes::{css_value, Attributes},
    presentation::element::Element,
};

/// User interaction delivered to a view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    Click,
    Input { value: String },
    Slide { value: i64 },
}

/// What a view asks of its model after handling a [`UiEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum Interaction {
    /// Set these attributes locally and sync them as a patch.
    Sync(Attributes),
    /// Send an application-level message to the backend.
    Custom(Value),
}

/// State every view carries: the model it observes, its group, visibility
/// cache and presentation element.
#[derive(Clone, Debug)]
pub struct ViewBase {
    model: CommId,
    group: GroupKey,
    visible: bool,
    visibility_changes: usize,
    element: Element,
    style_target: Option<String>,
}

impl ViewBase {
    pub fn new(model: CommId, group: GroupKey) -> Self {
        Self {
            model,
            group,
            visible: true,
            visibility_changes: 0,
            element: Element::new("div"),
            style_target: None,
        }
    }

    pub fn model(&self) -> &CommId {
        &self.model
    }

    pub fn group(&self) -> GroupKey {
        self.group
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of show/hide toggles applied to the element so far.
    pub fn visibility_changes(&self) -> usize {
        self.visibility_changes
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    pub fn set_element(&mut self, element: Element) {
        self.element = element;
    }

    /// Nominates the descendant that receives empty-selector styles.
    pub fn set_style_target(&mut self, selector: &str) {
        self.style_target = Some(selector.to_string());
    }

    /// Applies visibility and style overrides from the model.
    pub fn refresh(&mut self, model: &WidgetModel) {
        if let Some(visible) = model.attributes().get_bool("visible") {
            if visible != self.visible {
                self.visible = visible;
                self.element.set_hidden(!visible);
                self.visibility_changes += 1;
            }
        }

        for (selector, properties) in model.css().iter() {
            let mut apply = |el: &mut Element| {
                for (property, value) in properties {
                    el.set_style(property, &css_value(value));
                }
            };
            if !selector.is_empty() {
                self.element.for_each_match(selector, &mut apply);
            } else if let Some(target) = &self.style_target {
                self.element.for_each_match(target, &mut apply);
            } else {
                apply(&mut self.element);
            }
        }
    }
}

/// Host for child views; the child-display capability of composite widgets.
pub trait ChildHost {
    fn display_child(&mut self, child: ViewId);
    fn remove_child(&mut self, child: ViewId);
}

pub trait WidgetView {
    fn base(&self) -> &ViewBase;
    fn base_mut(&mut self) -> &mut ViewBase;

    /// Re-renders from the model. Overrides must keep the base behavior by
    /// calling `self.base_mut().refresh(model)`.
    fn refresh(&mut self, model: &WidgetModel) {
        self.base_mut().refresh(model);
    }

    fn handle_event(&mut self, _event: &UiEvent, _model: &WidgetModel) -> Option<Interaction> {
        None
    }

    fn as_container(&mut self) -> Option<&mut dyn ChildHost> {
        None
    }

    fn children(&self) -> &[ViewId] {
        &[]
    }
}

/// Plain view with only the base behavior.
pub struct BaseView {
    base: ViewBase,
}

impl BaseView {
    pub fn create(base: ViewBase) -> Box<dyn WidgetView> {
        Box::new(Self { base })
    }
}

impl WidgetView for BaseView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }
}
