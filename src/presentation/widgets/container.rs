use crate::{
    core::{
        msg::ViewId,
        view::{ChildHost, ViewBase, WidgetView},
    },
    presentation::element::Element,
};

/// Composite widget that hosts child views in display order.
pub struct ContainerView {
    base: ViewBase,
    children: Vec<ViewId>,
}

impl ContainerView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        base.set_element(Element::new("div").with_class("widget-container"));
        Box::new(Self {
            base,
            children: Vec::new(),
        })
    }
}

impl ChildHost for ContainerView {
    fn display_child(&mut self, child: ViewId) {
        self.children.push(child);
    }

    fn remove_child(&mut self, child: ViewId) {
        self.children.retain(|c| *c != child);
    }
}

impl WidgetView for ContainerView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn as_container(&mut self) -> Option<&mut dyn ChildHost> {
        Some(self)
    }

    fn children(&self) -> &[ViewId] {
        &self.children
    }
}
