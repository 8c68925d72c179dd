use crate::{
    core::{
        model::WidgetModel,
        view::{Interaction, UiEvent, ViewBase, WidgetView},
    },
    domain::attributes::Attributes,
    presentation::element::Element,
};

fn value(model: &WidgetModel) -> i64 {
    model.attributes().get_i64("value").unwrap_or(0)
}

/// Clamps into `[min, max]` when the model is bounded.
pub fn clamp_value(model: &WidgetModel, value: i64) -> i64 {
    let attrs = model.attributes();
    let value = attrs.get_i64("max").map_or(value, |max| value.min(max));
    attrs.get_i64("min").map_or(value, |min| value.max(min))
}

/// Syncs `candidate` unless the widget is disabled or the value is unchanged.
fn propose(model: &WidgetModel, candidate: i64) -> Option<Interaction> {
    if super::is_disabled(model) {
        return None;
    }
    let candidate = clamp_value(model, candidate);
    (candidate != value(model))
        .then(|| Interaction::Sync(Attributes::new().with("value", candidate)))
}

fn labeled(control: Element) -> Element {
    Element::new("div")
        .with_class("widget-hbox-single")
        .with_child(Element::new("div").with_class("widget-hlabel"))
        .with_child(control)
}

fn render_label(base: &mut ViewBase, model: &WidgetModel) {
    let description = super::description_html(model);
    if let Some(label) = base.element_mut().child_mut(0) {
        label.set_html(&description);
        label.set_hidden(description.is_empty());
    }
}

/// Numeric text box.
pub struct IntTextView {
    base: ViewBase,
}

impl IntTextView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        base.set_element(labeled(
            Element::new("input")
                .with_class("widget-numeric-text")
                .with_attr("type", "text"),
        ));
        base.set_style_target("input");
        Box::new(Self { base })
    }

    fn render_value(&mut self, value: i64) {
        if let Some(input) = self.base.element_mut().child_mut(1) {
            input.set_attr("value", &value.to_string());
        }
    }
}

impl WidgetView for IntTextView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn refresh(&mut self, model: &WidgetModel) {
        render_label(&mut self.base, model);
        if let Some(input) = self.base.element_mut().child_mut(1) {
            input.set_flag("disabled", super::is_disabled(model));
        }
        self.render_value(value(model));
        self.base.refresh(model);
    }

    fn handle_event(&mut self, event: &UiEvent, model: &WidgetModel) -> Option<Interaction> {
        let UiEvent::Input { value: text } = event else {
            return None;
        };
        if super::is_disabled(model) {
            return None;
        }
        // Partial input such as "-" is left in the box without syncing.
        let parsed = text.trim().parse::<i64>().ok()?;
        let interaction = propose(model, parsed);
        self.render_value(clamp_value(model, parsed));
        interaction
    }
}

/// Slider with an optional readout of the current value.
pub struct IntSliderView {
    base: ViewBase,
}

impl IntSliderView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        let mut element = labeled(Element::new("div").with_class("slider"));
        element = element.with_child(Element::new("div").with_class("widget-readout"));
        base.set_element(element);
        base.set_style_target(".slider");
        Box::new(Self { base })
    }

    fn render_value(&mut self, value: i64) {
        let element = self.base.element_mut();
        if let Some(slider) = element.child_mut(1) {
            slider.set_attr("value", &value.to_string());
        }
        if let Some(readout) = element.child_mut(2) {
            readout.set_html(&value.to_string());
        }
    }
}

impl WidgetView for IntSliderView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn refresh(&mut self, model: &WidgetModel) {
        render_label(&mut self.base, model);
        let attrs = model.attributes();
        let readout = attrs.get_bool("readout").unwrap_or(true);
        let orientation = attrs.get_str("orientation").unwrap_or("horizontal").to_string();
        let element = self.base.element_mut();
        if let Some(slider) = element.child_mut(1) {
            for key in ["min", "max", "step"] {
                match attrs.get_i64(key) {
                    Some(bound) => slider.set_attr(key, &bound.to_string()),
                    None => slider.remove_attr(key),
                }
            }
            slider.set_attr("orientation", &orientation);
            slider.set_flag("disabled", super::is_disabled(model));
        }
        if let Some(readout_el) = element.child_mut(2) {
            readout_el.set_hidden(!readout);
        }
        self.render_value(value(model));
        self.base.refresh(model);
    }

    fn handle_event(&mut self, event: &UiEvent, model: &WidgetModel) -> Option<Interaction> {
        let UiEvent::Slide { value: position } = event else {
            return None;
        };
        if super::is_disabled(model) {
            return None;
        }
        let interaction = propose(model, *position);
        self.render_value(clamp_value(model, *position));
        interaction
    }
}

/// Position of the value between `min` and `max`, in percent.
pub fn progress_percent(model: &WidgetModel) -> f64 {
    let attrs = model.attributes();
    let min = attrs.get_i64("min").unwrap_or(0);
    let max = attrs.get_i64("max").unwrap_or(100);
    if max <= min {
        return 0.0;
    }
    let value = value(model).clamp(min, max);
    (value as f64 - min as f64) * 100.0 / (max as f64 - min as f64)
}

/// Read-only progress bar.
pub struct ProgressView {
    base: ViewBase,
}

impl ProgressView {
    pub fn create(mut base: ViewBase) -> Box<dyn WidgetView> {
        base.set_element(labeled(
            Element::new("div")
                .with_class("progress")
                .with_child(Element::new("div").with_class("progress-bar")),
        ));
        base.set_style_target(".progress");
        Box::new(Self { base })
    }
}

impl WidgetView for ProgressView {
    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn refresh(&mut self, model: &WidgetModel) {
        render_label(&mut self.base, model);
        let width = format!("{}%", progress_percent(model));
        if let Some(bar) = self
            .base
            .element_mut()
            .child_mut(1)
            .and_then(|progress| progress.child_mut(0))
        {
            bar.set_style("width", &width);
        }
        self.base.refresh(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::channel_comm;
    use crate::{core::msg::CommId, core::msg::GroupKey, presentation::widgets::bounded_int_model};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn bounded() -> WidgetModel {
        let (comm, _rx) = channel_comm("c1");
        bounded_int_model(comm)
    }

    #[rstest]
    #[case(50, 50)]
    #[case(-5, 0)]
    #[case(150, 100)]
    fn test_clamp_value(#[case] input: i64, #[case] expected: i64) {
        assert_eq!(clamp_value(&bounded(), input), expected);
    }

    #[test]
    fn test_int_text_ignores_unparsable_input() {
        let model = bounded();
        let mut view = IntTextView::create(ViewBase::new(CommId::from("c1"), GroupKey::Cell(0)));
        let event = UiEvent::Input {
            value: "12a".to_string(),
        };
        assert_eq!(view.handle_event(&event, &model), None);

        let event = UiEvent::Input {
            value: " 42 ".to_string(),
        };
        assert_eq!(
            view.handle_event(&event, &model),
            Some(Interaction::Sync(Attributes::new().with("value", 42)))
        );
        assert_eq!(view.base().element().find("input").unwrap().attr("value"), Some("42"));
    }

    fn disabled_bounded() -> WidgetModel {
        let mut model = bounded();
        model
            .apply_remote_update(Attributes::new().with("disabled", true).with("value", 7))
            .unwrap();
        model
    }

    #[test]
    fn test_disabled_slider_keeps_model_value() {
        let model = disabled_bounded();
        let mut view = IntSliderView::create(ViewBase::new(CommId::from("c1"), GroupKey::Cell(0)));
        view.refresh(&model);

        assert_eq!(view.handle_event(&UiEvent::Slide { value: 50 }, &model), None);
        let html = view.base().element().to_html();
        assert!(html.contains("value=\"7\""), "{html}");
        assert!(html.contains("<div class=\"widget-readout\">7</div>"), "{html}");
        assert!(!html.contains("50"), "{html}");
    }

    #[test]
    fn test_disabled_int_text_keeps_model_value() {
        let model = disabled_bounded();
        let mut view = IntTextView::create(ViewBase::new(CommId::from("c1"), GroupKey::Cell(0)));
        view.refresh(&model);

        let event = UiEvent::Input {
            value: "42".to_string(),
        };
        assert_eq!(view.handle_event(&event, &model), None);
        assert_eq!(view.base().element().find("input").unwrap().attr("value"), Some("7"));
    }

    #[rstest]
    #[case(0, 100, 0, 0.0)]
    #[case(0, 100, 100, 100.0)]
    #[case(0, 100, 25, 25.0)]
    #[case(10, 20, 15, 50.0)]
    #[case(0, 100, 500, 100.0)]
    #[case(5, 5, 5, 0.0)]
    #[case(i64::MIN, i64::MAX, i64::MIN, 0.0)]
    fn test_progress_percent(
        #[case] min: i64,
        #[case] max: i64,
        #[case] value: i64,
        #[case] expected: f64,
    ) {
        let mut model = bounded();
        model.set(&Attributes::new().with("min", min).with("max", max).with("value", value));
        assert_eq!(progress_percent(&model), expected);
    }

    #[test]
    fn test_progress_view_sets_bar_width() {
        let mut model = bounded();
        model.set(&Attributes::new().with("value", 40));
        let mut view = ProgressView::create(ViewBase::new(CommId::from("c1"), GroupKey::Cell(0)));
        view.refresh(&model);

        let bar = view.base().element().find(".progress-bar").unwrap();
        assert_eq!(bar.style("width"), Some("40%"));
        assert_eq!(view.handle_event(&UiEvent::Click, &model), None);
    }

    #[test]
    fn test_slider_same_value_does_not_sync() {
        let model = bounded();
        let mut view = IntSliderView::create(ViewBase::new(CommId::from("c1"), GroupKey::Cell(0)));
        assert_eq!(view.handle_event(&UiEvent::Slide { value: -3 }, &model), None);
        assert_eq!(
            view.handle_event(&UiEvent::Slide { value: 300 }, &model),
            Some(Interaction::Sync(Attributes::new().with("value", 100)))
        );
    }
}
