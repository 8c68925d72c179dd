//! DOM-like presentation tree owned by each view.

use std::collections::BTreeMap;

const VOID_TAGS: &[&str] = &["input", "br", "img"];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    html: String,
    hidden: bool,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn toggle_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.remove(name);
    }

    /// Sets or removes a boolean attribute such as `checked`.
    pub fn set_flag(&mut self, name: &str, on: bool) {
        if on {
            self.set_attr(name, name);
        } else {
            self.remove_attr(name);
        }
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, property: &str, value: &str) {
        self.styles.insert(property.to_string(), value.to_string());
    }

    /// Inner markup rendered before any children.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn set_html(&mut self, html: &str) {
        self.html = html.to_string();
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.children.get_mut(index)
    }

    /// First descendant matching `selector`.
    pub fn find(&self, selector: &str) -> Option<&Element> {
        let selector = Selector::parse(selector);
        self.children.iter().find_map(|c| c.find_matching(&selector))
    }

    fn find_matching(&self, selector: &Selector) -> Option<&Element> {
        if selector.matches(self) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_matching(selector))
    }

    /// Visits every descendant (not `self`) matching `selector`. Returns the
    /// number of matches.
    pub fn for_each_match(&mut self, selector: &str, f: &mut dyn FnMut(&mut Element)) -> usize {
        let selector = Selector::parse(selector);
        self.children
            .iter_mut()
            .map(|c| c.visit_matching(&selector, f))
            .sum()
    }

    fn visit_matching(&mut self, selector: &Selector, f: &mut dyn FnMut(&mut Element)) -> usize {
        let mut count = 0;
        if selector.matches(self) {
            f(self);
            count += 1;
        }
        for child in self.children.iter_mut() {
            count += child.visit_matching(selector, f);
        }
        count
    }

    pub fn to_html(&self) -> String {
        self.to_html_with("")
    }

    /// Serializes the element with `extra` markup appended after its own
    /// children, used for views hosting child views.
    pub fn to_html_with(&self, extra: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("<{}", self.tag));
        if !self.classes.is_empty() {
            out.push_str(&format!(" class=\"{}\"", self.classes.join(" ")));
        }
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        let mut styles: Vec<String> = self.styles.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        if self.hidden {
            styles.push("display: none".to_string());
        }
        if !styles.is_empty() {
            out.push_str(&format!(" style=\"{}\"", styles.join("; ")));
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return out;
        }
        out.push_str(&self.html);
        for child in &self.children {
            out.push_str(&child.to_html());
        }
        out.push_str(extra);
        out.push_str(&format!("</{}>", self.tag));
        out
    }
}

/// Compound selector: optional tag followed by any number of `.class` parts.
#[derive(Debug, Default, PartialEq, Eq)]
struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    fn parse(selector: &str) -> Self {
        let mut parts = selector.trim().split('.');
        let tag = parts
            .next()
            .filter(|t| !t.is_empty() && *t != "*")
            .map(str::to_string);
        let classes = parts.filter(|c| !c.is_empty()).map(str::to_string).collect();
        Self { tag, classes }
    }

    fn matches(&self, element: &Element) -> bool {
        if self.tag.is_none() && self.classes.is_empty() {
            return false;
        }
        self.tag.as_ref().is_none_or(|t| *t == element.tag)
            && self.classes.iter().all(|c| element.has_class(c))
    }
}
