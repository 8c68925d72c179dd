//! Metadata editing dialog state.
//!
//! The dialog shows metadata as pretty-printed JSON. Saving text that does not
//! parse keeps the dialog open with an inline warning instead of failing.

use color_eyre::eyre::Result;
use serde_json::Value;

pub const INVALID_JSON_WARNING: &str = "WARNING: Could not save invalid JSON.";

/// Keyboard shortcut handling that must be suspended while a dialog has focus.
pub trait KeyboardManager {
    fn enable(&mut self);
    fn disable(&mut self);
    fn command_mode(&mut self);
}

pub struct MetadataEditor<'a> {
    keyboard: &'a mut dyn KeyboardManager,
    name: String,
    text: String,
    warning: Option<String>,
}

impl<'a> MetadataEditor<'a> {
    /// Opens the editor for the metadata of `name` (e.g. "cell" or "notebook").
    pub fn open(
        keyboard: &'a mut dyn KeyboardManager,
        metadata: Option<&Value>,
        name: &str,
    ) -> Result<Self> {
        let empty = Value::Object(Default::default());
        let text = serde_json::to_string_pretty(metadata.unwrap_or(&empty))?;
        keyboard.disable();
        Ok(Self {
            keyboard,
            name: name.to_string(),
            text,
            warning: None,
        })
    }

    pub fn help_text(&self) -> String {
        format!(
            "Manually edit the JSON below to manipulate the metadata for this {}. \
             We recommend putting custom metadata attributes in an appropriately named \
             sub-structure, so they don't conflict with those of others.",
            self.name
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Parses the edited text. Invalid JSON sets the inline warning and
    /// returns `None`, leaving the dialog open.
    pub fn save(&mut self) -> Option<Value> {
        match serde_json::from_str::<Value>(&self.text) {
            Ok(metadata) => {
                self.warning = None;
                self.close();
                Some(metadata)
            }
            Err(e) => {
                tracing::debug!("Rejecting {} metadata: {e}", self.name);
                self.warning = Some(INVALID_JSON_WARNING.to_string());
                None
            }
        }
    }

    pub fn cancel(mut self) {
        self.close();
    }

    fn close(&mut self) {
        self.keyboard.enable();
        self.keyboard.command_mode();
    }
}
