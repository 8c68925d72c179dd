//! Presentation layer
//!
//! This module contains everything views render into:
//! - DOM-like elements
//! - Built-in widget views
//! - The metadata editing dialog

pub mod element;
pub mod metadata_editor;
pub mod widgets;
