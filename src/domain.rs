//! Domain logic
//!
//! This module contains the widget domain types that are not tied to the
//! synchronization protocol:
//! - Synchronized attribute maps and style overrides
//! - The notebook document collaborator

pub mod attributes;
pub mod document;
