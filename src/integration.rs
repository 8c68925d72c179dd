//! Integration layer
//!
//! This module wires the widget core to a backend connection:
//! - Session event runtime

pub mod runtime;
