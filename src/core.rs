//! Core widget synchronization
//!
//! This module contains the model/view synchronization protocol:
//! - Wire messages and identifiers
//! - Throttle and coalescing decisions
//! - Widget models, views and the manager that owns them

pub mod coalescer;
pub mod manager;
pub mod model;
pub mod msg;
pub mod view;
