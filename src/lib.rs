//! # nbwidget - notebook widget synchronization
//!
//! Keeps interactive widget views in a notebook frontend in sync with their
//! backend counterparts over kernel comms.
//!
//! ## Architecture Overview
//!
//! - **Model** (`core::model`): synchronized attributes bound to one comm,
//!   with a throttle on in-flight sync messages and a single coalesced buffer
//! - **View** (`core::view`): renders a model into an element tree and turns
//!   user interaction into syncs
//! - **Manager** (`core::manager`): type registries, the model/view arena and
//!   dispatch of inbound comm traffic
//! - **Runtime** (`integration::runtime`): one backend connection feeding
//!   session events through the manager
//!
//! ## Example Usage
//!
//! ```rust
//! use nbwidget::{
//!     core::msg::{CommId, CommOpen, SessionEvent},
//!     domain::document::Notebook,
//!     infrastructure::config::WidgetConfig,
//!     integration::runtime::Runtime,
//! };
//!
//! let mut runtime = Runtime::new(WidgetConfig::default());
//! runtime
//!     .install_widget_manager(Box::new(Notebook::with_cells(1)))
//!     .unwrap();
//!
//! let frames = runtime.process_event(SessionEvent::CommOpen(CommOpen {
//!     comm_id: CommId::from("c1"),
//!     target_name: "ButtonWidgetModel".to_string(),
//! }));
//! assert!(frames.is_empty());
//! ```

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod integration;
pub mod presentation;
pub mod test_helpers;
pub mod utils;

pub use crate::core::manager::WidgetManager;
pub use crate::core::model::WidgetModel;
pub use crate::core::view::{ViewBase, WidgetView};
pub use crate::integration::runtime::Runtime;

/// Result type used throughout the library
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
