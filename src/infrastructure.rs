//! Infrastructure layer
//!
//! This module handles external integrations and services:
//! - CLI argument processing
//! - Configuration loading
//! - Comm transport to the kernel

pub mod cli;
pub mod comm;
pub mod config;
