//! Adapters for external systems.

pub mod cache;
pub mod plugins;
