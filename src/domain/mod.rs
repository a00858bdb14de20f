//! Domain layer for the BTS to GitHub sync
//!
//! This module contains the models, the title/comment wire conventions and
//! the port traits the services depend on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
