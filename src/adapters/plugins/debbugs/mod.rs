//! Debian BTS adapter.
//!
//! Implements the tracker port over the Debbugs SOAP interface.

pub mod client;
pub mod soap;

pub use client::DebbugsClient;
