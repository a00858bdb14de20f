//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::Cli;

/// Report a fatal error on stderr, as JSON when requested.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) {
    if json_mode {
        let payload = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        eprintln!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
}
