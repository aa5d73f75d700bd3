//! Per-policy configuration parsing and resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings
//! or already-decoded payloads.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::{InitialConfig, InitialConfigEntry};
pub use resolve::{normalize_initial_config, resolve_config};

use resguard_types::ConfigureRequest;

/// Parse a pack's initial configuration (`policy name -> level | {enforcementLevel?, ...}`).
pub fn parse_initial_config_json(input: &str) -> anyhow::Result<InitialConfig> {
    let cfg: InitialConfig = serde_json::from_str(input)?;
    Ok(cfg)
}

/// Parse the payload of a `Configure` call.
pub fn parse_configure_json(input: &str) -> anyhow::Result<ConfigureRequest> {
    let req: ConfigureRequest = serde_json::from_str(input)?;
    Ok(req)
}
