//! Stable DTOs and IDs used across the resguard workspace.
//!
//! This crate is intentionally boring:
//! - request/response shapes exchanged with the transport collaborator
//! - the enforcement level vocabulary
//! - stable reason strings for not-applicable records

#![forbid(unsafe_code)]

pub mod diagnostic;
pub mod ids;
pub mod level;
pub mod wire;

pub use diagnostic::{Diagnostic, NotApplicable};
pub use level::{EnforcementLevel, ParseEnforcementLevelError};
pub use wire::{
    AnalyzeRequest, AnalyzeResponse, AnalyzeStackRequest, AnalyzerInfo, AnalyzerResource,
    ConfigureRequest, CustomTimeouts, PluginInfo, PolicyConfig, PolicyConfigSchema, PolicyInfo,
    PropertyDependencies, ProviderResource, RemediateRequest, RemediateResponse, Remediation,
    ResourceOptions,
};
