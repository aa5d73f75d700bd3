//! Analyzer service for resguard.
//!
//! This crate is the application layer: it turns wire requests into domain views, runs the
//! engine against a snapshot of the current configuration, and turns the results back into
//! wire responses. It is intentionally thin; policy semantics live in `resguard-domain`.
//!
//! The transport collaborator depends on this; it only handles framing and I/O.

#![forbid(unsafe_code)]

mod analyzer;
mod decode;
mod lifecycle;

pub use analyzer::Analyzer;
pub use decode::{resource_view, stack_view};
pub use lifecycle::{HostError, ServeLease, ServiceLifecycle};
