//! Policy evaluation (no IO).
//!
//! Input: a validated [`PolicyPack`], decoded resources or stacks, and an [`EffectiveConfig`]
//! resolved elsewhere.
//! Output: diagnostics, not-applicable records and remediated properties.
//!
//! Policies run one at a time in declaration order. Callbacks are async so that a policy may
//! wait on deferred values, but the engine itself never spawns.

#![forbid(unsafe_code)]

pub mod args;
pub mod error;
pub mod model;
pub mod pack;
pub mod policy;
pub mod report;

mod engine;

#[cfg(test)]
mod test_support;

pub use args::{RemediationArgs, ResourceValidationArgs, StackValidationArgs};
pub use engine::{analyze, analyze_stack, remediate};
pub use error::{AnalyzeError, PackError, PolicyError, ensure_eq};
pub use model::{ProviderView, ResourceView, StackEntry, StackResource, StackView};
pub use pack::PolicyPack;
pub use policy::{
    EffectiveConfig, Policy, PolicyMeta, PolicySettings, ResourceFilter, ResourcePolicy,
    ResourceRemediator, ResourceValidator, StackPolicy, StackValidator,
};
pub use report::{
    AnalyzeReport, RemediateReport, RemediationRecord, Violation, ViolationReporter,
};
