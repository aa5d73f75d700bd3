use crate::EnforcementLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One reported policy violation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub policy_name: String,
    pub policy_pack_name: String,
    pub policy_pack_version: String,
    pub description: String,
    pub message: String,
    pub enforcement_level: EnforcementLevel,

    /// Offending resource; absent for stack-wide violations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urn: Option<String>,
}

/// A policy that was excluded from a resource or operation, with the reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotApplicable {
    pub policy_name: String,
    pub reason: String,
}

impl NotApplicable {
    pub fn new(policy_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            policy_name: policy_name.into(),
            reason: reason.into(),
        }
    }
}
