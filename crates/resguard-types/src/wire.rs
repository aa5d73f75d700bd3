//! Shapes exchanged with the transport collaborator.
//!
//! Property trees stay in their structured (JSON) form here; decoding them into rich values is
//! the codec's job, not the transport's.

use crate::{Diagnostic, EnforcementLevel, NotApplicable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Custom operation timeouts, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomTimeouts {
    #[serde(default)]
    pub create: f64,
    #[serde(default)]
    pub update: f64,
    #[serde(default)]
    pub delete: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOptions {
    #[serde(default)]
    pub protect: bool,
    #[serde(default)]
    pub ignore_changes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_before_replace: Option<bool>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_timeouts: Option<CustomTimeouts>,
    #[serde(default)]
    pub additional_secret_outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub urn: String,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
}

/// A single resource to analyze or remediate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeRequest {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub urn: String,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
    #[serde(default)]
    pub options: ResourceOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderResource>,
}

/// Remediation requests carry the same payload as analysis requests.
pub type RemediateRequest = AnalyzeRequest;

/// `property name -> urns` the property's value depends on.
pub type PropertyDependencies = BTreeMap<String, Vec<String>>;

/// A resource as it appears in a stack-wide request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    pub urn: String,
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
    #[serde(default)]
    pub options: ResourceOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub property_dependencies: PropertyDependencies,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeStackRequest {
    #[serde(default)]
    pub resources: Vec<AnalyzerResource>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default)]
    pub not_applicable: Vec<NotApplicable>,
}

/// One policy's contribution to a remediate call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Remediation {
    pub policy_name: String,
    pub policy_pack_name: String,
    pub policy_pack_version: String,
    pub description: String,
    /// Encoded properties after this remediation; absent when it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemediateResponse {
    pub remediations: Vec<Remediation>,
    /// Final encoded properties, present only when some remediation changed the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, JsonValue>>,
    #[serde(default)]
    pub not_applicable: Vec<NotApplicable>,
}

/// Declared shape of a policy's configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyConfigSchema {
    #[serde(default)]
    pub properties: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInfo {
    pub name: String,
    pub description: String,
    pub enforcement_level: EnforcementLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_schema: Option<PolicyConfigSchema>,
}

/// Per-policy configuration as exchanged on the wire.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement_level: Option<EnforcementLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, JsonValue>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerInfo {
    pub name: String,
    pub version: String,
    pub supports_config: bool,
    pub policies: Vec<PolicyInfo>,
    #[serde(default)]
    pub initial_config: BTreeMap<String, PolicyConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureRequest {
    #[serde(default)]
    pub policy_config: BTreeMap<String, PolicyConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PluginInfo {
    pub version: String,
}
