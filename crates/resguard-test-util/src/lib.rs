//! Shared wire-payload builders for the resguard workspace.
//!
//! This crate exists because `xtask` needs sample payloads at runtime (not behind
//! `#[cfg(test)]`) to check the emitted schemas against.

use resguard_props::{ARCHIVE_SIG, ASSET_SIG, SECRET_SIG, SIG_KEY, UnknownKind};
use resguard_types::{AnalyzeRequest, AnalyzeStackRequest, ConfigureRequest};
use serde_json::{Map, Value, json};

/// A secret wrapper around an already-encoded value.
pub fn secret(value: Value) -> Value {
    json!({ SIG_KEY: SECRET_SIG, "value": value })
}

pub fn unknown(kind: UnknownKind) -> Value {
    Value::String(kind.sentinel().to_string())
}

pub fn text_asset(text: &str) -> Value {
    json!({ SIG_KEY: ASSET_SIG, "text": text })
}

pub fn file_asset(path: &str) -> Value {
    json!({ SIG_KEY: ASSET_SIG, "path": path })
}

pub fn asset_archive(members: Value) -> Value {
    json!({ SIG_KEY: ARCHIVE_SIG, "assets": members })
}

/// Conventional urn for a resource of `resource_type` named `name`.
pub fn urn(resource_type: &str, name: &str) -> String {
    format!("urn:pulumi:dev::proj::{resource_type}::{name}")
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// A single-resource request; `properties` must be a JSON object.
pub fn analyze_request(resource_type: &str, name: &str, properties: Value) -> AnalyzeRequest {
    AnalyzeRequest {
        resource_type: resource_type.to_string(),
        name: name.to_string(),
        urn: urn(resource_type, name),
        properties: object(properties),
        ..AnalyzeRequest::default()
    }
}

/// A stack member in wire form, for use with [`stack_request`].
pub fn stack_resource(resource_type: &str, name: &str, properties: Value) -> Value {
    json!({
        "type": resource_type,
        "name": name,
        "urn": urn(resource_type, name),
        "properties": properties,
    })
}

pub fn stack_request(resources: Vec<Value>, tags: Value) -> AnalyzeStackRequest {
    serde_json::from_value(json!({ "resources": resources, "tags": tags }))
        .expect("stack request fixture must match the wire shape")
}

/// A `Configure` payload from `policy name -> {enforcementLevel?, properties?}`.
pub fn configure_request(policy_config: Value) -> ConfigureRequest {
    serde_json::from_value(json!({ "policyConfig": policy_config }))
        .expect("configure fixture must match the wire shape")
}

/// Representative responses, one per schema, for schema conformance checks.
pub fn sample_responses() -> Vec<(&'static str, Value)> {
    vec![
        (
            "analyze_response",
            json!({
                "diagnostics": [{
                    "policyName": "s3-no-public-read",
                    "policyPackName": "aws-baseline",
                    "policyPackVersion": "0.0.1",
                    "description": "Prohibits public read on buckets",
                    "message": "Prohibits public read on buckets\nacl is public-read",
                    "enforcementLevel": "mandatory",
                    "urn": urn("aws:s3/bucket:Bucket", "logs"),
                }],
                "notApplicable": [{
                    "policyName": "ec2-size",
                    "reason": "Resource type does not match the policy's resource filter",
                }],
            }),
        ),
        (
            "remediate_response",
            json!({
                "remediations": [{
                    "policyName": "rotate-password",
                    "policyPackName": "aws-baseline",
                    "policyPackVersion": "0.0.1",
                    "description": "Rotates weak passwords",
                    "properties": {"password": secret(json!("correct horse"))},
                }],
                "properties": {"password": secret(json!("correct horse"))},
                "notApplicable": [],
            }),
        ),
        (
            "analyzer_info",
            json!({
                "name": "aws-baseline",
                "version": "0.0.1",
                "supportsConfig": true,
                "policies": [{
                    "name": "s3-no-public-read",
                    "description": "Prohibits public read on buckets",
                    "enforcementLevel": "advisory",
                    "configSchema": {"properties": {"allowed": {"type": "array"}}},
                }],
                "initialConfig": {"s3-no-public-read": {"enforcementLevel": "mandatory"}},
            }),
        ),
    ]
}
