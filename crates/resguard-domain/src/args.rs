//! What a policy callback gets to see.

use crate::error::PolicyError;
use crate::model::{ProviderView, ResourceView, StackResource, StackView};
use anyhow::Context;
use resguard_props::{Guarded, PropertyMap, PropertyValue, SecretView, guard};
use resguard_types::ResourceOptions;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Deserialize a policy's configuration; a policy without configuration sees `{}`.
fn decode_config<T: DeserializeOwned>(
    config: Option<&Map<String, Value>>,
) -> Result<T, PolicyError> {
    let value = Value::Object(config.cloned().unwrap_or_default());
    let decoded = serde_json::from_value(value).context("invalid policy configuration")?;
    Ok(decoded)
}

pub struct ResourceValidationArgs<'a> {
    pub resource: &'a ResourceView,
    config: Option<&'a Map<String, Value>>,
}

impl<'a> ResourceValidationArgs<'a> {
    pub(crate) fn new(resource: &'a ResourceView, config: Option<&'a Map<String, Value>>) -> Self {
        Self { resource, config }
    }

    /// Properties behind the unknown-value guard.
    pub fn props(&self) -> Guarded<'a> {
        self.resource.props()
    }

    pub fn resource_type(&self) -> &'a str {
        &self.resource.resource_type
    }

    pub fn is_type(&self, resource_type: &str) -> bool {
        self.resource.resource_type == resource_type
    }

    pub fn name(&self) -> &'a str {
        &self.resource.name
    }

    pub fn urn(&self) -> &'a str {
        &self.resource.urn
    }

    pub fn options(&self) -> &'a ResourceOptions {
        &self.resource.options
    }

    pub fn provider(&self) -> Option<&'a ProviderView> {
        self.resource.provider.as_ref()
    }

    pub fn config<T: DeserializeOwned>(&self) -> Result<T, PolicyError> {
        decode_config(self.config)
    }
}

/// Arguments to a remediation.
///
/// Holds its own copy of the properties, secrets kept, so a remediation can edit freely and
/// hand the result back.
pub struct RemediationArgs<'a> {
    pub resource: &'a ResourceView,
    properties: PropertyValue,
    config: Option<&'a Map<String, Value>>,
}

impl<'a> RemediationArgs<'a> {
    pub(crate) fn new(resource: &'a ResourceView, config: Option<&'a Map<String, Value>>) -> Self {
        Self {
            resource,
            properties: PropertyValue::Map(resource.properties().clone()),
            config,
        }
    }

    /// Read/write view that keeps secrets secret across overwrites.
    pub fn props(&mut self) -> SecretView<'_> {
        SecretView::new(&mut self.properties)
    }

    /// The working copy behind the unknown-value guard.
    pub fn guarded(&self) -> Guarded<'_> {
        guard(&self.properties)
    }

    /// The working copy as a plain map, ready to return.
    pub fn properties(&self) -> PropertyMap {
        self.properties.as_map().cloned().unwrap_or_default()
    }

    pub fn resource_type(&self) -> &'a str {
        &self.resource.resource_type
    }

    pub fn urn(&self) -> &'a str {
        &self.resource.urn
    }

    pub fn config<T: DeserializeOwned>(&self) -> Result<T, PolicyError> {
        decode_config(self.config)
    }
}

pub struct StackValidationArgs<'a> {
    pub stack: &'a StackView,
    config: Option<&'a Map<String, Value>>,
}

impl<'a> StackValidationArgs<'a> {
    pub(crate) fn new(stack: &'a StackView, config: Option<&'a Map<String, Value>>) -> Self {
        Self { stack, config }
    }

    pub fn resources(&self) -> &'a [StackResource] {
        self.stack.resources()
    }

    pub fn tags(&self) -> &'a BTreeMap<String, String> {
        self.stack.tags()
    }

    pub fn config<T: DeserializeOwned>(&self) -> Result<T, PolicyError> {
        decode_config(self.config)
    }
}
