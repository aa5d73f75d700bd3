use crate::args::{RemediationArgs, ResourceValidationArgs, StackValidationArgs};
use crate::error::PolicyError;
use crate::model::ResourceView;
use crate::report::ViolationReporter;
use async_trait::async_trait;
use resguard_props::PendingValue;
use resguard_types::{EnforcementLevel, PolicyConfigSchema};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Host-supplied settings for one policy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolicySettings {
    /// Takes precedence over the policy's and the pack's level.
    pub enforcement_level: Option<EnforcementLevel>,
    pub properties: Map<String, Value>,
}

/// Configuration consumed by the engine, already resolved and validated elsewhere.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectiveConfig {
    pub policies: BTreeMap<String, PolicySettings>,
}

impl EffectiveConfig {
    pub fn policy(&self, name: &str) -> Option<&PolicySettings> {
        self.policies.get(name)
    }

    pub fn level_override(&self, name: &str) -> Option<EnforcementLevel> {
        self.policy(name).and_then(|p| p.enforcement_level)
    }

    pub fn properties(&self, name: &str) -> Option<&Map<String, Value>> {
        self.policy(name).map(|p| &p.properties)
    }
}

// ============================================================================
// Callbacks
// ============================================================================

#[async_trait]
pub trait ResourceValidator: Send + Sync {
    async fn validate(
        &self,
        args: &ResourceValidationArgs<'_>,
        report: &ViolationReporter,
    ) -> Result<(), PolicyError>;
}

/// Rewrites a resource's properties before validation.
///
/// `Ok(None)` leaves the resource unchanged; writes made through the args' view are only
/// kept when the view is returned.
#[async_trait]
pub trait ResourceRemediator: Send + Sync {
    async fn remediate(
        &self,
        args: &mut RemediationArgs<'_>,
    ) -> Result<Option<PendingValue>, PolicyError>;
}

#[async_trait]
pub trait StackValidator: Send + Sync {
    async fn validate(
        &self,
        args: &StackValidationArgs<'_>,
        report: &ViolationReporter,
    ) -> Result<(), PolicyError>;
}

/// Adapts a synchronous closure into a [`ResourceValidator`].
pub struct ValidateFn<F>(pub F);

#[async_trait]
impl<F> ResourceValidator for ValidateFn<F>
where
    F: Fn(&ResourceValidationArgs<'_>, &ViolationReporter) -> Result<(), PolicyError>
        + Send
        + Sync,
{
    async fn validate(
        &self,
        args: &ResourceValidationArgs<'_>,
        report: &ViolationReporter,
    ) -> Result<(), PolicyError> {
        (self.0)(args, report)
    }
}

pub struct RemediateFn<F>(pub F);

#[async_trait]
impl<F> ResourceRemediator for RemediateFn<F>
where
    F: Fn(&mut RemediationArgs<'_>) -> Result<Option<PendingValue>, PolicyError> + Send + Sync,
{
    async fn remediate(
        &self,
        args: &mut RemediationArgs<'_>,
    ) -> Result<Option<PendingValue>, PolicyError> {
        (self.0)(args)
    }
}

pub struct StackValidateFn<F>(pub F);

#[async_trait]
impl<F> StackValidator for StackValidateFn<F>
where
    F: Fn(&StackValidationArgs<'_>, &ViolationReporter) -> Result<(), PolicyError> + Send + Sync,
{
    async fn validate(
        &self,
        args: &StackValidationArgs<'_>,
        report: &ViolationReporter,
    ) -> Result<(), PolicyError> {
        (self.0)(args, report)
    }
}

// ============================================================================
// Applicability
// ============================================================================

type Predicate = Arc<dyn Fn(&ResourceView) -> bool + Send + Sync>;

/// Which resources a resource policy applies to.
#[derive(Clone, Default)]
pub enum ResourceFilter {
    #[default]
    Any,
    /// Exact type-name match against any of the listed types.
    Types(Vec<String>),
    Predicate(Predicate),
}

impl ResourceFilter {
    pub fn of_type(resource_type: impl Into<String>) -> Self {
        ResourceFilter::Types(vec![resource_type.into()])
    }

    pub fn of_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResourceFilter::Types(types.into_iter().map(Into::into).collect())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&ResourceView) -> bool + Send + Sync + 'static,
    {
        ResourceFilter::Predicate(Arc::new(f))
    }

    pub fn matches(&self, resource: &ResourceView) -> bool {
        match self {
            ResourceFilter::Any => true,
            ResourceFilter::Types(types) => types.iter().any(|t| *t == resource.resource_type),
            ResourceFilter::Predicate(f) => f(resource),
        }
    }
}

impl fmt::Debug for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFilter::Any => f.write_str("Any"),
            ResourceFilter::Types(types) => f.debug_tuple("Types").field(types).finish(),
            ResourceFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// ============================================================================
// Policies
// ============================================================================

/// Metadata shared by every policy kind.
#[derive(Clone, Debug)]
pub struct PolicyMeta {
    pub name: String,
    pub description: String,
    pub enforcement_level: Option<EnforcementLevel>,
    pub config_schema: Option<PolicyConfigSchema>,
}

impl PolicyMeta {
    fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enforcement_level: None,
            config_schema: None,
        }
    }
}

/// A policy checked once per resource.
#[derive(Clone)]
pub struct ResourcePolicy {
    pub(crate) meta: PolicyMeta,
    pub(crate) filter: ResourceFilter,
    pub(crate) validations: Vec<Arc<dyn ResourceValidator>>,
    pub(crate) remediation: Option<Arc<dyn ResourceRemediator>>,
}

impl ResourcePolicy {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            meta: PolicyMeta::new(name, description),
            filter: ResourceFilter::Any,
            validations: Vec::new(),
            remediation: None,
        }
    }

    pub fn enforcement_level(mut self, level: EnforcementLevel) -> Self {
        self.meta.enforcement_level = Some(level);
        self
    }

    pub fn config_schema(mut self, schema: PolicyConfigSchema) -> Self {
        self.meta.config_schema = Some(schema);
        self
    }

    pub fn filter(mut self, filter: ResourceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Append a validation; validations run in the order they were added.
    pub fn validate(mut self, validator: impl ResourceValidator + 'static) -> Self {
        self.validations.push(Arc::new(validator));
        self
    }

    pub fn validate_fn<F>(self, f: F) -> Self
    where
        F: Fn(&ResourceValidationArgs<'_>, &ViolationReporter) -> Result<(), PolicyError>
            + Send
            + Sync
            + 'static,
    {
        self.validate(ValidateFn(f))
    }

    pub fn remediate(mut self, remediator: impl ResourceRemediator + 'static) -> Self {
        self.remediation = Some(Arc::new(remediator));
        self
    }

    pub fn remediate_fn<F>(self, f: F) -> Self
    where
        F: Fn(&mut RemediationArgs<'_>) -> Result<Option<PendingValue>, PolicyError>
            + Send
            + Sync
            + 'static,
    {
        self.remediate(RemediateFn(f))
    }

    pub fn meta(&self) -> &PolicyMeta {
        &self.meta
    }

    pub fn resource_filter(&self) -> &ResourceFilter {
        &self.filter
    }

    pub fn has_validations(&self) -> bool {
        !self.validations.is_empty()
    }

    pub fn has_remediation(&self) -> bool {
        self.remediation.is_some()
    }
}

impl fmt::Debug for ResourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePolicy")
            .field("meta", &self.meta)
            .field("filter", &self.filter)
            .field("validations", &self.validations.len())
            .field("remediation", &self.remediation.is_some())
            .finish()
    }
}

/// A policy checked once per stack operation, over every resource at once.
#[derive(Clone)]
pub struct StackPolicy {
    pub(crate) meta: PolicyMeta,
    pub(crate) validation: Arc<dyn StackValidator>,
}

impl StackPolicy {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        validator: impl StackValidator + 'static,
    ) -> Self {
        Self {
            meta: PolicyMeta::new(name, description),
            validation: Arc::new(validator),
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(&StackValidationArgs<'_>, &ViolationReporter) -> Result<(), PolicyError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, description, StackValidateFn(f))
    }

    pub fn enforcement_level(mut self, level: EnforcementLevel) -> Self {
        self.meta.enforcement_level = Some(level);
        self
    }

    pub fn config_schema(mut self, schema: PolicyConfigSchema) -> Self {
        self.meta.config_schema = Some(schema);
        self
    }

    pub fn meta(&self) -> &PolicyMeta {
        &self.meta
    }
}

impl fmt::Debug for StackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackPolicy")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Policy {
    Resource(ResourcePolicy),
    Stack(StackPolicy),
}

impl Policy {
    pub fn meta(&self) -> &PolicyMeta {
        match self {
            Policy::Resource(p) => &p.meta,
            Policy::Stack(p) => &p.meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    pub fn description(&self) -> &str {
        &self.meta().description
    }
}

impl From<ResourcePolicy> for Policy {
    fn from(p: ResourcePolicy) -> Self {
        Policy::Resource(p)
    }
}

impl From<StackPolicy> for Policy {
    fn from(p: StackPolicy) -> Self {
        Policy::Stack(p)
    }
}

/// Effective level: host override, then the policy's own, then the pack default, then advisory.
pub fn effective_level(
    meta: &PolicyMeta,
    pack_default: Option<EnforcementLevel>,
    cfg: &EffectiveConfig,
) -> EnforcementLevel {
    cfg.level_override(&meta.name)
        .or(meta.enforcement_level)
        .or(pack_default)
        .unwrap_or_default()
}
