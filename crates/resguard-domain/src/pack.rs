use crate::error::PackError;
use crate::policy::{EffectiveConfig, Policy, PolicyMeta, effective_level};
use resguard_types::{EnforcementLevel, PolicyConfig, PolicyConfigSchema, ids};
use std::collections::{BTreeMap, BTreeSet};

const CONFIG_LEVEL_KEY: &str = "enforcementLevel";

/// An ordered, validated set of policies.
#[derive(Clone, Debug)]
pub struct PolicyPack {
    name: String,
    version: String,
    enforcement_level: Option<EnforcementLevel>,
    policies: Vec<Policy>,
    initial_config: BTreeMap<String, PolicyConfig>,
}

impl PolicyPack {
    /// Build a pack, checking names, descriptions, callbacks and config schemas.
    pub fn new(
        name: impl Into<String>,
        enforcement_level: Option<EnforcementLevel>,
        policies: Vec<Policy>,
        initial_config: Option<BTreeMap<String, PolicyConfig>>,
    ) -> Result<Self, PackError> {
        let name = name.into();
        if !is_valid_pack_name(&name) {
            return Err(PackError::InvalidName(name));
        }
        if policies.is_empty() {
            return Err(PackError::NoPolicies(name));
        }

        let mut seen = BTreeSet::new();
        for policy in &policies {
            check_policy(policy)?;
            if !seen.insert(policy.name()) {
                return Err(PackError::DuplicatePolicyName(policy.name().to_string()));
            }
        }

        Ok(Self {
            name,
            version: ids::DEFAULT_PACK_VERSION.to_string(),
            enforcement_level,
            policies,
            initial_config: initial_config.unwrap_or_default(),
        })
    }

    /// Set the reported version; empty keeps the default.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        if !version.is_empty() {
            self.version = version;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn enforcement_level(&self) -> Option<EnforcementLevel> {
        self.enforcement_level
    }

    /// Policies in declaration order.
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn initial_config(&self) -> &BTreeMap<String, PolicyConfig> {
        &self.initial_config
    }

    /// Level a policy runs at under `cfg`.
    pub fn level_for(&self, meta: &PolicyMeta, cfg: &EffectiveConfig) -> EnforcementLevel {
        effective_level(meta, self.enforcement_level, cfg)
    }

    /// Level reported in analyzer info: the policy's own, else the pack default.
    pub fn declared_level(&self, meta: &PolicyMeta) -> EnforcementLevel {
        meta.enforcement_level
            .or(self.enforcement_level)
            .unwrap_or_default()
    }
}

fn is_valid_pack_name(name: &str) -> bool {
    (1..=100).contains(&name.chars().count())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn check_policy(policy: &Policy) -> Result<(), PackError> {
    let meta = policy.meta();
    if meta.name.is_empty() {
        return Err(PackError::EmptyPolicyName);
    }
    if meta.name == ids::RESERVED_POLICY_NAME {
        return Err(PackError::ReservedPolicyName(meta.name.clone()));
    }
    if meta.description.is_empty() {
        return Err(PackError::EmptyDescription(meta.name.clone()));
    }
    if let Policy::Resource(p) = policy
        && !p.has_validations()
        && !p.has_remediation()
    {
        return Err(PackError::NoCallbacks(meta.name.clone()));
    }
    if let Some(schema) = &meta.config_schema {
        check_config_schema(&meta.name, schema)?;
    }
    Ok(())
}

/// The level is configured separately and may not double as a schema property.
fn check_config_schema(policy: &str, schema: &PolicyConfigSchema) -> Result<(), PackError> {
    if schema.properties.contains_key(CONFIG_LEVEL_KEY) {
        return Err(PackError::InvalidConfigSchema {
            policy: policy.to_string(),
            reason: format!("{CONFIG_LEVEL_KEY} cannot be explicitly specified in properties"),
        });
    }
    if schema.required.iter().any(|r| r == CONFIG_LEVEL_KEY) {
        return Err(PackError::InvalidConfigSchema {
            policy: policy.to_string(),
            reason: format!("{CONFIG_LEVEL_KEY} cannot be specified in required"),
        });
    }
    Ok(())
}
