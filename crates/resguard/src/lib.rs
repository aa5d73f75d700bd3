//! Write and serve resguard policy packs.
//!
//! Re-exports what a pack author needs: the policy model, the property views handed to
//! callbacks, and the analyzer service that hosts a pack.

#![forbid(unsafe_code)]

pub use resguard_app::{Analyzer, HostError, ServeLease, ServiceLifecycle};
pub use resguard_domain::{
    EffectiveConfig, Policy, PolicyError, PolicyMeta, PolicyPack, RemediationArgs,
    ResourceFilter, ResourcePolicy, ResourceRemediator, ResourceValidationArgs,
    ResourceValidator, ResourceView, StackPolicy, StackResource, StackValidationArgs,
    StackValidator, StackView, Violation, ViolationReporter, ensure_eq,
};
pub use resguard_props::{
    Guarded, PendingMap, PendingValue, PropertyMap, PropertyValue, SecretView, UnknownKind,
    UnknownValueError,
};
pub use resguard_settings::InitialConfig;
pub use resguard_types::EnforcementLevel;

/// Build a pack whose initial configuration is given as JSON
/// (`policy name -> level | {enforcementLevel?, ...properties}`).
pub fn pack_with_initial_config(
    name: &str,
    enforcement_level: Option<EnforcementLevel>,
    policies: Vec<Policy>,
    initial_config_json: &str,
) -> anyhow::Result<PolicyPack> {
    use anyhow::Context;

    let initial = resguard_settings::parse_initial_config_json(initial_config_json)
        .context("parse initial config")?;
    let initial =
        resguard_settings::normalize_initial_config(initial).context("normalize initial config")?;
    let pack = PolicyPack::new(name, enforcement_level, policies, Some(initial))
        .with_context(|| format!("build policy pack {name}"))?;
    Ok(pack)
}

/// Claim `lifecycle` and start serving `pack`.
pub fn serve(pack: PolicyPack, lifecycle: &ServiceLifecycle) -> Result<Analyzer, HostError> {
    let lease = lifecycle.claim()?;
    Ok(Analyzer::new(pack, lease))
}
