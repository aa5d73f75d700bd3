use crate::model::{InitialConfig, InitialConfigEntry};
use anyhow::Context;
use resguard_domain::{EffectiveConfig, PolicySettings};
use resguard_types::{ConfigureRequest, EnforcementLevel, PolicyConfig};
use serde_json::Value;
use std::collections::BTreeMap;

const LEVEL_KEY: &str = "enforcementLevel";

/// Split each entry into an optional level and optional properties.
///
/// An object without any key other than `enforcementLevel` has no properties.
pub fn normalize_initial_config(
    cfg: InitialConfig,
) -> anyhow::Result<BTreeMap<String, PolicyConfig>> {
    let mut out = BTreeMap::new();
    for (policy, entry) in cfg {
        let normalized = match entry {
            InitialConfigEntry::Level(level) => PolicyConfig {
                enforcement_level: Some(
                    parse_level(&level)
                        .with_context(|| format!("invalid initial config for {policy}"))?,
                ),
                properties: None,
            },
            InitialConfigEntry::Detailed(mut properties) => {
                let enforcement_level = match properties.remove(LEVEL_KEY) {
                    None | Some(Value::Null) => None,
                    Some(Value::String(level)) => Some(
                        parse_level(&level)
                            .with_context(|| format!("invalid {LEVEL_KEY} for {policy}"))?,
                    ),
                    Some(other) => {
                        anyhow::bail!(
                            "invalid {LEVEL_KEY} for {policy}: expected a string, got {other}"
                        )
                    }
                };
                PolicyConfig {
                    enforcement_level,
                    properties: (!properties.is_empty()).then_some(properties),
                }
            }
        };
        out.insert(policy, normalized);
    }
    Ok(out)
}

/// Build the configuration the engine runs with from a `Configure` call.
///
/// The result replaces whatever was configured before; policies it does not mention run with
/// their declared level and no properties.
pub fn resolve_config(req: ConfigureRequest) -> EffectiveConfig {
    let policies = req
        .policy_config
        .into_iter()
        .map(|(name, cfg)| {
            (
                name,
                PolicySettings {
                    enforcement_level: cfg.enforcement_level,
                    properties: cfg.properties.unwrap_or_default(),
                },
            )
        })
        .collect();
    EffectiveConfig { policies }
}

fn parse_level(v: &str) -> anyhow::Result<EnforcementLevel> {
    Ok(v.parse::<EnforcementLevel>()?)
}
