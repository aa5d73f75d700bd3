use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Initial configuration of a pack, keyed by policy name.
pub type InitialConfig = BTreeMap<String, InitialConfigEntry>;

/// One policy's initial configuration as an author writes it.
///
/// Either a bare enforcement level (`"mandatory"`), or an object whose optional
/// `enforcementLevel` key sets the level and whose other keys are the policy's properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum InitialConfigEntry {
    Level(String),
    Detailed(Map<String, Value>),
}

impl From<resguard_types::EnforcementLevel> for InitialConfigEntry {
    fn from(level: resguard_types::EnforcementLevel) -> Self {
        InitialConfigEntry::Level(level.as_str().to_string())
    }
}
