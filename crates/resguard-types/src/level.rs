use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when a policy is violated.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementLevel {
    /// Report the violation, let the operation proceed.
    #[default]
    Advisory,
    /// Report the violation and block the operation.
    Mandatory,
    /// Attempt to fix the resource before validating it.
    Remediate,
    /// Never run the policy.
    Disabled,
}

impl EnforcementLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EnforcementLevel::Advisory => "advisory",
            EnforcementLevel::Mandatory => "mandatory",
            EnforcementLevel::Remediate => "remediate",
            EnforcementLevel::Disabled => "disabled",
        }
    }

    pub fn is_disabled(self) -> bool {
        self == EnforcementLevel::Disabled
    }

    /// Level attached to a violation that survived (or could not use) remediation.
    pub fn for_violation(self) -> EnforcementLevel {
        match self {
            EnforcementLevel::Remediate => EnforcementLevel::Mandatory,
            other => other,
        }
    }
}

impl fmt::Display for EnforcementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseEnforcementLevelError(pub String);

impl fmt::Display for ParseEnforcementLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown enforcement level: {} (expected advisory|mandatory|remediate|disabled)",
            self.0
        )
    }
}

impl std::error::Error for ParseEnforcementLevelError {}

impl FromStr for EnforcementLevel {
    type Err = ParseEnforcementLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "advisory" => Ok(EnforcementLevel::Advisory),
            "mandatory" => Ok(EnforcementLevel::Mandatory),
            "remediate" => Ok(EnforcementLevel::Remediate),
            "disabled" => Ok(EnforcementLevel::Disabled),
            other => Err(ParseEnforcementLevelError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_level_and_rejects_others() {
        for level in [
            EnforcementLevel::Advisory,
            EnforcementLevel::Mandatory,
            EnforcementLevel::Remediate,
            EnforcementLevel::Disabled,
        ] {
            assert_eq!(level.as_str().parse::<EnforcementLevel>(), Ok(level));
        }
        assert!("warning".parse::<EnforcementLevel>().is_err());
    }

    #[test]
    fn remediate_escalates_for_violations() {
        assert_eq!(
            EnforcementLevel::Remediate.for_violation(),
            EnforcementLevel::Mandatory
        );
        assert_eq!(
            EnforcementLevel::Advisory.for_violation(),
            EnforcementLevel::Advisory
        );
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&EnforcementLevel::Mandatory).unwrap();
        assert_eq!(json, "\"mandatory\"");
    }
}
