//! Stable strings that callers may match on.
//!
//! Reasons are attached to not-applicable records; changing one is a breaking change for
//! anything that filters on them.

/// Reported when a resource policy's type filter excludes the resource.
pub const REASON_TYPE_MISMATCH: &str = "Resource type does not match the policy's resource filter";

/// Reported when a remediate call reaches a policy without a remediation.
pub const REASON_NO_REMEDIATION: &str = "Policy does not implement remediation";

/// Reported when a validate call reaches a policy without validations.
pub const REASON_NO_VALIDATION: &str = "Policy does not implement validation";

/// Name the analyzer logs itself under at startup.
pub const TOOL_NAME: &str = "resguard";

/// Policy name that packs may not use; the orchestrator treats it as "every policy".
pub const RESERVED_POLICY_NAME: &str = "all";

/// Version a pack reports when none was supplied.
pub const DEFAULT_PACK_VERSION: &str = "0.0.1";
