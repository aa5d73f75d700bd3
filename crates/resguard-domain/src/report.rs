use parking_lot::Mutex;
use resguard_props::PropertyMap;
use resguard_types::{Diagnostic, EnforcementLevel, NotApplicable};

/// One call to the violation reporter.
///
/// Every field other than the message falls back to the reporting policy's own value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Violation {
    pub message: String,
    pub urn: Option<String>,
    pub policy_name: Option<String>,
    pub description: Option<String>,
    pub enforcement_level: Option<EnforcementLevel>,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Name the offending resource. Ignored for resource policies.
    pub fn urn(mut self, urn: impl Into<String>) -> Self {
        self.urn = Some(urn.into());
        self
    }

    /// Report under a synthesized policy identity.
    pub fn policy_name(mut self, name: impl Into<String>) -> Self {
        self.policy_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn enforcement_level(mut self, level: EnforcementLevel) -> Self {
        self.enforcement_level = Some(level);
        self
    }
}

impl From<&str> for Violation {
    fn from(message: &str) -> Self {
        Violation::new(message)
    }
}

impl From<String> for Violation {
    fn from(message: String) -> Self {
        Violation::new(message)
    }
}

/// Collects violations reported by a single callback invocation.
#[derive(Debug, Default)]
pub struct ViolationReporter {
    reported: Mutex<Vec<Violation>>,
}

impl ViolationReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, violation: impl Into<Violation>) {
        self.reported.lock().push(violation.into());
    }

    /// Shorthand for a message naming the offending resource.
    pub fn report_for(&self, message: impl Into<String>, urn: impl Into<String>) {
        self.report(Violation::new(message).urn(urn));
    }

    pub fn is_empty(&self) -> bool {
        self.reported.lock().is_empty()
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.reported.into_inner()
    }
}

/// `description`, then the message on its own line when there is one.
pub fn violation_message(description: &str, message: &str) -> String {
    if message.is_empty() {
        description.to_string()
    } else {
        format!("{description}\n{message}")
    }
}

/// Result of a validate-kind call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalyzeReport {
    pub diagnostics: Vec<Diagnostic>,
    pub not_applicable: Vec<NotApplicable>,
}

/// One policy's contribution to a remediate call.
#[derive(Clone, Debug, PartialEq)]
pub struct RemediationRecord {
    pub policy_name: String,
    pub description: String,
    /// Properties after this remediation; `None` when it failed recoverably.
    pub properties: Option<PropertyMap>,
    pub diagnostic: Option<String>,
}

/// Result of a remediate-kind call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemediateReport {
    pub remediations: Vec<RemediationRecord>,
    /// Final properties; `None` when no remediation changed the resource.
    pub properties: Option<PropertyMap>,
    pub not_applicable: Vec<NotApplicable>,
}
