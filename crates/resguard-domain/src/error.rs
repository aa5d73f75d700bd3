use resguard_props::{CodecError, UnknownValueError, ViewError};
use thiserror::Error;

/// Outcome of a policy callback other than success.
///
/// `NotApplicable`, `UnknownValue` and `Assertion` are recoverable and become records in the
/// report. Everything else aborts the call.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The callback opted out for this resource or stack.
    #[error("policy is not applicable: {0}")]
    NotApplicable(String),

    #[error(transparent)]
    UnknownValue(#[from] UnknownValueError),

    /// Assertion-style failure; reported as a violation with a generated message.
    #[error("{}", assertion_message(.expected, .actual, .message))]
    Assertion {
        expected: String,
        actual: String,
        message: Option<String>,
    },

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PolicyError {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        PolicyError::NotApplicable(reason.into())
    }

    /// An expectation that did not hold.
    pub fn assertion(expected: impl ToString, actual: impl ToString) -> Self {
        PolicyError::Assertion {
            expected: expected.to_string(),
            actual: actual.to_string(),
            message: None,
        }
    }

    /// Attach an author-supplied message to an assertion failure; no-op for other variants.
    pub fn with_message(self, text: impl Into<String>) -> Self {
        match self {
            PolicyError::Assertion {
                expected, actual, ..
            } => PolicyError::Assertion {
                expected,
                actual,
                message: Some(text.into()),
            },
            other => other,
        }
    }

    pub fn other(msg: impl std::fmt::Display) -> Self {
        PolicyError::Other(anyhow::anyhow!("{msg}"))
    }
}

fn assertion_message(expected: &str, actual: &str, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("expected {expected}, but got {actual}"),
    }
}

/// Fail when `actual != expected`, with an assertion-style error.
///
/// Shorthand for reporting a violation from inside a validation.
pub fn ensure_eq<T>(actual: T, expected: T) -> Result<(), PolicyError>
where
    T: PartialEq + std::fmt::Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(PolicyError::assertion(
            format!("{expected:?}"),
            format!("{actual:?}"),
        ))
    }
}

/// A policy pack that cannot be constructed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("invalid policy pack name {0:?}: expected 1-100 characters from [a-zA-Z0-9-_.]")]
    InvalidName(String),

    #[error("policy pack {0:?} declares no policies")]
    NoPolicies(String),

    #[error("policy name must not be empty")]
    EmptyPolicyName,

    #[error("policy name {0:?} is reserved")]
    ReservedPolicyName(String),

    #[error("duplicate policy name {0:?}")]
    DuplicatePolicyName(String),

    #[error("policy {0:?} has an empty description")]
    EmptyDescription(String),

    #[error("resource policy {0:?} declares neither a validation nor a remediation")]
    NoCallbacks(String),

    #[error("invalid config schema for policy {policy:?}: {reason}")]
    InvalidConfigSchema { policy: String, reason: String },
}

/// A call that could not be completed; no partial result is returned.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("error running policy '{policy}' from policy pack '{pack}': {source}")]
    Policy {
        policy: String,
        pack: String,
        #[source]
        source: PolicyError,
    },

    #[error("remediation from policy '{policy}' could not be resolved: {source}")]
    Remediation {
        policy: String,
        #[source]
        source: CodecError,
    },

    #[error("remediation from policy '{policy}' returned a non-map value")]
    InvalidRemediation { policy: String },
}

impl AnalyzeError {
    /// Name of the policy the failure is attributed to.
    pub fn policy(&self) -> &str {
        match self {
            AnalyzeError::Policy { policy, .. }
            | AnalyzeError::Remediation { policy, .. }
            | AnalyzeError::InvalidRemediation { policy } => policy,
        }
    }
}
