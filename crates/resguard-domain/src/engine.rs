use crate::args::{RemediationArgs, ResourceValidationArgs, StackValidationArgs};
use crate::error::{AnalyzeError, PolicyError};
use crate::model::{ResourceView, StackView};
use crate::pack::PolicyPack;
use crate::policy::{EffectiveConfig, Policy, PolicyMeta};
use crate::report::{
    AnalyzeReport, RemediateReport, RemediationRecord, Violation, ViolationReporter,
    violation_message,
};
use resguard_props::{PropertyValue, UnknownValueError, resolve};
use resguard_types::{Diagnostic, EnforcementLevel, NotApplicable, ids};
use tracing::{debug, error, warn};

/// Validate one resource against every resource policy of the pack.
///
/// Stack policies are skipped. Policies run sequentially in declaration order and the
/// report keeps that order.
pub async fn analyze(
    pack: &PolicyPack,
    resource: &ResourceView,
    cfg: &EffectiveConfig,
) -> Result<AnalyzeReport, AnalyzeError> {
    let mut report = AnalyzeReport::default();

    for policy in pack.policies() {
        let Policy::Resource(policy) = policy else {
            continue;
        };
        let meta = &policy.meta;
        let level = pack.level_for(meta, cfg);
        if level.is_disabled() {
            debug!(
                policy = %meta.name,
                pack = pack.name(),
                urn = %resource.urn,
                "policy disabled; skipping"
            );
            continue;
        }
        if !policy.filter.matches(resource) {
            debug!(
                policy = %meta.name,
                pack = pack.name(),
                urn = %resource.urn,
                level = %level,
                "resource not matched by filter"
            );
            report
                .not_applicable
                .push(NotApplicable::new(&meta.name, ids::REASON_TYPE_MISMATCH));
            continue;
        }
        if policy.validations.is_empty() {
            report
                .not_applicable
                .push(NotApplicable::new(&meta.name, ids::REASON_NO_VALIDATION));
            continue;
        }

        let args = ResourceValidationArgs::new(resource, cfg.properties(&meta.name));
        let mut run = PolicyRun::new(pack, meta, level, Some(&resource.urn));
        let mut opted_out = None;
        for validation in &policy.validations {
            let reporter = ViolationReporter::new();
            let outcome = validation.validate(&args, &reporter).await;
            run.record(reporter.into_violations());
            match run.settle(outcome)? {
                Settled::Continue => {}
                Settled::Stop => break,
                Settled::NotApplicable(reason) => {
                    opted_out = Some(reason);
                    break;
                }
            }
        }
        run.finish(&mut report, opted_out);
    }

    Ok(report)
}

/// Validate a whole stack against every stack policy of the pack.
pub async fn analyze_stack(
    pack: &PolicyPack,
    stack: &StackView,
    cfg: &EffectiveConfig,
) -> Result<AnalyzeReport, AnalyzeError> {
    let mut report = AnalyzeReport::default();

    for policy in pack.policies() {
        let Policy::Stack(policy) = policy else {
            continue;
        };
        let meta = &policy.meta;
        let level = pack.level_for(meta, cfg);
        if level.is_disabled() {
            debug!(policy = %meta.name, pack = pack.name(), "policy disabled; skipping");
            continue;
        }

        let args = StackValidationArgs::new(stack, cfg.properties(&meta.name));
        let mut run = PolicyRun::new(pack, meta, level, None);
        let reporter = ViolationReporter::new();
        let outcome = policy.validation.validate(&args, &reporter).await;
        run.record(reporter.into_violations());
        let opted_out = match run.settle(outcome)? {
            Settled::NotApplicable(reason) => Some(reason),
            Settled::Continue | Settled::Stop => None,
        };
        run.finish(&mut report, opted_out);
    }

    Ok(report)
}

/// Run every applicable remediation in declaration order, each seeing the previous one's output.
///
/// `resource` should be decoded with secrets kept so they survive the round trip.
pub async fn remediate(
    pack: &PolicyPack,
    resource: &ResourceView,
    cfg: &EffectiveConfig,
) -> Result<RemediateReport, AnalyzeError> {
    let mut current = resource.clone();
    let mut report = RemediateReport::default();
    let mut changed = false;

    for policy in pack.policies() {
        let meta = policy.meta();
        let level = pack.level_for(meta, cfg);
        if level.is_disabled() {
            debug!(
                policy = %meta.name,
                pack = pack.name(),
                urn = %current.urn,
                "policy disabled; skipping"
            );
            continue;
        }
        let policy = match policy {
            Policy::Resource(p) => p,
            Policy::Stack(_) => {
                report
                    .not_applicable
                    .push(NotApplicable::new(&meta.name, ids::REASON_NO_REMEDIATION));
                continue;
            }
        };
        if !policy.filter.matches(&current) {
            report
                .not_applicable
                .push(NotApplicable::new(&meta.name, ids::REASON_TYPE_MISMATCH));
            continue;
        }
        let Some(remediation) = &policy.remediation else {
            report
                .not_applicable
                .push(NotApplicable::new(&meta.name, ids::REASON_NO_REMEDIATION));
            continue;
        };

        let outcome = {
            let mut args = RemediationArgs::new(&current, cfg.properties(&meta.name));
            remediation.remediate(&mut args).await
        };

        let pending = match outcome {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                debug!(
                    policy = %meta.name,
                    pack = pack.name(),
                    urn = %current.urn,
                    "remediation made no change"
                );
                continue;
            }
            Err(PolicyError::NotApplicable(reason)) => {
                report
                    .not_applicable
                    .push(NotApplicable::new(&meta.name, reason));
                continue;
            }
            Err(PolicyError::UnknownValue(err)) => {
                warn!(
                    policy = %meta.name,
                    pack = pack.name(),
                    urn = %current.urn,
                    path = %err.dotted_path(),
                    "unknown value stopped remediation"
                );
                report
                    .remediations
                    .push(failed_record(meta, unknown_value_message(pack, meta, &err)));
                continue;
            }
            Err(err @ PolicyError::Assertion { .. }) => {
                report.remediations.push(failed_record(
                    meta,
                    violation_message(&meta.description, &err.to_string()),
                ));
                continue;
            }
            Err(source) => {
                error!(
                    policy = %meta.name,
                    pack = pack.name(),
                    urn = %current.urn,
                    error = %source,
                    "remediation failed"
                );
                return Err(AnalyzeError::Policy {
                    policy: meta.name.clone(),
                    pack: pack.name().to_string(),
                    source,
                });
            }
        };

        let resolved = resolve(pending)
            .await
            .map_err(|source| AnalyzeError::Remediation {
                policy: meta.name.clone(),
                source,
            })?;
        match resolved {
            None | Some(PropertyValue::Null) => {
                debug!(
                    policy = %meta.name,
                    pack = pack.name(),
                    urn = %current.urn,
                    "remediation made no change"
                );
            }
            Some(PropertyValue::Map(properties)) => {
                debug!(
                    policy = %meta.name,
                    pack = pack.name(),
                    urn = %current.urn,
                    level = %level,
                    "resource remediated"
                );
                report.remediations.push(RemediationRecord {
                    policy_name: meta.name.clone(),
                    description: meta.description.clone(),
                    properties: Some(properties.clone()),
                    diagnostic: None,
                });
                current.replace_properties(properties);
                changed = true;
            }
            Some(_) => {
                return Err(AnalyzeError::InvalidRemediation {
                    policy: meta.name.clone(),
                });
            }
        }
    }

    if changed {
        report.properties = Some(current.properties().clone());
    }
    Ok(report)
}

fn failed_record(meta: &PolicyMeta, diagnostic: String) -> RemediationRecord {
    RemediationRecord {
        policy_name: meta.name.clone(),
        description: meta.description.clone(),
        properties: None,
        diagnostic: Some(diagnostic),
    }
}

fn unknown_value_message(
    pack: &PolicyPack,
    meta: &PolicyMeta,
    err: &UnknownValueError,
) -> String {
    format!(
        "can't run policy '{}' from policy pack '{}' during preview: {err}",
        meta.name,
        pack.name()
    )
}

enum Settled {
    Continue,
    Stop,
    NotApplicable(String),
}

/// Diagnostics of one policy on one resource (or stack), held back until the policy is done
/// so that an opt-out can discard them.
struct PolicyRun<'a> {
    pack: &'a PolicyPack,
    meta: &'a PolicyMeta,
    level: EnforcementLevel,
    /// Resource every diagnostic is attributed to; `None` for stack runs.
    urn: Option<&'a str>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> PolicyRun<'a> {
    fn new(
        pack: &'a PolicyPack,
        meta: &'a PolicyMeta,
        level: EnforcementLevel,
        urn: Option<&'a str>,
    ) -> Self {
        Self {
            pack,
            meta,
            level,
            urn,
            diagnostics: Vec::new(),
        }
    }

    fn diagnostic(
        &self,
        policy_name: String,
        description: String,
        message: String,
        level: EnforcementLevel,
        urn: Option<String>,
    ) -> Diagnostic {
        Diagnostic {
            policy_name,
            policy_pack_name: self.pack.name().to_string(),
            policy_pack_version: self.pack.version().to_string(),
            description,
            message,
            // A violation that survives remediation is not advisory.
            enforcement_level: level.for_violation(),
            urn,
        }
    }

    fn record(&mut self, violations: Vec<Violation>) {
        for v in violations {
            let level = v.enforcement_level.unwrap_or(self.level);
            if level.is_disabled() {
                continue;
            }
            let urn = match self.urn {
                Some(urn) => Some(urn.to_string()),
                None => v.urn.filter(|u| !u.is_empty()),
            };
            let description = v.description.unwrap_or_else(|| self.meta.description.clone());
            let message = violation_message(&description, &v.message);
            let policy_name = v.policy_name.unwrap_or_else(|| self.meta.name.clone());
            let d = self.diagnostic(policy_name, description, message, level, urn);
            self.diagnostics.push(d);
        }
    }

    fn settle(&mut self, outcome: Result<(), PolicyError>) -> Result<Settled, AnalyzeError> {
        let urn = self.urn.unwrap_or_default();
        match outcome {
            Ok(()) => Ok(Settled::Continue),
            Err(PolicyError::NotApplicable(reason)) => {
                debug!(
                    policy = %self.meta.name,
                    pack = self.pack.name(),
                    urn,
                    %reason,
                    "policy opted out"
                );
                Ok(Settled::NotApplicable(reason))
            }
            Err(PolicyError::UnknownValue(err)) => {
                warn!(
                    policy = %self.meta.name,
                    pack = self.pack.name(),
                    urn,
                    level = %self.level,
                    path = %err.dotted_path(),
                    "unknown value stopped policy"
                );
                let d = self.diagnostic(
                    self.meta.name.clone(),
                    self.meta.description.clone(),
                    unknown_value_message(self.pack, self.meta, &err),
                    self.level,
                    self.urn.map(str::to_string),
                );
                self.diagnostics.push(d);
                Ok(Settled::Stop)
            }
            Err(err @ PolicyError::Assertion { .. }) => {
                self.record(vec![Violation::new(err.to_string())]);
                Ok(Settled::Stop)
            }
            Err(source) => {
                error!(
                    policy = %self.meta.name,
                    pack = self.pack.name(),
                    urn,
                    error = %source,
                    "policy failed"
                );
                Err(AnalyzeError::Policy {
                    policy: self.meta.name.clone(),
                    pack: self.pack.name().to_string(),
                    source,
                })
            }
        }
    }

    fn finish(self, report: &mut AnalyzeReport, opted_out: Option<String>) {
        match opted_out {
            Some(reason) => report
                .not_applicable
                .push(NotApplicable::new(&self.meta.name, reason)),
            None => report.diagnostics.extend(self.diagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicySettings, ResourceFilter, ResourcePolicy, StackPolicy};
    use crate::test_support::{Calls, pack, props, resource, stack};
    use resguard_props::{PendingValue, SECRET_SIG, SIG_KEY, SecretView, UnknownKind};
    use serde_json::json;

    fn bad_when_state_is_one() -> ResourcePolicy {
        ResourcePolicy::new("state-check", "State must not be 1")
            .enforcement_level(EnforcementLevel::Mandatory)
            .filter(ResourceFilter::of_type("R"))
            .validate_fn(|args, report| {
                if args.props().get("state")?.and_then(|s| s.as_i64()) == Some(1) {
                    report.report("bad");
                }
                Ok(())
            })
    }

    #[tokio::test]
    async fn violating_resource_yields_one_diagnostic() {
        let pack = pack(vec![bad_when_state_is_one().into()]);
        let r = resource("R", json!({"state": 1}));

        let report = analyze(&pack, &r, &EffectiveConfig::default()).await.unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        let d = &report.diagnostics[0];
        assert!(d.message.ends_with("bad"));
        assert_eq!(d.message, "State must not be 1\nbad");
        assert_eq!(d.enforcement_level, EnforcementLevel::Mandatory);
        assert_eq!(d.urn.as_deref(), Some(r.urn.as_str()));
        assert_eq!(d.policy_pack_name, "test-pack");
        assert!(report.not_applicable.is_empty());
    }

    #[tokio::test]
    async fn compliant_resource_yields_nothing() {
        let pack = pack(vec![bad_when_state_is_one().into()]);
        let r = resource("R", json!({"state": 2}));

        let report = analyze(&pack, &r, &EffectiveConfig::default()).await.unwrap();
        assert!(report.diagnostics.is_empty());
        assert!(report.not_applicable.is_empty());
    }

    #[tokio::test]
    async fn filtered_out_resource_is_not_applicable_and_never_invoked() {
        let calls = Calls::default();
        let counter = calls.clone();
        let policy = ResourcePolicy::new("foo-only", "d")
            .filter(ResourceFilter::of_type("Foo"))
            .validate_fn(move |_, report| {
                counter.hit();
                report.report("never");
                Ok(())
            });
        let pack = pack(vec![policy.into()]);

        let report = analyze(&pack, &resource("Bar", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert!(report.diagnostics.is_empty());
        assert_eq!(
            report.not_applicable,
            vec![NotApplicable::new("foo-only", ids::REASON_TYPE_MISMATCH)]
        );
        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn disabled_policies_never_run() {
        let calls = Calls::default();
        let counter = calls.clone();
        let policy = ResourcePolicy::new("off", "d")
            .enforcement_level(EnforcementLevel::Disabled)
            .filter(ResourceFilter::of_type("Foo"))
            .validate_fn(move |_, _| {
                counter.hit();
                Ok(())
            });
        let pack = pack(vec![policy.into()]);

        // Not even applicability is reported.
        let report = analyze(&pack, &resource("Bar", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert_eq!(report, AnalyzeReport::default());
        let report = remediate(&pack, &resource("Foo", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert_eq!(report, RemediateReport::default());
        assert_eq!(calls.count(), 0);
    }

    #[tokio::test]
    async fn configured_level_overrides_policy_level() {
        let pack = pack(vec![bad_when_state_is_one().into()]);
        let mut cfg = EffectiveConfig::default();
        cfg.policies.insert(
            "state-check".into(),
            PolicySettings {
                enforcement_level: Some(EnforcementLevel::Advisory),
                properties: Default::default(),
            },
        );

        let report = analyze(&pack, &resource("R", json!({"state": 1})), &cfg)
            .await
            .unwrap();
        assert_eq!(report.diagnostics[0].enforcement_level, EnforcementLevel::Advisory);
    }

    #[tokio::test]
    async fn remediate_level_violations_escalate_to_mandatory() {
        let resource_policy = ResourcePolicy::new("r", "d")
            .enforcement_level(EnforcementLevel::Remediate)
            .validate_fn(|_, report| {
                report.report("still wrong");
                Ok(())
            });
        let stack_policy = StackPolicy::from_fn("s", "d", |_, report| {
            report.report("stack wrong");
            Ok(())
        })
        .enforcement_level(EnforcementLevel::Remediate);
        let pack = pack(vec![resource_policy.into(), stack_policy.into()]);
        let cfg = EffectiveConfig::default();

        let report = analyze(&pack, &resource("T", json!({})), &cfg).await.unwrap();
        assert_eq!(report.diagnostics[0].enforcement_level, EnforcementLevel::Mandatory);

        let report = analyze_stack(&pack, &stack(vec![]), &cfg).await.unwrap();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].enforcement_level, EnforcementLevel::Mandatory);
        assert_eq!(report.diagnostics[0].urn, None);
    }

    #[tokio::test]
    async fn unknown_values_become_a_diagnostic_without_stopping_siblings() {
        let reads_unknown = ResourcePolicy::new("reads-ip", "Checks the ip")
            .enforcement_level(EnforcementLevel::Mandatory)
            .validate_fn(|args, _| {
                args.props().get("ip")?;
                Ok(())
            });
        let pack = pack(vec![reads_unknown.into(), bad_when_state_is_one().into()]);
        let r = resource(
            "R",
            json!({"state": 1, "ip": UnknownKind::String.sentinel()}),
        );

        let report = analyze(&pack, &r, &EffectiveConfig::default()).await.unwrap();
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(
            report.diagnostics[0].message,
            "can't run policy 'reads-ip' from policy pack 'test-pack' during preview: \
             string value at .ip can't be known during preview"
        );
        assert_eq!(report.diagnostics[0].enforcement_level, EnforcementLevel::Mandatory);
        assert_eq!(report.diagnostics[1].policy_name, "state-check");
    }

    #[tokio::test]
    async fn assertion_failures_are_violations() {
        let policy = ResourcePolicy::new("asserts", "Must be private").validate_fn(|args, _| {
            let acl = args.props().get("acl")?.and_then(|v| v.as_str().map(str::to_string));
            crate::error::ensure_eq(acl.as_deref(), Some("private"))
        });
        let pack = pack(vec![policy.into()]);

        let report = analyze(
            &pack,
            &resource("T", json!({"acl": "public"})),
            &EffectiveConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            report.diagnostics[0].message,
            "Must be private\nexpected Some(\"private\"), but got Some(\"public\")"
        );
    }

    #[tokio::test]
    async fn other_errors_abort_the_call_naming_the_policy() {
        let fine = ResourcePolicy::new("fine", "d").validate_fn(|_, r| {
            r.report("x");
            Ok(())
        });
        let broken =
            ResourcePolicy::new("broken", "d").validate_fn(|_, _| Err(PolicyError::other("boom")));
        let pack = pack(vec![fine.into(), broken.into()]);

        let err = analyze(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.policy(), "broken");
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn opting_out_discards_the_policys_diagnostics() {
        let policy = ResourcePolicy::new("opts-out", "d")
            .validate_fn(|_, r| {
                r.report("first validation");
                Ok(())
            })
            .validate_fn(|_, _| Err(PolicyError::not_applicable("only for prod")));
        let pack = pack(vec![policy.into()]);

        let report = analyze(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert!(report.diagnostics.is_empty());
        assert_eq!(
            report.not_applicable,
            vec![NotApplicable::new("opts-out", "only for prod")]
        );
    }

    #[tokio::test]
    async fn validations_run_in_order_and_report_multiple_times() {
        let policy = ResourcePolicy::new("multi", "d")
            .validate_fn(|_, r| {
                r.report("a");
                r.report("b");
                Ok(())
            })
            .validate_fn(|_, r| {
                r.report("c");
                Ok(())
            });
        let pack = pack(vec![policy.into()]);

        let report = analyze(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        let messages: Vec<_> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["d\na", "d\nb", "d\nc"]);
    }

    #[tokio::test]
    async fn structured_violations_override_identity_but_not_resource_urn() {
        let policy = ResourcePolicy::new("parent", "Parent description").validate_fn(|_, r| {
            r.report(
                Violation::new("sub finding")
                    .policy_name("parent/sub")
                    .description("Sub description")
                    .enforcement_level(EnforcementLevel::Mandatory)
                    .urn("urn:other"),
            );
            Ok(())
        });
        let pack = pack(vec![policy.into()]);
        let r = resource("T", json!({}));

        let report = analyze(&pack, &r, &EffectiveConfig::default()).await.unwrap();
        let d = &report.diagnostics[0];
        assert_eq!(d.policy_name, "parent/sub");
        assert_eq!(d.description, "Sub description");
        assert_eq!(d.message, "Sub description\nsub finding");
        assert_eq!(d.enforcement_level, EnforcementLevel::Mandatory);
        assert_eq!(d.urn.as_deref(), Some(r.urn.as_str()));
    }

    #[tokio::test]
    async fn stack_violations_name_the_offending_resource() {
        let policy = StackPolicy::from_fn("stack", "d", |args, r| {
            for res in args.resources() {
                if res.props().get("public")?.and_then(|v| v.as_bool()) == Some(true) {
                    r.report_for("public", res.urn.clone());
                }
            }
            r.report(Violation::new("whole stack").urn(""));
            Ok(())
        });
        let pack = pack(vec![policy.into()]);
        let s = stack(vec![
            resource("T", json!({"public": true})),
            resource("T", json!({"public": false})),
        ]);

        let report = analyze_stack(&pack, &s, &EffectiveConfig::default())
            .await
            .unwrap();
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(
            report.diagnostics[0].urn.as_deref(),
            Some(s.resources()[0].urn.as_str())
        );
        assert_eq!(report.diagnostics[1].urn, None);
    }

    #[tokio::test]
    async fn resource_and_stack_calls_skip_each_others_policies() {
        let calls = Calls::default();
        let (a, b) = (calls.clone(), calls.clone());
        let resource_policy = ResourcePolicy::new("r", "d").validate_fn(move |_, _| {
            a.hit();
            Ok(())
        });
        let stack_policy = StackPolicy::from_fn("s", "d", move |_, _| {
            b.hit();
            Ok(())
        });
        let pack = pack(vec![resource_policy.into(), stack_policy.into()]);
        let cfg = EffectiveConfig::default();

        let report = analyze(&pack, &resource("T", json!({})), &cfg).await.unwrap();
        assert!(report.not_applicable.is_empty());
        assert_eq!(calls.count(), 1);

        let report = analyze_stack(&pack, &stack(vec![]), &cfg).await.unwrap();
        assert!(report.not_applicable.is_empty());
        assert_eq!(calls.count(), 2);
    }

    #[tokio::test]
    async fn remediation_chain_preserves_secrets() {
        let rotate = ResourcePolicy::new("rotate", "Rotates the password").remediate_fn(|args| {
            let mut view = args.props();
            view.set("password", "new")?;
            Ok(Some(view.into()))
        });
        let tag = ResourcePolicy::new("tag", "Adds a tag").remediate_fn(|args| {
            let mut view = args.props();
            assert_eq!(view.get("password").as_deref(), Some(&PropertyValue::from("new")));
            view.set("tagged", true)?;
            Ok(Some(PendingValue::from(SecretView::into_target(view).clone())))
        });
        let pack = pack(vec![rotate.into(), tag.into()]);
        let r = crate::test_support::resource_keep_secrets(
            "T",
            json!({"password": {SIG_KEY: SECRET_SIG, "value": "old"}}),
        );

        let report = remediate(&pack, &r, &EffectiveConfig::default()).await.unwrap();
        assert_eq!(report.remediations.len(), 2);
        let props = report.properties.unwrap();
        assert_eq!(props["password"], PropertyValue::secret("new".into()));
        assert_eq!(props["tagged"], PropertyValue::from(true));
    }

    #[tokio::test]
    async fn remediation_without_result_discards_edits() {
        let policy = ResourcePolicy::new("noop", "d").remediate_fn(|args| {
            args.props().set("x", 1)?;
            Ok(None)
        });
        let pack = pack(vec![policy.into()]);

        let report = remediate(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert!(report.remediations.is_empty());
        assert_eq!(report.properties, None);
    }

    #[tokio::test]
    async fn remediate_calls_mark_policies_without_remediation() {
        let validate_only = ResourcePolicy::new("v", "d").validate_fn(|_, _| Ok(()));
        let filtered = ResourcePolicy::new("f", "d")
            .filter(ResourceFilter::of_type("Other"))
            .remediate_fn(|_| Ok(None));
        let stack_policy = StackPolicy::from_fn("s", "d", |_, _| Ok(()));
        let pack = pack(vec![
            validate_only.into(),
            filtered.into(),
            stack_policy.into(),
        ]);

        let report = remediate(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert_eq!(
            report.not_applicable,
            vec![
                NotApplicable::new("v", ids::REASON_NO_REMEDIATION),
                NotApplicable::new("f", ids::REASON_TYPE_MISMATCH),
                NotApplicable::new("s", ids::REASON_NO_REMEDIATION),
            ]
        );
    }

    #[tokio::test]
    async fn validate_calls_mark_remediation_only_policies() {
        let policy = ResourcePolicy::new("fix", "d").remediate_fn(|_| Ok(None));
        let pack = pack(vec![policy.into()]);

        let report = analyze(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert_eq!(
            report.not_applicable,
            vec![NotApplicable::new("fix", ids::REASON_NO_VALIDATION)]
        );
    }

    #[tokio::test]
    async fn recoverable_remediation_failures_leave_properties_alone() {
        let policy = ResourcePolicy::new("needs-ip", "d").remediate_fn(|args| {
            args.guarded().get("ip")?;
            Ok(Some(PendingValue::from(args.properties())))
        });
        let pack = pack(vec![policy.into()]);
        let r = resource("T", json!({"ip": UnknownKind::String.sentinel()}));

        let report = remediate(&pack, &r, &EffectiveConfig::default()).await.unwrap();
        assert_eq!(report.properties, None);
        let record = &report.remediations[0];
        assert_eq!(record.properties, None);
        assert!(
            record
                .diagnostic
                .as_deref()
                .unwrap()
                .ends_with("string value at .ip can't be known during preview")
        );
    }

    #[tokio::test]
    async fn remediation_assertions_become_diagnostics() {
        let strict = ResourcePolicy::new("strict", "Size must be 10")
            .remediate_fn(|_| Err(PolicyError::assertion(10, 3)));
        let tagger = ResourcePolicy::new("tagger", "d").remediate_fn(|args| {
            args.props().set("tagged", true)?;
            Ok(Some(PendingValue::from(args.properties())))
        });
        let pack = pack(vec![strict.into(), tagger.into()]);

        let report = remediate(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap();
        assert_eq!(report.remediations.len(), 2);
        let record = &report.remediations[0];
        assert_eq!(record.policy_name, "strict");
        assert_eq!(record.properties, None);
        assert_eq!(
            record.diagnostic.as_deref(),
            Some("Size must be 10\nexpected 10, but got 3")
        );
        assert_eq!(report.properties, Some(props(json!({"tagged": true}))));
    }

    #[tokio::test]
    async fn non_map_remediation_results_are_rejected() {
        let policy = ResourcePolicy::new("scalar", "d")
            .remediate_fn(|_| Ok(Some(PendingValue::from(PropertyValue::from("nope")))));
        let pack = pack(vec![policy.into()]);

        let err = remediate(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, AnalyzeError::InvalidRemediation { ref policy } if policy == "scalar")
        );
    }

    #[tokio::test]
    async fn unresolved_outputs_abort_remediation() {
        let policy = ResourcePolicy::new("lazy", "d").remediate_fn(|_| {
            let mut map = resguard_props::PendingMap::new();
            map.insert("arn".into(), PendingValue::Output("Output<string>".into()));
            Ok(Some(PendingValue::Map(map)))
        });
        let pack = pack(vec![policy.into()]);

        let err = remediate(&pack, &resource("T", json!({})), &EffectiveConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::Remediation { ref policy, .. } if policy == "lazy"));
    }

    #[tokio::test]
    async fn deferred_remediation_values_are_awaited() {
        let policy = ResourcePolicy::new("later", "d").remediate_fn(|args| {
            let mut map = resguard_props::PendingMap::new();
            for (k, v) in args.properties() {
                map.insert(k, v.into());
            }
            map.insert(
                "size".into(),
                PendingValue::deferred(async { PendingValue::Ready(10.into()) }),
            );
            Ok(Some(PendingValue::Map(map)))
        });
        let pack = pack(vec![policy.into()]);

        let report = remediate(
            &pack,
            &resource("T", json!({"name": "x"})),
            &EffectiveConfig::default(),
        )
        .await
        .unwrap();
        let expected = props(json!({"name": "x", "size": 10}));
        assert_eq!(report.properties, Some(expected));
    }
}
