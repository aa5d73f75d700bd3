use crate::decode::{resource_view, stack_view};
use crate::lifecycle::ServeLease;
use anyhow::Context;
use parking_lot::RwLock;
use resguard_domain::{EffectiveConfig, PolicyPack, RemediateReport};
use resguard_props::{DecodeOptions, encode_properties};
use resguard_types::{
    AnalyzeRequest, AnalyzeResponse, AnalyzeStackRequest, AnalyzerInfo, ConfigureRequest,
    PluginInfo, PolicyInfo, RemediateRequest, RemediateResponse, Remediation, ids,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Serves one policy pack to the transport collaborator.
///
/// Calls may run concurrently. Each call works on the configuration installed when it started;
/// a concurrent [`Analyzer::configure`] affects later calls only.
#[derive(Debug)]
pub struct Analyzer {
    pack: Arc<PolicyPack>,
    config: RwLock<Arc<EffectiveConfig>>,
    _lease: ServeLease,
}

impl Analyzer {
    /// The analyzer starts unconfigured: the pack's initial config is advertised in
    /// [`Analyzer::analyzer_info`] and takes effect once the orchestrator sends it back.
    pub fn new(pack: PolicyPack, lease: ServeLease) -> Self {
        info!(
            tool = ids::TOOL_NAME,
            pack = pack.name(),
            version = pack.version(),
            policies = pack.policies().len(),
            "serving policy pack"
        );
        Self {
            pack: Arc::new(pack),
            config: RwLock::new(Arc::new(EffectiveConfig::default())),
            _lease: lease,
        }
    }

    pub fn pack(&self) -> &PolicyPack {
        &self.pack
    }

    /// The configuration new calls will run with.
    pub fn config(&self) -> Arc<EffectiveConfig> {
        Arc::clone(&self.config.read())
    }

    pub async fn analyze(&self, req: &AnalyzeRequest) -> anyhow::Result<AnalyzeResponse> {
        let cfg = self.config();
        let resource =
            resource_view(req, DecodeOptions::default()).context("decode analyze request")?;
        let report = resguard_domain::analyze(&self.pack, &resource, &cfg)
            .await
            .with_context(|| format!("analyze {}", req.urn))?;
        Ok(AnalyzeResponse {
            diagnostics: report.diagnostics,
            not_applicable: report.not_applicable,
        })
    }

    pub async fn analyze_stack(
        &self,
        req: &AnalyzeStackRequest,
    ) -> anyhow::Result<AnalyzeResponse> {
        let cfg = self.config();
        let stack = stack_view(req).context("decode stack request")?;
        let report = resguard_domain::analyze_stack(&self.pack, &stack, &cfg)
            .await
            .context("analyze stack")?;
        Ok(AnalyzeResponse {
            diagnostics: report.diagnostics,
            not_applicable: report.not_applicable,
        })
    }

    pub async fn remediate(&self, req: &RemediateRequest) -> anyhow::Result<RemediateResponse> {
        let cfg = self.config();
        let resource = resource_view(req, DecodeOptions::keep_secrets())
            .context("decode remediate request")?;
        let report = resguard_domain::remediate(&self.pack, &resource, &cfg)
            .await
            .with_context(|| format!("remediate {}", req.urn))?;
        Ok(self.remediate_response(report))
    }

    fn remediate_response(&self, report: RemediateReport) -> RemediateResponse {
        let remediations = report
            .remediations
            .into_iter()
            .map(|r| Remediation {
                policy_name: r.policy_name,
                policy_pack_name: self.pack.name().to_string(),
                policy_pack_version: self.pack.version().to_string(),
                description: r.description,
                properties: r.properties.as_ref().map(encode_properties),
                diagnostic: r.diagnostic,
            })
            .collect();
        RemediateResponse {
            remediations,
            properties: report.properties.as_ref().map(encode_properties),
            not_applicable: report.not_applicable,
        }
    }

    /// Pack metadata as declared; runtime overrides are not reflected.
    pub fn analyzer_info(&self) -> AnalyzerInfo {
        let policies = self
            .pack
            .policies()
            .iter()
            .map(|p| {
                let meta = p.meta();
                PolicyInfo {
                    name: meta.name.clone(),
                    description: meta.description.clone(),
                    enforcement_level: self.pack.declared_level(meta),
                    config_schema: meta.config_schema.clone(),
                }
            })
            .collect();
        let initial_config = self
            .pack
            .initial_config()
            .iter()
            .filter(|(_, c)| c.enforcement_level.is_some() || c.properties.is_some())
            .map(|(name, c)| (name.clone(), c.clone()))
            .collect();
        AnalyzerInfo {
            name: self.pack.name().to_string(),
            version: self.pack.version().to_string(),
            supports_config: true,
            policies,
            initial_config,
        }
    }

    pub fn plugin_info(&self) -> PluginInfo {
        PluginInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Replace the whole runtime configuration.
    pub fn configure(&self, req: ConfigureRequest) {
        let cfg = resguard_settings::resolve_config(req);
        debug!(pack = self.pack.name(), policies = cfg.policies.len(), "configured");
        *self.config.write() = Arc::new(cfg);
    }
}
