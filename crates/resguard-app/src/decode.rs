//! Wire requests to domain views.

use anyhow::Context;
use resguard_domain::{ProviderView, ResourceView, StackEntry, StackView};
use resguard_props::{DecodeOptions, decode_properties};
use resguard_types::{AnalyzeRequest, AnalyzeStackRequest, AnalyzerResource, ProviderResource};

/// Decode a single-resource request.
///
/// Analysis decodes with secrets unwrapped; remediation keeps them so they survive re-encoding.
pub fn resource_view(req: &AnalyzeRequest, opts: DecodeOptions) -> anyhow::Result<ResourceView> {
    let properties = decode_properties(&req.properties, opts)
        .with_context(|| format!("decode properties of {}", req.urn))?;
    let mut view = ResourceView::new(&req.resource_type, &req.name, &req.urn, properties)
        .with_options(req.options.clone());
    if let Some(provider) = &req.provider {
        view = view.with_provider(provider_view(provider, opts)?);
    }
    Ok(view)
}

/// Decode a stack request, resolving references between its resources.
pub fn stack_view(req: &AnalyzeStackRequest) -> anyhow::Result<StackView> {
    let entries = req
        .resources
        .iter()
        .map(stack_entry)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(StackView::resolve(entries, req.tags.clone()))
}

fn stack_entry(r: &AnalyzerResource) -> anyhow::Result<StackEntry> {
    let opts = DecodeOptions::default();
    let properties = decode_properties(&r.properties, opts)
        .with_context(|| format!("decode properties of {}", r.urn))?;
    let mut resource = ResourceView::new(&r.resource_type, &r.name, &r.urn, properties)
        .with_options(r.options.clone());
    if let Some(provider) = &r.provider {
        resource = resource.with_provider(provider_view(provider, opts)?);
    }
    Ok(StackEntry {
        resource,
        parent: r.parent.clone(),
        dependencies: r.dependencies.clone(),
        property_dependencies: r.property_dependencies.clone(),
    })
}

fn provider_view(p: &ProviderResource, opts: DecodeOptions) -> anyhow::Result<ProviderView> {
    let properties = decode_properties(&p.properties, opts)
        .with_context(|| format!("decode properties of provider {}", p.urn))?;
    Ok(ProviderView::new(&p.resource_type, &p.name, &p.urn, properties))
}
