use resguard_props::{Guarded, PropertyMap, PropertyValue, guard};
use resguard_types::ResourceOptions;
use std::collections::BTreeMap;

static EMPTY: PropertyMap = PropertyMap::new();

/// A resource as policies see it, properties already decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceView {
    pub resource_type: String,
    pub name: String,
    pub urn: String,
    /// Always a map.
    properties: PropertyValue,
    pub options: ResourceOptions,
    pub provider: Option<ProviderView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProviderView {
    pub resource_type: String,
    pub name: String,
    pub urn: String,
    properties: PropertyValue,
}

impl ResourceView {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        urn: impl Into<String>,
        properties: PropertyMap,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            urn: urn.into(),
            properties: PropertyValue::Map(properties),
            options: ResourceOptions::default(),
            provider: None,
        }
    }

    pub fn with_options(mut self, options: ResourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_provider(mut self, provider: ProviderView) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Properties behind the unknown-value guard.
    pub fn props(&self) -> Guarded<'_> {
        guard(&self.properties)
    }

    /// Properties without any check, sentinels included.
    pub fn properties(&self) -> &PropertyMap {
        self.properties.as_map().unwrap_or(&EMPTY)
    }

    pub(crate) fn replace_properties(&mut self, properties: PropertyMap) {
        self.properties = PropertyValue::Map(properties);
    }
}

impl ProviderView {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        urn: impl Into<String>,
        properties: PropertyMap,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            urn: urn.into(),
            properties: PropertyValue::Map(properties),
        }
    }

    pub fn props(&self) -> Guarded<'_> {
        guard(&self.properties)
    }

    pub fn properties(&self) -> &PropertyMap {
        self.properties.as_map().unwrap_or(&EMPTY)
    }
}

/// A stack member before its references are resolved; references are urns.
#[derive(Clone, Debug)]
pub struct StackEntry {
    pub resource: ResourceView,
    pub parent: Option<String>,
    pub dependencies: Vec<String>,
    pub property_dependencies: BTreeMap<String, Vec<String>>,
}

impl StackEntry {
    pub fn new(resource: ResourceView) -> Self {
        Self {
            resource,
            parent: None,
            dependencies: Vec::new(),
            property_dependencies: BTreeMap::new(),
        }
    }
}

/// A stack member; references point at other members of the same stack.
#[derive(Clone, Debug)]
pub struct StackResource {
    pub resource: ResourceView,
    parent: Option<usize>,
    dependencies: Vec<usize>,
    property_dependencies: BTreeMap<String, Vec<usize>>,
}

impl std::ops::Deref for StackResource {
    type Target = ResourceView;

    fn deref(&self) -> &ResourceView {
        &self.resource
    }
}

/// Every resource of one stack operation, plus the stack's tags.
#[derive(Clone, Debug, Default)]
pub struct StackView {
    resources: Vec<StackResource>,
    tags: BTreeMap<String, String>,
}

impl StackView {
    /// Resolve urn references against the entries themselves.
    ///
    /// References to urns outside the stack are dropped. With duplicate urns the first entry wins.
    pub fn resolve(entries: Vec<StackEntry>, tags: BTreeMap<String, String>) -> Self {
        let mut by_urn: BTreeMap<String, usize> = BTreeMap::new();
        for (i, e) in entries.iter().enumerate() {
            by_urn.entry(e.resource.urn.clone()).or_insert(i);
        }
        let lookup = |urns: &[String]| -> Vec<usize> {
            urns.iter().filter_map(|u| by_urn.get(u).copied()).collect()
        };

        let resources = entries
            .into_iter()
            .map(|e| StackResource {
                parent: e.parent.as_ref().and_then(|u| by_urn.get(u).copied()),
                dependencies: lookup(&e.dependencies),
                property_dependencies: e
                    .property_dependencies
                    .iter()
                    .map(|(k, urns)| (k.clone(), lookup(urns)))
                    .collect(),
                resource: e.resource,
            })
            .collect();

        Self { resources, tags }
    }

    pub fn resources(&self) -> &[StackResource] {
        &self.resources
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn find(&self, urn: &str) -> Option<&StackResource> {
        self.resources.iter().find(|r| r.resource.urn == urn)
    }

    pub fn parent(&self, resource: &StackResource) -> Option<&StackResource> {
        resource.parent.and_then(|i| self.resources.get(i))
    }

    pub fn dependencies<'a>(
        &'a self,
        resource: &'a StackResource,
    ) -> impl Iterator<Item = &'a StackResource> + 'a {
        resource
            .dependencies
            .iter()
            .filter_map(|&i| self.resources.get(i))
    }

    /// Resources the given property's value depends on.
    pub fn property_dependencies<'a>(
        &'a self,
        resource: &'a StackResource,
        property: &str,
    ) -> impl Iterator<Item = &'a StackResource> + use<'a> {
        resource
            .property_dependencies
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| self.resources.get(i))
    }

    /// Names of the properties that carry dependency information.
    pub fn dependent_properties<'a>(
        &self,
        resource: &'a StackResource,
    ) -> impl Iterator<Item = &'a str> + 'a {
        resource.property_dependencies.keys().map(String::as_str)
    }
}
