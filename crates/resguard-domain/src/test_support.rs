use crate::model::{ResourceView, StackEntry, StackView};
use crate::pack::PolicyPack;
use crate::policy::Policy;
use resguard_props::{DecodeOptions, PropertyMap, decode_properties};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_NAME: AtomicUsize = AtomicUsize::new(0);

pub fn props(json: Value) -> PropertyMap {
    let Value::Object(map) = json else {
        panic!("properties must be a JSON object");
    };
    decode_properties(&map, DecodeOptions::default()).expect("decodable properties")
}

fn view(resource_type: &str, properties: PropertyMap) -> ResourceView {
    let name = format!("r{}", NEXT_NAME.fetch_add(1, Ordering::Relaxed));
    let urn = format!("urn:pulumi:dev::proj::{resource_type}::{name}");
    ResourceView::new(resource_type, name, urn, properties)
}

/// A resource with a unique name, decoded the way analyze calls decode.
pub fn resource(resource_type: &str, properties: Value) -> ResourceView {
    view(resource_type, props(properties))
}

/// A resource decoded the way remediate calls decode.
pub fn resource_keep_secrets(resource_type: &str, properties: Value) -> ResourceView {
    let Value::Object(map) = properties else {
        panic!("properties must be a JSON object");
    };
    let props =
        decode_properties(&map, DecodeOptions::keep_secrets()).expect("decodable properties");
    view(resource_type, props)
}

pub fn stack(resources: Vec<ResourceView>) -> StackView {
    StackView::resolve(
        resources.into_iter().map(StackEntry::new).collect(),
        BTreeMap::new(),
    )
}

pub fn pack(policies: Vec<Policy>) -> PolicyPack {
    PolicyPack::new("test-pack", None, policies, None).expect("valid pack")
}

/// Counts callback invocations across clones.
#[derive(Clone, Debug, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
