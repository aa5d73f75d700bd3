use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A resource property as policies see it.
///
/// Secrecy and "not yet known" are variants rather than flags so that every consumer has to
/// decide what to do with them.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<PropertyValue>),
    Map(PropertyMap),
    /// Never wraps another secret or an unknown; use [`PropertyValue::secret`].
    Secret(Box<PropertyValue>),
    Asset(Asset),
    Archive(Archive),
    /// Placeholder for a value that is only computed once the operation runs.
    Unknown(UnknownKind),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Asset {
    File { path: String },
    Text { content: String },
    Remote { uri: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Archive {
    File { path: String },
    Remote { uri: String },
    Collection(BTreeMap<String, ArchiveMember>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveMember {
    Asset(Asset),
    Archive(Archive),
}

/// Category of a not-yet-known value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnknownKind {
    Bool,
    Number,
    String,
    Array,
    Object,
    Asset,
    Archive,
}

impl UnknownKind {
    pub const ALL: [UnknownKind; 7] = [
        UnknownKind::Bool,
        UnknownKind::Number,
        UnknownKind::String,
        UnknownKind::Array,
        UnknownKind::Object,
        UnknownKind::Asset,
        UnknownKind::Archive,
    ];

    /// Reserved string the wire uses in place of the value.
    pub fn sentinel(self) -> &'static str {
        match self {
            UnknownKind::Bool => "1c4a061d-8072-4f0a-a4cb-0ff528b18fe7",
            UnknownKind::Number => "3eeb2bf0-c639-47a8-9e75-3b44932eb421",
            UnknownKind::String => "04da6b54-80e4-46f7-96ec-b56ff0331ba9",
            UnknownKind::Array => "6a19a0b0-7e62-4c92-b797-7f8e31da9cc2",
            UnknownKind::Object => "dd056dcd-154b-4c76-9bd3-c8f88648b5ff",
            UnknownKind::Asset => "030794c1-ac77-496b-92df-f27374a8bd58",
            UnknownKind::Archive => "e48ece36-62e2-4504-bad9-02848725956a",
        }
    }

    pub fn from_sentinel(s: &str) -> Option<UnknownKind> {
        UnknownKind::ALL.into_iter().find(|k| k.sentinel() == s)
    }

    /// Name used in user-facing messages.
    pub fn describe(self) -> &'static str {
        match self {
            UnknownKind::Bool => "boolean",
            UnknownKind::Number => "number",
            UnknownKind::String => "string",
            UnknownKind::Array => "Array",
            UnknownKind::Object => "Object",
            UnknownKind::Asset => "asset",
            UnknownKind::Archive => "archive",
        }
    }
}

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

impl PropertyValue {
    /// Marks `value` secret, keeping the tree flat: secrets are not nested and unknowns stay bare.
    pub fn secret(value: PropertyValue) -> PropertyValue {
        match value {
            PropertyValue::Secret(_) | PropertyValue::Unknown(_) => value,
            other => PropertyValue::Secret(Box::new(other)),
        }
    }

    /// The value with one level of secret wrapping removed.
    pub fn unsecret(&self) -> &PropertyValue {
        match self {
            PropertyValue::Secret(inner) => inner,
            other => other,
        }
    }

    pub fn unsecret_mut(&mut self) -> &mut PropertyValue {
        match self {
            PropertyValue::Secret(inner) => inner,
            other => other,
        }
    }

    /// Deep copy with every secret marker stripped.
    pub fn to_plain(&self) -> PropertyValue {
        match self {
            PropertyValue::Secret(inner) => inner.to_plain(),
            PropertyValue::Sequence(items) => {
                PropertyValue::Sequence(items.iter().map(PropertyValue::to_plain).collect())
            }
            PropertyValue::Map(map) => PropertyValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_plain()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, PropertyValue::Secret(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_unknown(&self) -> Option<UnknownKind> {
        match self {
            PropertyValue::Unknown(kind) => Some(*kind),
            _ => None,
        }
    }

    /// True when an unknown appears anywhere in the tree.
    pub fn contains_unknowns(&self) -> bool {
        match self {
            PropertyValue::Unknown(_) => true,
            PropertyValue::Secret(inner) => inner.contains_unknowns(),
            PropertyValue::Sequence(items) => items.iter().any(PropertyValue::contains_unknowns),
            PropertyValue::Map(map) => map.values().any(PropertyValue::contains_unknowns),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut PropertyMap> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Number(value.into())
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        PropertyValue::Number(value.into())
    }
}

/// Non-finite floats have no wire form and become `Null`.
impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(PropertyValue::Number)
            .unwrap_or(PropertyValue::Null)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(value: Vec<PropertyValue>) -> Self {
        PropertyValue::Sequence(value)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(value: PropertyMap) -> Self {
        PropertyValue::Map(value)
    }
}

impl From<Asset> for PropertyValue {
    fn from(value: Asset) -> Self {
        PropertyValue::Asset(value)
    }
}

impl From<Archive> for PropertyValue {
    fn from(value: Archive) -> Self {
        PropertyValue::Archive(value)
    }
}
