use crate::error::{CodecError, join_path};
use crate::value::{Archive, ArchiveMember, Asset, PropertyMap, PropertyValue, UnknownKind};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key whose presence marks a map as a special value rather than plain data.
pub const SIG_KEY: &str = "4dabf18193072939515e22adb298388d";
pub const ASSET_SIG: &str = "c44067f5952c0a294b673a41bacd8c17";
pub const ARCHIVE_SIG: &str = "0def7320c3a5731c473e5ecbe6d01bc7";
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Re-wrap decoded secrets as [`PropertyValue::Secret`] instead of unwrapping them in place.
    pub keep_secrets: bool,
}

impl DecodeOptions {
    pub fn keep_secrets() -> Self {
        Self { keep_secrets: true }
    }
}

/// Decode a top-level property payload.
pub fn decode_properties(
    props: &Map<String, Value>,
    opts: DecodeOptions,
) -> Result<PropertyMap, CodecError> {
    let mut path = Vec::new();
    decode_map(props, opts, &mut path)
}

/// Decode a single structured value.
pub fn decode(value: &Value, opts: DecodeOptions) -> Result<PropertyValue, CodecError> {
    let mut path = Vec::new();
    decode_value(value, opts, &mut path)
}

fn decode_map(
    props: &Map<String, Value>,
    opts: DecodeOptions,
    path: &mut Vec<String>,
) -> Result<PropertyMap, CodecError> {
    let mut out = PropertyMap::new();
    for (key, value) in props {
        path.push(key.clone());
        let decoded = decode_value(value, opts, path)?;
        path.pop();
        out.insert(key.clone(), decoded);
    }
    Ok(out)
}

fn decode_value(
    value: &Value,
    opts: DecodeOptions,
    path: &mut Vec<String>,
) -> Result<PropertyValue, CodecError> {
    match value {
        Value::Null => Ok(PropertyValue::Null),
        Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
        Value::Number(n) => Ok(PropertyValue::Number(n.clone())),
        Value::String(s) => Ok(match UnknownKind::from_sentinel(s) {
            Some(kind) => PropertyValue::Unknown(kind),
            None => PropertyValue::String(s.clone()),
        }),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                path.push(i.to_string());
                out.push(decode_value(item, opts, path)?);
                path.pop();
            }
            Ok(PropertyValue::Sequence(out))
        }
        Value::Object(map) => match map.get(SIG_KEY) {
            None => decode_map(map, opts, path).map(PropertyValue::Map),
            Some(Value::String(sig)) if sig == ASSET_SIG => {
                decode_asset(map, path).map(PropertyValue::Asset)
            }
            Some(Value::String(sig)) if sig == ARCHIVE_SIG => {
                decode_archive(map, opts, path).map(PropertyValue::Archive)
            }
            Some(Value::String(sig)) if sig == SECRET_SIG => {
                let inner = map.get("value").ok_or_else(|| CodecError::UndefinedLeaf {
                    what: "secret value",
                    path: join_path(path),
                })?;
                let decoded = decode_value(inner, opts, path)?;
                // Secrecy stays at the position it was encoded at; it is never promoted.
                Ok(if opts.keep_secrets {
                    PropertyValue::secret(decoded)
                } else {
                    decoded
                })
            }
            Some(other) => Err(CodecError::UnknownSignature {
                signature: match other {
                    Value::String(s) => s.clone(),
                    v => v.to_string(),
                },
                path: join_path(path),
            }),
        },
    }
}

fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

fn decode_asset(map: &Map<String, Value>, path: &[String]) -> Result<Asset, CodecError> {
    if let Some(p) = string_field(map, "path") {
        return Ok(Asset::File { path: p.to_string() });
    }
    if let Some(text) = string_field(map, "text") {
        return Ok(Asset::Text {
            content: text.to_string(),
        });
    }
    if let Some(uri) = string_field(map, "uri") {
        return Ok(Asset::Remote {
            uri: uri.to_string(),
        });
    }
    Err(CodecError::InvalidAsset {
        path: join_path(path),
    })
}

fn decode_archive(
    map: &Map<String, Value>,
    opts: DecodeOptions,
    path: &mut Vec<String>,
) -> Result<Archive, CodecError> {
    if let Some(assets) = map.get("assets") {
        let Value::Object(assets) = assets else {
            return Err(CodecError::InvalidArchive {
                path: join_path(path),
            });
        };
        path.push("assets".to_string());
        let mut members = BTreeMap::new();
        for (name, raw) in assets {
            path.push(name.clone());
            let member = match decode_value(raw, opts, path)? {
                PropertyValue::Asset(a) => ArchiveMember::Asset(a),
                PropertyValue::Archive(a) => ArchiveMember::Archive(a),
                _ => {
                    path.pop();
                    return Err(CodecError::InvalidArchiveMember {
                        member: name.clone(),
                        path: join_path(path),
                    });
                }
            };
            path.pop();
            members.insert(name.clone(), member);
        }
        path.pop();
        return Ok(Archive::Collection(members));
    }
    if let Some(p) = string_field(map, "path") {
        return Ok(Archive::File { path: p.to_string() });
    }
    if let Some(uri) = string_field(map, "uri") {
        return Ok(Archive::Remote {
            uri: uri.to_string(),
        });
    }
    Err(CodecError::InvalidArchive {
        path: join_path(path),
    })
}

/// Encode a top-level property map.
pub fn encode_properties(props: &PropertyMap) -> Map<String, Value> {
    props
        .iter()
        .map(|(k, v)| (k.clone(), encode(v)))
        .collect()
}

/// Encode a single value into its structured form.
pub fn encode(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => Value::Number(n.clone()),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Sequence(items) => Value::Array(items.iter().map(encode).collect()),
        PropertyValue::Map(map) => Value::Object(encode_properties(map)),
        PropertyValue::Secret(inner) => signed(SECRET_SIG, [("value", encode(inner))]),
        PropertyValue::Asset(asset) => encode_asset(asset),
        PropertyValue::Archive(archive) => encode_archive(archive),
        PropertyValue::Unknown(kind) => Value::String(kind.sentinel().to_string()),
    }
}

fn signed<const N: usize>(sig: &str, fields: [(&str, Value); N]) -> Value {
    let mut map = Map::new();
    map.insert(SIG_KEY.to_string(), Value::String(sig.to_string()));
    for (k, v) in fields {
        map.insert(k.to_string(), v);
    }
    Value::Object(map)
}

fn encode_asset(asset: &Asset) -> Value {
    match asset {
        Asset::File { path } => signed(ASSET_SIG, [("path", Value::String(path.clone()))]),
        Asset::Text { content } => signed(ASSET_SIG, [("text", Value::String(content.clone()))]),
        Asset::Remote { uri } => signed(ASSET_SIG, [("uri", Value::String(uri.clone()))]),
    }
}

fn encode_archive(archive: &Archive) -> Value {
    match archive {
        Archive::File { path } => signed(ARCHIVE_SIG, [("path", Value::String(path.clone()))]),
        Archive::Remote { uri } => signed(ARCHIVE_SIG, [("uri", Value::String(uri.clone()))]),
        Archive::Collection(members) => {
            let assets = members
                .iter()
                .map(|(name, member)| {
                    let encoded = match member {
                        ArchiveMember::Asset(a) => encode_asset(a),
                        ArchiveMember::Archive(a) => encode_archive(a),
                    };
                    (name.clone(), encoded)
                })
                .collect::<Map<String, Value>>();
            signed(ARCHIVE_SIG, [("assets", Value::Object(assets))])
        }
    }
}
