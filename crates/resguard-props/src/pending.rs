//! Values that may still need awaiting before they can be encoded.
//!
//! Remediations hand back trees that can contain deferred pieces. Everything is resolved
//! here, before the codec ever sees the tree, so encoding itself stays synchronous.

use crate::error::{CodecError, join_path};
use crate::secret::SecretView;
use crate::value::{PropertyMap, PropertyValue};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;

pub type PendingMap = BTreeMap<String, PendingValue>;

pub enum PendingValue {
    Ready(PropertyValue),
    Sequence(Vec<PendingValue>),
    Map(PendingMap),
    Secret(Box<PendingValue>),
    /// Resolves later; may itself resolve to [`PendingValue::Undefined`].
    Deferred(BoxFuture<'static, PendingValue>),
    /// No value. Dropped from maps, `null` inside sequences.
    Undefined,
    /// A computation handle from the resource-definition layer that never became concrete.
    Output(String),
}

impl PendingValue {
    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = PendingValue> + Send + 'static,
    {
        PendingValue::Deferred(fut.boxed())
    }
}

impl fmt::Debug for PendingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingValue::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            PendingValue::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            PendingValue::Map(map) => f.debug_tuple("Map").field(map).finish(),
            PendingValue::Secret(inner) => f.debug_tuple("Secret").field(inner).finish(),
            PendingValue::Deferred(_) => f.write_str("Deferred(..)"),
            PendingValue::Undefined => f.write_str("Undefined"),
            PendingValue::Output(d) => f.debug_tuple("Output").field(d).finish(),
        }
    }
}

impl From<PropertyValue> for PendingValue {
    fn from(value: PropertyValue) -> Self {
        PendingValue::Ready(value)
    }
}

impl From<PropertyMap> for PendingValue {
    fn from(value: PropertyMap) -> Self {
        PendingValue::Ready(PropertyValue::Map(value))
    }
}

/// A view resolves to its backing tree, secret markers included.
impl From<SecretView<'_>> for PendingValue {
    fn from(view: SecretView<'_>) -> Self {
        PendingValue::Ready(view.target().clone())
    }
}

impl<T: Into<PendingValue>> From<Option<T>> for PendingValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PendingValue::Undefined)
    }
}

/// Resolve a pending value. `Ok(None)` means "no value".
pub async fn resolve(value: PendingValue) -> Result<Option<PropertyValue>, CodecError> {
    resolve_at(value, Vec::new()).await
}

/// Resolve a pending property map, dropping entries that resolve to no value.
pub async fn resolve_properties(props: PendingMap) -> Result<PropertyMap, CodecError> {
    resolve_map(props, Vec::new()).await
}

fn resolve_at(
    value: PendingValue,
    path: Vec<String>,
) -> BoxFuture<'static, Result<Option<PropertyValue>, CodecError>> {
    async move {
        match value {
            PendingValue::Ready(v) => Ok(Some(v)),
            PendingValue::Undefined => Ok(None),
            PendingValue::Output(description) => Err(CodecError::UnsupportedOutput {
                description,
                path: join_path(&path),
            }),
            PendingValue::Deferred(fut) => {
                let next = fut.await;
                resolve_at(next, path).await
            }
            PendingValue::Secret(inner) => Ok(resolve_at(*inner, path)
                .await?
                .map(PropertyValue::secret)),
            PendingValue::Sequence(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    let mut child = path.clone();
                    child.push(i.to_string());
                    out.push(resolve_at(item, child).await?.unwrap_or(PropertyValue::Null));
                }
                Ok(Some(PropertyValue::Sequence(out)))
            }
            PendingValue::Map(map) => Ok(Some(PropertyValue::Map(resolve_map(map, path).await?))),
        }
    }
    .boxed()
}

async fn resolve_map(props: PendingMap, path: Vec<String>) -> Result<PropertyMap, CodecError> {
    let mut out = PropertyMap::new();
    for (key, value) in props {
        let mut child = path.clone();
        child.push(key.clone());
        if let Some(resolved) = resolve_at(value, child).await? {
            out.insert(key, resolved);
        }
    }
    Ok(out)
}
