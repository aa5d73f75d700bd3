//! Mutable view that hides secret markers from readers but keeps them on write.
//!
//! Remediations work on properties decoded with secrets kept. The view lets them read and
//! replace values as if nothing were secret, while a replaced value that used to be secret
//! is stored secret again.

use crate::error::ViewError;
use crate::value::PropertyValue;
use std::borrow::Cow;

/// `value` with every secret marker removed; borrowed when there is none to remove.
fn plain(value: &PropertyValue) -> Cow<'_, PropertyValue> {
    let value = value.unsecret();
    if holds_secret(value) {
        Cow::Owned(value.to_plain())
    } else {
        Cow::Borrowed(value)
    }
}

fn holds_secret(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Secret(_) => true,
        PropertyValue::Sequence(items) => items.iter().any(holds_secret),
        PropertyValue::Map(map) => map.values().any(holds_secret),
        _ => false,
    }
}

#[derive(Debug)]
pub struct SecretView<'a> {
    target: &'a mut PropertyValue,
}

impl<'a> SecretView<'a> {
    /// View `target`. A secret root is peeled so its map or sequence is addressable.
    pub fn new(target: &'a mut PropertyValue) -> Self {
        Self {
            target: target.unsecret_mut(),
        }
    }

    /// Read an entry of a map-like target with all secret markers beneath it removed.
    pub fn get(&self, key: &str) -> Option<Cow<'_, PropertyValue>> {
        self.target.as_map().and_then(|m| m.get(key)).map(plain)
    }

    /// Read an element of a sequence-like target, secrets removed as in [`SecretView::get`].
    pub fn get_index(&self, index: usize) -> Option<Cow<'_, PropertyValue>> {
        self.target
            .as_sequence()
            .and_then(|items| items.get(index))
            .map(plain)
    }

    /// Whether the raw entry under `key` is secret.
    pub fn is_secret(&self, key: &str) -> bool {
        self.target
            .as_map()
            .and_then(|m| m.get(key))
            .is_some_and(PropertyValue::is_secret)
    }

    /// A nested view over a container entry; writes through it keep the nested secrets.
    pub fn child(&mut self, key: &str) -> Option<SecretView<'_>> {
        self.target
            .as_map_mut()
            .and_then(|m| m.get_mut(key))
            .map(SecretView::new)
    }

    pub fn child_at(&mut self, index: usize) -> Option<SecretView<'_>> {
        match &mut *self.target {
            PropertyValue::Sequence(items) => items.get_mut(index).map(SecretView::new),
            _ => None,
        }
    }

    /// Write an entry. If the entry it replaces was secret, the new value is stored secret.
    pub fn set(&mut self, key: &str, value: impl Into<PropertyValue>) -> Result<(), ViewError> {
        let map = self.target.as_map_mut().ok_or_else(|| ViewError::NotAMap {
            key: key.to_string(),
        })?;
        let value = value.into();
        let value = if map.get(key).is_some_and(PropertyValue::is_secret) {
            PropertyValue::secret(value)
        } else {
            value
        };
        map.insert(key.to_string(), value);
        Ok(())
    }

    /// Write an element in place, with the same secrecy rule as [`SecretView::set`].
    pub fn set_index(
        &mut self,
        index: usize,
        value: impl Into<PropertyValue>,
    ) -> Result<(), ViewError> {
        let PropertyValue::Sequence(items) = &mut *self.target else {
            return Err(ViewError::NotASequence { index });
        };
        let len = items.len();
        let slot = items
            .get_mut(index)
            .ok_or(ViewError::IndexOutOfBounds { index, len })?;
        let value = value.into();
        *slot = if slot.is_secret() {
            PropertyValue::secret(value)
        } else {
            value
        };
        Ok(())
    }

    /// Remove an entry, returning it with its secret markers stripped.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.target
            .as_map_mut()
            .and_then(|m| m.remove(key))
            .map(|v| v.to_plain())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.target
            .as_map()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Entries in key order, secrets removed.
    pub fn entries(&self) -> Vec<(&str, Cow<'_, PropertyValue>)> {
        self.target
            .as_map()
            .map(|m| m.iter().map(|(k, v)| (k.as_str(), plain(v))).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        match &*self.target {
            PropertyValue::Map(m) => m.len(),
            PropertyValue::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The backing tree, secret markers included.
    pub fn target(&self) -> &PropertyValue {
        &*self.target
    }

    pub fn into_target(self) -> &'a mut PropertyValue {
        self.target
    }
}
