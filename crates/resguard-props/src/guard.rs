//! Read interposer that refuses to hand out not-yet-known values.
//!
//! During preview some properties are placeholders. A policy that reads one cannot reach a
//! verdict, so the read fails with the full path instead of returning a sentinel the policy
//! would silently compare against.

use crate::value::{PropertyMap, PropertyValue, UnknownKind};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} value at .{} can't be known during preview", .path.join("."))]
pub struct UnknownValueError {
    pub kind: UnknownKind,
    /// Accessors leading to the value; sequence indices are stringified.
    pub path: Vec<String>,
}

impl UnknownValueError {
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

/// Wrap a tree so that every read checks for unknowns.
pub fn guard(value: &PropertyValue) -> Guarded<'_> {
    Guarded {
        value,
        path: Vec::new(),
    }
}

/// A guarded position in a property tree.
///
/// Children are wrapped lazily, on access, carrying their path along. Secrets are read
/// through transparently.
#[derive(Clone)]
pub struct Guarded<'a> {
    value: &'a PropertyValue,
    path: Vec<String>,
}

impl fmt::Debug for Guarded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl<'a> Guarded<'a> {
    /// Wrap a map that is the root of its own tree (e.g. resource properties).
    pub fn root(map: &'a PropertyValue) -> Self {
        guard(map)
    }

    fn child(
        &self,
        key: String,
        value: &'a PropertyValue,
    ) -> Result<Guarded<'a>, UnknownValueError> {
        let mut path = self.path.clone();
        path.push(key);
        let value = value.unsecret();
        if let PropertyValue::Unknown(kind) = value {
            return Err(UnknownValueError { kind: *kind, path });
        }
        Ok(Guarded { value, path })
    }

    fn target(&self) -> &'a PropertyValue {
        self.value.unsecret()
    }

    /// Read a map entry. `Ok(None)` when the key is absent or this is not a map.
    pub fn get(&self, key: &str) -> Result<Option<Guarded<'a>>, UnknownValueError> {
        let Some(map) = self.target().as_map() else {
            return Ok(None);
        };
        match map.get(key) {
            Some(v) => self.child(key.to_string(), v).map(Some),
            None => Ok(None),
        }
    }

    /// Read a sequence element. `Ok(None)` when out of range or this is not a sequence.
    pub fn index(&self, index: usize) -> Result<Option<Guarded<'a>>, UnknownValueError> {
        let Some(items) = self.target().as_sequence() else {
            return Ok(None);
        };
        match items.get(index) {
            Some(v) => self.child(index.to_string(), v).map(Some),
            None => Ok(None),
        }
    }

    /// Walk a dotted path of keys and indices, e.g. `"rules.0.port"`.
    pub fn lookup(&self, dotted: &str) -> Result<Option<Guarded<'a>>, UnknownValueError> {
        let mut current = self.clone();
        for segment in dotted.split('.').filter(|s| !s.is_empty()) {
            let next = match current.target() {
                PropertyValue::Sequence(_) => match segment.parse::<usize>() {
                    Ok(i) => current.index(i)?,
                    Err(_) => None,
                },
                _ => current.get(segment)?,
            };
            match next {
                Some(n) => current = n,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Iterate sequence elements; the first unknown element ends iteration with an error.
    pub fn iter(&self) -> GuardedIter<'a> {
        GuardedIter {
            parent: self.clone(),
            items: self.target().as_sequence().unwrap_or(&[]),
            next: 0,
            failed: false,
        }
    }

    /// Iterate map entries in key order; the first unknown value ends iteration with an error.
    pub fn entries(&self) -> GuardedEntries<'a> {
        static EMPTY: PropertyMap = PropertyMap::new();
        let map = self.target().as_map().unwrap_or(&EMPTY);
        GuardedEntries {
            parent: self.clone(),
            inner: map.iter(),
            failed: false,
        }
    }

    /// Map keys; reading keys never touches values.
    pub fn keys(&self) -> Vec<&'a str> {
        self.target()
            .as_map()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Element or entry count; zero for scalars.
    pub fn len(&self) -> usize {
        match self.target() {
            PropertyValue::Sequence(items) => items.len(),
            PropertyValue::Map(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.target().as_str()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.target().as_bool()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.target().as_f64()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.target().as_i64()
    }

    pub fn is_null(&self) -> bool {
        self.target().is_null()
    }

    pub fn is_map(&self) -> bool {
        self.target().as_map().is_some()
    }

    pub fn is_sequence(&self) -> bool {
        self.target().as_sequence().is_some()
    }

    /// The underlying tree, unknowns included, without any check.
    ///
    /// For code that must forward the tree verbatim (e.g. re-encoding it).
    pub fn raw(&self) -> &'a PropertyValue {
        self.value
    }
}

pub struct GuardedIter<'a> {
    parent: Guarded<'a>,
    items: &'a [PropertyValue],
    next: usize,
    failed: bool,
}

impl<'a> Iterator for GuardedIter<'a> {
    type Item = Result<Guarded<'a>, UnknownValueError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let value = self.items.get(self.next)?;
        let index = self.next;
        self.next += 1;
        let item = self.parent.child(index.to_string(), value);
        self.failed = item.is_err();
        Some(item)
    }
}

pub struct GuardedEntries<'a> {
    parent: Guarded<'a>,
    inner: std::collections::btree_map::Iter<'a, String, PropertyValue>,
    failed: bool,
}

impl<'a> Iterator for GuardedEntries<'a> {
    type Item = Result<(&'a str, Guarded<'a>), UnknownValueError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let (key, value) = self.inner.next()?;
        let item = self
            .parent
            .child(key.clone(), value)
            .map(|g| (key.as_str(), g));
        self.failed = item.is_err();
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PropertyMap;

    fn map(entries: Vec<(&str, PropertyValue)>) -> PropertyValue {
        PropertyValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<PropertyMap>(),
        )
    }

    fn unknown(kind: UnknownKind) -> PropertyValue {
        PropertyValue::Unknown(kind)
    }

    #[test]
    fn known_values_pass_through() {
        let tree = map(vec![
            ("foo", "bar".into()),
            ("n", 0.into()),
            ("nested", map(vec![("b", true.into())])),
            ("list", vec![PropertyValue::from("x")].into()),
        ]);
        let g = guard(&tree);
        assert_eq!(g.get("foo").unwrap().unwrap().as_str(), Some("bar"));
        assert_eq!(g.get("n").unwrap().unwrap().as_i64(), Some(0));
        assert_eq!(
            g.lookup("nested.b").unwrap().unwrap().as_bool(),
            Some(true)
        );
        assert_eq!(
            g.get("list").unwrap().unwrap().index(0).unwrap().unwrap().as_str(),
            Some("x")
        );
        assert!(g.get("missing").unwrap().is_none());
    }

    #[test]
    fn every_unknown_kind_raises_on_read() {
        for kind in UnknownKind::ALL {
            let tree = map(vec![("foo", unknown(kind))]);
            let err = guard(&tree).get("foo").unwrap_err();
            assert_eq!(err.kind, kind);
            assert_eq!(err.path, vec!["foo".to_string()]);
        }
    }

    #[test]
    fn nested_unknown_reports_full_path() {
        let tree = map(vec![("foo", map(vec![("bar", unknown(UnknownKind::Bool))]))]);
        let foo = guard(&tree).get("foo").unwrap().unwrap();
        let err = foo.get("bar").unwrap_err();
        assert_eq!(
            err,
            UnknownValueError {
                kind: UnknownKind::Bool,
                path: vec!["foo".into(), "bar".into()],
            }
        );
        assert_eq!(err.to_string(), "boolean value at .foo.bar can't be known during preview");
    }

    #[test]
    fn iteration_stops_at_first_unknown_element() {
        let tree = map(vec![(
            "foo",
            vec![true.into(), unknown(UnknownKind::Bool), false.into()].into(),
        )]);
        let foo = guard(&tree).get("foo").unwrap().unwrap();

        let mut seen = 0;
        let mut failure = None;
        for item in foo.iter() {
            match item {
                Ok(_) => seen += 1,
                Err(e) => failure = Some(e),
            }
        }
        assert_eq!(seen, 1);
        let err = failure.expect("iteration must hit the unknown");
        assert_eq!(err.path, vec!["foo".to_string(), "1".to_string()]);

        let collected: Result<Vec<_>, _> = foo.iter().collect();
        assert!(collected.is_err());
    }

    #[test]
    fn entry_iteration_checks_values() {
        let tree = map(vec![(
            "foo",
            map(vec![
                ("a", true.into()),
                ("b", unknown(UnknownKind::Bool)),
                ("c", false.into()),
            ]),
        )]);
        let foo = guard(&tree).get("foo").unwrap().unwrap();
        let err = foo.entries().find_map(Result::err).unwrap();
        assert_eq!(err.path, vec!["foo".to_string(), "b".to_string()]);
        // Keys alone never trip the guard.
        assert_eq!(foo.keys(), vec!["a", "b", "c"]);
    }

    #[test]
    fn raw_escape_hatch_returns_sentinels() {
        let tree = map(vec![("foo", unknown(UnknownKind::Object))]);
        let g = guard(&tree);
        assert_eq!(
            g.raw().as_map().unwrap()["foo"],
            PropertyValue::Unknown(UnknownKind::Object)
        );
    }

    #[test]
    fn secrets_are_read_through() {
        let tree = map(vec![("pw", PropertyValue::secret("s".into()))]);
        assert_eq!(guard(&tree).get("pw").unwrap().unwrap().as_str(), Some("s"));
    }
}
