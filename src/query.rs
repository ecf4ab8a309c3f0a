//! Immutable multi-value string maps for query, path and stage parameters

use std::{
    collections::HashMap,
    sync::Arc,
};

/// A read-only view over string keys mapped to one or more string values.
///
/// Cloning is cheap; the underlying storage is shared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryMap(Arc<HashMap<String, Vec<String>>>);

impl QueryMap {
    /// Return the first value associated with `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// Return all values associated with `key`, if any.
    pub fn get_all(&self, key: &str) -> Option<Vec<&str>> {
        self.0
            .get(key)
            .map(|values| values.iter().map(String::as_str).collect())
    }

    /// Return true when no keys are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, Vec<String>>> for QueryMap {
    fn from(inner: HashMap<String, Vec<String>>) -> Self {
        QueryMap(Arc::new(inner))
    }
}

impl From<HashMap<String, String>> for QueryMap {
    fn from(inner: HashMap<String, String>) -> Self {
        QueryMap(Arc::new(
            inner.into_iter().map(|(k, v)| (k, vec![v])).collect(),
        ))
    }
}

impl std::iter::FromIterator<(String, String)> for QueryMap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut inner: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in iter {
            inner.entry(k).or_insert_with(Vec::new).push(v);
        }
        QueryMap(Arc::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::QueryMap;
    use maplit::hashmap;

    #[test]
    fn get_returns_first_value() {
        let map: QueryMap = vec![
            ("tag".to_string(), "a".to_string()),
            ("tag".to_string(), "b".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.get("tag"), Some("a"));
        assert_eq!(map.get_all("tag"), Some(vec!["a", "b"]));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn from_single_valued_map() {
        let map = QueryMap::from(hashmap! {
            "page".to_string() => "1".to_string()
        });
        assert_eq!(map.get("page"), Some("1"));
        assert!(!map.is_empty());
    }

    #[test]
    fn default_is_empty() {
        assert!(QueryMap::default().is_empty());
    }
}
