//! Core scene value type.

use indexmap::IndexMap;
use yaml_rust2::Yaml;

/// Field map of a scene node, in document order.
pub type SceneMap = IndexMap<String, SceneValue>;

/// A node in a scene document.
///
/// Every scene file, before and after merging, is a tree of these values.
/// The root of a loaded scene is always a [`SceneValue::Map`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneValue {
    /// Atomic values (String, Integer, Real, Boolean, Null).
    Scalar(Yaml),

    /// Ordered sequence of values.
    Sequence(Vec<SceneValue>),

    /// Nested mapping from string keys to values.
    Map(SceneMap),
}

impl Default for SceneValue {
    fn default() -> Self {
        SceneValue::Map(SceneMap::new())
    }
}

impl From<&str> for SceneValue {
    fn from(s: &str) -> Self {
        SceneValue::Scalar(Yaml::String(s.to_string()))
    }
}

impl From<String> for SceneValue {
    fn from(s: String) -> Self {
        SceneValue::Scalar(Yaml::String(s))
    }
}

impl From<i64> for SceneValue {
    fn from(i: i64) -> Self {
        SceneValue::Scalar(Yaml::Integer(i))
    }
}

impl From<bool> for SceneValue {
    fn from(b: bool) -> Self {
        SceneValue::Scalar(Yaml::Boolean(b))
    }
}

impl From<SceneMap> for SceneValue {
    fn from(map: SceneMap) -> Self {
        SceneValue::Map(map)
    }
}

impl From<Vec<SceneValue>> for SceneValue {
    fn from(items: Vec<SceneValue>) -> Self {
        SceneValue::Sequence(items)
    }
}

impl SceneValue {
    /// Create an empty map node.
    pub fn new_map() -> Self {
        SceneValue::Map(SceneMap::new())
    }

    /// Create a null scalar.
    pub fn null() -> Self {
        SceneValue::Scalar(Yaml::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, SceneValue::Scalar(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, SceneValue::Sequence(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, SceneValue::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SceneValue::Scalar(Yaml::Null))
    }

    /// Get the string content if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SceneValue::Scalar(Yaml::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Get as a Yaml scalar if this is a scalar.
    pub fn as_yaml(&self) -> Option<&Yaml> {
        match self {
            SceneValue::Scalar(yaml) => Some(yaml),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[SceneValue]> {
        match self {
            SceneValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&SceneMap> {
        match self {
            SceneValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut SceneMap> {
        match self {
            SceneValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a field of a map node. Returns `None` for non-map nodes.
    pub fn get(&self, key: &str) -> Option<&SceneValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Mutable variant of [`SceneValue::get`].
    pub fn get_mut(&mut self, key: &str) -> Option<&mut SceneValue> {
        self.as_map_mut().and_then(|map| map.get_mut(key))
    }

    /// Follow a chain of map keys.
    ///
    /// An empty path returns `self`.
    pub fn get_path(&self, path: &[&str]) -> Option<&SceneValue> {
        let mut current = self;
        for key in path {
            current = current.get(key)?;
        }
        Some(current)
    }

    /// Insert a field into a map node, returning the previous value.
    ///
    /// Does nothing (and returns `None`) when called on a non-map node.
    pub fn insert(&mut self, key: impl Into<String>, value: SceneValue) -> Option<SceneValue> {
        self.as_map_mut()
            .and_then(|map| map.insert(key.into(), value))
    }

    /// Remove a field from a map node, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<SceneValue> {
        self.as_map_mut().and_then(|map| map.shift_remove(key))
    }
}
