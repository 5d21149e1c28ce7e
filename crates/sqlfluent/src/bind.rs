//! Ordered placeholder → value storage for one compiled statement.

use crate::value::Value;
use std::collections::HashSet;

/// The ordered bind table produced by compilation.
///
/// Entries appear in the order their placeholders are emitted in the SQL text.
/// Names are unique within one map: [`BindMap::push`] suffixes a colliding name
/// with `_2`, `_3`, ... and returns the name actually used.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindMap {
    entries: Vec<(String, Value)>,
    names: HashSet<String>,
}

impl BindMap {
    /// Create a new empty bind map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value under `name` (or a unique variant of it) and return the placeholder used.
    pub fn push(&mut self, name: String, value: Value) -> String {
        let name = if self.names.contains(&name) {
            let mut n = 2;
            loop {
                let candidate = format!("{name}_{n}");
                if !self.names.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            }
        } else {
            name
        };
        self.names.insert(name.clone());
        self.entries.push((name.clone(), value));
        name
    }

    /// Get the current entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Look up a value by placeholder name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterate entries in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Placeholder names in emission order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.names.clear();
    }
}

impl FromIterator<(String, Value)> for BindMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = BindMap::new();
        for (name, value) in iter {
            map.push(name, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_order() {
        let mut binds = BindMap::new();
        binds.push(":status".into(), Value::from("active"));
        binds.push(":role".into(), Value::from("admin"));
        let names: Vec<_> = binds.names().collect();
        assert_eq!(names, vec![":status", ":role"]);
    }

    #[test]
    fn push_suffixes_collisions() {
        let mut binds = BindMap::new();
        assert_eq!(binds.push(":id".into(), Value::Int(1)), ":id");
        assert_eq!(binds.push(":id".into(), Value::Int(2)), ":id_2");
        assert_eq!(binds.push(":id".into(), Value::Int(3)), ":id_3");
        assert_eq!(binds.get(":id_2"), Some(&Value::Int(2)));
        assert_eq!(binds.len(), 3);
    }
}
