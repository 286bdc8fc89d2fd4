//! Ordered flat key/value namespace used by legacy environment files.

/// Insertion-ordered map of flat variable names to raw string values.
///
/// Re-inserting an existing key replaces its value in place, so the order
/// reflects where each variable was first defined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatNamespace {
    entries: Vec<(String, String)>,
}

impl FlatNamespace {
    /// Create an empty namespace.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let name = key.into();
        let text = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = text,
            None => self.entries.push((name, text)),
        }
    }

    /// Value of `key`, if defined.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Whether `key` is defined with a non-empty value.
    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|value| !value.is_empty())
    }

    /// Overlay every entry of `other`, replacing values of shared keys.
    pub fn extend_from(&mut self, other: Self) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the namespace holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FlatNamespace
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut namespace = Self::new();
        for (key, value) in iter {
            namespace.insert(key, value);
        }
        namespace
    }
}
