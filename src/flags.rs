use std::{borrow::Cow, collections::BTreeMap};

/// Well known flag keys.
pub struct Filter;

impl Filter {
    /// Run only focused examples when anything in the suite is focused.
    pub const FOCUSED: &'static str = "focused";

    /// Register the example but never run it.
    pub const PENDING: &'static str = "pending";
}

/// Named boolean filters attached to groups and examples.
///
/// A key that was never set is "unset", which reads as `false` through
/// [`get`](Self::get) but does not override an ancestor during
/// [`merge`](Self::merge).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(BTreeMap<Cow<'static, str>, bool>);

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused() -> Self {
        Self::new().with(Filter::FOCUSED, true)
    }

    pub fn pending() -> Self {
        Self::new().with(Filter::PENDING, true)
    }

    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<Cow<'static, str>>, value: bool) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> bool {
        self.explicit(key).unwrap_or(false)
    }

    pub fn explicit(&self, key: &str) -> Option<bool> {
        self.0.get(key).copied()
    }

    pub fn is_focused(&self) -> bool {
        self.get(Filter::FOCUSED)
    }

    pub fn is_pending(&self) -> bool {
        self.get(Filter::PENDING)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(key, value)| (key.as_ref(), *value))
    }

    /// Effective flags of `child` nested inside `parent`.
    ///
    /// Explicit values of the child win, everything else is inherited.
    pub fn merge(child: &Flags, parent: &Flags) -> Flags {
        let mut merged = parent.clone();
        for (key, value) in &child.0 {
            merged.0.insert(key.clone(), *value);
        }
        merged
    }
}

impl<K: Into<Cow<'static, str>>> FromIterator<(K, bool)> for Flags {
    fn from_iter<T: IntoIterator<Item = (K, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_reads_false() {
        let flags = Flags::new();
        assert!(!flags.get(Filter::PENDING));
        assert_eq!(flags.explicit(Filter::PENDING), None);
    }

    #[test]
    fn child_inherits_unset_keys() {
        let parent = Flags::pending();
        let child = Flags::new();
        assert!(Flags::merge(&child, &parent).is_pending());
    }

    #[test]
    fn explicit_child_value_wins() {
        let parent = Flags::pending();
        let child = Flags::new().with(Filter::PENDING, false);
        let merged = Flags::merge(&child, &parent);
        assert!(!merged.is_pending());
        assert_eq!(merged.explicit(Filter::PENDING), Some(false));
    }

    #[test]
    fn custom_keys_merge_too() {
        let parent: Flags = [("slow", true), ("network", false)].into_iter().collect();
        let child = Flags::new().with("network", true);
        let merged = Flags::merge(&child, &parent);
        assert!(merged.get("slow"));
        assert!(merged.get("network"));
    }
}
