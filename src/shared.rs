//! Named, reusable declaration closures.

use std::{
    any::Any,
    borrow::Cow,
    collections::HashMap,
    fmt::{self, Debug},
    sync::Arc,
};

use crate::{
    error::{DeclarationError, DeclarationResult, Declared},
    spec::Spec,
};

pub type SharedExampleClosure =
    Arc<dyn Fn(&mut Spec<'_>, &SharedExampleContext) -> Declared + Send + Sync>;

/// Values handed from an `it_behaves_like` call into the shared examples.
#[derive(Default, Clone)]
pub struct SharedExampleContext(HashMap<Cow<'static, str>, Arc<dyn Any + Send + Sync>>);

impl SharedExampleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: T,
    ) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: T,
    ) {
        self.0.insert(key.into(), Arc::new(value));
    }

    /// The value stored under `key`, if there is one of type `T`.
    pub fn get<T: Send + Sync + 'static>(&self, key: &str) -> Option<&T> {
        self.0.get(key)?.downcast_ref()
    }

    /// Shared handle to the value, for moving into example bodies.
    pub fn get_arc<T: Send + Sync + 'static>(&self, key: &str) -> Option<Arc<T>> {
        Arc::clone(self.0.get(key)?).downcast().ok()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for SharedExampleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

#[derive(Default, Clone)]
pub struct SharedExampleRegistry(HashMap<String, SharedExampleClosure>);

impl SharedExampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `closure` under `name`.
    ///
    /// A name can only be registered once, the first registration stays.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        closure: SharedExampleClosure,
    ) -> DeclarationResult {
        let name = name.into();
        if self.0.contains_key(&name) {
            return Err(DeclarationError::DuplicateSharedExample(name));
        }
        self.0.insert(name, closure);
        Ok(())
    }

    pub fn get(&self, name: &str) -> DeclarationResult<SharedExampleClosure> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| DeclarationError::UndefinedSharedExample(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl Debug for SharedExampleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

pub(crate) fn shared_closure<F, T>(f: F) -> SharedExampleClosure
where
    F: Fn(&mut Spec<'_>, &SharedExampleContext) -> T + Send + Sync + 'static,
    T: Into<Declared>,
{
    Arc::new(move |spec: &mut Spec<'_>, ctx: &SharedExampleContext| -> Declared {
        f(spec, ctx).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> SharedExampleClosure {
        shared_closure(|_: &mut Spec<'_>, _: &SharedExampleContext| ())
    }

    #[test]
    fn duplicate_names_are_rejected_and_first_wins() {
        let mut registry = SharedExampleRegistry::new();
        registry.register("a stack", noop()).unwrap();
        assert_eq!(
            registry.register("a stack", noop()).unwrap_err(),
            DeclarationError::DuplicateSharedExample("a stack".into())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_names_fail_lookup() {
        let registry = SharedExampleRegistry::new();
        assert!(matches!(
            registry.get("missing"),
            Err(DeclarationError::UndefinedSharedExample(name)) if name == "missing"
        ));
    }

    #[test]
    fn context_values_are_typed() {
        let ctx = SharedExampleContext::new()
            .with("capacity", 3usize)
            .with("name", String::from("stack"));
        assert_eq!(ctx.get::<usize>("capacity"), Some(&3));
        assert_eq!(ctx.get::<u32>("capacity"), None);
        assert_eq!(ctx.get_arc::<String>("name").as_deref().map(String::as_str), Some("stack"));
        assert!(ctx.get::<usize>("missing").is_none());
    }
}
