//! Before and after hooks and their composition across nested scopes.
//!
//! Every scope (world, group, suite) keeps its own [`HookRegistry`]. When an
//! example is flattened the registries of its ancestors are concatenated root
//! to leaf, for the before chain and the after chain alike.

use std::{fmt::Debug, sync::Arc};

use crate::{
    callsite::Callsite,
    example::{ExampleMetadata, ExampleResult},
};

/// A hook closure, tagged by whether it wants example metadata.
#[derive(Clone)]
pub enum Hook {
    Plain(Arc<dyn Fn() -> ExampleResult + Send + Sync>),
    WithMetadata(Arc<dyn Fn(&ExampleMetadata) -> ExampleResult + Send + Sync>),
}

impl Hook {
    pub fn plain<F, T>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        Self::Plain(Arc::new(move || -> ExampleResult { f().into() }))
    }

    pub fn with_metadata<F, T>(f: F) -> Self
    where
        F: Fn(&ExampleMetadata) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        Self::WithMetadata(Arc::new(move |meta: &ExampleMetadata| -> ExampleResult {
            f(meta).into()
        }))
    }

    /// Invoke the hook, handing over `meta` only if it asked for it.
    pub fn call(&self, meta: &ExampleMetadata) -> ExampleResult {
        match self {
            Self::Plain(f) => f(),
            Self::WithMetadata(f) => f(meta),
        }
    }

    /// Invoke a hook outside of any example, as suite hooks are.
    ///
    /// Metadata hooks are never stored at suite level, so they are skipped here.
    pub(crate) fn call_detached(&self) -> ExampleResult {
        match self {
            Self::Plain(f) => f(),
            Self::WithMetadata(_) => ().into(),
        }
    }
}

impl Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => write!(f, "Plain(...)"),
            Self::WithMetadata(_) => write!(f, "WithMetadata(...)"),
        }
    }
}

/// A hook together with where it was registered.
#[derive(Debug, Clone)]
pub struct RegisteredHook {
    pub hook: Hook,
    pub callsite: Callsite,
}

#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    before: Vec<RegisteredHook>,
    after: Vec<RegisteredHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_before(&mut self, hook: Hook, callsite: Callsite) {
        self.before.push(RegisteredHook { hook, callsite });
    }

    pub fn append_after(&mut self, hook: Hook, callsite: Callsite) {
        self.after.push(RegisteredHook { hook, callsite });
    }

    pub fn befores(&self) -> &[RegisteredHook] {
        &self.before
    }

    pub fn afters(&self) -> &[RegisteredHook] {
        &self.after
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn compose_before<'h>(
        chain: impl IntoIterator<Item = &'h HookRegistry>,
    ) -> Vec<RegisteredHook> {
        chain
            .into_iter()
            .flat_map(|registry| registry.before.iter().cloned())
            .collect()
    }

    /// Same order as [`compose_before`](Self::compose_before), not reversed.
    pub fn compose_after<'h>(
        chain: impl IntoIterator<Item = &'h HookRegistry>,
    ) -> Vec<RegisteredHook> {
        chain
            .into_iter()
            .flat_map(|registry| registry.after.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::{callsite, test_support::*};

    fn tagged(log: &CallLog, tag: &'static str) -> Hook {
        let log = log.clone();
        Hook::plain(move || log.push(tag))
    }

    #[test]
    fn composition_is_root_to_leaf_for_both_chains() {
        let log = CallLog::default();
        let mut outer = HookRegistry::new();
        outer.append_before(tagged(&log, "b0"), callsite!());
        outer.append_after(tagged(&log, "a0"), callsite!());
        let mut inner = HookRegistry::new();
        inner.append_before(tagged(&log, "b1"), callsite!());
        inner.append_before(tagged(&log, "b1'"), callsite!());
        inner.append_after(tagged(&log, "a1"), callsite!());

        let meta = metadata("m");
        for hook in HookRegistry::compose_before([&outer, &inner]) {
            hook.hook.call(&meta);
        }
        for hook in HookRegistry::compose_after([&outer, &inner]) {
            hook.hook.call(&meta);
        }

        assert_eq!(log.take(), ["b0", "b1", "b1'", "a0", "a1"]);
    }

    #[test]
    fn metadata_only_reaches_metadata_hooks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook = {
            let seen = Arc::clone(&seen);
            Hook::with_metadata(move |meta: &ExampleMetadata| {
                seen.lock().unwrap().push(meta.name.clone());
            })
        };

        assert_eq!(hook.call(&metadata("A t1")), ExampleResult(Ok(())));
        assert_eq!(*seen.lock().unwrap(), ["A t1"]);
    }

    #[test]
    fn hook_errors_surface_as_results() {
        let hook = Hook::plain(|| Err::<(), _>("broken"));
        assert!(hook.call(&metadata("x")).0.is_err());
    }
}
