//! The coordinator of all suites.
//!
//! A [`World`] keeps one registration tree per [`SuiteId`], the hooks that
//! span suites, the shared example registry and the [`Reporter`] used to
//! surface failures. Worlds are plain values; [`World::global`] offers a
//! process wide instance for hosts that want one.

use std::{
    any::type_name,
    borrow::Cow,
    collections::{HashMap, HashSet},
    fmt,
    sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError},
};

use tracing::{debug, warn};

use crate::{
    callsite::Callsite,
    error::{DeclarationResult, Declared},
    example::{ExampleMetadata, ExampleResult},
    flatten::flatten,
    group::GroupTree,
    hooks::{Hook, HookRegistry},
    reporter::{Reporter, TracingReporter},
    runner::Suite,
    shared::{SharedExampleClosure, SharedExampleContext, SharedExampleRegistry, shared_closure},
    spec::Spec,
};

/// Stable identifier of a suite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteId(Cow<'static, str>);

impl SuiteId {
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// Identify a suite by a Rust type, usually the type declaring it.
    pub fn of<T: ?Sized>() -> Self {
        Self(Cow::Borrowed(type_name::<T>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for SuiteId {
    fn from(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }
}

impl From<String> for SuiteId {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static GLOBAL_WORLD: LazyLock<Mutex<World>> = LazyLock::new(|| Mutex::new(World::new()));

pub struct World {
    suites: HashMap<SuiteId, GroupTree>,
    registered: HashSet<SuiteId>,
    suite_hooks: HookRegistry,
    example_hooks: HookRegistry,
    shared_examples: SharedExampleRegistry,
    reporter: Arc<dyn Reporter + Send + Sync>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            suites: HashMap::new(),
            registered: HashSet::new(),
            suite_hooks: HookRegistry::new(),
            example_hooks: HookRegistry::new(),
            shared_examples: SharedExampleRegistry::new(),
            reporter: Arc::new(TracingReporter),
        }
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("suites", &self.suites.keys().collect::<Vec<_>>())
            .field("registered", &self.registered)
            .field("suite_hooks", &self.suite_hooks)
            .field("example_hooks", &self.example_hooks)
            .field("shared_examples", &self.shared_examples)
            .finish_non_exhaustive()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process wide world.
    ///
    /// Declaration closures and example bodies run while the guard is held,
    /// so they must not call this again.
    pub fn global() -> MutexGuard<'static, World> {
        GLOBAL_WORLD.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_reporter<R: Reporter + Send + Sync + 'static>(mut self, reporter: R) -> Self {
        self.set_reporter(reporter);
        self
    }

    pub fn set_reporter<R: Reporter + Send + Sync + 'static>(&mut self, reporter: R) {
        self.reporter = Arc::new(reporter);
    }

    pub fn reporter(&self) -> &Arc<dyn Reporter + Send + Sync> {
        &self.reporter
    }

    /// Forget every suite, hook and shared example.
    pub fn reset(&mut self) {
        self.suites.clear();
        self.registered.clear();
        self.suite_hooks = HookRegistry::new();
        self.example_hooks = HookRegistry::new();
        self.shared_examples.clear();
    }

    /// The tree of `suite`, created empty on first access.
    pub fn root_group_for(&mut self, suite: impl Into<SuiteId>) -> &GroupTree {
        self.suites.entry(suite.into()).or_default()
    }

    pub fn tree(&self, suite: &SuiteId) -> Option<&GroupTree> {
        self.suites.get(suite)
    }

    pub fn is_registered(&self, suite: &SuiteId) -> bool {
        self.registered.contains(suite)
    }

    pub fn suite_ids(&self) -> impl Iterator<Item = &SuiteId> {
        self.suites.keys()
    }

    /// Run the declaration closure of `suite`.
    ///
    /// The closure runs at most once per suite, later calls return right away.
    /// If declaring fails the suite is left without examples, shared examples
    /// and suite hooks declared by the closure are dropped again, and the first
    /// error is returned.
    pub fn register<F, T>(&mut self, suite: impl Into<SuiteId>, declare: F) -> DeclarationResult
    where
        F: FnOnce(&mut Spec<'_>) -> T,
        T: Into<Declared>,
    {
        let suite = suite.into();
        if self.registered.contains(&suite) {
            debug!(%suite, "suite already registered");
            return Ok(());
        }

        let checkpoint = (self.shared_examples.clone(), self.suite_hooks.clone());
        let tree = self.suites.remove(&suite).unwrap_or_default();
        let mut spec = Spec::new(self, suite.clone(), tree);
        let declared = declare(&mut spec).into();
        match spec.finish(declared) {
            Ok(tree) => {
                debug!(
                    %suite,
                    groups = tree.group_count(),
                    examples = tree.example_count(),
                    "suite registered"
                );
                self.suites.insert(suite.clone(), tree);
                self.registered.insert(suite);
                Ok(())
            }
            Err(err) => {
                warn!(%suite, %err, "suite registration failed");
                (self.shared_examples, self.suite_hooks) = checkpoint;
                Err(err)
            }
        }
    }

    /// The flattened, runnable form of `suite`.
    pub fn suite(&mut self, suite: impl Into<SuiteId>) -> Suite {
        let suite = suite.into();
        let tree = self.suites.entry(suite.clone()).or_default();
        let examples = flatten(tree, &self.example_hooks);
        Suite::new(
            suite,
            examples,
            self.suite_hooks.clone(),
            Arc::clone(&self.reporter),
        )
    }

    /// Register `suite` if needed and return its runnable form.
    pub fn load<F, T>(&mut self, suite: impl Into<SuiteId>, declare: F) -> DeclarationResult<Suite>
    where
        F: FnOnce(&mut Spec<'_>) -> T,
        T: Into<Declared>,
    {
        let suite = suite.into();
        self.register(suite.clone(), declare)?;
        Ok(self.suite(suite))
    }

    pub fn shared_examples<F, T>(&mut self, name: impl Into<String>, f: F) -> DeclarationResult
    where
        F: Fn(&mut Spec<'_>, &SharedExampleContext) -> T + Send + Sync + 'static,
        T: Into<Declared>,
    {
        self.shared_examples.register(name, shared_closure(f))
    }

    pub fn shared_example(&self, name: &str) -> DeclarationResult<SharedExampleClosure> {
        self.shared_examples.get(name)
    }

    pub fn shared_example_registry(&self) -> &SharedExampleRegistry {
        &self.shared_examples
    }

    /// Runs once before the first executed example of every suite run.
    #[track_caller]
    pub fn before_suite<F, T>(&mut self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.suite_hooks
            .append_before(Hook::plain(f), Callsite::caller());
    }

    /// Runs once after the last example of every suite run that ran
    /// [`before_suite`](Self::before_suite) hooks.
    #[track_caller]
    pub fn after_suite<F, T>(&mut self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.suite_hooks
            .append_after(Hook::plain(f), Callsite::caller());
    }

    /// Runs before every example of every suite, ahead of any group hook.
    #[track_caller]
    pub fn before_each<F, T>(&mut self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.example_hooks
            .append_before(Hook::plain(f), Callsite::caller());
    }

    #[track_caller]
    pub fn before_each_with_metadata<F, T>(&mut self, f: F)
    where
        F: Fn(&ExampleMetadata) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.example_hooks
            .append_before(Hook::with_metadata(f), Callsite::caller());
    }

    /// Runs after every example of every suite, ahead of any group hook.
    #[track_caller]
    pub fn after_each<F, T>(&mut self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.example_hooks
            .append_after(Hook::plain(f), Callsite::caller());
    }

    #[track_caller]
    pub fn after_each_with_metadata<F, T>(&mut self, f: F)
    where
        F: Fn(&ExampleMetadata) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.example_hooks
            .append_after(Hook::with_metadata(f), Callsite::caller());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::DeclarationError, test_support::*};

    struct CalculatorSpec;

    #[test]
    fn suite_ids_from_types_are_stable() {
        assert_eq!(SuiteId::of::<CalculatorSpec>(), SuiteId::of::<CalculatorSpec>());
        assert!(SuiteId::of::<CalculatorSpec>().as_str().ends_with("CalculatorSpec"));
        assert_ne!(SuiteId::of::<CalculatorSpec>(), SuiteId::of::<World>());
    }

    #[test]
    fn root_group_is_created_once() {
        let mut world = World::new();
        assert!(world.tree(&"suite".into()).is_none());
        assert_eq!(world.root_group_for("suite").group_count(), 1);
        assert_eq!(world.root_group_for("suite").group_count(), 1);
        assert_eq!(world.suite_ids().count(), 1);
    }

    #[test]
    fn declaration_closure_runs_once() {
        let (mut world, _) = world();
        let log = CallLog::default();
        for _ in 0..2 {
            let log = log.clone();
            world
                .register("suite", move |s| {
                    log.push("declared");
                    s.it("example", || ())
                })
                .unwrap();
        }
        assert_eq!(log.take(), ["declared"]);
        assert!(world.is_registered(&"suite".into()));
        assert_eq!(world.tree(&"suite".into()).unwrap().example_count(), 1);
    }

    #[test]
    fn failed_registration_can_be_retried() {
        let (mut world, _) = world();
        assert!(world.register("suite", |s| s.it_behaves_like("later")).is_err());
        assert!(!world.is_registered(&"suite".into()));

        world
            .shared_examples("later", |s, _| s.it("shared", || ()))
            .unwrap();
        world
            .register("suite", |s| s.it_behaves_like("later"))
            .unwrap();
        assert_eq!(world.tree(&"suite".into()).unwrap().example_count(), 1);
    }

    #[test]
    fn failed_registration_leaves_no_shared_examples_behind() {
        let (mut world, _) = world();
        let declare = |s: &mut Spec<'_>| -> DeclarationResult {
            s.shared_examples("local", |s, _| s.it("works", || ()))?;
            s.it_behaves_like("local")?;
            s.it_behaves_like("not yet")
        };
        assert_eq!(
            world.register("suite", declare),
            Err(DeclarationError::UndefinedSharedExample("not yet".into()))
        );
        assert!(!world.shared_example_registry().contains("local"));

        world
            .shared_examples("not yet", |s, _| s.it("arrived", || ()))
            .unwrap();
        world.register("suite", declare).unwrap();
        assert_eq!(world.tree(&"suite".into()).unwrap().example_count(), 2);
    }

    #[test]
    fn failed_registration_leaves_no_suite_hooks_behind() {
        let (mut world, _) = world();
        let log = CallLog::default();
        for fail in [true, false] {
            let registered = world.register("suite", |s| -> DeclarationResult {
                s.before_suite(log.pusher("before suite"));
                s.after_suite(log.pusher("after suite"));
                s.it("runs", log.pusher("body"))?;
                match fail {
                    true => s.it_behaves_like("missing"),
                    false => Ok(()),
                }
            });
            assert_eq!(registered.is_err(), fail);
        }
        assert!(world.is_registered(&"suite".into()));

        world.suite("suite").run();
        assert_eq!(log.take(), ["before suite", "body", "after suite"]);
    }

    #[test]
    fn duplicate_shared_examples_keep_the_first() {
        let mut world = World::new();
        world.shared_examples("stack", |s, _| s.it("first", || ())).unwrap();
        let err = world
            .shared_examples("stack", |s, _| s.it("second", || ()))
            .unwrap_err();
        assert_eq!(err, DeclarationError::DuplicateSharedExample("stack".into()));

        let suite = world.load("suite", |s| s.it_behaves_like("stack")).unwrap();
        assert_eq!(suite.examples()[0].name(), "stack first");
    }

    #[test]
    fn reset_forgets_everything() {
        let mut world = World::new();
        world.shared_examples("stack", |_, _| ()).unwrap();
        world.before_suite(|| ());
        world.register("suite", |s| s.it("x", || ())).unwrap();

        world.reset();
        assert!(!world.is_registered(&"suite".into()));
        assert!(world.shared_example_registry().is_empty());
        assert_eq!(world.suite_ids().count(), 0);
    }

    #[test]
    fn global_world_is_shared() {
        World::global().reset();
        World::global()
            .register("global suite", |s| s.it("x", || ()))
            .unwrap();
        assert!(World::global().is_registered(&"global suite".into()));
        World::global().reset();
    }
}
