//! The registration context handed to a suite's declaration closure.
//!
//! [`Spec`] owns the cursor that tracks which group declarations attach to.
//! `describe` opens a group, runs its body against the same context and
//! closes the group again, so groups nest strictly.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::{
    callsite::Callsite,
    error::{DeclarationError, DeclarationResult, Declared},
    example::{Example, ExampleFnHandle, ExampleMetadata, ExampleResult},
    flags::Flags,
    group::{GroupId, GroupTree},
    hooks::Hook,
    shared::SharedExampleContext,
    world::{SuiteId, World},
};

pub struct Spec<'w> {
    world: &'w mut World,
    suite: SuiteId,
    tree: GroupTree,
    cursor: Option<GroupId>,
    error: Option<DeclarationError>,
}

impl<'w> Spec<'w> {
    pub(crate) fn new(world: &'w mut World, suite: SuiteId, tree: GroupTree) -> Self {
        let cursor = Some(tree.root());
        Self {
            world,
            suite,
            tree,
            cursor,
            error: None,
        }
    }

    /// Hand back the tree, failing with the first error seen while declaring.
    pub(crate) fn finish(self, declared: Declared) -> DeclarationResult<GroupTree> {
        if let Some(err) = self.error {
            return Err(err);
        }
        declared.0?;
        match self.cursor == Some(self.tree.root()) {
            true => Ok(self.tree),
            false => Err(DeclarationError::unbalanced()),
        }
    }

    pub fn suite(&self) -> &SuiteId {
        &self.suite
    }

    pub fn tree(&self) -> &GroupTree {
        &self.tree
    }

    /// The group declarations currently attach to, if any.
    pub fn current_group(&self) -> Option<GroupId> {
        self.cursor
    }

    fn record(&mut self, err: DeclarationError) -> DeclarationError {
        if self.error.is_none() {
            self.error = Some(err.clone());
        }
        err
    }

    fn active(&mut self, operation: &'static str) -> DeclarationResult<GroupId> {
        match self.cursor {
            Some(id) => Ok(id),
            None => Err(self.record(DeclarationError::outside_registration(operation))),
        }
    }

    pub fn begin_group(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        flags: Flags,
    ) -> DeclarationResult<GroupId> {
        let parent = self.active("describe")?;
        let id = self.tree.add_group(parent, description, flags);
        trace!(suite = %self.suite, group = %self.tree.group(id).description, "open group");
        self.cursor = Some(id);
        Ok(id)
    }

    pub fn end_group(&mut self) -> DeclarationResult {
        let current = self.active("end_group")?;
        self.cursor = self.tree.parent(current);
        Ok(())
    }

    pub fn add_example(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        callsite: Callsite,
        flags: Flags,
        body: ExampleFnHandle,
    ) -> DeclarationResult {
        let parent = self.active("it")?;
        self.tree
            .add_example(parent, Example::new(description, callsite, flags, body));
        Ok(())
    }

    fn scoped<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        flags: Flags,
        body: F,
    ) -> DeclarationResult<GroupId>
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        let id = self.begin_group(description, flags)?;
        let declared = body(self).into();
        self.end_group()?;
        declared.0.map_err(|err| self.record(err))?;
        Ok(id)
    }

    pub fn describe_with_flags<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        flags: Flags,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.scoped(description, flags, body).map(drop)
    }

    pub fn describe<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.describe_with_flags(description, Flags::new(), body)
    }

    pub fn context<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.describe(description, body)
    }

    pub fn fdescribe<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.describe_with_flags(description, Flags::focused(), body)
    }

    pub fn xdescribe<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.describe_with_flags(description, Flags::pending(), body)
    }

    pub fn fcontext<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.fdescribe(description, body)
    }

    pub fn xcontext<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: FnOnce(&mut Self) -> T,
        T: Into<Declared>,
    {
        self.xdescribe(description, body)
    }

    #[track_caller]
    pub fn it_with_flags<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        flags: Flags,
        body: F,
    ) -> DeclarationResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        let callsite = Callsite::caller();
        self.add_example(description, callsite, flags, ExampleFnHandle::from_closure(body))
    }

    #[track_caller]
    pub fn it<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.it_with_flags(description, Flags::new(), body)
    }

    #[track_caller]
    pub fn fit<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.it_with_flags(description, Flags::focused(), body)
    }

    #[track_caller]
    pub fn xit<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        body: F,
    ) -> DeclarationResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.it_with_flags(description, Flags::pending(), body)
    }

    /// Announce an example that is not written yet.
    ///
    /// Nothing is registered and the body never runs, unlike [`xit`](Self::xit).
    pub fn pending<F>(&mut self, description: impl AsRef<str>, _body: F)
    where
        F: FnOnce(),
    {
        self.world
            .reporter()
            .log(&format!("Pending: {}", description.as_ref()));
    }

    fn hook(
        &mut self,
        operation: &'static str,
        before: bool,
        hook: Hook,
        callsite: Callsite,
    ) -> DeclarationResult {
        let current = self.active(operation)?;
        let hooks = &mut self.tree.group_mut(current).hooks;
        match before {
            true => hooks.append_before(hook, callsite),
            false => hooks.append_after(hook, callsite),
        }
        Ok(())
    }

    #[track_caller]
    pub fn before_each<F, T>(&mut self, f: F) -> DeclarationResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.hook("before_each", true, Hook::plain(f), Callsite::caller())
    }

    #[track_caller]
    pub fn before_each_with_metadata<F, T>(&mut self, f: F) -> DeclarationResult
    where
        F: Fn(&ExampleMetadata) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.hook("before_each", true, Hook::with_metadata(f), Callsite::caller())
    }

    #[track_caller]
    pub fn after_each<F, T>(&mut self, f: F) -> DeclarationResult
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.hook("after_each", false, Hook::plain(f), Callsite::caller())
    }

    #[track_caller]
    pub fn after_each_with_metadata<F, T>(&mut self, f: F) -> DeclarationResult
    where
        F: Fn(&ExampleMetadata) -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.hook("after_each", false, Hook::with_metadata(f), Callsite::caller())
    }

    #[track_caller]
    pub fn before_suite<F, T>(&mut self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.world.before_suite(f);
    }

    #[track_caller]
    pub fn after_suite<F, T>(&mut self, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        self.world.after_suite(f);
    }

    pub fn shared_examples<F, T>(&mut self, name: impl Into<String>, f: F) -> DeclarationResult
    where
        F: Fn(&mut Spec<'_>, &SharedExampleContext) -> T + Send + Sync + 'static,
        T: Into<Declared>,
    {
        self.world
            .shared_examples(name, f)
            .map_err(|err| self.record(err))
    }

    /// Expand the shared examples `name` into a new group.
    ///
    /// Every example declared by the shared closure reports `callsite` as its
    /// origin and is marked as a shared example instance.
    pub fn it_behaves_like_at(
        &mut self,
        name: &str,
        context: SharedExampleContext,
        flags: Flags,
        callsite: Callsite,
    ) -> DeclarationResult {
        let closure = self
            .world
            .shared_example(name)
            .map_err(|err| self.record(err))?;
        debug!(suite = %self.suite, shared = name, %callsite, "expand shared examples");

        let group = self.begin_group(name.to_string(), flags)?;
        let declared = closure(self, &context);
        self.tree
            .walk_examples_mut(group, |example| example.attribute_to_shared(&callsite));
        self.end_group()?;
        declared.0.map_err(|err| self.record(err))
    }

    #[track_caller]
    pub fn it_behaves_like_with_flags(
        &mut self,
        name: &str,
        context: SharedExampleContext,
        flags: Flags,
    ) -> DeclarationResult {
        self.it_behaves_like_at(name, context, flags, Callsite::caller())
    }

    #[track_caller]
    pub fn it_behaves_like_with(
        &mut self,
        name: &str,
        context: SharedExampleContext,
    ) -> DeclarationResult {
        self.it_behaves_like_with_flags(name, context, Flags::new())
    }

    #[track_caller]
    pub fn it_behaves_like(&mut self, name: &str) -> DeclarationResult {
        self.it_behaves_like_with_flags(name, SharedExampleContext::new(), Flags::new())
    }

    #[track_caller]
    pub fn fit_behaves_like(&mut self, name: &str) -> DeclarationResult {
        self.it_behaves_like_with_flags(name, SharedExampleContext::new(), Flags::focused())
    }

    #[track_caller]
    pub fn xit_behaves_like(&mut self, name: &str) -> DeclarationResult {
        self.it_behaves_like_with_flags(name, SharedExampleContext::new(), Flags::pending())
    }
}
