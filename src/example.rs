use std::{borrow::Cow, fmt::Debug, sync::Arc};

use crate::{callsite::Callsite, flags::Flags};

/// A single declared example.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Example {
    pub description: Cow<'static, str>,
    pub callsite: Callsite,
    pub flags: Flags,
    pub is_shared_example: bool,
    body: ExampleFnHandle,
}

impl Example {
    pub fn new(
        description: impl Into<Cow<'static, str>>,
        callsite: Callsite,
        flags: Flags,
        body: ExampleFnHandle,
    ) -> Self {
        Self {
            description: description.into(),
            callsite,
            flags,
            is_shared_example: false,
            body,
        }
    }

    pub fn body(&self) -> &ExampleFnHandle {
        &self.body
    }

    /// Point the example at the `it_behaves_like` call that produced it.
    pub(crate) fn attribute_to_shared(&mut self, callsite: &Callsite) {
        self.callsite = callsite.clone();
        self.is_shared_example = true;
    }
}

/// Callable body of an example or hook.
#[derive(Clone)]
#[non_exhaustive]
pub enum ExampleFnHandle {
    Ptr(fn() -> ExampleResult),
    Shared(Arc<dyn ExampleFn + Send + Sync>),
}

impl Debug for ExampleFnHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ptr(ptr) => f.debug_tuple("Ptr").field(ptr).finish(),
            Self::Shared(_) => write!(f, "Shared(...)"),
        }
    }
}

impl ExampleFnHandle {
    pub const fn from_const_fn(f: fn() -> ExampleResult) -> Self {
        Self::Ptr(f)
    }

    pub fn from_closure<F, T>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<ExampleResult>,
    {
        Self::Shared(Arc::new(f))
    }

    pub fn call(&self) -> ExampleResult {
        match self {
            Self::Ptr(f) => f(),
            Self::Shared(f) => f.call_example(),
        }
    }
}

pub trait ExampleFn {
    fn call_example(&self) -> ExampleResult;
}

impl<F, T> ExampleFn for F
where
    F: Fn() -> T,
    T: Into<ExampleResult>,
{
    fn call_example(&self) -> ExampleResult {
        (self)().into()
    }
}

/// What an example body or hook returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleResult(pub Result<(), String>);

impl From<()> for ExampleResult {
    fn from(_: ()) -> Self {
        Self(Ok(()))
    }
}

impl<E: Debug> From<Result<(), E>> for ExampleResult {
    fn from(v: Result<(), E>) -> Self {
        ExampleResult(v.map_err(|e| format!("{e:#?}")))
    }
}

/// Facts about the example a hook is running for.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ExampleMetadata {
    pub description: Cow<'static, str>,
    /// Group descriptions joined with the example description.
    pub name: String,
    pub callsite: Callsite,
    /// Descriptions of the enclosing groups, outermost first. The root group is
    /// not part of the path.
    pub group_path: Vec<Cow<'static, str>>,
    /// Position of the example in the flattened suite.
    pub index: usize,
    pub is_shared_example: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_and_results_convert() {
        assert_eq!(ExampleResult::from(()), ExampleResult(Ok(())));
        assert_eq!(
            ExampleResult::from(Err::<(), _>("nope")),
            ExampleResult(Err("\"nope\"".to_string()))
        );
    }

    #[test]
    fn closures_are_callable_through_handle() {
        let handle = ExampleFnHandle::from_closure(|| Err::<(), _>(42));
        assert_eq!(handle.call(), ExampleResult(Err("42".to_string())));

        fn ok() -> ExampleResult {
            ().into()
        }
        assert_eq!(ExampleFnHandle::from_const_fn(ok).call(), ExampleResult(Ok(())));
    }

    #[test]
    fn shared_attribution_overwrites_callsite() {
        let mut example = Example::new(
            "e",
            Callsite::new("shared.rs", 3),
            Flags::new(),
            ExampleFnHandle::from_closure(|| ()),
        );
        example.attribute_to_shared(&Callsite::new("spec.rs", 40));
        assert_eq!(example.callsite, Callsite::new("spec.rs", 40));
        assert!(example.is_shared_example);
    }
}
