//! Executing flattened examples.
//!
//! A [`Suite`] is the runnable form of one registration tree. It can be run
//! as a whole, producing a [`SpecReport`], or split into independent
//! [`RunnableExample`]s for a host runner that drives examples itself. Both
//! paths share one run state, so suite hooks run exactly once around the
//! executed examples either way.

use std::{
    any::Any,
    collections::HashSet,
    fmt,
    mem,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tracing::{debug, trace};

use crate::{
    callsite::Callsite,
    example::{ExampleMetadata, ExampleResult},
    filter::{FilteredExamples, NameFilter},
    flatten::FlatExample,
    hooks::{HookRegistry, RegisteredHook},
    outcome::{ExampleFailure, ExampleOutcome, ExampleStatus, FailureCause, Phase},
    report::SpecReport,
    reporter::Reporter,
    world::SuiteId,
};

/// Convert a panic payload into a string.
///
/// This matches the common payload types produced by `panic!` (`&'static str` and `String`).
/// Other payload types are formatted as a generic placeholder.
pub fn payload_as_string(err: Box<dyn Any + Send + 'static>) -> String {
    err.downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|err| err.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}

fn guarded(f: impl FnOnce() -> ExampleResult) -> Result<(), FailureCause> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(ExampleResult(Ok(()))) => Ok(()),
        Ok(ExampleResult(Err(msg))) => Err(FailureCause::Error(msg)),
        Err(payload) => Err(FailureCause::Panicked(payload_as_string(payload))),
    }
}

pub struct Suite {
    id: SuiteId,
    examples: Vec<FlatExample>,
    filtered: usize,
    hooks: HookRegistry,
    reporter: Arc<dyn Reporter + Send + Sync>,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("id", &self.id)
            .field("examples", &self.examples)
            .field("filtered", &self.filtered)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

impl Suite {
    pub(crate) fn new(
        id: SuiteId,
        examples: Vec<FlatExample>,
        hooks: HookRegistry,
        reporter: Arc<dyn Reporter + Send + Sync>,
    ) -> Self {
        Self {
            id,
            examples,
            filtered: 0,
            hooks,
            reporter,
        }
    }

    pub fn id(&self) -> &SuiteId {
        &self.id
    }

    pub fn examples(&self) -> &[FlatExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// How many examples the name filters removed.
    pub fn filtered(&self) -> usize {
        self.filtered
    }

    pub fn with_reporter<R: Reporter + Send + Sync + 'static>(self, reporter: R) -> Self {
        Self {
            reporter: Arc::new(reporter),
            ..self
        }
    }

    pub fn with_filter(self, filter: &NameFilter) -> Self {
        let FilteredExamples { examples, filtered } = filter.filter(self.examples);
        Self {
            examples,
            filtered: self.filtered + filtered,
            ..self
        }
    }

    fn into_parts(self) -> (SuiteId, usize, Vec<FlatExample>, Arc<SuiteState>) {
        let remaining = self
            .examples
            .iter()
            .filter(|example| example.skip.is_none())
            .map(|example| example.meta.index)
            .collect();
        let state = Arc::new(SuiteState {
            hooks: self.hooks,
            reporter: self.reporter,
            phase: Mutex::new(SuitePhase {
                remaining,
                ..SuitePhase::default()
            }),
        });
        (self.id, self.filtered, self.examples, state)
    }

    pub fn into_runnables(self) -> Vec<RunnableExample> {
        let (_, _, examples, state) = self.into_parts();
        examples
            .into_iter()
            .map(|example| RunnableExample {
                example,
                state: Arc::clone(&state),
            })
            .collect()
    }

    /// The suite as `(name, run)` pairs, in execution order.
    ///
    /// `before_suite` hooks run with the first executed pair. `after_suite`
    /// hooks run once every pair that is not skipped has run at least once,
    /// so a host running only a subset never triggers them.
    pub fn into_tests(self) -> Vec<(String, Box<dyn Fn() -> ExampleOutcome + Send + Sync>)> {
        self.into_runnables()
            .into_iter()
            .map(|runnable| {
                let name = runnable.name().to_string();
                let run: Box<dyn Fn() -> ExampleOutcome + Send + Sync> =
                    Box::new(move || runnable.run());
                (name, run)
            })
            .collect()
    }

    /// Run every example in order.
    pub fn run(self) -> SpecReport {
        let now = Instant::now();
        let (suite, filtered, examples, state) = self.into_parts();
        debug!(%suite, examples = examples.len(), filtered, "running suite");

        let outcomes = examples
            .into_iter()
            .map(|example| {
                let runnable = RunnableExample {
                    example,
                    state: Arc::clone(&state),
                };
                let outcome = runnable.run();
                (runnable.example.meta.name, outcome)
            })
            .collect();

        let suite_failures = mem::take(&mut state.lock().failures);
        SpecReport {
            suite,
            outcomes,
            suite_failures,
            filtered,
            duration: now.elapsed(),
        }
    }
}

struct SuiteState {
    hooks: HookRegistry,
    reporter: Arc<dyn Reporter + Send + Sync>,
    phase: Mutex<SuitePhase>,
}

#[derive(Debug, Default)]
struct SuitePhase {
    before_ran: bool,
    after_ran: bool,
    /// Indices of examples that have not executed yet.
    remaining: HashSet<usize>,
    failures: Vec<ExampleFailure>,
}

impl SuiteState {
    fn lock(&self) -> MutexGuard<'_, SuitePhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) {
        let mut phase = self.lock();
        if phase.before_ran {
            return;
        }
        phase.before_ran = true;
        for hook in self.hooks.befores() {
            self.run_hook(&mut phase, Phase::BeforeSuite, hook);
        }
    }

    fn leave(&self, index: usize) {
        let mut phase = self.lock();
        phase.remaining.remove(&index);
        if !phase.remaining.is_empty() || !phase.before_ran || phase.after_ran {
            return;
        }
        phase.after_ran = true;
        for hook in self.hooks.afters() {
            self.run_hook(&mut phase, Phase::AfterSuite, hook);
        }
    }

    fn run_hook(&self, phase: &mut SuitePhase, kind: Phase, hook: &RegisteredHook) {
        if let Err(cause) = guarded(|| hook.hook.call_detached()) {
            let failure = ExampleFailure {
                phase: kind,
                cause,
                origin: hook.callsite.clone(),
            };
            self.reporter
                .report_failure(&failure.to_string(), &hook.callsite);
            phase.failures.push(failure);
        }
    }
}

/// One flattened example bound to the run state of its suite.
pub struct RunnableExample {
    example: FlatExample,
    state: Arc<SuiteState>,
}

impl fmt::Debug for RunnableExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnableExample")
            .field("example", &self.example)
            .finish_non_exhaustive()
    }
}

impl RunnableExample {
    pub fn name(&self) -> &str {
        self.example.name()
    }

    pub fn meta(&self) -> &ExampleMetadata {
        &self.example.meta
    }

    pub fn example(&self) -> &FlatExample {
        &self.example
    }

    pub fn run(&self) -> ExampleOutcome {
        let now = Instant::now();
        let status = match self.example.skip {
            Some(reason) => {
                debug!(example = self.name(), %reason, "skipped");
                ExampleStatus::Skipped { reason }
            }
            None => {
                self.state.enter();
                let status = execute(&self.example, self.state.reporter.as_ref());
                self.state.leave(self.example.meta.index);
                status
            }
        };
        ExampleOutcome {
            status,
            duration: now.elapsed(),
        }
    }
}

/// Run the before chain, the body and the after chain of one example.
///
/// A failing before hook stops the chain and the body, the after chain still
/// runs. Every failure is reported at the example's callsite.
fn execute(example: &FlatExample, reporter: &(dyn Reporter + Send + Sync)) -> ExampleStatus {
    let meta = &example.meta;
    trace!(example = %meta.name, "run");

    let mut first = None;
    let mut fail = |phase: Phase, cause: FailureCause, origin: &Callsite| {
        let failure = ExampleFailure {
            phase,
            cause,
            origin: origin.clone(),
        };
        reporter.report_failure(&failure.to_string(), &meta.callsite);
        if first.is_none() {
            first = Some(failure);
        }
    };

    let mut ready = true;
    for hook in &example.before {
        if let Err(cause) = guarded(|| hook.hook.call(meta)) {
            fail(Phase::BeforeEach, cause, &hook.callsite);
            ready = false;
            break;
        }
    }

    if ready && let Err(cause) = guarded(|| example.body.call()) {
        fail(Phase::Body, cause, &meta.callsite);
    }

    for hook in &example.after {
        if let Err(cause) = guarded(|| hook.hook.call(meta)) {
            fail(Phase::AfterEach, cause, &hook.callsite);
        }
    }

    match first {
        Some(failure) => ExampleStatus::Failed(failure),
        None => ExampleStatus::Passed,
    }
}
