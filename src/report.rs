use std::{process::ExitCode, time::Duration};

use crate::{
    outcome::{ExampleFailure, ExampleOutcome},
    world::SuiteId,
};

pub type ExampleOutcomes = Vec<(String, ExampleOutcome)>;

#[derive(Debug)]
#[non_exhaustive]
pub struct SpecReport {
    pub suite: SuiteId,
    /// One entry per example, in execution order.
    pub outcomes: ExampleOutcomes,
    /// Failures of `before_suite` and `after_suite` hooks.
    pub suite_failures: Vec<ExampleFailure>,
    /// Examples removed by a name filter.
    pub filtered: usize,
    pub duration: Duration,
}

impl SpecReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.skipped()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.suite_failures.is_empty()
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.is_success() {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }

    pub fn outcome(&self, name: &str) -> Option<&ExampleOutcome> {
        self.outcomes
            .iter()
            .find(|(example, _)| example == name)
            .map(|(_, outcome)| outcome)
    }
}
