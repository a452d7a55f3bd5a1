use std::{fmt, time::Duration};

use thiserror::Error;

use crate::callsite::Callsite;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ExampleOutcome {
    pub status: ExampleStatus,
    pub duration: Duration,
}

impl ExampleOutcome {
    pub fn passed(&self) -> bool {
        self.status.passed()
    }

    pub fn skipped(&self) -> bool {
        self.status.skipped()
    }

    pub fn failed(&self) -> bool {
        self.status.failed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExampleStatus {
    Passed,
    Skipped { reason: SkipReason },
    /// The first failure of the example. Every failure was reported.
    Failed(ExampleFailure),
}

impl ExampleStatus {
    pub fn passed(&self) -> bool {
        matches!(self, ExampleStatus::Passed)
    }

    pub fn skipped(&self) -> bool {
        matches!(self, ExampleStatus::Skipped { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self, ExampleStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The example or one of its groups is pending.
    Pending,
    /// Something else in the suite is focused.
    Unfocused,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Pending => f.write_str("pending"),
            SkipReason::Unfocused => f.write_str("not focused"),
        }
    }
}

/// Where during an example run a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    BeforeSuite,
    BeforeEach,
    Body,
    AfterEach,
    AfterSuite,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::BeforeSuite => "before_suite hook",
            Phase::BeforeEach => "before_each hook",
            Phase::Body => "example",
            Phase::AfterEach => "after_each hook",
            Phase::AfterSuite => "after_suite hook",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Error(String),
    Panicked(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Error(msg) => write!(f, "failed: {msg}"),
            FailureCause::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// A failure raised by an example body or one of its hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{phase} at {origin} {cause}")]
pub struct ExampleFailure {
    pub phase: Phase,
    pub cause: FailureCause,
    /// Where the failing closure was declared.
    pub origin: Callsite,
}

impl ExampleFailure {
    pub fn message(&self) -> &str {
        match &self.cause {
            FailureCause::Error(msg) | FailureCause::Panicked(msg) => msg,
        }
    }

    pub fn panicked(&self) -> bool {
        matches!(self.cause, FailureCause::Panicked(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_describe_themselves() {
        let failure = ExampleFailure {
            phase: Phase::BeforeEach,
            cause: FailureCause::Panicked("no database".into()),
            origin: Callsite::new("spec.rs", 9),
        };
        assert_eq!(
            failure.to_string(),
            "before_each hook at spec.rs:9 panicked: no database"
        );
        assert_eq!(failure.message(), "no database");
        assert!(failure.panicked());
    }

    #[test]
    fn status_predicates() {
        assert!(ExampleStatus::Passed.passed());
        assert!(
            ExampleStatus::Skipped {
                reason: SkipReason::Pending
            }
            .skipped()
        );
        assert!(!ExampleStatus::Passed.failed());
    }
}
