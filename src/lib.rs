pub mod callsite;
pub mod error;
pub mod example;
pub mod filter;
pub mod flags;
pub mod flatten;
pub mod group;
pub mod hooks;
pub mod outcome;
pub mod reporter;
pub mod runner;
pub mod shared;
pub mod spec;
pub mod world;

mod report;
pub use report::*;

#[cfg(test)]
mod test_support;

pub mod prelude {
    pub use crate::{
        callsite,
        callsite::Callsite,
        error::{DeclarationError, DeclarationResult},
        example::{ExampleMetadata, ExampleResult},
        filter::NameFilter,
        flags::{Filter, Flags},
        outcome::{ExampleOutcome, ExampleStatus, SkipReason},
        report::SpecReport,
        reporter::{ChannelReporter, ReportEvent, Reporter, TracingReporter},
        runner::Suite,
        shared::SharedExampleContext,
        spec::Spec,
        world::{SuiteId, World},
    };
}
