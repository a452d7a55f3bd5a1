//! The collaborator that surfaces failures and log lines to the host.

use crossbeam_channel::{Receiver, Sender};
use tracing::{info, warn};

use crate::callsite::Callsite;

pub trait Reporter {
    /// Called once per failing hook or example body.
    fn report_failure(&self, message: &str, callsite: &Callsite);

    fn log(&self, message: &str);
}

/// Emits `tracing` events, the default for a fresh [`World`](crate::world::World).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report_failure(&self, message: &str, callsite: &Callsite) {
        warn!(file = callsite.file(), line = callsite.line(), "{message}");
    }

    fn log(&self, message: &str) {
        info!("{message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Failure { message: String, callsite: Callsite },
    Log(String),
}

/// Forwards every report to a channel, for hosts that collect them elsewhere.
///
/// Reports are dropped silently once the receiving side is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: Sender<ReportEvent>,
}

impl ChannelReporter {
    pub fn new() -> (Self, Receiver<ReportEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    pub fn from_sender(sender: Sender<ReportEvent>) -> Self {
        Self { sender }
    }
}

impl Reporter for ChannelReporter {
    fn report_failure(&self, message: &str, callsite: &Callsite) {
        let _ = self.sender.send(ReportEvent::Failure {
            message: message.to_string(),
            callsite: callsite.clone(),
        });
    }

    fn log(&self, message: &str) {
        let _ = self.sender.send(ReportEvent::Log(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_reporter_keeps_order() {
        let (reporter, events) = ChannelReporter::new();
        reporter.log("Pending: later");
        reporter.report_failure("boom", &Callsite::new("spec.rs", 7));
        drop(reporter);

        let events: Vec<_> = events.iter().collect();
        assert_eq!(
            events,
            [
                ReportEvent::Log("Pending: later".into()),
                ReportEvent::Failure {
                    message: "boom".into(),
                    callsite: Callsite::new("spec.rs", 7),
                },
            ]
        );
    }

    #[test]
    fn channel_reporter_survives_closed_receiver() {
        let (reporter, events) = ChannelReporter::new();
        drop(events);
        reporter.log("nobody listens");
    }

    #[test]
    fn bounded_sender_can_be_used_from_another_thread() {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let reporter = ChannelReporter::from_sender(sender);
        std::thread::scope(|scope| {
            scope.spawn(move || reporter.log("from worker"));
            assert_eq!(receiver.recv().unwrap(), ReportEvent::Log("from worker".into()));
        });
    }
}
