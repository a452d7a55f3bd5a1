use std::{
    borrow::Cow,
    sync::{Arc, Mutex},
};

use crate::{
    callsite::Callsite,
    example::ExampleMetadata,
    reporter::{ReportEvent, Reporter},
    world::World,
};

/// Records the order in which closures ran.
#[derive(Debug, Default, Clone)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    /// A closure pushing `entry`, ready to be used as example body or hook.
    pub fn pusher(&self, entry: &'static str) -> impl Fn() + Send + Sync + 'static {
        let log = self.clone();
        move || log.push(entry)
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingReporter(Arc<Mutex<Vec<ReportEvent>>>);

impl RecordingReporter {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(String, Callsite)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Failure { message, callsite } => Some((message, callsite)),
                ReportEvent::Log(_) => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ReportEvent::Log(message) => Some(message),
                ReportEvent::Failure { .. } => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report_failure(&self, message: &str, callsite: &Callsite) {
        self.0.lock().unwrap().push(ReportEvent::Failure {
            message: message.to_string(),
            callsite: callsite.clone(),
        });
    }

    fn log(&self, message: &str) {
        self.0.lock().unwrap().push(ReportEvent::Log(message.to_string()));
    }
}

/// A fresh world reporting into the returned recorder.
pub fn world() -> (World, RecordingReporter) {
    let reporter = RecordingReporter::default();
    (World::new().with_reporter(reporter.clone()), reporter)
}

pub fn metadata(name: &'static str) -> ExampleMetadata {
    ExampleMetadata {
        description: Cow::Borrowed(name),
        name: name.to_string(),
        callsite: Callsite::new("support.rs", 1),
        group_path: Vec::new(),
        index: 0,
        is_shared_example: false,
    }
}
