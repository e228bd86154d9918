use std::error::Error;
use std::fmt;
use std::sync::mpsc;

/// Share of the overall progress owned by artifact synchronization.
/// Application load owns the rest.
pub const SYNC_SHARE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    ManifestSync,
    ArtifactSync,
    AppLoad,
    Running,
    Failed,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Init => "Init",
            Phase::ManifestSync => "Update Manifest",
            Phase::ArtifactSync => "File Synchronization",
            Phase::AppLoad => "Application Load",
            Phase::Running => "Running",
            Phase::Failed => "Failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Notification posted by the update worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PhaseStarted(Phase),
    Progress(f64),
    Status(String),
}

/// Presentation of launch progress.
///
/// Always called on the thread that invoked [`Orchestrator::run`](crate::Orchestrator::run),
/// never from the worker.
pub trait ProgressSink {
    fn on_phase_start(&mut self, phase: Phase);

    /// Overall progress in `0.0..=1.0`, non-decreasing within a launch.
    fn on_progress(&mut self, fraction: f64);

    fn on_status_text(&mut self, text: &str);

    fn on_error(&mut self, report: &ErrorReport) {
        let _ = report;
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::PhaseStarted(phase) => self.on_phase_start(phase),
            Event::Progress(fraction) => self.on_progress(fraction),
            Event::Status(text) => self.on_status_text(&text),
        }
    }
}

/// Worker side of the event channel.
///
/// Sends are fire-and-forget; a closed channel means nobody is watching.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: Option<mpsc::Sender<Event>>,
}

impl Reporter {
    pub fn channel() -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A reporter that drops every event.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    pub fn phase(&self, phase: Phase) {
        self.send(Event::PhaseStarted(phase));
    }

    pub fn progress(&self, fraction: f64) {
        self.send(Event::Progress(fraction.clamp(0.0, 1.0)));
    }

    pub fn status(&self, text: impl Into<String>) {
        self.send(Event::Status(text.into()));
    }

    fn send(&self, event: Event) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

/// Human-facing description of a fatal launch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub phase: Phase,
    pub title: String,
    /// Display of the error followed by every `source()` below it.
    pub causes: Vec<String>,
}

impl ErrorReport {
    pub fn new(phase: Phase, error: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut current = Some(error);
        while let Some(err) = current {
            causes.push(err.to_string());
            current = err.source();
        }

        Self {
            phase,
            title: format!("Error during {phase} phase"),
            causes,
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        let mut causes = self.causes.iter();
        if let Some(first) = causes.next() {
            write!(f, ": {first}")?;
        }
        for cause in causes {
            write!(f, "\n  caused by: {cause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LaunchError, SyncError};
    use relaunch_fetch::FetchError;

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl ProgressSink for Recorder {
        fn on_phase_start(&mut self, phase: Phase) {
            self.0.push(Event::PhaseStarted(phase));
        }
        fn on_progress(&mut self, fraction: f64) {
            self.0.push(Event::Progress(fraction));
        }
        fn on_status_text(&mut self, text: &str) {
            self.0.push(Event::Status(text.to_string()));
        }
    }

    #[test]
    fn test_reporter_delivers_in_order() {
        let (reporter, rx) = Reporter::channel();
        reporter.phase(Phase::ArtifactSync);
        reporter.progress(1.5);
        reporter.status("hi");
        drop(reporter);

        let mut sink = Recorder::default();
        for event in rx {
            sink.dispatch(event);
        }
        assert_eq!(
            sink.0,
            vec![
                Event::PhaseStarted(Phase::ArtifactSync),
                Event::Progress(1.0),
                Event::Status("hi".into()),
            ]
        );
    }

    #[test]
    fn test_noop_reporter() {
        Reporter::noop().progress(0.5);
    }

    #[test]
    fn test_report_walks_source_chain() {
        let err = LaunchError::Sync(SyncError::Transfer {
            path: "lib/core.jar".into(),
            source: FetchError::InvalidUrl("ftp://x".into()),
        });
        let report = ErrorReport::new(Phase::ArtifactSync, &err);

        assert_eq!(report.title, "Error during File Synchronization phase");
        assert_eq!(
            report.causes,
            vec![
                "artifact synchronization failed",
                "failed to download lib/core.jar",
                "invalid URL: ftp://x",
            ]
        );
        assert!(report.to_string().starts_with(
            "Error during File Synchronization phase: artifact synchronization failed\n"
        ));
    }
}
