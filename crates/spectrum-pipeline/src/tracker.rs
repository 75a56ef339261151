//! Sequential progress over a fixed list of step labels.

use std::fmt;

/// Default message of [`StepTracker::complete`].
pub const COMPLETED_MESSAGE: &str = "Operation completed successfully";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    /// 1-based index of the current step.
    Running(usize),
    Completed(String),
    Failed(String),
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

/// A transition reported by a [`StepTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent<'a> {
    Advanced {
        index: usize,
        total: usize,
        label: &'a str,
    },
    Completed {
        message: &'a str,
    },
    Failed {
        error: &'a str,
    },
    /// A non-fatal step failed; the pipeline continues.
    Warning {
        message: &'a str,
    },
}

impl fmt::Display for StepEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advanced {
                index,
                total,
                label,
            } => write!(f, "[{index}/{total}] - {label}"),
            Self::Completed { message } => write!(f, "✔ {message}"),
            Self::Failed { error } => write!(f, "✖ {error}"),
            Self::Warning { message } => write!(f, "⚠ {message}"),
        }
    }
}

/// Sink for tracker transitions.
pub trait StepReporter: Send {
    fn report(&mut self, event: StepEvent<'_>);
}

/// Prints progress to stdout and failures/warnings to stderr.
#[derive(Debug, Default)]
pub struct TerminalReporter {
    scope: String,
}

impl TerminalReporter {
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_owned(),
        }
    }
}

impl StepReporter for TerminalReporter {
    fn report(&mut self, event: StepEvent<'_>) {
        match event {
            StepEvent::Advanced { .. } | StepEvent::Completed { .. } => {
                println!("[{}] {event}", self.scope);
            }
            StepEvent::Failed { .. } | StepEvent::Warning { .. } => {
                eprintln!("[{}] {event}", self.scope);
            }
        }
    }
}

/// Cursor over an immutable ordered list of step labels.
///
/// ```text
/// idle ─advance→ running(1) ─advance→ … running(N) ─advance→ completed
///   └──────────────┴──── fail ───→ failed        complete ─→ completed
/// ```
///
/// Transitions out of a terminal state are ignored and logged.
pub struct StepTracker {
    labels: Vec<String>,
    cursor: usize,
    state: TrackerState,
    reporter: Box<dyn StepReporter>,
}

impl StepTracker {
    pub fn new<S: Into<String>>(
        labels: impl IntoIterator<Item = S>,
        reporter: Box<dyn StepReporter>,
    ) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            cursor: 0,
            state: TrackerState::Idle,
            reporter,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn total(&self) -> usize {
        self.labels.len()
    }

    /// Move to the next step and report it; `label` replaces the stored
    /// label in this report only. Past the last step the tracker completes.
    pub fn advance(&mut self, label: Option<&str>) {
        if self.ignore_terminal("advance") {
            return;
        }
        if self.cursor == self.labels.len() {
            self.complete(None);
            return;
        }

        self.cursor += 1;
        self.state = TrackerState::Running(self.cursor);
        let label = label.unwrap_or(&self.labels[self.cursor - 1]);
        self.reporter.report(StepEvent::Advanced {
            index: self.cursor,
            total: self.labels.len(),
            label,
        });
    }

    pub fn fail(&mut self, error: &dyn fmt::Display) {
        if self.ignore_terminal("fail") {
            return;
        }
        let error = error.to_string();
        self.reporter.report(StepEvent::Failed { error: &error });
        self.state = TrackerState::Failed(error);
    }

    pub fn complete(&mut self, message: Option<&str>) {
        if self.ignore_terminal("complete") {
            return;
        }
        let message = message.unwrap_or(COMPLETED_MESSAGE);
        self.reporter.report(StepEvent::Completed { message });
        self.state = TrackerState::Completed(message.to_owned());
    }

    /// Report a non-fatal step failure without changing state.
    pub fn warn(&mut self, message: &str) {
        tracing::warn!(step = self.cursor, "{message}");
        self.reporter.report(StepEvent::Warning { message });
    }

    fn ignore_terminal(&self, transition: &str) -> bool {
        if self.state.is_terminal() {
            tracing::warn!(transition, state = ?self.state, "tracker already finished; ignoring");
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl StepReporter for Recorder {
        fn report(&mut self, event: StepEvent<'_>) {
            self.0.lock().unwrap().push(event.to_string());
        }
    }

    impl Recorder {
        fn lines(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    fn tracker(labels: &[&str]) -> (StepTracker, Recorder) {
        let recorder = Recorder::default();
        let tracker = StepTracker::new(labels.iter().copied(), Box::new(recorder.clone()));
        (tracker, recorder)
    }

    #[test]
    fn advances_through_every_label_then_completes() {
        let (mut t, rec) = tracker(&["one", "two", "three"]);
        assert_eq!(t.state(), &TrackerState::Idle);

        t.advance(None);
        t.advance(Some("two: detail"));
        t.advance(None);
        assert_eq!(t.state(), &TrackerState::Running(3));

        t.advance(None);
        assert_eq!(
            t.state(),
            &TrackerState::Completed(COMPLETED_MESSAGE.to_owned())
        );
        assert_eq!(
            rec.lines(),
            vec![
                "[1/3] - one",
                "[2/3] - two: detail",
                "[3/3] - three",
                "✔ Operation completed successfully",
            ]
        );
    }

    #[test]
    fn override_does_not_replace_stored_label() {
        let (mut t, rec) = tracker(&["one"]);
        t.advance(Some("custom"));
        assert_eq!(t.total(), 1);
        assert_eq!(rec.lines(), vec!["[1/1] - custom"]);
    }

    #[test]
    fn no_transitions_after_failure() {
        let (mut t, rec) = tracker(&["one", "two"]);
        t.advance(None);
        t.fail(&"boom");

        t.advance(None);
        t.complete(Some("done"));
        t.fail(&"again");

        assert_eq!(t.state(), &TrackerState::Failed("boom".to_owned()));
        assert_eq!(rec.lines(), vec!["[1/2] - one", "✖ boom"]);
    }

    #[test]
    fn no_transitions_after_completion() {
        let (mut t, _rec) = tracker(&["one"]);
        t.complete(Some("done"));
        t.fail(&"late");
        t.advance(None);

        assert_eq!(t.state(), &TrackerState::Completed("done".to_owned()));
    }

    #[test]
    fn fail_from_idle_is_allowed() {
        let (mut t, _rec) = tracker(&["one"]);
        t.fail(&"missing credentials");
        assert_eq!(
            t.state(),
            &TrackerState::Failed("missing credentials".to_owned())
        );
    }

    #[test]
    fn empty_tracker_completes_on_first_advance() {
        let (mut t, _rec) = tracker(&[]);
        t.advance(None);
        assert!(t.state().is_terminal());
    }

    #[test]
    fn warnings_keep_state() {
        let (mut t, rec) = tracker(&["one", "two"]);
        t.advance(None);
        t.warn("cleanup failed");

        assert_eq!(t.state(), &TrackerState::Running(1));
        assert_eq!(rec.lines(), vec!["[1/2] - one", "⚠ cleanup failed"]);
    }
}
