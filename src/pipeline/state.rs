//! In-memory pipeline state tracking
//!
//! Records the strictly ordered progression of a single invocation with
//! timestamped transitions. Nothing is persisted; each invocation starts
//! fresh.

use chrono::{DateTime, Utc};

/// Pipeline states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    PrivacyCheck,
    DetectChange,
    TestPhase,
    VersionBump,
    SafetyGate,
    Publish,
    Commit,
    Done,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Start => "start",
            PipelineState::PrivacyCheck => "privacy-check",
            PipelineState::DetectChange => "detect-change",
            PipelineState::TestPhase => "test-phase",
            PipelineState::VersionBump => "version-bump",
            PipelineState::SafetyGate => "safety-gate",
            PipelineState::Publish => "publish",
            PipelineState::Commit => "commit",
            PipelineState::Done => "done",
        }
    }
}

/// One recorded transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: DateTime<Utc>,
}

/// Transition recorder for one pipeline invocation
#[derive(Debug, Default)]
pub struct StateTracker {
    current: Option<PipelineState>,
    transitions: Vec<StateTransition>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            current: Some(PipelineState::Start),
            transitions: Vec::new(),
        }
    }

    /// Move to a new state, recording the transition
    pub fn transition(&mut self, to: PipelineState) {
        let from = self.current.unwrap_or(PipelineState::Start);
        if from == to {
            return;
        }
        self.transitions.push(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
        });
        self.current = Some(to);
    }

    pub fn current(&self) -> PipelineState {
        self.current.unwrap_or(PipelineState::Start)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn into_history(self) -> Vec<StateTransition> {
        self.transitions
    }

    /// Transition history as a human-readable string
    pub fn describe(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                format!(
                    "{}: {} -> {}",
                    t.timestamp.to_rfc3339(),
                    t.from.as_str(),
                    t.to.as_str()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker() {
        let tracker = StateTracker::new();
        assert_eq!(tracker.current(), PipelineState::Start);
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn test_transition_sequence() {
        let mut tracker = StateTracker::new();
        tracker.transition(PipelineState::PrivacyCheck);
        tracker.transition(PipelineState::DetectChange);

        assert_eq!(tracker.current(), PipelineState::DetectChange);
        assert_eq!(tracker.history().len(), 2);
        assert_eq!(tracker.history()[0].from, PipelineState::Start);
        assert_eq!(tracker.history()[1].to, PipelineState::DetectChange);
    }

    #[test]
    fn test_self_transition_is_ignored() {
        let mut tracker = StateTracker::new();
        tracker.transition(PipelineState::TestPhase);
        tracker.transition(PipelineState::TestPhase);

        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn test_describe() {
        let mut tracker = StateTracker::new();
        tracker.transition(PipelineState::PrivacyCheck);
        tracker.transition(PipelineState::Done);

        let described = tracker.describe();
        assert!(described.contains("start -> privacy-check"));
        assert!(described.contains("privacy-check -> done"));
    }
}
