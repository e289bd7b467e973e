use std::fmt;

/// Interpreter state. The engine is in exactly one of these at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourState {
    Idle,
    /// Step `index` has executed (or is in its pre-step delay) and only the
    /// dwell, if any, stands between it and the next step
    Running { index: usize },
    /// Step `index` is waiting on typing, a delayed click or a navigation
    AwaitingSubAction { index: usize },
    Stopped,
    Finished,
}

impl TourState {
    pub fn index(&self) -> Option<usize> {
        match self {
            TourState::Running { index } | TourState::AwaitingSubAction { index } => Some(*index),
            _ => None,
        }
    }

    /// A tour is loaded and progressing (possibly paused)
    pub fn is_active(&self) -> bool {
        self.index().is_some()
    }

    pub fn name(&self) -> &'static str {
        match self {
            TourState::Idle => "idle",
            TourState::Running { .. } => "running",
            TourState::AwaitingSubAction { .. } => "awaiting_sub_action",
            TourState::Stopped => "stopped",
            TourState::Finished => "finished",
        }
    }
}

impl fmt::Display for TourState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(index) => write!(f, "{}({index})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// Whether the interpreter may move from `from` to `to`
pub fn allowed(from: TourState, to: TourState) -> bool {
    use TourState::*;
    match (from, to) {
        // start / resume
        (Idle | Stopped | Finished, Running { .. }) => true,
        // next step, previous step, branch swap
        (Running { .. } | AwaitingSubAction { .. }, Running { .. }) => true,
        (Running { index: a } | AwaitingSubAction { index: a }, AwaitingSubAction { index: b }) => {
            a == b
        }
        (Running { .. } | AwaitingSubAction { .. }, Finished) => true,
        // notice dismissed
        (Finished, Idle) => true,
        (_, Stopped) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TourState::*;

    #[test]
    fn test_start_from_inactive_states() {
        for from in [Idle, Stopped, Finished] {
            assert!(allowed(from, Running { index: 0 }), "{from} -> running");
        }
    }

    #[test]
    fn test_sub_action_only_for_current_step() {
        assert!(allowed(Running { index: 2 }, AwaitingSubAction { index: 2 }));
        assert!(!allowed(Running { index: 2 }, AwaitingSubAction { index: 3 }));
        assert!(!allowed(Idle, AwaitingSubAction { index: 0 }));
        assert!(allowed(
            AwaitingSubAction { index: 2 },
            AwaitingSubAction { index: 2 }
        ));
    }

    #[test]
    fn test_stop_from_anywhere() {
        for from in [
            Idle,
            Running { index: 1 },
            AwaitingSubAction { index: 1 },
            Stopped,
            Finished,
        ] {
            assert!(allowed(from, Stopped));
        }
    }

    #[test]
    fn test_inactive_states_cannot_finish() {
        assert!(!allowed(Idle, Finished));
        assert!(!allowed(Stopped, Finished));
        assert!(!allowed(Stopped, Idle));
    }

    #[test]
    fn test_display() {
        assert_eq!(Running { index: 3 }.to_string(), "running(3)");
        assert_eq!(Stopped.to_string(), "stopped");
    }
}
