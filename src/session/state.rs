//! Session state machine.

/// Represents the lifecycle state of a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session yet: configuration may still change.
    #[default]
    Idle,
    /// Debugger spawned; breakpoints and the run command are being applied.
    Starting,
    /// The dispatch loop is consuming debugger output.
    Running,
    /// A breakpoint hit was detected; the break handler is in control.
    AtBreakpoint,
    /// The session ended. A fresh session may be started from here.
    Terminated,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Idle -> Starting
    /// - Starting -> Running
    /// - Starting -> Terminated
    /// - Running -> AtBreakpoint
    /// - Running -> Terminated
    /// - AtBreakpoint -> Running
    /// - AtBreakpoint -> Terminated
    /// - Terminated -> Starting (fresh session after a clean end)
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (Idle, Starting)
                | (Starting, Running)
                | (Starting, Terminated)
                | (Running, AtBreakpoint)
                | (Running, Terminated)
                | (AtBreakpoint, Running)
                | (AtBreakpoint, Terminated)
                | (Terminated, Starting)
        )
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns `Ok(())` if the transition is valid, or an error otherwise.
    pub fn transition_to(&mut self, target: SessionState) -> crate::Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(crate::error::GdbPilotError::InvalidStateTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if the session has ended.
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionState::Terminated)
    }

    /// Check if a session is currently live.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Running | SessionState::AtBreakpoint
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::AtBreakpoint => write!(f, "at breakpoint"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}
