use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    AwaitConnection,
    ReceiveParameters,
    ReceiveStrings,
    ReceiveLayout,
    ApplyLayout,
    ReceiveAssignment,
    SynthesizeAndTime,
    SendDurations,
    ReceiveAssemblyOrder,
    ReceiveSchedule,
    AssembleTimeline,
    SendIterationAck,
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Position of a session in its exchange sequence.
///
/// Iterations are numbered from 1; the acknowledgment for iteration `n` carries `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    phase: SessionPhase,
    iteration: usize,
    total_iterations: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::AwaitConnection,
            iteration: 0,
            total_iterations: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    /// Must be set before leaving `ReceiveStrings`; zero closes the session right away.
    pub fn set_total_iterations(&mut self, total: usize) {
        self.total_iterations = total;
    }

    pub fn advance(&mut self) -> SessionPhase {
        use SessionPhase::*;
        self.phase = match self.phase {
            AwaitConnection => ReceiveParameters,
            ReceiveParameters => ReceiveStrings,
            ReceiveStrings => self.begin_iteration(),
            ReceiveLayout => ApplyLayout,
            ApplyLayout => ReceiveAssignment,
            ReceiveAssignment => SynthesizeAndTime,
            SynthesizeAndTime => SendDurations,
            SendDurations => ReceiveAssemblyOrder,
            ReceiveAssemblyOrder => ReceiveSchedule,
            ReceiveSchedule => AssembleTimeline,
            AssembleTimeline => SendIterationAck,
            SendIterationAck => self.begin_iteration(),
            Closed => Closed,
        };
        self.phase
    }

    fn begin_iteration(&mut self) -> SessionPhase {
        if self.iteration < self.total_iterations {
            self.iteration += 1;
            SessionPhase::ReceiveLayout
        } else {
            SessionPhase::Closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_close(total: usize) -> Vec<SessionPhase> {
        let mut state = SessionState::new();
        let mut seen = vec![state.phase()];
        while state.phase() != SessionPhase::Closed {
            if state.phase() == SessionPhase::ReceiveStrings {
                state.set_total_iterations(total);
            }
            seen.push(state.advance());
        }
        seen
    }

    #[test]
    fn three_iterations_visit_layout_three_times() {
        let phases = run_to_close(3);
        let layouts = phases
            .iter()
            .filter(|p| **p == SessionPhase::ReceiveLayout)
            .count();
        let acks = phases
            .iter()
            .filter(|p| **p == SessionPhase::SendIterationAck)
            .count();
        assert_eq!(layouts, 3);
        assert_eq!(acks, 3);
    }

    #[test]
    fn iteration_body_order_is_fixed() {
        let phases = run_to_close(1);
        use SessionPhase::*;
        assert_eq!(
            phases,
            vec![
                AwaitConnection,
                ReceiveParameters,
                ReceiveStrings,
                ReceiveLayout,
                ApplyLayout,
                ReceiveAssignment,
                SynthesizeAndTime,
                SendDurations,
                ReceiveAssemblyOrder,
                ReceiveSchedule,
                AssembleTimeline,
                SendIterationAck,
                Closed,
            ]
        );
    }

    #[test]
    fn zero_iterations_close_after_strings() {
        let phases = run_to_close(0);
        assert_eq!(phases.last(), Some(&SessionPhase::Closed));
        assert!(!phases.contains(&SessionPhase::ReceiveLayout));
    }

    #[test]
    fn iteration_counter_is_one_based() {
        let mut state = SessionState::new();
        state.advance();
        state.advance();
        state.set_total_iterations(2);
        assert_eq!(state.advance(), SessionPhase::ReceiveLayout);
        assert_eq!(state.iteration(), 1);
    }
}
