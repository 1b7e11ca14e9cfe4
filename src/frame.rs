//! Simulation frames and per-round events.
//!
//! A [`Frame`] is the immutable record handed to a renderer: the N×M
//! affiliation matrix after a round, the affiliations that changed during
//! it, every agent's utility and whether the round was an equilibrium.
//! Frames are produced in round order and that order is the playback order.
//!
//! A [`RoundEvent`] is the lightweight progress signal delivered to a
//! [`RoundObserver`] after every round.

use crate::agent::AgentId;
use crate::dynamics::RunState;
use crate::idea::IdeaId;
use crate::index::AffiliationIndex;

/// Whether an agent joined or left an idea.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Bit went 0 → 1.
    Join,
    /// Bit went 1 → 0.
    Leave,
}

/// One committed (agent, idea, direction) change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffiliationChange {
    /// Agent that moved.
    pub agent: AgentId,
    /// Idea whose membership changed.
    pub idea: IdeaId,
    /// Join or leave.
    pub direction: Direction,
}

impl AffiliationChange {
    /// Node labels used by bipartite renderings: `("A<agent>", "I<idea>")`.
    pub fn labels(&self) -> (String, String) {
        (format!("A{}", self.agent), format!("I{}", self.idea))
    }
}

/// State of the population after one round.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Frame {
    /// Round number; 0 is the initial state.
    pub round: usize,
    /// Row labels of `affiliations` and `utilities`, ascending.
    pub agent_ids: Vec<AgentId>,
    /// N×M affiliation matrix.
    pub affiliations: Vec<Vec<u8>>,
    /// Changes committed during the round, in application order.
    pub changes: Vec<AffiliationChange>,
    /// Utility of each agent after the round.
    pub utilities: Vec<f64>,
    /// True if no agent had an improving move this round.
    pub equilibrium: bool,
}

impl Frame {
    /// Capture the index's current state.
    pub fn capture(
        index: &AffiliationIndex,
        round: usize,
        changes: Vec<AffiliationChange>,
        equilibrium: bool,
    ) -> Self {
        Self {
            round,
            agent_ids: index.agent_ids(),
            affiliations: index.snapshot(),
            changes,
            utilities: index.utilities(),
            equilibrium,
        }
    }

    /// Sum of all agents' utilities.
    pub fn total_utility(&self) -> f64 {
        self.utilities.iter().sum()
    }
}

/// Progress report emitted after each round.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundEvent {
    /// Round number, starting at 1.
    pub round: usize,
    /// Agents whose move was committed this round.
    pub moves_applied: usize,
    /// Driver state after the round.
    pub state: RunState,
}

/// Receiver of [`RoundEvent`]s.
pub trait RoundObserver {
    /// Called after every round that leaves the driver running, then once
    /// with the terminal state. A cycle or round-limit stop repeats the last
    /// evaluated round number with `moves_applied == 0`.
    fn on_round(&mut self, event: &RoundEvent);
}

impl<F: FnMut(&RoundEvent)> RoundObserver for F {
    fn on_round(&mut self, event: &RoundEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::model::UtilityModel;

    #[test]
    fn test_capture_reflects_index() {
        let index = AffiliationIndex::from_agents([
            Agent::new(4, vec![1, 0], UtilityModel::LinearDegree).unwrap(),
            Agent::new(2, vec![1, 1], UtilityModel::LinearDegree).unwrap(),
        ])
        .unwrap();
        let frame = Frame::capture(&index, 0, Vec::new(), false);
        assert_eq!(frame.agent_ids, vec![2, 4]);
        assert_eq!(frame.affiliations, vec![vec![1, 1], vec![1, 0]]);
        assert_eq!(frame.utilities, vec![3.0, 2.0]);
        assert_eq!(frame.total_utility(), 5.0);
    }

    #[test]
    fn test_change_labels() {
        let change = AffiliationChange {
            agent: 3,
            idea: 7,
            direction: Direction::Join,
        };
        assert_eq!(change.labels(), ("A3".to_string(), "I7".to_string()));
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |e: &RoundEvent| seen.push(e.round);
            observer.on_round(&RoundEvent {
                round: 1,
                moves_applied: 0,
                state: RunState::Equilibrium,
            });
        }
        assert_eq!(seen, vec![1]);
    }
}
