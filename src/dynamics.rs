/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Round-based best-response dynamics with equilibrium and cycle detection.
//!
//! ```text
//!            ┌──────────── round r ────────────┐
//! Running ──►│ state seen before? → CycleDetected
//!            │ r > cap?           → RoundLimitExceeded
//!            │ best response per agent (ascending id)
//!            │ zero moves?        → Equilibrium
//!            └─────────────────────────────────┘
//! ```
//!
//! # Update modes
//!
//! - [`UpdateMode::Sequential`]: each accepted move is committed at once, so
//!   agent k sees the moves of agents 1..k−1 from the same round.
//! - [`UpdateMode::Simultaneous`]: every agent searches against the
//!   round-start state (and one round-start adjacency snapshot); all moves are
//!   committed after the last agent has searched.
//!
//! # Termination
//!
//! The round cap is `rounds_per_agent · N` (default 500·N, at least 1). Every
//! round-start state is remembered; an exact repeat ends the run as a cycle.
//! Together these guarantee a terminal state for any finite population.

use hashbrown::HashMap;
use tracing::{debug, info, trace};

use crate::agent::AgentId;
use crate::distance;
use crate::error::Result;
use crate::frame::{AffiliationChange, Frame, RoundEvent, RoundObserver};
use crate::index::AffiliationIndex;
use crate::search::{self, Move};

/// Default multiplier for the round cap.
pub const DEFAULT_ROUNDS_PER_AGENT: usize = 500;

/// How moves within a round are committed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateMode {
    /// Commit each move immediately.
    #[default]
    Sequential,
    /// Search against the round-start state, commit all moves afterwards.
    Simultaneous,
}

/// Driver configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicsConfig {
    /// Sequential or simultaneous commits.
    pub mode: UpdateMode,
    /// Round cap per agent. Default 500.
    pub rounds_per_agent: usize,
}

impl DynamicsConfig {
    /// Configuration with the given mode and default cap.
    pub fn new(mode: UpdateMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Maximum number of rounds for a population of `agents`.
    pub fn round_cap(&self, agents: usize) -> usize {
        self.rounds_per_agent.saturating_mul(agents).max(1)
    }
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            mode: UpdateMode::Sequential,
            rounds_per_agent: DEFAULT_ROUNDS_PER_AGENT,
        }
    }
}

/// Driver state. Every variant except `Running` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    /// At least one agent moved in the last round.
    Running,
    /// A round passed with no improving move for any agent.
    Equilibrium,
    /// The round-start state repeated an earlier one.
    CycleDetected {
        /// Round whose start state recurred.
        first_seen: usize,
    },
    /// The round cap was reached without equilibrium or cycle.
    RoundLimitExceeded,
}

impl RunState {
    /// Whether the driver stops in this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// Result of a completed run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Outcome {
    /// Terminal state.
    pub state: RunState,
    /// Rounds fully evaluated.
    pub rounds: usize,
    /// Initial frame followed by one frame per evaluated round.
    pub frames: Vec<Frame>,
}

impl Outcome {
    /// Whether the run ended in equilibrium.
    pub fn is_equilibrium(&self) -> bool {
        self.state == RunState::Equilibrium
    }

    /// Last recorded frame.
    pub fn final_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

/// Best-response dynamics over an [`AffiliationIndex`].
pub struct Dynamics<'a> {
    index: &'a mut AffiliationIndex,
    config: DynamicsConfig,
    observer: Option<Box<dyn RoundObserver + 'a>>,
}

impl<'a> Dynamics<'a> {
    /// Driver over `index`.
    pub fn new(index: &'a mut AffiliationIndex, config: DynamicsConfig) -> Self {
        Self {
            index,
            config,
            observer: None,
        }
    }

    /// Attach an observer that receives one [`RoundEvent`] per round.
    pub fn with_observer(mut self, observer: impl RoundObserver + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run until a terminal state.
    pub fn run(mut self) -> Result<Outcome> {
        let cap = self.config.round_cap(self.index.len());
        self.index.update_utilities();

        let mut frames = vec![Frame::capture(&*self.index, 0, Vec::new(), false)];
        let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut rounds = 0;

        let state = loop {
            if rounds >= cap {
                break RunState::RoundLimitExceeded;
            }
            let round = rounds + 1;
            let key = self.index.state_key();
            if let Some(&first_seen) = seen.get(&key) {
                break RunState::CycleDetected { first_seen };
            }
            seen.insert(key, round);

            let (moves, changes) = match self.config.mode {
                UpdateMode::Sequential => self.sequential_round()?,
                UpdateMode::Simultaneous => self.simultaneous_round()?,
            };
            rounds = round;

            let equilibrium = moves == 0;
            frames.push(Frame::capture(&*self.index, round, changes, equilibrium));

            let state = if equilibrium {
                RunState::Equilibrium
            } else {
                RunState::Running
            };
            debug!(round, moves, ?state, "round complete");
            if equilibrium {
                break state;
            }
            self.emit(RoundEvent {
                round,
                moves_applied: moves,
                state,
            });
        };

        info!(rounds, ?state, "dynamics finished");
        self.emit(RoundEvent {
            round: rounds,
            moves_applied: 0,
            state,
        });

        Ok(Outcome {
            state,
            rounds,
            frames,
        })
    }

    /// One round with immediate commits.
    fn sequential_round(&mut self) -> Result<(usize, Vec<AffiliationChange>)> {
        let mut moves = 0;
        let mut changes = Vec::new();
        for id in self.index.agent_ids() {
            let basis = if self.index.agent(id)?.model().requires_distances() {
                Some(distance::adjacency(&*self.index))
            } else {
                None
            };
            if let Some(best) = search::best_response(&mut *self.index, id, basis.as_ref())? {
                changes.extend(self.commit(id, &best.mv, best.improvement)?);
                self.index.update_utilities();
                moves += 1;
            }
        }
        Ok((moves, changes))
    }

    /// One round against a frozen round-start state.
    fn simultaneous_round(&mut self) -> Result<(usize, Vec<AffiliationChange>)> {
        let needs_distances = self
            .index
            .all_agents()
            .iter()
            .any(|a| a.model().requires_distances());
        let basis = needs_distances.then(|| distance::adjacency(&*self.index));

        let mut proposals = Vec::new();
        for id in self.index.agent_ids() {
            if let Some(best) = search::best_response(&mut *self.index, id, basis.as_ref())? {
                proposals.push((id, best));
            }
        }

        let mut changes = Vec::new();
        for (id, best) in &proposals {
            changes.extend(self.commit(*id, &best.mv, best.improvement)?);
        }
        if !proposals.is_empty() {
            self.index.update_utilities();
        }
        Ok((proposals.len(), changes))
    }

    fn commit(&mut self, id: AgentId, mv: &Move, improvement: f64) -> Result<Vec<AffiliationChange>> {
        trace!(agent = id, ?mv, improvement, "applying move");
        self.index.apply_move(id, mv)
    }

    fn emit(&mut self, event: RoundEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_round(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::model::{ModelParams, UtilityModel};

    fn linear(rows: &[&[u8]]) -> AffiliationIndex {
        AffiliationIndex::from_agents(rows.iter().enumerate().map(|(id, bits)| {
            Agent::new(id, bits.to_vec(), UtilityModel::LinearDegree).unwrap()
        }))
        .unwrap()
    }

    #[test]
    fn test_round_cap_scales_with_population() {
        let config = DynamicsConfig::default();
        assert_eq!(config.round_cap(3), 1500);
        assert_eq!(config.round_cap(0), 1);
    }

    #[test]
    fn test_sequential_linear_reaches_full_affiliation() {
        let mut index = linear(&[&[1, 0], &[1, 0], &[0, 1]]);
        let outcome = Dynamics::new(&mut index, DynamicsConfig::default()).run().unwrap();
        assert_eq!(outcome.state, RunState::Equilibrium);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(outcome.frames.len(), 3);
        assert_eq!(index.snapshot(), vec![vec![1, 1]; 3]);
        assert_eq!(index.utilities(), vec![6.0; 3]);
        assert!(outcome.final_frame().unwrap().equilibrium);
    }

    #[test]
    fn test_simultaneous_linear_reaches_equilibrium() {
        let mut index = linear(&[&[1, 0], &[1, 0], &[0, 1]]);
        let outcome = Dynamics::new(&mut index, DynamicsConfig::new(UpdateMode::Simultaneous))
            .run()
            .unwrap();
        assert!(outcome.is_equilibrium());
        assert_eq!(index.snapshot(), vec![vec![1, 1]; 3]);
    }

    fn crowded_pair() -> AffiliationIndex {
        // Two congested agents sharing idea 0. Alone on an idea each scores
        // 1 − 0.45 − 0.5 = 0.05; together each scores 2 − 1.8 − 0.5 = −0.3.
        let params = ModelParams { alpha: 2.0, cost: 0.45 };
        AffiliationIndex::from_agents([
            Agent::with_params(0, vec![1, 0], UtilityModel::CongestedDegree, params).unwrap(),
            Agent::with_params(1, vec![1, 0], UtilityModel::CongestedDegree, params).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_sequential_moves_are_visible_to_later_agents() {
        let mut index = crowded_pair();
        let outcome = Dynamics::new(&mut index, DynamicsConfig::default()).run().unwrap();

        // Agent 0 swaps to idea 1; agent 1 then finds idea 0 uncrowded and stays.
        let round1 = &outcome.frames[1];
        assert_eq!(round1.changes.len(), 2);
        assert!(round1.changes.iter().all(|c| c.agent == 0));
        assert_eq!(outcome.state, RunState::Equilibrium);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(index.snapshot(), vec![vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_simultaneous_moves_see_only_round_start_state() {
        let mut index = crowded_pair();
        let outcome = Dynamics::new(&mut index, DynamicsConfig::new(UpdateMode::Simultaneous))
            .run()
            .unwrap();

        // Both agents judge the crowded start and both swap.
        let round1 = &outcome.frames[1];
        assert_eq!(round1.changes.len(), 4);
        assert_eq!(round1.affiliations, vec![vec![0, 1], vec![0, 1]]);
    }

    #[test]
    fn test_cap_of_one_round_stops_running_population() {
        let mut index = linear(&[&[1, 0], &[0, 1]]);
        let config = DynamicsConfig {
            mode: UpdateMode::Sequential,
            rounds_per_agent: 0,
        };
        let outcome = Dynamics::new(&mut index, config).run().unwrap();
        assert_eq!(outcome.state, RunState::RoundLimitExceeded);
        assert_eq!(outcome.rounds, 1);
    }

    #[test]
    fn test_simultaneous_anti_coordination_cycles() {
        // The pair flees together, then returns together.
        let mut index = crowded_pair();
        let outcome = Dynamics::new(&mut index, DynamicsConfig::new(UpdateMode::Simultaneous))
            .run()
            .unwrap();
        assert_eq!(outcome.state, RunState::CycleDetected { first_seen: 1 });
        assert_eq!(outcome.rounds, 2);
    }

    #[test]
    fn test_observer_sees_every_round() {
        let mut index = linear(&[&[1, 0], &[1, 0], &[0, 1]]);
        let mut events = Vec::new();
        let outcome = Dynamics::new(&mut index, DynamicsConfig::default())
            .with_observer(|e: &RoundEvent| events.push(*e))
            .run()
            .unwrap();
        assert_eq!(outcome.rounds, 2);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].state, RunState::Running);
        assert_eq!(events[0].moves_applied, 3);
        assert_eq!(events[1].state, RunState::Equilibrium);
        assert!(events[1].state.is_terminal());
    }

    #[test]
    fn test_empty_population_is_immediate_equilibrium() {
        let mut index = AffiliationIndex::new();
        let outcome = Dynamics::new(&mut index, DynamicsConfig::default()).run().unwrap();
        assert_eq!(outcome.state, RunState::Equilibrium);
        assert_eq!(outcome.rounds, 1);
    }
}
