/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! The affiliation index: canonical agent set, idea map and distance cache.
//!
//! Agents are stored arena-style in ascending identifier order. An agent's
//! position in that order (its *slot*) is its row and column in every
//! [`DistanceMatrix`]. Ideas are stored densely for positions `0..M`.
//!
//! # Invariants
//!
//! - For every agent `a` and idea `i`: `i.contains(a) ⟺ a.hedges[i] == 1`.
//!   Every mutation goes through a paired toggle of agent bit and idea
//!   membership; [`AffiliationIndex::resync`] rebuilds from vectors.
//! - All agents share the same vector length M.
//! - The cached all-pairs shortest-path matrix is dropped on any committed
//!   mutation and recomputed on demand.

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::agent::{Agent, AgentId};
use crate::distance::{self, DistanceMatrix};
use crate::error::{AffinityError, Result};
use crate::frame::{AffiliationChange, Direction};
use crate::idea::{Idea, IdeaId};
use crate::search::Move;
use crate::utility;

/// Owner of all agents, ideas and derived distance state.
#[derive(Clone, Debug, Default)]
pub struct AffiliationIndex {
    /// Agents in ascending identifier order.
    agents: Vec<Agent>,
    /// Identifier → slot in `agents`.
    slots: HashMap<AgentId, usize>,
    /// Ideas `0..M`.
    ideas: Vec<Idea>,
    /// All-pairs shortest paths, valid until the next committed mutation.
    shortest: Option<DistanceMatrix>,
}

impl AffiliationIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a generated population.
    pub fn from_agents(agents: impl IntoIterator<Item = Agent>) -> Result<Self> {
        let mut index = Self::new();
        index.ingest(agents)?;
        Ok(index)
    }

    /// Take ownership of `agents`, rebuild the idea map and compute utilities.
    ///
    /// The whole batch is validated before anything is inserted: identifiers
    /// must be new and unique, and every vector must have the index's length
    /// (or, for an empty index, the length of the first agent).
    pub fn ingest(&mut self, agents: impl IntoIterator<Item = Agent>) -> Result<()> {
        let incoming: Vec<Agent> = agents.into_iter().collect();
        let expected = self
            .agents
            .first()
            .or_else(|| incoming.first())
            .map(Agent::len)
            .unwrap_or(0);

        let mut batch_ids = HashSet::with_capacity(incoming.len());
        for agent in &incoming {
            if agent.len() != expected {
                return Err(AffinityError::LengthMismatch {
                    expected,
                    found: agent.len(),
                });
            }
            if self.slots.contains_key(&agent.id()) || !batch_ids.insert(agent.id()) {
                return Err(AffinityError::DuplicateAgent(agent.id()));
            }
        }

        self.agents.extend(incoming);
        self.agents.sort_by_key(Agent::id);
        self.slots = self
            .agents
            .iter()
            .enumerate()
            .map(|(slot, a)| (a.id(), slot))
            .collect();
        self.resync();
        self.update_utilities();

        debug!(agents = self.agents.len(), ideas = self.ideas.len(), "ingested population");
        Ok(())
    }

    /// Rebuild every idea's backing set from the agent vectors.
    ///
    /// Ideas are created for positions `0..max(len)`; existing ideas are refreshed.
    pub fn resync(&mut self) {
        let m = self.agents.iter().map(Agent::len).max().unwrap_or(0);
        while self.ideas.len() < m {
            self.ideas.push(Idea::new(self.ideas.len()));
        }
        for idea in &mut self.ideas {
            idea.rebuild(&self.agents);
        }
        self.shortest = None;
    }

    /// Number of agents N.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True when no agents have been ingested.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of ideas held: M, plus any created past it by [`idea`](Self::idea).
    pub fn num_ideas(&self) -> usize {
        self.ideas.len()
    }

    /// Agent by identifier.
    pub fn agent(&self, id: AgentId) -> Result<&Agent> {
        Ok(&self.agents[self.slot(id)?])
    }

    /// Slot (matrix row) of agent `id`.
    pub fn slot(&self, id: AgentId) -> Result<usize> {
        self.slots
            .get(&id)
            .copied()
            .ok_or(AffinityError::DetachedAgent(id))
    }

    /// Agent at a slot. Panics on an out-of-range slot.
    pub(crate) fn agent_at(&self, slot: usize) -> &Agent {
        &self.agents[slot]
    }

    /// Idea at position `i`, created empty if it does not exist yet.
    ///
    /// Ideas past the agents' vector length have degree 0 and can never be
    /// joined; [`toggle`](Self::toggle) still rejects those positions.
    pub fn idea(&mut self, i: IdeaId) -> &Idea {
        while self.ideas.len() <= i {
            self.ideas.push(Idea::new(self.ideas.len()));
        }
        &self.ideas[i]
    }

    /// Existing idea at position `i`, without creating it.
    pub fn get_idea(&self, i: IdeaId) -> Option<&Idea> {
        self.ideas.get(i)
    }

    /// Read-only view of every agent, ascending identifier.
    pub fn all_agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Read-only view of every idea, ascending position.
    pub fn all_ideas(&self) -> &[Idea] {
        &self.ideas
    }

    /// Agent identifiers in iteration (ascending) order.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(Agent::id).collect()
    }

    /// Current stored utility of every agent, ascending identifier.
    pub fn utilities(&self) -> Vec<f64> {
        self.agents.iter().map(Agent::utility).collect()
    }

    /// N×M affiliation matrix, rows in ascending identifier order.
    pub fn snapshot(&self) -> Vec<Vec<u8>> {
        self.agents.iter().map(|a| a.hedges().to_vec()).collect()
    }

    /// Row-major flattening of [`snapshot`](Self::snapshot), used as a state key.
    pub fn state_key(&self) -> Vec<u8> {
        self.agents.iter().flat_map(|a| a.hedges().iter().copied()).collect()
    }

    /// Toggle agent `id`'s affiliation with idea `i`, keeping the idea in step.
    pub fn toggle(&mut self, id: AgentId, i: IdeaId) -> Result<Direction> {
        let slot = self.slot(id)?;
        self.check_position(slot, i)?;
        let joined = self.toggle_slot(slot, i);
        self.shortest = None;
        Ok(if joined { Direction::Join } else { Direction::Leave })
    }

    /// Reject positions outside the agent's affiliation vector.
    fn check_position(&self, slot: usize, i: IdeaId) -> Result<()> {
        let m = self.agents[slot].len();
        if i < m {
            Ok(())
        } else {
            Err(AffinityError::IdeaOutOfRange { idea: i, ideas: m })
        }
    }

    /// Paired toggle without cache invalidation.
    ///
    /// Only for tentative search mutations that are reverted before the
    /// index is observed again. Returns `true` if the agent joined.
    pub(crate) fn toggle_slot(&mut self, slot: usize, i: IdeaId) -> bool {
        let agent = &mut self.agents[slot];
        agent.flip(i);
        let id = agent.id();
        self.ideas[i].invert(id)
    }

    /// Commit a best-response move for agent `id`.
    ///
    /// Returns the changed affiliations in application order. Utilities are
    /// not refreshed; call [`update_utilities`](Self::update_utilities).
    pub fn apply_move(&mut self, id: AgentId, mv: &Move) -> Result<Vec<AffiliationChange>> {
        let slot = self.slot(id)?;
        let positions = mv.positions();
        for &i in &positions {
            self.check_position(slot, i)?;
        }
        let mut changes = Vec::with_capacity(positions.len());
        for i in positions {
            let direction = self.toggle(id, i)?;
            changes.push(AffiliationChange {
                agent: id,
                idea: i,
                direction,
            });
        }
        Ok(changes)
    }

    /// Whether every idea's backing set matches the agent vectors.
    pub fn is_consistent(&self) -> bool {
        self.agents.iter().all(|a| {
            self.ideas
                .iter()
                .all(|idea| idea.contains(a.id()) == a.is_affiliated(idea.id()))
        })
    }

    /// All-pairs shortest paths over the derived agent graph, computed on demand.
    pub fn shortest_paths(&mut self) -> &DistanceMatrix {
        let paths = match self.shortest.take() {
            Some(paths) => paths,
            None => distance::shortest_paths(&distance::adjacency(self)),
        };
        self.shortest.insert(paths)
    }

    /// Cached shortest paths, if still valid.
    pub fn cached_shortest_paths(&self) -> Option<&DistanceMatrix> {
        self.shortest.as_ref()
    }

    /// Recompute and store every agent's utility.
    pub fn update_utilities(&mut self) {
        let needs_distances = self.agents.iter().any(|a| a.model().requires_distances());
        if needs_distances {
            self.shortest_paths();
        }
        let values: Vec<f64> = (0..self.agents.len())
            .map(|slot| {
                let row = self.shortest.as_ref().map(|m| m.row(slot));
                utility::evaluate(self, slot, row)
            })
            .collect();
        for (agent, u) in self.agents.iter_mut().zip(values) {
            agent.set_utility(u);
        }
    }

    /// Fresh utility of agent `id` against the current state.
    pub fn utility_of(&self, id: AgentId) -> Result<f64> {
        let slot = self.slot(id)?;
        let row = self.shortest.as_ref().map(|m| m.row(slot));
        Ok(utility::evaluate(self, slot, row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UtilityModel;

    fn agent(id: AgentId, bits: &[u8]) -> Agent {
        Agent::new(id, bits.to_vec(), UtilityModel::LinearDegree).unwrap()
    }

    fn three() -> AffiliationIndex {
        AffiliationIndex::from_agents([agent(0, &[1, 0]), agent(1, &[1, 0]), agent(2, &[0, 1])])
            .unwrap()
    }

    #[test]
    fn test_ingest_builds_ideas_and_utilities() {
        let mut index = three();
        assert_eq!(index.len(), 3);
        assert_eq!(index.num_ideas(), 2);
        assert_eq!(index.idea(0).degree(), 2);
        assert_eq!(index.idea(1).degree(), 1);
        assert_eq!(index.utilities(), vec![2.0, 2.0, 1.0]);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_ingest_sorts_by_identifier() {
        let index =
            AffiliationIndex::from_agents([agent(9, &[1]), agent(3, &[0]), agent(5, &[1])]).unwrap();
        assert_eq!(index.agent_ids(), vec![3, 5, 9]);
        assert_eq!(index.slot(9), Ok(2));
    }

    #[test]
    fn test_ingest_rejects_duplicates_atomically() {
        let mut index = three();
        let err = index.ingest([agent(7, &[1, 1]), agent(1, &[0, 0])]).unwrap_err();
        assert_eq!(err, AffinityError::DuplicateAgent(1));
        assert_eq!(index.len(), 3);
        assert!(index.agent(7).is_err());
    }

    #[test]
    fn test_ingest_rejects_heterogeneous_lengths() {
        let err = AffiliationIndex::from_agents([agent(0, &[1, 0]), agent(1, &[1, 0, 1])])
            .unwrap_err();
        assert_eq!(err, AffinityError::LengthMismatch { expected: 2, found: 3 });
    }

    #[test]
    fn test_unknown_agent_is_detached() {
        let index = three();
        assert_eq!(index.agent(42).unwrap_err(), AffinityError::DetachedAgent(42));
        assert_eq!(index.utility_of(42).unwrap_err(), AffinityError::DetachedAgent(42));
    }

    #[test]
    fn test_toggle_keeps_idea_in_step() {
        let mut index = three();
        assert_eq!(index.toggle(2, 0), Ok(Direction::Join));
        assert_eq!(index.idea(0).degree(), 3);
        assert!(index.is_consistent());
        assert_eq!(index.toggle(2, 0), Ok(Direction::Leave));
        assert_eq!(index.idea(0).degree(), 2);
        assert!(index.is_consistent());
    }

    #[test]
    fn test_toggle_out_of_range_idea() {
        let mut index = three();
        assert_eq!(
            index.toggle(0, 5),
            Err(AffinityError::IdeaOutOfRange { idea: 5, ideas: 2 })
        );
        assert!(index.is_consistent());
    }

    #[test]
    fn test_idea_past_vector_length_is_created_empty() {
        let mut index = three();
        assert!(index.get_idea(5).is_none());
        let idea = index.idea(5);
        assert_eq!(idea.id(), 5);
        assert_eq!(idea.degree(), 0);
        assert_eq!(index.num_ideas(), 6);
        assert!(index.get_idea(4).is_some_and(|i| i.degree() == 0));
        assert!(index.is_consistent());
        // Created ideas are not joinable: the agents' vectors stay length 2.
        assert_eq!(
            index.toggle(0, 5),
            Err(AffinityError::IdeaOutOfRange { idea: 5, ideas: 2 })
        );
        index.update_utilities();
        assert_eq!(index.utilities(), vec![2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_apply_move_rejects_position_past_vector() {
        let mut index = three();
        index.idea(4);
        let before = index.snapshot();
        assert_eq!(
            index.apply_move(0, &Move::Swap { leave: 0, join: 4 }),
            Err(AffinityError::IdeaOutOfRange { idea: 4, ideas: 2 })
        );
        assert_eq!(index.snapshot(), before);
    }

    #[test]
    fn test_apply_swap_move() {
        let mut index = three();
        let changes = index.apply_move(2, &Move::Swap { leave: 1, join: 0 }).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].direction, Direction::Leave);
        assert_eq!(changes[1].direction, Direction::Join);
        assert_eq!(index.agent(2).unwrap().hedges(), &[1, 0]);
        index.update_utilities();
        assert_eq!(index.utilities(), vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_mutation_invalidates_distance_cache() {
        let mut index = three();
        index.shortest_paths();
        assert!(index.cached_shortest_paths().is_some());
        index.toggle(0, 1).unwrap();
        assert!(index.cached_shortest_paths().is_none());
    }

    #[test]
    fn test_snapshot_and_state_key() {
        let index = three();
        assert_eq!(index.snapshot(), vec![vec![1, 0], vec![1, 0], vec![0, 1]]);
        assert_eq!(index.state_key(), vec![1, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_resync_repairs_ideas() {
        let mut index = three();
        index.ideas[0] = Idea::new(0);
        assert!(!index.is_consistent());
        index.resync();
        assert!(index.is_consistent());
    }
}
