//! Ideas: one position of the affiliation vector and the agents holding it.
//!
//! An idea's backing set must always equal `{ a : a.hedges[id] == 1 }`. The
//! [`AffiliationIndex`](crate::index::AffiliationIndex) is the only writer and
//! always toggles agent bit and idea membership together.

use hashbrown::HashSet;

use crate::agent::{Agent, AgentId};
use crate::index::AffiliationIndex;

/// Idea identifier: its position in the affiliation vector.
pub type IdeaId = usize;

/// One idea and the set of agents currently affiliated with it.
#[derive(Clone, Debug, Default)]
pub struct Idea {
    id: IdeaId,
    agents: HashSet<AgentId>,
}

impl Idea {
    /// Empty idea at position `id`.
    pub fn new(id: IdeaId) -> Self {
        Self {
            id,
            agents: HashSet::new(),
        }
    }

    /// Idea at position `id` populated from every agent whose bit `id` is 1.
    pub fn from_agents<'a>(id: IdeaId, agents: impl IntoIterator<Item = &'a Agent>) -> Self {
        let mut idea = Self::new(id);
        idea.rebuild(agents);
        idea
    }

    /// Replace the backing set from scratch.
    pub fn rebuild<'a>(&mut self, agents: impl IntoIterator<Item = &'a Agent>) {
        self.agents = agents
            .into_iter()
            .filter(|a| a.is_affiliated(self.id))
            .map(Agent::id)
            .collect();
    }

    /// Toggle membership of `agent` in O(1). Returns the new membership.
    pub fn invert(&mut self, agent: AgentId) -> bool {
        if self.agents.remove(&agent) {
            false
        } else {
            self.agents.insert(agent);
            true
        }
    }

    /// Position in the affiliation vector.
    pub fn id(&self) -> IdeaId {
        self.id
    }

    /// Number of affiliated agents.
    pub fn degree(&self) -> usize {
        self.agents.len()
    }

    /// Whether `agent` is affiliated.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.agents.contains(&agent)
    }

    /// Affiliated agents, in no particular order.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.agents.iter().copied()
    }

    /// Mean utility of the affiliated agents. `0.0` for an empty idea.
    pub fn average_utility(&self, index: &AffiliationIndex) -> f64 {
        let (total, count) = self
            .agents
            .iter()
            .filter_map(|&id| index.agent(id).ok())
            .fold((0.0, 0usize), |(t, c), a| (t + a.utility(), c + 1));
        if count == 0 {
            0.0
        } else {
            total / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UtilityModel;

    fn agent(id: AgentId, bits: &[u8]) -> Agent {
        Agent::new(id, bits.to_vec(), UtilityModel::LinearDegree).unwrap()
    }

    #[test]
    fn test_from_agents_selects_bit_holders() {
        let agents = [agent(0, &[1, 0]), agent(1, &[1, 1]), agent(2, &[0, 1])];
        let idea = Idea::from_agents(0, &agents);
        assert_eq!(idea.degree(), 2);
        assert!(idea.contains(0) && idea.contains(1) && !idea.contains(2));
    }

    #[test]
    fn test_invert_twice_restores_membership() {
        let mut idea = Idea::new(3);
        assert!(idea.invert(5));
        assert!(idea.contains(5));
        assert!(!idea.invert(5));
        assert!(!idea.contains(5));
        assert_eq!(idea.degree(), 0);
    }

    #[test]
    fn test_average_utility_of_empty_idea_is_zero() {
        let index = AffiliationIndex::new();
        assert_eq!(Idea::new(0).average_utility(&index), 0.0);
    }
}
