//! Utility engine: one evaluation function per [`UtilityModel`] variant.
//!
//! Every call recomputes from scratch against the index's current idea
//! degrees. Nothing is cached between calls, so a tentative toggle is
//! reflected immediately.

use hashbrown::HashSet;

use crate::agent::{Agent, AgentId};
use crate::distance::{self, UNREACHABLE};
use crate::error::Result;
use crate::index::AffiliationIndex;
use crate::model::{ModelParams, UtilityModel};

/// Fixed per-affiliation overhead of the congested-degree model.
pub const AFFILIATION_OVERHEAD: f64 = 0.5;

/// Fresh utility of agent `id`.
pub fn utility(index: &AffiliationIndex, id: AgentId) -> Result<f64> {
    index.utility_of(id)
}

/// Utility of the agent at `slot`.
///
/// `distances` is that agent's row of shortest distances. It is only read by
/// the distance-connectivity model; when absent the row is computed from a
/// fresh adjacency matrix.
pub(crate) fn evaluate(index: &AffiliationIndex, slot: usize, distances: Option<&[f64]>) -> f64 {
    let agent = index.agent_at(slot);
    let params = agent.params();
    match agent.model() {
        UtilityModel::LinearDegree => linear_degree(index, agent),
        UtilityModel::CongestedDegree => congested_degree(index, agent, params),
        UtilityModel::NeighborhoodCardinality => neighborhood_cardinality(index, agent, params),
        UtilityModel::DistanceConnectivity => match distances {
            Some(row) => distance_connectivity(agent, slot, row, params),
            None => {
                let row = distance::individual_shortest(slot, &distance::adjacency(index));
                distance_connectivity(agent, slot, &row, params)
            }
        },
    }
}

/// Degrees of the ideas `agent` is affiliated with.
fn affiliated_degrees<'a>(
    index: &'a AffiliationIndex,
    agent: &'a Agent,
) -> impl Iterator<Item = f64> + 'a {
    let ideas = index.all_ideas();
    agent
        .hedges()
        .iter()
        .enumerate()
        .filter(|(_, &b)| b == 1)
        .filter_map(move |(i, _)| ideas.get(i))
        .map(|idea| idea.degree() as f64)
}

fn congestion(degree: f64, params: ModelParams) -> f64 {
    params.cost * degree.powf(params.alpha)
}

/// `mil1`: Σ deg(i).
fn linear_degree(index: &AffiliationIndex, agent: &Agent) -> f64 {
    affiliated_degrees(index, agent).sum()
}

/// `mil10`: Σ deg(i) − c·deg(i)^α − 0.5.
fn congested_degree(index: &AffiliationIndex, agent: &Agent, params: ModelParams) -> f64 {
    affiliated_degrees(index, agent)
        .map(|d| d - congestion(d, params) - AFFILIATION_OVERHEAD)
        .sum()
}

/// `mil00`: |agents sharing any idea, self excluded| − Σ c·deg(i)^α.
fn neighborhood_cardinality(index: &AffiliationIndex, agent: &Agent, params: ModelParams) -> f64 {
    let ideas = index.all_ideas();
    let mut reached: HashSet<AgentId> = HashSet::new();
    for i in agent.ones() {
        if let Some(idea) = ideas.get(i) {
            reached.extend(idea.agents());
        }
    }
    reached.remove(&agent.id());
    let cost: f64 = affiliated_degrees(index, agent)
        .map(|d| congestion(d, params))
        .sum();
    reached.len() as f64 - cost
}

/// `mil01`: Σ_{j ≠ self} 1/d(self, j) − c·|ones|. Unreachable agents add 0.
fn distance_connectivity(agent: &Agent, slot: usize, row: &[f64], params: ModelParams) -> f64 {
    let reach: f64 = row
        .iter()
        .enumerate()
        .filter(|&(j, &d)| j != slot && d > 0.0 && d < UNREACHABLE)
        .map(|(_, &d)| 1.0 / d)
        .sum();
    reach - params.cost * agent.affiliation_count() as f64
}
