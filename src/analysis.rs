//! Summary statistics over a population of affiliation vectors.

use crate::agent::{hamming_distance, Agent};
use crate::error::{AffinityError, Result};
use crate::index::AffiliationIndex;

/// Density and pairwise-distance statistics for a population.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationStats {
    /// Number of agents.
    pub agents: usize,
    /// Common vector length M.
    pub vector_length: usize,
    /// Mean fraction of ones per agent.
    pub avg_density: f64,
    /// Fraction of agents affiliated with each idea.
    pub position_densities: Vec<f64>,
    /// Mean pairwise hamming distance. 0 with fewer than two agents.
    pub avg_hamming: f64,
    /// Smallest pairwise hamming distance.
    pub min_hamming: usize,
    /// Largest pairwise hamming distance.
    pub max_hamming: usize,
}

impl PopulationStats {
    /// Statistics for `agents`. All vectors must share one length.
    pub fn from_agents(agents: &[Agent]) -> Result<Self> {
        let Some(first) = agents.first() else {
            return Ok(Self::default());
        };
        let m = first.len();
        if let Some(bad) = agents.iter().find(|a| a.len() != m) {
            return Err(AffinityError::LengthMismatch {
                expected: m,
                found: bad.len(),
            });
        }

        let n = agents.len() as f64;
        let mut counts = vec![0usize; m];
        for agent in agents {
            for i in agent.ones() {
                counts[i] += 1;
            }
        }
        let position_densities: Vec<f64> = counts.iter().map(|&c| c as f64 / n).collect();
        let avg_density = if m == 0 {
            0.0
        } else {
            agents
                .iter()
                .map(|a| a.affiliation_count() as f64 / m as f64)
                .sum::<f64>()
                / n
        };

        let mut pairs = 0usize;
        let mut total = 0usize;
        let mut min_hamming = usize::MAX;
        let mut max_hamming = 0;
        for (k, a) in agents.iter().enumerate() {
            for b in &agents[k + 1..] {
                let d = hamming_distance(a.hedges(), b.hedges())?;
                pairs += 1;
                total += d;
                min_hamming = min_hamming.min(d);
                max_hamming = max_hamming.max(d);
            }
        }
        if pairs == 0 {
            min_hamming = 0;
        }

        Ok(Self {
            agents: agents.len(),
            vector_length: m,
            avg_density,
            position_densities,
            avg_hamming: if pairs == 0 { 0.0 } else { total as f64 / pairs as f64 },
            min_hamming,
            max_hamming,
        })
    }

    /// Statistics for the agents currently held by `index`.
    pub fn from_index(index: &AffiliationIndex) -> Result<Self> {
        Self::from_agents(index.all_agents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UtilityModel;

    fn agents(rows: &[&[u8]]) -> Vec<Agent> {
        rows.iter()
            .enumerate()
            .map(|(id, bits)| Agent::new(id, bits.to_vec(), UtilityModel::LinearDegree).unwrap())
            .collect()
    }

    #[test]
    fn test_stats_over_small_population() {
        let stats = PopulationStats::from_agents(&agents(&[&[1, 0, 0, 0], &[1, 1, 0, 0], &[0, 0, 1, 1]])).unwrap();
        assert_eq!(stats.agents, 3);
        assert_eq!(stats.vector_length, 4);
        assert!((stats.avg_density - 5.0 / 12.0).abs() < 1e-12);
        assert_eq!(stats.position_densities, vec![2.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]);
        // Pairs: (0,1)=1, (0,2)=3, (1,2)=4
        assert!((stats.avg_hamming - 8.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats.min_hamming, 1);
        assert_eq!(stats.max_hamming, 4);
    }

    #[test]
    fn test_single_agent_has_zero_distances() {
        let stats = PopulationStats::from_agents(&agents(&[&[1, 1]])).unwrap();
        assert_eq!(stats.avg_hamming, 0.0);
        assert_eq!(stats.min_hamming, 0);
        assert_eq!(stats.max_hamming, 0);
        assert_eq!(stats.avg_density, 1.0);
    }

    #[test]
    fn test_empty_population() {
        assert_eq!(PopulationStats::from_agents(&[]).unwrap(), PopulationStats::default());
    }

    #[test]
    fn test_mixed_lengths_rejected() {
        let mixed = vec![
            Agent::new(0, vec![1, 0], UtilityModel::LinearDegree).unwrap(),
            Agent::new(1, vec![1], UtilityModel::LinearDegree).unwrap(),
        ];
        assert_eq!(
            PopulationStats::from_agents(&mixed),
            Err(AffinityError::LengthMismatch { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_from_index_matches_agents() {
        let population = agents(&[&[1, 0], &[0, 1]]);
        let index = AffiliationIndex::from_agents(population.clone()).unwrap();
        assert_eq!(
            PopulationStats::from_index(&index).unwrap(),
            PopulationStats::from_agents(&population).unwrap()
        );
    }
}
