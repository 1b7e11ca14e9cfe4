/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Best-response local search over the 1-flip and 2-swap neighbourhoods.
//!
//! For one agent the search tries, in order:
//!
//! 1. every single flip, position ascending;
//! 2. every swap `(leave, join)` with `leave` currently 1 and `join` currently
//!    0, lexicographic.
//!
//! Each candidate is applied to the shared index, evaluated, and reverted
//! before the next one. The revert is tied to a guard's `Drop`, so the index
//! is restored on every exit path. The first candidate with the largest
//! strictly positive improvement wins.
//!
//! Cost: O(M + |ones|·|zeros|) utility evaluations. For the distance model
//! each evaluation refreshes one adjacency row and runs a single-source
//! shortest-path pass against a base adjacency snapshot.

use crate::agent::AgentId;
use crate::distance::{self, DistanceMatrix};
use crate::error::Result;
use crate::idea::IdeaId;
use crate::index::AffiliationIndex;
use crate::utility;

/// Relative tolerance below which two utilities are treated as equal.
///
/// Scaled by the magnitude of the utilities compared (at least 1), so it only
/// absorbs rounding noise: real gains of any practical size still count.
pub const IMPROVEMENT_TOLERANCE: f64 = 1e-12;

/// Whether `gain` beats `best` by more than rounding noise at utility scale `scale`.
fn beats(gain: f64, best: f64, scale: f64) -> bool {
    gain > best + IMPROVEMENT_TOLERANCE * scale.abs().max(1.0)
}

/// A change to one agent's affiliation vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    /// Toggle a single position.
    Flip(IdeaId),
    /// Leave one idea and join another in the same step.
    Swap {
        /// Position going 1 → 0.
        leave: IdeaId,
        /// Position going 0 → 1.
        join: IdeaId,
    },
}

impl Move {
    /// Positions touched, in application order.
    pub fn positions(&self) -> Vec<IdeaId> {
        match *self {
            Move::Flip(i) => vec![i],
            Move::Swap { leave, join } => vec![leave, join],
        }
    }
}

/// The winning move and how much it raises the agent's utility.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestMove {
    /// Move to apply.
    pub mv: Move,
    /// Utility gain, strictly positive.
    pub improvement: f64,
}

/// Tentatively applied positions, reverted on drop.
struct Tentative<'a> {
    index: &'a mut AffiliationIndex,
    slot: usize,
    positions: [Option<IdeaId>; 2],
}

impl<'a> Tentative<'a> {
    fn apply(index: &'a mut AffiliationIndex, slot: usize, mv: Move) -> Self {
        let positions = match mv {
            Move::Flip(i) => [Some(i), None],
            Move::Swap { leave, join } => [Some(leave), Some(join)],
        };
        for &i in positions.iter().flatten() {
            index.toggle_slot(slot, i);
        }
        Self {
            index,
            slot,
            positions,
        }
    }

    fn utility(&self, basis: Option<&DistanceMatrix>) -> f64 {
        evaluate(&*self.index, self.slot, basis)
    }
}

impl Drop for Tentative<'_> {
    fn drop(&mut self) {
        for &i in self.positions.iter().rev().flatten() {
            self.index.toggle_slot(self.slot, i);
        }
    }
}

/// Utility of `slot` against the index as it stands, using `basis` for distances.
fn evaluate(index: &AffiliationIndex, slot: usize, basis: Option<&DistanceMatrix>) -> f64 {
    match basis {
        Some(base) => {
            let adjacency = distance::individual_adjacency(index, slot, base);
            let row = distance::individual_shortest(slot, &adjacency);
            utility::evaluate(index, slot, Some(&row))
        }
        None => utility::evaluate(index, slot, None),
    }
}

/// Find agent `id`'s best strictly improving move, or `None`.
///
/// `basis` is the adjacency snapshot the distance model measures against.
/// Pass the round-start snapshot for simultaneous play; with `None` a fresh
/// adjacency is built from the current state. Other models ignore it.
///
/// The baseline is the agent's utility evaluated the same way as the
/// candidates, against the unmodified state.
pub fn best_response(
    index: &mut AffiliationIndex,
    id: AgentId,
    basis: Option<&DistanceMatrix>,
) -> Result<Option<BestMove>> {
    let slot = index.slot(id)?;
    let agent = index.agent_at(slot);
    let m = agent.len();
    let ones = agent.ones();
    let zeros = agent.zeros();

    let fresh;
    let basis = if agent.model().requires_distances() {
        match basis {
            Some(b) => Some(b),
            None => {
                fresh = distance::adjacency(index);
                Some(&fresh)
            }
        }
    } else {
        None
    };

    let baseline = evaluate(index, slot, basis);
    let mut best: Option<BestMove> = None;
    let mut best_improvement = 0.0;

    let singles = (0..m).map(Move::Flip);
    let swaps = ones
        .iter()
        .flat_map(|&leave| zeros.iter().map(move |&join| Move::Swap { leave, join }));

    for mv in singles.chain(swaps) {
        let candidate = Tentative::apply(index, slot, mv).utility(basis);
        let improvement = candidate - baseline;
        if beats(improvement, best_improvement, baseline.abs().max(candidate.abs())) {
            best_improvement = improvement;
            best = Some(BestMove { mv, improvement });
        }
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::model::{ModelParams, UtilityModel};

    fn build(model: UtilityModel, params: ModelParams, rows: &[&[u8]]) -> AffiliationIndex {
        AffiliationIndex::from_agents(rows.iter().enumerate().map(|(id, bits)| {
            Agent::with_params(id, bits.to_vec(), model, params).unwrap()
        }))
        .unwrap()
    }

    fn linear(rows: &[&[u8]]) -> AffiliationIndex {
        build(UtilityModel::LinearDegree, ModelParams::default(), rows)
    }

    #[test]
    fn test_linear_prefers_joining_largest_gain() {
        let mut idx = linear(&[&[1, 0], &[1, 0], &[0, 1]]);
        // Agent 2: join idea 0 → 3 + 1 = 4 (gain 3) beats swap → 3 (gain 2).
        let best = best_response(&mut idx, 2, None).unwrap().unwrap();
        assert_eq!(best.mv, Move::Flip(0));
        assert_eq!(best.improvement, 3.0);
    }

    #[test]
    fn test_search_leaves_index_untouched() {
        let mut idx = linear(&[&[1, 0, 1], &[1, 1, 0], &[0, 1, 1]]);
        let before = idx.snapshot();
        let utilities = idx.utilities();
        for id in 0..3 {
            best_response(&mut idx, id, None).unwrap();
        }
        assert_eq!(idx.snapshot(), before);
        assert_eq!(idx.utilities(), utilities);
        assert!(idx.is_consistent());
    }

    #[test]
    fn test_no_improving_move_at_full_affiliation() {
        let mut idx = linear(&[&[1, 1], &[1, 1]]);
        assert_eq!(best_response(&mut idx, 0, None).unwrap(), None);
    }

    #[test]
    fn test_swap_beats_single_flips() {
        // Congested model, c = 0.3, α = 2. Ideas 0, 1, 2 have degrees 2, 3, 0.
        let params = ModelParams { alpha: 2.0, cost: 0.3 };
        let mut idx = build(
            UtilityModel::CongestedDegree,
            params,
            &[&[1, 0, 0], &[1, 0, 0], &[0, 1, 0], &[0, 1, 0], &[0, 1, 0]],
        );
        // Agent 2 on idea 1: 3 − 2.7 − 0.5 = −0.2.
        // Leaving idea 1 gains 0.2, joining idea 2 alone gains 0.2,
        // swapping 1 → 2 gains both.
        let best = best_response(&mut idx, 2, None).unwrap().unwrap();
        assert_eq!(best.mv, Move::Swap { leave: 1, join: 2 });
        assert!((best.improvement - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        // Agent 0 alone with nothing: every flip on an empty idea gains 1 equally.
        let mut idx = linear(&[&[0, 0, 0], &[0, 0, 0]]);
        let best = best_response(&mut idx, 0, None).unwrap().unwrap();
        assert_eq!(best.mv, Move::Flip(0));
    }

    #[test]
    fn test_tiny_real_gain_is_an_improvement() {
        // Alone on idea 0 the congested agent scores 1 − c − 0.5 = 5e-10.
        let params = ModelParams { alpha: 2.0, cost: 0.5 - 5e-10 };
        let mut idx = build(UtilityModel::CongestedDegree, params, &[&[0]]);
        let best = best_response(&mut idx, 0, None).unwrap().unwrap();
        assert_eq!(best.mv, Move::Flip(0));
        assert!(best.improvement > 0.0 && best.improvement < 1e-9);
    }

    #[test]
    fn test_rounding_noise_is_not_a_gain() {
        assert!(!beats(1e-15, 0.0, 3.0));
        assert!(!beats(0.4 + 1e-16, 0.4, 1.0));
        assert!(beats(5e-10, 0.0, 0.0));
        assert!(beats(0.35, 0.3, 1e3));
    }

    #[test]
    fn test_detached_agent() {
        let mut idx = linear(&[&[1, 0]]);
        assert!(best_response(&mut idx, 9, None).is_err());
    }

    #[test]
    fn test_distance_model_uses_basis_and_restores_state() {
        let params = ModelParams { alpha: 2.0, cost: 0.1 };
        let mut idx = build(
            UtilityModel::DistanceConnectivity,
            params,
            &[&[1, 0, 0], &[1, 1, 0], &[0, 1, 0], &[0, 0, 1]],
        );
        let base = distance::adjacency(&idx);
        let before = idx.snapshot();
        // Isolated agent 3 gains by joining idea 1 (reaches 1 and 2 at 3, 0 at 5).
        let best = best_response(&mut idx, 3, Some(&base)).unwrap().unwrap();
        assert!(best.improvement > 0.0);
        assert_eq!(idx.snapshot(), before);
        assert!(idx.is_consistent());
    }

    #[test]
    fn test_move_positions() {
        assert_eq!(Move::Flip(4).positions(), vec![4]);
        assert_eq!(Move::Swap { leave: 1, join: 3 }.positions(), vec![1, 3]);
    }
}
