//! Derived agent-to-agent distance graph and shortest paths.
//!
//! The bipartite agent/idea graph is folded into a weighted agent graph:
//! the edge between agents `a` and `b` weighs the smallest degree among the
//! ideas they share. A small shared idea is a close tie; a crowded one is
//! a loose tie. Pairs sharing nothing have no edge ([`UNREACHABLE`]).
//!
//! Matrix rows and columns are index slots (agents in ascending identifier
//! order).
//!
//! # Algorithms
//!
//! - [`adjacency`]: O(Σ over agents of Σ over their ideas of degree).
//! - [`shortest_paths`]: Floyd–Warshall, O(N³).
//! - [`individual_adjacency`] + [`individual_shortest`]: refresh one agent's
//!   row/column of a base matrix, then dense Dijkstra from that agent, O(N²).
//!   Search uses this pair per candidate move instead of a full recomputation.
//!
//! # Invariants
//! - Adjacency and shortest-path matrices are symmetric.
//! - The adjacency diagonal is [`UNREACHABLE`] (no self-loops); the
//!   shortest-path diagonal is 0.

use crate::index::AffiliationIndex;

/// Distance between agents with no connecting path.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Dense square matrix of agent-to-agent weights, row-major.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DistanceMatrix {
    n: usize,
    cells: Vec<f64>,
}

impl DistanceMatrix {
    /// `n × n` matrix with every cell [`UNREACHABLE`].
    pub fn unreachable(n: usize) -> Self {
        Self {
            n,
            cells: vec![UNREACHABLE; n * n],
        }
    }

    /// Dimension N.
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for a 0 × 0 matrix.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Cell `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.n + j]
    }

    /// Row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.cells[i * self.n..(i + 1) * self.n]
    }

    /// Set `(i, j)` and `(j, i)`.
    pub fn set_symmetric(&mut self, i: usize, j: usize, w: f64) {
        self.cells[i * self.n + j] = w;
        self.cells[j * self.n + i] = w;
    }

    fn set(&mut self, i: usize, j: usize, w: f64) {
        self.cells[i * self.n + j] = w;
    }

    /// Lower `(i, j)` and `(j, i)` to `w` if `w` is smaller.
    fn relax(&mut self, i: usize, j: usize, w: f64) {
        if w < self.get(i, j) {
            self.set_symmetric(i, j, w);
        }
    }

    /// Whether `m[i][j] == m[j][i]` for every pair.
    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Build the agent graph from the current affiliation state.
pub fn adjacency(index: &AffiliationIndex) -> DistanceMatrix {
    let mut m = DistanceMatrix::unreachable(index.len());
    for slot in 0..index.len() {
        connect_agent(index, slot, &mut m);
    }
    m
}

/// All-pairs shortest paths over `adjacency`, treated as undirected.
pub fn shortest_paths(adjacency: &DistanceMatrix) -> DistanceMatrix {
    let n = adjacency.len();
    let mut d = adjacency.clone();
    for i in 0..n {
        d.set(i, i, 0.0);
    }
    for k in 0..n {
        for i in 0..n {
            let dik = d.get(i, k);
            if dik == UNREACHABLE {
                continue;
            }
            for j in 0..n {
                let through = dik + d.get(k, j);
                if through < d.get(i, j) {
                    d.set(i, j, through);
                }
            }
        }
    }
    d
}

/// Copy of `base` with agent `slot`'s row and column rebuilt from the current state.
///
/// Only edges incident to `slot` are refreshed; the rest of `base` is kept
/// as is, including weights that depend on degrees the agent just changed.
pub fn individual_adjacency(
    index: &AffiliationIndex,
    slot: usize,
    base: &DistanceMatrix,
) -> DistanceMatrix {
    let mut m = base.clone();
    for j in 0..m.len() {
        m.set_symmetric(slot, j, UNREACHABLE);
    }
    connect_agent(index, slot, &mut m);
    m
}

/// Single-source shortest distances from `slot` over `adjacency`.
pub fn individual_shortest(slot: usize, adjacency: &DistanceMatrix) -> Vec<f64> {
    let n = adjacency.len();
    let mut dist = vec![UNREACHABLE; n];
    let mut done = vec![false; n];
    dist[slot] = 0.0;

    for _ in 0..n {
        let next = (0..n)
            .filter(|&v| !done[v] && dist[v] < UNREACHABLE)
            .min_by(|&a, &b| dist[a].total_cmp(&dist[b]));
        let Some(u) = next else { break };
        done[u] = true;

        for v in 0..n {
            if done[v] {
                continue;
            }
            let w = adjacency.get(u, v);
            if w < UNREACHABLE && dist[u] + w < dist[v] {
                dist[v] = dist[u] + w;
            }
        }
    }
    dist
}

/// Relax every edge between `slot` and the co-members of its ideas.
fn connect_agent(index: &AffiliationIndex, slot: usize, m: &mut DistanceMatrix) {
    let ideas = index.all_ideas();
    let agent = index.agent_at(slot);
    for i in agent.ones() {
        let idea = &ideas[i];
        let degree = idea.degree() as f64;
        for other in idea.agents() {
            if other == agent.id() {
                continue;
            }
            if let Ok(j) = index.slot(other) {
                m.relax(slot, j, degree);
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
