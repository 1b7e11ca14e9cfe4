//! Seeded population generators.
//!
//! Every generator draws from a [`ChaCha12Rng`] seeded from a `u64`, so a
//! `(config, strategy)` pair always produces the same population. Generated
//! agents have identifiers `0..N` (except [`PopulationGenerator::similar`]),
//! vectors of length M, and the configured model and parameters.
//!
//! | Strategy | Per-agent vector |
//! |----------|------------------|
//! | [`random`](PopulationGenerator::random) | independent fair bits |
//! | [`uniform_density`](PopulationGenerator::uniform_density) | exactly ⌊M·density⌋ ones at random positions |
//! | [`structured`](PopulationGenerator::structured) | a [`Pattern`] |
//! | [`similar`](PopulationGenerator::similar) | within a hamming radius of a base agent |
//! | [`normal_density`](PopulationGenerator::normal_density) | density ~ N(mean, std), clipped to [0, 1] |
//! | [`beta_density`](PopulationGenerator::beta_density) | density ~ Beta(a, b) |

use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use rand_distr::{Beta, Distribution, Normal};

use crate::agent::{Agent, AgentId};
use crate::error::{AffinityError, Result};
use crate::model::{ModelParams, UtilityModel};

/// Identifier offset for agents derived from a base agent.
pub const SIMILAR_ID_OFFSET: AgentId = 100;

/// Population size, dimensionality, seed and model.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Number of agents N.
    pub agents: usize,
    /// Number of ideas M.
    pub ideas: usize,
    /// RNG seed.
    pub seed: u64,
    /// Utility model given to every agent.
    pub model: UtilityModel,
    /// Model parameters given to every agent.
    pub params: ModelParams,
}

impl GeneratorConfig {
    /// `agents × ideas` population with the default parameters for `model`.
    pub fn new(agents: usize, ideas: usize, model: UtilityModel) -> Self {
        Self {
            agents,
            ideas,
            seed: 0,
            model,
            params: ModelParams::for_model(model),
        }
    }

    /// Same configuration with a different seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(10, 10, UtilityModel::LinearDegree)
    }
}

/// Deterministic shapes for [`PopulationGenerator::structured`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    /// One contiguous run of ones, random length in `[2, max(3, M/3))` and random start.
    Clusters,
    /// `0101…` or `1010…` depending on the agent's parity.
    Alternating,
    /// A block of `max(2, M/4)` ones starting at `(index · block) mod M`.
    Blocks,
}

/// Seeded generator of agent populations.
pub struct PopulationGenerator {
    config: GeneratorConfig,
    rng: ChaCha12Rng,
}

impl PopulationGenerator {
    /// Generator for `config`.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            rng: ChaCha12Rng::seed_from_u64(config.seed),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Independent fair bits.
    pub fn random(&mut self) -> Result<Vec<Agent>> {
        let m = self.config.ideas;
        (0..self.config.agents)
            .map(|id| {
                let hedges: Vec<u8> = (0..m).map(|_| self.rng.gen_range(0..2)).collect();
                self.agent(id, hedges)
            })
            .collect()
    }

    /// Exactly `⌊M · density⌋` ones per agent.
    pub fn uniform_density(&mut self, density: f64) -> Result<Vec<Agent>> {
        check_density(density)?;
        let ones = (self.config.ideas as f64 * density) as usize;
        (0..self.config.agents)
            .map(|id| {
                let hedges = self.scatter(ones);
                self.agent(id, hedges)
            })
            .collect()
    }

    /// Agents following `pattern`.
    pub fn structured(&mut self, pattern: Pattern) -> Result<Vec<Agent>> {
        let m = self.config.ideas;
        (0..self.config.agents)
            .map(|id| {
                let hedges = match pattern {
                    Pattern::Clusters => self.cluster(),
                    Pattern::Alternating => (0..m).map(|i| ((i + id % 2) % 2) as u8).collect(),
                    Pattern::Blocks => block(m, id),
                };
                self.agent(id, hedges)
            })
            .collect()
    }

    /// Up to `N − 1` distinct agents within `max_hamming` flips of `base`.
    ///
    /// All candidates at distance `1..=max_hamming` are enumerated; if there are
    /// more than `N − 1`, a random subset is kept in enumeration order.
    /// Identifiers are `base.id() + 100 + k`; model and parameters are `base`'s.
    pub fn similar(&mut self, base: &Agent, max_hamming: usize) -> Result<Vec<Agent>> {
        let m = base.len();
        if max_hamming > m {
            return Err(AffinityError::InvalidParameter(format!(
                "hamming radius {max_hamming} exceeds vector length {m}"
            )));
        }
        let mut candidates = Vec::new();
        for distance in 1..=max_hamming {
            for positions in combinations(m, distance) {
                let mut hedges = base.hedges().to_vec();
                for p in positions {
                    hedges[p] ^= 1;
                }
                candidates.push(hedges);
            }
        }

        let wanted = self.config.agents.saturating_sub(1);
        let selected: Vec<Vec<u8>> = if candidates.len() > wanted {
            let mut picks = sample(&mut self.rng, candidates.len(), wanted).into_vec();
            picks.sort_unstable();
            picks.into_iter().map(|i| candidates[i].clone()).collect()
        } else {
            candidates
        };

        selected
            .into_iter()
            .enumerate()
            .map(|(k, hedges)| {
                let id = base
                    .id()
                    .checked_add(SIMILAR_ID_OFFSET)
                    .and_then(|id| id.checked_add(k))
                    .ok_or_else(|| {
                        AffinityError::InvalidParameter(format!(
                            "derived identifier for base agent {} overflows",
                            base.id()
                        ))
                    })?;
                Agent::with_params(id, hedges, base.model(), base.params())
            })
            .collect()
    }

    /// Densities drawn from N(mean, std), clipped to [0, 1].
    ///
    /// `mean` must be finite and `std` finite and non-negative.
    pub fn normal_density(&mut self, mean: f64, std: f64) -> Result<Vec<Agent>> {
        if !mean.is_finite() || !std.is_finite() || std < 0.0 {
            return Err(AffinityError::InvalidParameter(format!(
                "normal({mean}, {std}) needs a finite mean and a finite, non-negative std"
            )));
        }
        let dist = Normal::new(mean, std)
            .map_err(|e| AffinityError::InvalidParameter(format!("normal({mean}, {std}): {e}")))?;
        self.with_densities(|rng| dist.sample(rng))
    }

    /// Densities drawn from Beta(a, b).
    ///
    /// Both shape parameters must be finite and positive.
    pub fn beta_density(&mut self, a: f64, b: f64) -> Result<Vec<Agent>> {
        if !(a.is_finite() && b.is_finite() && a > 0.0 && b > 0.0) {
            return Err(AffinityError::InvalidParameter(format!(
                "beta({a}, {b}) needs finite, positive shapes"
            )));
        }
        let dist = Beta::new(a, b)
            .map_err(|e| AffinityError::InvalidParameter(format!("beta({a}, {b}): {e}")))?;
        self.with_densities(|rng| dist.sample(rng))
    }

    fn with_densities(&mut self, mut draw: impl FnMut(&mut ChaCha12Rng) -> f64) -> Result<Vec<Agent>> {
        let m = self.config.ideas;
        (0..self.config.agents)
            .map(|id| {
                let density = draw(&mut self.rng).clamp(0.0, 1.0);
                let hedges = self.scatter((m as f64 * density) as usize);
                self.agent(id, hedges)
            })
            .collect()
    }

    /// Vector with `ones` ones at distinct random positions.
    fn scatter(&mut self, ones: usize) -> Vec<u8> {
        let m = self.config.ideas;
        let mut hedges = vec![0u8; m];
        for p in sample(&mut self.rng, m, ones.min(m)) {
            hedges[p] = 1;
        }
        hedges
    }

    fn cluster(&mut self) -> Vec<u8> {
        let m = self.config.ideas;
        let mut hedges = vec![0u8; m];
        if m == 0 {
            return hedges;
        }
        let size = self.rng.gen_range(2..(m / 3).max(3)).min(m);
        let start = self.rng.gen_range(0..=m - size);
        hedges[start..start + size].fill(1);
        hedges
    }

    fn agent(&self, id: AgentId, hedges: Vec<u8>) -> Result<Agent> {
        Agent::with_params(id, hedges, self.config.model, self.config.params)
    }
}

fn check_density(density: f64) -> Result<()> {
    if (0.0..=1.0).contains(&density) {
        Ok(())
    } else {
        Err(AffinityError::InvalidParameter(format!(
            "density {density} outside [0, 1]"
        )))
    }
}

fn block(m: usize, index: usize) -> Vec<u8> {
    let mut hedges = vec![0u8; m];
    if m == 0 {
        return hedges;
    }
    let size = (m / 4).max(2);
    let start = (index * size) % m;
    let end = (start + size).min(m);
    hedges[start..end].fill(1);
    hedges
}

/// All `k`-subsets of `0..n` in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        let Some(i) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
            return out;
        };
        idx[i] += 1;
        for j in i + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}
