/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Agents: an identifier, a binary affiliation vector and a utility model.
//!
//! An agent holds no reference to the index it lives in. Operations that need
//! shared state (idea degrees, distances) take the
//! [`AffiliationIndex`](crate::index::AffiliationIndex) as a parameter.
//!
//! # Invariants
//!
//! - Every affiliation entry is 0 or 1 (checked at construction).
//! - Vector length is fixed for the agent's lifetime; only bit values change.
//! - Equality and hashing use the identifier alone.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::str::FromStr;

use crate::error::{AffinityError, Result};
use crate::model::{ModelParams, UtilityModel};

/// Stable agent identifier. Also the agent's row/column key in distance matrices.
pub type AgentId = usize;

/// One participant in the affiliation game.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    hedges: Vec<u8>,
    utility: f64,
    model: UtilityModel,
    params: ModelParams,
}

impl Agent {
    /// Build an agent with the default parameters for `model`.
    ///
    /// Fails with [`AffinityError::InvalidVector`] if any entry is not 0 or 1.
    pub fn new(id: AgentId, hedges: impl Into<Vec<u8>>, model: UtilityModel) -> Result<Self> {
        Self::with_params(id, hedges, model, ModelParams::for_model(model))
    }

    /// Build an agent with explicit model parameters.
    pub fn with_params(
        id: AgentId,
        hedges: impl Into<Vec<u8>>,
        model: UtilityModel,
        params: ModelParams,
    ) -> Result<Self> {
        let hedges = hedges.into();
        if let Some((position, &value)) = hedges.iter().enumerate().find(|(_, &b)| b > 1) {
            return Err(AffinityError::InvalidVector { position, value });
        }
        params.validate()?;
        Ok(Self {
            id,
            hedges,
            utility: 0.0,
            model,
            params,
        })
    }

    /// Build an agent from a model tag such as `"mil10"`.
    ///
    /// Unknown tags fail with [`AffinityError::UnknownModel`].
    pub fn from_tag(id: AgentId, hedges: impl Into<Vec<u8>>, tag: &str) -> Result<Self> {
        Self::new(id, hedges, UtilityModel::from_str(tag)?)
    }

    /// Identifier.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Affiliation vector.
    pub fn hedges(&self) -> &[u8] {
        &self.hedges
    }

    /// Vector length M.
    pub fn len(&self) -> usize {
        self.hedges.len()
    }

    /// True for a zero-length vector.
    pub fn is_empty(&self) -> bool {
        self.hedges.is_empty()
    }

    /// Utility as of the last recomputation by the index.
    pub fn utility(&self) -> f64 {
        self.utility
    }

    /// Utility model.
    pub fn model(&self) -> UtilityModel {
        self.model
    }

    /// Model parameters.
    pub fn params(&self) -> ModelParams {
        self.params
    }

    /// Whether the agent is affiliated with idea `i`. Out-of-range is `false`.
    pub fn is_affiliated(&self, i: usize) -> bool {
        self.hedges.get(i).copied() == Some(1)
    }

    /// Positions currently set to 1, ascending.
    pub fn ones(&self) -> Vec<usize> {
        self.positions_with(1)
    }

    /// Positions currently set to 0, ascending.
    pub fn zeros(&self) -> Vec<usize> {
        self.positions_with(0)
    }

    /// Number of affiliated ideas.
    pub fn affiliation_count(&self) -> usize {
        self.hedges.iter().filter(|&&b| b == 1).count()
    }

    /// Number of positions where the two vectors differ.
    ///
    /// Fails with [`AffinityError::LengthMismatch`] when lengths differ.
    pub fn hamming_distance(&self, other: &Agent) -> Result<usize> {
        hamming_distance(&self.hedges, &other.hedges)
    }

    fn positions_with(&self, bit: u8) -> Vec<usize> {
        self.hedges
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == bit)
            .map(|(i, _)| i)
            .collect()
    }

    /// Toggle bit `i`. Only the index calls this, paired with the idea toggle.
    pub(crate) fn flip(&mut self, i: usize) {
        self.hedges[i] ^= 1;
    }

    pub(crate) fn set_utility(&mut self, utility: f64) {
        self.utility = utility;
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Agent {}

impl Hash for Agent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent(id={}, vector=[", self.id)?;
        for (i, b) in self.hedges.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{b}")?;
        }
        write!(f, "], u={})", self.utility)
    }
}

/// Hamming distance between two raw affiliation vectors.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> Result<usize> {
    if a.len() != b.len() {
        return Err(AffinityError::LengthMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(a.iter().zip(b).filter(|(x, y)| x != y).count())
}
