//! Utility model selector and its parameters.
//!
//! The model is a closed set of four variants resolved once when an agent is
//! built. String tags are accepted for compatibility with existing run
//! descriptions:
//!
//! | Tag | Variant | Utility |
//! |-----|---------|---------|
//! | `mil1`  | [`UtilityModel::LinearDegree`] | Σ deg(i) |
//! | `mil10` | [`UtilityModel::CongestedDegree`] | Σ deg(i) − c·deg(i)^α − 0.5 |
//! | `mil00` | [`UtilityModel::NeighborhoodCardinality`] | \|reached agents\| − Σ c·deg(i)^α |
//! | `mil01` | [`UtilityModel::DistanceConnectivity`] | Σ 1/d(self, j) − c·\|ones\| |
//!
//! `mil11` is a deprecated alias for `mil10`. Any other tag is rejected with
//! [`AffinityError::UnknownModel`].

use core::fmt;
use core::str::FromStr;

use crate::error::AffinityError;

/// Which utility function an agent maximises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UtilityModel {
    /// `mil1`: sum of the degrees of affiliated ideas.
    LinearDegree,
    /// `mil10`: degree net of a concave congestion penalty and a fixed 0.5 overhead.
    CongestedDegree,
    /// `mil00`: distinct agents reached through affiliated ideas, net of congestion.
    NeighborhoodCardinality,
    /// `mil01`: inverse shortest distance to every other agent, net of a per-affiliation cost.
    DistanceConnectivity,
}

impl UtilityModel {
    /// All variants in catalog order.
    pub const ALL: [UtilityModel; 4] = [
        UtilityModel::LinearDegree,
        UtilityModel::CongestedDegree,
        UtilityModel::NeighborhoodCardinality,
        UtilityModel::DistanceConnectivity,
    ];

    /// Canonical tag for this model.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LinearDegree => "mil1",
            Self::CongestedDegree => "mil10",
            Self::NeighborhoodCardinality => "mil00",
            Self::DistanceConnectivity => "mil01",
        }
    }

    /// Whether evaluating this model needs shortest-path distances.
    pub fn requires_distances(&self) -> bool {
        matches!(self, Self::DistanceConnectivity)
    }
}

impl fmt::Display for UtilityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for UtilityModel {
    type Err = AffinityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mil1" => Ok(Self::LinearDegree),
            // mil11 is the older name of the congested model.
            "mil10" | "mil11" => Ok(Self::CongestedDegree),
            "mil00" => Ok(Self::NeighborhoodCardinality),
            "mil01" => Ok(Self::DistanceConnectivity),
            other => Err(AffinityError::UnknownModel(other.into())),
        }
    }
}

/// Numeric parameters shared by the cost-bearing models.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelParams {
    /// Congestion exponent α. Default 2.0.
    pub alpha: f64,
    /// Cost coefficient `c`. The linear-degree model ignores it.
    pub cost: f64,
}

impl ModelParams {
    /// Default parameters for `model`.
    ///
    /// ```text
    /// mil1  → c = 1.0    (unused)
    /// mil10 → c = 0.2
    /// mil00 → c = 0.05
    /// mil01 → c = 1.0
    /// α = 2.0 for every model
    /// ```
    pub fn for_model(model: UtilityModel) -> Self {
        let cost = match model {
            UtilityModel::LinearDegree => 1.0,
            UtilityModel::CongestedDegree => 0.2,
            UtilityModel::NeighborhoodCardinality => 0.05,
            UtilityModel::DistanceConnectivity => 1.0,
        };
        Self { alpha: 2.0, cost }
    }

    /// Reject non-finite values.
    pub fn validate(&self) -> Result<(), AffinityError> {
        if !self.alpha.is_finite() || !self.cost.is_finite() {
            return Err(AffinityError::InvalidParameter(format!(
                "model parameters must be finite (alpha = {}, cost = {})",
                self.alpha, self.cost
            )));
        }
        Ok(())
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::for_model(UtilityModel::LinearDegree)
    }
}
