//! # affinity-core
//!
//! Best-response dynamics for an agent/idea affiliation game.
//!
//! ---
//!
//! ## The game
//!
//! N agents each hold a binary vector over M ideas: bit `i` says whether the
//! agent is affiliated with idea `i`. An idea's *degree* is the number of
//! agents affiliated with it. Every agent scores its position with one of four
//! utility models, and in each round every agent in turn takes its best
//! strictly improving move: one flip, or a swap that leaves one idea and joins
//! another.
//!
//! The run stops in exactly one of three states:
//!
//! - **Equilibrium**: a full round in which nobody could improve.
//! - **Cycle**: a round-start state that has been seen before.
//! - **Round limit**: `500·N` rounds without either.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! PopulationGenerator → AffiliationIndex → Dynamics ──► Vec<Frame>
//!                             ↑     ↑         │
//!                      UtilityModel │     best_response
//!                                   │         │
//!                            DistanceMatrix ◄─┘  (distance model only)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`agent`] | [`Agent`] | Identifier, affiliation vector, utility model |
//! | [`idea`] | [`Idea`] | Set of affiliated agents; degree |
//! | [`model`] | [`UtilityModel`], [`ModelParams`] | Model selector, tags and cost parameters |
//! | [`index`] | [`AffiliationIndex`] | Canonical agent/idea state with paired mutation |
//! | [`utility`] | [`utility::utility`] | One evaluation per utility model |
//! | [`distance`] | [`DistanceMatrix`] | Weighted agent graph and shortest paths |
//! | [`search`] | [`Move`], [`BestMove`] | 1-flip / 2-swap best response |
//! | [`dynamics`] | [`Dynamics`], [`RunState`], [`Outcome`] | Round driver with equilibrium and cycle detection |
//! | [`frame`] | [`Frame`], [`RoundEvent`], [`RoundObserver`] | Per-round history and progress events |
//! | [`population`] | [`PopulationGenerator`] | Seeded population generators |
//! | [`analysis`] | [`PopulationStats`] | Density and hamming statistics |
//!
//! ## Utility models
//!
//! | Tag | Variant | Utility of an agent |
//! |-----|---------|---------------------|
//! | `mil1` | [`UtilityModel::LinearDegree`] | Σ deg(i) |
//! | `mil10` | [`UtilityModel::CongestedDegree`] | Σ deg(i) − c·deg(i)^α − 0.5 |
//! | `mil00` | [`UtilityModel::NeighborhoodCardinality`] | \|agents sharing an idea\| − Σ c·deg(i)^α |
//! | `mil01` | [`UtilityModel::DistanceConnectivity`] | Σ 1/d(self, j) − c·\|ones\| |
//!
//! ## Example
//!
//! ```rust
//! use affinity_core::{AffiliationIndex, Agent, Dynamics, DynamicsConfig, RunState, UtilityModel};
//!
//! let agents = vec![
//!     Agent::new(0, vec![1, 0], UtilityModel::LinearDegree).unwrap(),
//!     Agent::new(1, vec![1, 0], UtilityModel::LinearDegree).unwrap(),
//!     Agent::new(2, vec![0, 1], UtilityModel::LinearDegree).unwrap(),
//! ];
//! let mut index = AffiliationIndex::from_agents(agents).unwrap();
//! let outcome = Dynamics::new(&mut index, DynamicsConfig::default()).run().unwrap();
//!
//! assert_eq!(outcome.state, RunState::Equilibrium);
//! assert_eq!(index.snapshot(), vec![vec![1, 1]; 3]);
//! ```
//!
//! ## Features
//!
//! Enable `serde` to derive `Serialize`/`Deserialize` on frames, events,
//! outcomes and configuration structs.
//!
//! ## License
//!
//! Business Source License 1.1. Free for evaluation and non-production use.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod agent;
pub mod analysis;
pub mod distance;
pub mod dynamics;
pub mod error;
pub mod frame;
pub mod idea;
pub mod index;
pub mod model;
pub mod population;
pub mod search;
pub mod utility;

pub use agent::{Agent, AgentId};
pub use analysis::PopulationStats;
pub use distance::{DistanceMatrix, UNREACHABLE};
pub use dynamics::{Dynamics, DynamicsConfig, Outcome, RunState, UpdateMode};
pub use error::{AffinityError, Result};
pub use frame::{AffiliationChange, Direction, Frame, RoundEvent, RoundObserver};
pub use idea::{Idea, IdeaId};
pub use index::AffiliationIndex;
pub use model::{ModelParams, UtilityModel};
pub use population::{GeneratorConfig, Pattern, PopulationGenerator};
pub use search::{best_response, BestMove, Move, IMPROVEMENT_TOLERANCE};
