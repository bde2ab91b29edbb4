//! Population annealing Monte Carlo (PAMC) for lattice Ising-class models.
//!
//! A population of replicas is equilibrated by local updates at each inverse
//! temperature of a schedule β₀ = 0 → β_max, then resampled with weights
//! `exp(-Δβ·Eᵢ)` so the survivors approximate the Boltzmann distribution at
//! the next β. Along the way the population accumulates the free-energy
//! change Δβ·F and a genealogy that quantifies sampling quality.
//!
//! # Algorithms
//!
//! | Move | Where |
//! |------|-------|
//! | Metropolis / heat-bath sweep | [`IsingReplica`] via [`Population::equilibrate`] |
//! | Wolff cluster update | [`IsingReplica`] (`IsingMethod::Wolff`) |
//! | Resampling + free-energy bookkeeping | [`Population::resample`] |
//! | Genealogy (ρ_t, ρ_s) | [`Population::compute_genealogy_statistics`] |
//!
//! Replicas are parallelized over threads with [`rayon`]; every replica slot
//! owns a deterministic RNG stream, so results are bit-reproducible for a
//! fixed seed regardless of thread count.
//!
//! # Quick start
//!
//! ```
//! use pamc::{IsingMethod, IsingReplica, Population, SharedLatticeData};
//!
//! let shared = SharedLatticeData::cubic(4, 1.0);
//! let mut population = Population::new(100, 42, |_| IsingReplica::new(&shared)).unwrap();
//!
//! let mut beta = 0.0;
//! while beta < 1.0 {
//!     population.equilibrate(5, beta, IsingMethod::Metropolis, true).unwrap();
//!     population.measure_energy(false);
//!     beta = population.suggest_next_beta(0.1).min(1.0);
//!     population.resample(beta, None).unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod genealogy;
pub mod geometry;
pub mod model;
pub mod pool;
pub mod population;

pub use config::AnnealConfig;
pub use error::{PamcError, Result};
pub use genealogy::GenealogyStats;
pub use geometry::{load_bond_table, load_neighbor_table, SharedLatticeData};
pub use model::{IsingMethod, IsingReplica, Replica};
pub use pool::SpinPool;
pub use population::{max_population_size, Population};
