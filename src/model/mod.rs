pub mod ising;

pub use ising::{IsingMethod, IsingReplica};

use rand_xoshiro::Xoshiro256StarStar;

use crate::error::Result;

/// Capability contract for one member of an annealing population.
///
/// A replica owns a complete model state, knows how to randomize it, copy it
/// from a sibling, measure its total (extensive) energy, and advance it by
/// local update sweeps. It also carries the genealogy tags the population
/// threads through resampling: `family` is the index of the founding replica
/// (set once, inherited on copy), `parent` is the index the state was copied
/// from in the most recent resample.
pub trait Replica: Send + Sync {
    /// Model-specific update moves. Each model defines its own variant set;
    /// there is no shared update enum across models.
    type Method: Copy + Send + Sync;

    /// Randomize the state using `rng`.
    fn init_state(&mut self, rng: &mut Xoshiro256StarStar);

    /// Overwrite this replica's full state (including genealogy tags) with
    /// `other`'s. Replicas of mismatched sizes indicate a caller bug and abort.
    fn copy_state_from(&mut self, other: &Self);

    /// Total energy of the current state. Extensive, not per-spin.
    fn measure_energy(&self) -> f64;

    /// Apply `num_sweeps` update sweeps at inverse temperature `beta`.
    ///
    /// With `sequential` set, single-site methods visit sites in index order;
    /// otherwise each attempt draws a site uniformly at random (with
    /// replacement).
    fn update_sweep(
        &mut self,
        num_sweeps: usize,
        beta: f64,
        rng: &mut Xoshiro256StarStar,
        method: Self::Method,
        sequential: bool,
    ) -> Result<()>;

    fn family(&self) -> Option<u32>;

    /// Set the founding-family tag. Fails with a logic error if the family
    /// was already set; families only change by inheritance via
    /// [`Replica::copy_state_from`].
    fn set_family(&mut self, family: u32) -> Result<()>;

    fn parent(&self) -> usize;

    fn set_parent(&mut self, parent: usize);
}
