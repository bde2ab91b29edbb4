//! Population management: equilibration, measurement, annealing-step
//! bookkeeping, and genealogy. The resampling step lives in
//! [`resample`](self::resample).

mod resample;

use log::debug;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;

use crate::error::{PamcError, Result};
use crate::genealogy::GenealogyStats;
use crate::model::Replica;

/// A population of replicas annealed together through a β schedule.
///
/// The live replica count `R` floats around the nominal size as resampling
/// duplicates and culls states; it is hard-bounded by
/// `R_max = R_nom + 10·√R_nom`. All `R_max` replica slots (and their RNG
/// streams) are allocated at construction, so resampling never allocates.
///
/// Every slot consumes only its own deterministic RNG stream during update
/// sweeps, which makes the rayon-parallel equilibration bit-identical to a
/// scalar pass over the replicas. Resampling draws from a separate stream
/// (optionally overridden per call) so rounding variance can be decoupled
/// from update variance in tests.
pub struct Population<R: Replica> {
    replicas: Vec<R>,
    rngs: Vec<Xoshiro256StarStar>,
    resample_rng: Xoshiro256StarStar,
    /// Per-replica total energy, valid when `energies_current`.
    energy: Vec<f64>,
    /// Normalized expected copy counts τ from the latest resample.
    weight: Vec<f64>,
    /// Stochastically rounded copy counts from the latest resample, indexed
    /// by pre-resample replica.
    copy_count: Vec<u32>,
    scratch_count: Vec<u32>,
    num_replicas: usize,
    nominal_size: usize,
    max_size: usize,
    initial_size: usize,
    beta: f64,
    delta_beta_f: f64,
    avg_energy: f64,
    var_energy: f64,
    energies_current: bool,
}

/// Hard upper bound on the live count for a nominal population size.
/// Useful for sizing external spin pools before constructing a population.
pub fn max_population_size(pop_size: usize) -> usize {
    pop_size + (10.0 * (pop_size as f64).sqrt()) as usize
}

impl<R: Replica> Population<R> {
    /// Create a population of `pop_size` replicas.
    ///
    /// `make` is called once per slot (including spare slots up to `R_max`)
    /// to build an uninitialized replica shell; the first `pop_size` slots
    /// are then state-randomized and tagged `family = parent = index`.
    pub fn new(pop_size: usize, seed: u64, mut make: impl FnMut(usize) -> R) -> Result<Self> {
        if pop_size == 0 {
            return Err(PamcError::InvalidArgument(
                "population size must be at least 1".into(),
            ));
        }
        let max_size = max_population_size(pop_size);

        let mut replicas = Vec::with_capacity(max_size);
        let mut rngs = Vec::with_capacity(max_size);
        for slot in 0..max_size {
            replicas.push(make(slot));
            rngs.push(Xoshiro256StarStar::seed_from_u64(seed + slot as u64));
        }
        for (slot, (replica, rng)) in replicas.iter_mut().zip(rngs.iter_mut()).enumerate().take(pop_size) {
            replica.init_state(rng);
            replica.set_family(slot as u32)?;
            replica.set_parent(slot);
        }
        debug!("population: R_nom {pop_size}, R_max {max_size}");

        Ok(Self {
            replicas,
            rngs,
            resample_rng: Xoshiro256StarStar::seed_from_u64(seed + max_size as u64),
            energy: Vec::with_capacity(max_size),
            weight: Vec::with_capacity(max_size),
            copy_count: Vec::with_capacity(max_size),
            scratch_count: Vec::with_capacity(max_size),
            num_replicas: pop_size,
            nominal_size: pop_size,
            max_size,
            initial_size: pop_size,
            beta: 0.0,
            delta_beta_f: 0.0,
            avg_energy: 0.0,
            var_energy: 0.0,
            energies_current: false,
        })
    }

    /// Apply `num_sweeps` update sweeps at `beta` to every live replica.
    pub fn equilibrate(
        &mut self,
        num_sweeps: usize,
        beta: f64,
        method: R::Method,
        sequential: bool,
    ) -> Result<()> {
        self.beta = beta;
        let live = self.num_replicas;
        self.replicas[..live]
            .par_iter_mut()
            .zip(self.rngs[..live].par_iter_mut())
            .try_for_each(|(replica, rng)| {
                replica.update_sweep(num_sweeps, beta, rng, method, sequential)
            })?;
        self.energies_current = false;
        Ok(())
    }

    /// Mean energy ⟨E⟩ over the live population.
    ///
    /// Recomputes and caches per-replica energies, ⟨E⟩ and Var(E) when the
    /// cache is stale or `force` is set; otherwise returns the cached mean.
    pub fn measure_energy(&mut self, force: bool) -> f64 {
        if !self.energies_current || force {
            let live = self.num_replicas;
            self.replicas[..live]
                .par_iter()
                .map(Replica::measure_energy)
                .collect_into_vec(&mut self.energy);

            let r = live as f64;
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for &e in &self.energy {
                sum += e;
                sum_sq += e * e;
            }
            self.avg_energy = sum / r;
            self.var_energy = sum_sq / r - self.avg_energy * self.avg_energy;
            self.energies_current = true;
        }
        self.avg_energy
    }

    /// Lowest replica energy in the live population.
    pub fn min_energy(&mut self) -> f64 {
        self.measure_energy(false);
        self.energy[..self.num_replicas]
            .iter()
            .fold(f64::INFINITY, |acc, &e| acc.min(e))
    }

    /// Energy variance from the latest measurement.
    pub fn energy_variance(&mut self) -> f64 {
        self.measure_energy(false);
        self.var_energy
    }

    /// Next inverse temperature for a target culling fraction ε:
    /// `β + √(2ε)/σ_E`. The caller clamps the result to its β_max.
    pub fn suggest_next_beta(&mut self, culling_frac: f64) -> f64 {
        self.measure_energy(false);
        self.beta + (2.0 * culling_frac).sqrt() / self.var_energy.sqrt()
    }

    /// Family concentration statistics over the live replicas.
    pub fn compute_genealogy_statistics(&self) -> GenealogyStats {
        let mut family_size = vec![0u32; self.initial_size];
        for replica in &self.replicas[..self.num_replicas] {
            if let Some(family) = replica.family() {
                family_size[family as usize] += 1;
            }
        }

        let r_nom = self.nominal_size as f64;
        let mut rho_t = 0.0;
        let mut entropy = 0.0;
        let mut num_unique_families = 0;
        let mut max_family_size = 0u32;
        for &count in &family_size {
            if count == 0 {
                continue;
            }
            num_unique_families += 1;
            max_family_size = max_family_size.max(count);
            let c = count as f64;
            rho_t += c * c;
            let p = c / r_nom;
            entropy -= p * p.ln();
        }

        GenealogyStats {
            rho_t: rho_t / r_nom,
            rho_s: r_nom / entropy.exp(),
            num_unique_families,
            max_family_size: max_family_size as usize,
        }
    }

    /// Current live replica count.
    pub fn len(&self) -> usize {
        self.num_replicas
    }

    pub fn is_empty(&self) -> bool {
        self.num_replicas == 0
    }

    pub fn nominal_size(&self) -> usize {
        self.nominal_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Accumulated `Δβ·F` across all resamples so far.
    pub fn delta_beta_f(&self) -> f64 {
        self.delta_beta_f
    }

    /// Per-replica energies from the latest measurement.
    pub fn energies(&self) -> &[f64] {
        &self.energy[..self.num_replicas.min(self.energy.len())]
    }

    /// Copy counts drawn in the latest resample, indexed by pre-resample
    /// replica.
    pub fn copy_counts(&self) -> &[u32] {
        &self.copy_count
    }

    /// Normalized expected copy counts τ from the latest resample, indexed by
    /// pre-resample replica.
    pub fn taus(&self) -> &[f64] {
        &self.weight
    }

    pub fn replicas(&self) -> &[R] {
        &self.replicas[..self.num_replicas]
    }

    /// Mutable access to the live replicas. Marks the energy cache stale.
    pub fn replicas_mut(&mut self) -> &mut [R] {
        self.energies_current = false;
        &mut self.replicas[..self.num_replicas]
    }
}

#[cfg(test)]
pub(crate) mod test_model {
    use rand_xoshiro::Xoshiro256StarStar;

    use crate::error::{PamcError, Result};
    use crate::model::Replica;

    /// Scalar-state stand-in model: its "energy" is a directly settable
    /// number and a sweep just records itself, so population mechanics can
    /// be exercised without lattice dynamics.
    #[derive(Default)]
    pub(crate) struct TestReplica {
        pub state: f64,
        pub sweeps_applied: usize,
        pub last_beta: f64,
        family: Option<u32>,
        parent: usize,
    }

    #[derive(Clone, Copy)]
    pub(crate) enum TestMethod {
        Count,
    }

    impl Replica for TestReplica {
        type Method = TestMethod;

        fn init_state(&mut self, _rng: &mut Xoshiro256StarStar) {
            self.state = 0.0;
        }

        fn copy_state_from(&mut self, other: &Self) {
            self.state = other.state;
            self.sweeps_applied = other.sweeps_applied;
            self.family = other.family;
            self.parent = other.parent;
        }

        fn measure_energy(&self) -> f64 {
            self.state
        }

        fn update_sweep(
            &mut self,
            num_sweeps: usize,
            beta: f64,
            _rng: &mut Xoshiro256StarStar,
            method: TestMethod,
            _sequential: bool,
        ) -> Result<()> {
            match method {
                TestMethod::Count => {
                    self.sweeps_applied += num_sweeps;
                    self.last_beta = beta;
                }
            }
            Ok(())
        }

        fn family(&self) -> Option<u32> {
            self.family
        }

        fn set_family(&mut self, family: u32) -> Result<()> {
            if self.family.is_some() {
                return Err(PamcError::Logic("replica family already set".into()));
            }
            self.family = Some(family);
            Ok(())
        }

        fn parent(&self) -> usize {
            self.parent
        }

        fn set_parent(&mut self, parent: usize) {
            self.parent = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_model::{TestMethod, TestReplica};
    use super::*;
    use crate::geometry::SharedLatticeData;
    use crate::model::{IsingMethod, IsingReplica};
    use crate::pool::SpinPool;
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_empty_population() {
        let err = Population::new(0, 1, |_| TestReplica::default());
        assert!(matches!(err, Err(PamcError::InvalidArgument(_))));
    }

    #[test]
    fn test_initial_genealogy() {
        let pop = Population::new(10, 1, |_| TestReplica::default()).unwrap();
        let stats = pop.compute_genealogy_statistics();
        assert_relative_eq!(stats.rho_t, 1.0, epsilon = 1e-12);
        assert_relative_eq!(stats.rho_s, 1.0, epsilon = 1e-12);
        assert_eq!(stats.num_unique_families, 10);
        assert_eq!(stats.max_family_size, 1);

        for (slot, replica) in pop.replicas().iter().enumerate() {
            assert_eq!(replica.family(), Some(slot as u32));
            assert_eq!(replica.parent(), slot);
        }
    }

    #[test]
    fn test_equilibrate_applies_sweeps_to_every_replica() {
        let mut pop = Population::new(5, 1, |_| TestReplica::default()).unwrap();
        pop.equilibrate(10, 1.0, TestMethod::Count, true).unwrap();
        assert_eq!(pop.beta(), 1.0);
        for replica in pop.replicas() {
            assert_eq!(replica.sweeps_applied, 10);
            assert_eq!(replica.last_beta, 1.0);
        }
    }

    #[test]
    fn test_measure_energy_statistics() {
        let mut pop = Population::new(5, 1, |_| TestReplica::default()).unwrap();
        for (i, replica) in pop.replicas_mut().iter_mut().enumerate() {
            replica.state = (i + 1) as f64;
        }
        assert_relative_eq!(pop.measure_energy(false), 3.0, epsilon = 1e-12);
        assert_relative_eq!(pop.energy_variance(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(pop.min_energy(), 1.0, epsilon = 1e-12);

        // Cached until something mutates the replicas.
        assert_relative_eq!(pop.measure_energy(false), 3.0, epsilon = 1e-12);

        // β + √(2ε)/σ_E with σ_E = √2.
        let next = pop.suggest_next_beta(1.0);
        assert_relative_eq!(next, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_high_temperature_energy_limit() {
        // ⟨E⟩/N → -Z/2 · tanh(βJ) in the high-temperature limit.
        let shared = SharedLatticeData::cubic(6, 1.0);
        let mut pop = Population::new(1000, 1234, |_| IsingReplica::new(&shared)).unwrap();
        pop.equilibrate(200, 0.1, IsingMethod::Metropolis, false)
            .unwrap();

        let per_spin = pop.measure_energy(false) / shared.num_spins as f64;
        let want = -3.0 * (0.1f64).tanh();
        assert!(
            (per_spin - want).abs() < 5e-2,
            "⟨E⟩/N = {per_spin}, expected ≈ {want}"
        );
    }

    #[test]
    fn test_pooled_population_anneals() {
        let shared = SharedLatticeData::cubic(2, 1.0);
        let pool = SpinPool::new(max_population_size(3) * shared.num_spins);
        let mut pop = Population::new(3, 9, |_| IsingReplica::with_pool(&shared, &pool)).unwrap();

        pop.equilibrate(5, 0.5, IsingMethod::Metropolis, false)
            .unwrap();
        let next = pop.suggest_next_beta(0.2).min(1.0);
        pop.resample(next, None).unwrap();
        assert!(pop.len() <= pop.max_size());
        assert!(!pop.is_empty());
    }
}
