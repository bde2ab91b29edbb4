use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::error::{PamcError, Result};
use crate::geometry::SharedLatticeData;
use crate::model::Replica;
use crate::pool::SpinPool;

/// Update moves available to [`IsingReplica`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsingMethod {
    Metropolis,
    HeatBath,
    Wolff,
}

/// Spin storage: one heap allocation per replica, or a region carved from an
/// external [`SpinPool`]. Fixed at construction; `copy_state_from` copies
/// contents without reseating storage.
enum SpinStorage<'a> {
    Owned(Box<[i8]>),
    Pooled(&'a mut [i8]),
}

impl SpinStorage<'_> {
    #[inline]
    fn as_slice(&self) -> &[i8] {
        match self {
            SpinStorage::Owned(spins) => spins,
            SpinStorage::Pooled(spins) => spins,
        }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [i8] {
        match self {
            SpinStorage::Owned(spins) => spins,
            SpinStorage::Pooled(spins) => spins,
        }
    }
}

/// One Ising-class lattice configuration (±1 spins over a shared neighbor and
/// bond table). Serves both the uniform ferromagnet and disordered
/// Edwards-Anderson couplings; the difference lives entirely in the bond
/// table.
pub struct IsingReplica<'a> {
    shared: &'a SharedLatticeData,
    spins: SpinStorage<'a>,
    family: Option<u32>,
    parent: usize,
}

impl<'a> IsingReplica<'a> {
    /// New replica with heap-owned spins, initialized all-up.
    pub fn new(shared: &'a SharedLatticeData) -> Self {
        Self {
            shared,
            spins: SpinStorage::Owned(vec![1i8; shared.num_spins].into_boxed_slice()),
            family: None,
            parent: 0,
        }
    }

    /// New replica whose spins are carved from `pool`, initialized all-up.
    pub fn with_pool(shared: &'a SharedLatticeData, pool: &'a SpinPool) -> Self {
        let spins = pool.alloc(shared.num_spins);
        spins.fill(1);
        Self {
            shared,
            spins: SpinStorage::Pooled(spins),
            family: None,
            parent: 0,
        }
    }

    /// Set every spin up (a ground state of the uniform ferromagnet).
    pub fn init_all_up(&mut self) {
        self.spins.as_mut_slice().fill(1);
    }

    pub fn spins(&self) -> &[i8] {
        self.spins.as_slice()
    }

    pub fn spin(&self, site: usize) -> Result<i8> {
        if site >= self.shared.num_spins {
            return Err(PamcError::InvalidArgument(format!(
                "site index {site} out of range [0, {})",
                self.shared.num_spins
            )));
        }
        Ok(self.spins.as_slice()[site])
    }

    pub fn set_spin(&mut self, site: usize, value: i8) -> Result<()> {
        if site >= self.shared.num_spins {
            return Err(PamcError::InvalidArgument(format!(
                "site index {site} out of range [0, {})",
                self.shared.num_spins
            )));
        }
        if value != 1 && value != -1 {
            return Err(PamcError::InvalidArgument(format!(
                "spin value must be -1 or +1, got {value}"
            )));
        }
        self.spins.as_mut_slice()[site] = value;
        Ok(())
    }

    /// Magnetization per spin, `Σᵢ sᵢ / N`.
    pub fn measure_magnetization(&self) -> f64 {
        let spins = self.spins.as_slice();
        let sum: i64 = spins.iter().map(|&s| s as i64).sum();
        sum as f64 / spins.len() as f64
    }

    /// Local field at `site` from all neighbors: `h = Σₙ s_n · J_n`.
    #[inline]
    fn local_field(&self, site: usize) -> f64 {
        let shared = self.shared;
        let spins = self.spins.as_slice();
        let mut h = 0.0;
        for slot in 0..shared.num_neighbors {
            h += spins[shared.neighbor(site, slot)] as f64 * shared.bond(site, slot);
        }
        h
    }

    fn metropolis(&mut self, site: usize, beta: f64, rng: &mut Xoshiro256StarStar) {
        let h = self.local_field(site);
        let spins = self.spins.as_mut_slice();
        let delta_e = 2.0 * spins[site] as f64 * h;
        if delta_e <= 0.0 || rng.gen::<f64>() < (-beta * delta_e).exp() {
            spins[site] = -spins[site];
        }
    }

    fn heat_bath(&mut self, site: usize, beta: f64, rng: &mut Xoshiro256StarStar) {
        let h = self.local_field(site);
        let p_up = 1.0 / (1.0 + (-2.0 * beta * h).exp());
        let spins = self.spins.as_mut_slice();
        spins[site] = if rng.gen::<f64>() < p_up { 1 } else { -1 };
    }

    /// Grow and flip one Wolff cluster from a random seed; returns its size.
    ///
    /// Bond activation uses `p = 1 - exp(-2βJ)` with the uniform bond
    /// magnitude, so this is only valid when all bonds share one magnitude.
    fn wolff(&mut self, beta: f64, rng: &mut Xoshiro256StarStar) -> usize {
        let shared = self.shared;
        let n = shared.num_spins;
        let p = 1.0 - (-2.0 * beta * shared.bond(0, 0).abs()).exp();

        let spins = self.spins.as_mut_slice();
        let seed = rng.gen_range(0..n);
        let sigma = spins[seed];

        let mut in_cluster = vec![false; n];
        let mut stack = Vec::with_capacity(n);
        in_cluster[seed] = true;
        stack.push(seed);

        let mut size = 0;
        while let Some(site) = stack.pop() {
            spins[site] = -sigma;
            size += 1;
            for slot in 0..shared.num_neighbors {
                let nb = shared.neighbor(site, slot);
                if !in_cluster[nb] && spins[nb] == sigma && rng.gen::<f64>() < p {
                    in_cluster[nb] = true;
                    stack.push(nb);
                }
            }
        }
        size
    }
}

impl Replica for IsingReplica<'_> {
    type Method = IsingMethod;

    fn init_state(&mut self, rng: &mut Xoshiro256StarStar) {
        for spin in self.spins.as_mut_slice() {
            *spin = (rng.gen_range(0..2i8)) * 2 - 1;
        }
    }

    fn copy_state_from(&mut self, other: &Self) {
        let src = other.spins.as_slice();
        let dst = self.spins.as_mut_slice();
        assert_eq!(dst.len(), src.len(), "replica sizes must match");
        dst.copy_from_slice(src);
        self.family = other.family;
        self.parent = other.parent;
    }

    /// Total energy `E = -Σᵢ Σₙ sᵢ s_n J_n` over even slots only: the table
    /// pairs opposite directions, so stride 2 counts each bond once.
    fn measure_energy(&self) -> f64 {
        let shared = self.shared;
        let spins = self.spins.as_slice();
        let mut energy = 0.0;
        for site in 0..shared.num_spins {
            let s = spins[site] as f64;
            for slot in (0..shared.num_neighbors).step_by(2) {
                energy -= s * spins[shared.neighbor(site, slot)] as f64 * shared.bond(site, slot);
            }
        }
        energy
    }

    fn update_sweep(
        &mut self,
        num_sweeps: usize,
        beta: f64,
        rng: &mut Xoshiro256StarStar,
        method: IsingMethod,
        sequential: bool,
    ) -> Result<()> {
        let n = self.shared.num_spins;
        match method {
            IsingMethod::Metropolis => {
                for _ in 0..num_sweeps {
                    for attempt in 0..n {
                        let site = if sequential {
                            attempt
                        } else {
                            rng.gen_range(0..n)
                        };
                        self.metropolis(site, beta, rng);
                    }
                }
            }
            IsingMethod::HeatBath => {
                for _ in 0..num_sweeps {
                    for attempt in 0..n {
                        let site = if sequential {
                            attempt
                        } else {
                            rng.gen_range(0..n)
                        };
                        self.heat_bath(site, beta, rng);
                    }
                }
            }
            IsingMethod::Wolff => {
                if sequential {
                    return Err(PamcError::InvalidArgument(
                        "wolff update cannot visit sites sequentially".into(),
                    ));
                }
                for _ in 0..num_sweeps {
                    let mut flipped = 0;
                    while flipped < n {
                        flipped += self.wolff(beta, rng);
                    }
                }
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
