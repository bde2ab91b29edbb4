//! The resampling step: numerically-stable weights, free-energy bookkeeping,
//! stochastic rounding, and the constant-extra-memory in-place reshuffle.

use log::debug;
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;

use super::Population;
use crate::error::{PamcError, Result};
use crate::model::Replica;

/// Copy replica state between two slots of the same population.
fn copy_slot<R: Replica>(replicas: &mut [R], from: usize, to: usize) {
    debug_assert_ne!(from, to);
    if from < to {
        let (head, tail) = replicas.split_at_mut(to);
        tail[0].copy_state_from(&head[from]);
    } else {
        let (head, tail) = replicas.split_at_mut(from);
        head[to].copy_state_from(&tail[0]);
    }
}

impl<R: Replica> Population<R> {
    /// Resample the population to inverse temperature `new_beta`.
    ///
    /// Each replica receives weight `exp(-Δβ·(Eᵢ - ⟨E⟩))`; the ⟨E⟩ shift
    /// keeps the exponentials in range at large Δβ and cancels out of the
    /// free-energy increment. Expected copy counts `τᵢ = R_nom·wᵢ/Q_R` are
    /// rounded stochastically (`E[nᵢ] = τᵢ`) and realized by an in-place
    /// reshuffle, so the live count drifts around the nominal size.
    ///
    /// `rng_override` substitutes a caller-owned stream for the rounding
    /// draws only, leaving the update streams untouched.
    ///
    /// Fails with [`PamcError::CapacityExceeded`] when the drawn counts
    /// exceed the hard population bound.
    pub fn resample(
        &mut self,
        new_beta: f64,
        mut rng_override: Option<&mut Xoshiro256StarStar>,
    ) -> Result<()> {
        let live = self.num_replicas;
        let delta_beta = new_beta - self.beta;
        self.measure_energy(false);

        // Ancestry must survive the copies below: parent is reset to the
        // replica's own index and inherited by every copy made from it.
        for (slot, replica) in self.replicas[..live].iter_mut().enumerate() {
            replica.set_parent(slot);
        }

        self.weight.resize(live, 0.0);
        let mut q_r = 0.0;
        for (weight, &energy) in self.weight.iter_mut().zip(&self.energy[..live]) {
            *weight = (-delta_beta * (energy - self.avg_energy)).exp();
            q_r += *weight;
        }

        // The Δβ⟨E⟩ term undoes the energy shift, so the accumulated value
        // is the physical Δβ·F.
        self.delta_beta_f -= (q_r / live as f64).ln() + delta_beta * self.avg_energy;

        self.copy_count.resize(live, 0);
        let rounding_rng = match rng_override.as_deref_mut() {
            Some(rng) => rng,
            None => &mut self.resample_rng,
        };
        let mut total = 0usize;
        for i in 0..live {
            let tau = self.nominal_size as f64 * self.weight[i] / q_r;
            self.weight[i] = tau;
            let floor = tau.floor();
            let count = floor as u32 + u32::from(rounding_rng.gen::<f64>() < tau - floor);
            self.copy_count[i] = count;
            total += count as usize;
        }

        if total > self.max_size {
            return Err(PamcError::CapacityExceeded {
                requested: total,
                max: self.max_size,
            });
        }
        debug!(
            "resample: beta {:.6} -> {new_beta:.6}, R {live} -> {total}",
            self.beta
        );

        self.reshuffle(total);
        self.num_replicas = total;
        self.beta = new_beta;
        self.energies_current = false;
        Ok(())
    }

    /// Realize the drawn copy counts in place: afterwards every slot in
    /// `[0, r_new)` holds exactly one surviving state. Operates on a scratch
    /// copy of the counts so [`Population::copy_counts`] stays readable.
    fn reshuffle(&mut self, r_new: usize) {
        let r_old = self.num_replicas;
        let bound = r_old.max(r_new);
        self.scratch_count.clear();
        self.scratch_count
            .extend_from_slice(&self.copy_count[..r_old]);
        self.scratch_count.resize(bound, 0);

        // Forward pass: advance a hole cursor (count 0) and a donor cursor
        // (count >= 2) in lockstep, copying donor surplus into holes. When
        // the population grows, the slots past the old live region are
        // additional holes.
        let mut to = 0;
        let mut from = 0;
        loop {
            while to < bound && self.scratch_count[to] != 0 {
                to += 1;
            }
            while from < bound && self.scratch_count[from] < 2 {
                from += 1;
            }
            if to >= bound || from >= bound {
                break;
            }
            copy_slot(&mut self.replicas, from, to);
            self.scratch_count[to] = 1;
            self.scratch_count[from] -= 1;
        }

        // Shrink: the surplus ran out before the holes did. Backfill the
        // remaining holes from surviving tail slots, leaving the live region
        // contiguous at the bottom.
        if r_new < r_old {
            let mut to = 0;
            let mut from = r_old - 1;
            loop {
                while to < from && self.scratch_count[to] != 0 {
                    to += 1;
                }
                while from > to && self.scratch_count[from] == 0 {
                    from -= 1;
                }
                if to >= from {
                    break;
                }
                copy_slot(&mut self.replicas, from, to);
                self.scratch_count[to] = 1;
                self.scratch_count[from] -= 1;
            }
        }

        assert!(
            self.scratch_count[..r_new].iter().all(|&count| count == 1),
            "resample copy counts were not conserved"
        );
    }
}
