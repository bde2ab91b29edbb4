use crate::error::{PamcError, Result};

/// Immutable per-run lattice description, shared by reference across all
/// replicas of a population.
///
/// The neighbor table is a flat array of length `num_spins * num_neighbors`
/// where element `site * num_neighbors + slot` is the neighbor of `site` in
/// direction `slot`. Slots are paired: `2k` and `2k + 1` point in opposite
/// directions, so an energy loop with stride 2 visits each undirected bond
/// exactly once. The bond table has the same layout; entry `(site, slot)` is
/// the coupling on the bond from `site` to that neighbor.
pub struct SharedLatticeData {
    /// Side length of the cubic system (purely descriptive for loaded tables).
    pub side: usize,
    /// Total number of spins.
    pub num_spins: usize,
    /// Neighbor slots per site (coordination number). Always even.
    pub num_neighbors: usize,
    neighbors: Vec<u32>,
    bonds: Vec<f64>,
}

/// Flatten periodic 3-D coordinates to a row-major site index.
///
/// Coordinates may be negative or exceed `side`; they wrap around.
#[inline]
pub fn index3(side: usize, i: isize, j: isize, k: isize) -> usize {
    let l = side as isize;
    let (i, j, k) = (
        i.rem_euclid(l) as usize,
        j.rem_euclid(l) as usize,
        k.rem_euclid(l) as usize,
    );
    (i * side + j) * side + k
}

impl SharedLatticeData {
    /// Build lattice data from externally-supplied tables.
    ///
    /// Fails with [`PamcError::InvalidArgument`] when the slot count is odd
    /// (slots must come in opposite-direction pairs), when either table has
    /// the wrong length, or when a neighbor entry is out of range.
    pub fn new(
        side: usize,
        num_spins: usize,
        num_neighbors: usize,
        neighbors: Vec<u32>,
        bonds: Vec<f64>,
    ) -> Result<Self> {
        if num_neighbors == 0 || num_neighbors % 2 != 0 {
            return Err(PamcError::InvalidArgument(format!(
                "neighbor slot count must be positive and even, got {num_neighbors}"
            )));
        }
        let expected = num_spins * num_neighbors;
        if neighbors.len() != expected {
            return Err(PamcError::InvalidArgument(format!(
                "neighbor table has {} entries, expected {expected}",
                neighbors.len()
            )));
        }
        if bonds.len() != expected {
            return Err(PamcError::InvalidArgument(format!(
                "bond table has {} entries, expected {expected}",
                bonds.len()
            )));
        }
        if let Some((idx, &bad)) = neighbors
            .iter()
            .enumerate()
            .find(|(_, &n)| n as usize >= num_spins)
        {
            return Err(PamcError::InvalidArgument(format!(
                "neighbor entry {bad} at site {} slot {} is out of range [0, {num_spins})",
                idx / num_neighbors,
                idx % num_neighbors,
            )));
        }
        Ok(Self {
            side,
            num_spins,
            num_neighbors,
            neighbors,
            bonds,
        })
    }

    /// Cubic `side³` lattice with periodic boundaries and uniform `coupling`.
    ///
    /// Slot order per site is `{-x, +x, -y, +y, -z, +z}`.
    pub fn cubic(side: usize, coupling: f64) -> Self {
        let num_spins = side * side * side;
        let num_neighbors = 6;
        let mut neighbors = vec![0u32; num_spins * num_neighbors];

        for i in 0..side as isize {
            for j in 0..side as isize {
                for k in 0..side as isize {
                    let site = index3(side, i, j, k);
                    let slots = [
                        index3(side, i - 1, j, k),
                        index3(side, i + 1, j, k),
                        index3(side, i, j - 1, k),
                        index3(side, i, j + 1, k),
                        index3(side, i, j, k - 1),
                        index3(side, i, j, k + 1),
                    ];
                    for (slot, &nb) in slots.iter().enumerate() {
                        neighbors[site * num_neighbors + slot] = nb as u32;
                    }
                }
            }
        }

        Self {
            side,
            num_spins,
            num_neighbors,
            neighbors,
            bonds: vec![coupling; num_spins * num_neighbors],
        }
    }

    /// Neighbor of `site` in direction `slot`.
    #[inline]
    pub fn neighbor(&self, site: usize, slot: usize) -> usize {
        self.neighbors[site * self.num_neighbors + slot] as usize
    }

    /// Coupling on the bond from `site` in direction `slot`.
    #[inline]
    pub fn bond(&self, site: usize, slot: usize) -> f64 {
        self.bonds[site * self.num_neighbors + slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index3_wraps() {
        assert_eq!(index3(5, 0, 0, 0), 0);
        assert_eq!(index3(5, -1, 0, 0), index3(5, 4, 0, 0));
        assert_eq!(index3(5, 5, 0, 0), 0);
        assert_eq!(index3(5, 0, -1, 0), index3(5, 0, 4, 0));
        assert_eq!(index3(5, 1, 2, 3), (1 * 5 + 2) * 5 + 3);
    }

    #[test]
    fn test_cubic_neighbor_slots() {
        // 4x4x4, site (0,0,0): slots {-x,+x,-y,+y,-z,+z}
        let lat = SharedLatticeData::cubic(4, 1.0);
        assert_eq!(lat.num_spins, 64);
        assert_eq!(lat.num_neighbors, 6);

        assert_eq!(lat.neighbor(0, 0), index3(4, 3, 0, 0)); // -x wraps
        assert_eq!(lat.neighbor(0, 1), index3(4, 1, 0, 0));
        assert_eq!(lat.neighbor(0, 2), index3(4, 0, 3, 0)); // -y wraps
        assert_eq!(lat.neighbor(0, 3), index3(4, 0, 1, 0));
        assert_eq!(lat.neighbor(0, 4), index3(4, 0, 0, 3)); // -z wraps
        assert_eq!(lat.neighbor(0, 5), index3(4, 0, 0, 1));
    }

    #[test]
    fn test_cubic_slots_pair_opposite_directions() {
        let lat = SharedLatticeData::cubic(3, 1.0);
        for site in 0..lat.num_spins {
            for pair in 0..3 {
                let fwd = lat.neighbor(site, 2 * pair + 1);
                let bwd = lat.neighbor(site, 2 * pair);
                // Following the paired slot from the neighbor returns home.
                assert_eq!(lat.neighbor(fwd, 2 * pair), site);
                assert_eq!(lat.neighbor(bwd, 2 * pair + 1), site);
            }
        }
    }

    #[test]
    fn test_rejects_odd_slot_count() {
        let err = SharedLatticeData::new(2, 4, 3, vec![0; 12], vec![1.0; 12]);
        assert!(matches!(err, Err(PamcError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_wrong_table_lengths() {
        assert!(SharedLatticeData::new(2, 4, 2, vec![0; 7], vec![1.0; 8]).is_err());
        assert!(SharedLatticeData::new(2, 4, 2, vec![0; 8], vec![1.0; 9]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_neighbor() {
        let mut neighbors = vec![0u32; 8];
        neighbors[5] = 4; // num_spins = 4
        let err = SharedLatticeData::new(2, 4, 2, neighbors, vec![1.0; 8]);
        assert!(matches!(err, Err(PamcError::InvalidArgument(_))));
    }
}
