//! Family statistics that quantify how much resampling has narrowed the
//! ancestry of the population.

/// Snapshot of family concentration over the live replicas.
///
/// Both ρ statistics are normalized by the nominal population size; values
/// grow as resampling concentrates the population into fewer families.
#[derive(Debug, Clone, Copy)]
pub struct GenealogyStats {
    /// Second moment of family sizes: `Σ_f n_f² / R_nom`. Larger values mean
    /// more bottlenecking.
    pub rho_t: f64,
    /// `R_nom / exp(H)` with `H` the Shannon entropy of family fractions
    /// `n_f / R_nom` (empty families contribute nothing).
    pub rho_s: f64,
    /// Number of founding families with at least one live descendant.
    pub num_unique_families: usize,
    /// Size of the largest surviving family.
    pub max_family_size: usize,
}
