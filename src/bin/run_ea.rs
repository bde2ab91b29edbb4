//! Population annealing driver for the 3-D Edwards-Anderson spin glass.
//!
//! Neighbor and bond tables are supplied externally (one disorder
//! realization per bond file). Prints one line per annealing step:
//! `step β ⟨E⟩ min_E ρ_t num_families`

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::info;
use validator::Validate;

use pamc::{
    load_bond_table, load_neighbor_table, AnnealConfig, IsingMethod, IsingReplica, PamcError,
    Population, SharedLatticeData,
};

const NUM_NEIGHBORS: usize = 6;
const SWEEPS_PER_STEP: usize = 10;

/// Population annealing for the 3-D Edwards-Anderson spin glass.
#[derive(Parser)]
struct Cli {
    /// Cubic lattice side length L (N = L³ spins).
    side: usize,
    /// Nominal population size.
    pop_size: usize,
    /// Target culling fraction per annealing step.
    culling_frac: f64,
    /// Final inverse temperature.
    beta_max: f64,
    /// RNG seed.
    seed: u64,
    /// Neighbor-table file (N rows of Z site indices).
    neighbor_path: PathBuf,
    /// Bond-table file (N rows of Z couplings).
    bond_path: PathBuf,
}

fn main() {
    env_logger::init();
    let cli = Cli::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        process::exit(1);
    });
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> pamc::Result<()> {
    let config = AnnealConfig {
        pop_size: cli.pop_size,
        culling_frac: cli.culling_frac,
        beta_max: cli.beta_max,
        sweeps_per_step: SWEEPS_PER_STEP,
        seed: cli.seed,
    };
    config
        .validate()
        .map_err(|err| PamcError::InvalidArgument(err.to_string()))?;

    let num_spins = cli.side.pow(3);
    let neighbors = load_neighbor_table(&cli.neighbor_path, num_spins, NUM_NEIGHBORS)?;
    let bonds = load_bond_table(&cli.bond_path, num_spins, NUM_NEIGHBORS)?;
    let shared = SharedLatticeData::new(cli.side, num_spins, NUM_NEIGHBORS, neighbors, bonds)?;
    info!(
        "annealing {num_spins} spins from {}, R_nom {}",
        cli.bond_path.display(),
        config.pop_size
    );

    let mut population =
        Population::new(config.pop_size, config.seed, |_| IsingReplica::new(&shared))?;

    let mut beta = 0.0;
    let mut step = 0usize;
    loop {
        population.equilibrate(
            config.sweeps_per_step,
            beta,
            IsingMethod::Metropolis,
            true,
        )?;
        let avg_energy = population.measure_energy(false);
        let min_energy = population.min_energy();
        let stats = population.compute_genealogy_statistics();

        println!(
            "{step} {beta:.15} {avg_energy:.15} {min_energy:.15} {:.15} {}",
            stats.rho_t, stats.num_unique_families
        );

        if beta >= config.beta_max {
            break;
        }
        beta = population
            .suggest_next_beta(config.culling_frac)
            .min(config.beta_max);
        population.resample(beta, None)?;
        step += 1;
    }
    Ok(())
}
