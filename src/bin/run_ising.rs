//! Population annealing driver for the 3-D Ising ferromagnet.
//!
//! Prints one line per annealing step:
//! `step β ⟨E⟩/N ⟨M⟩ binder ρ_t ρ_s`

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

/// Population annealing for the 3-D Ising ferromagnet.
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
    /// Optional neighbor-table file (defaults to the built-in cubic table).
    #[arg(requires = "bond_path")]
    neighbor_path: Option<PathBuf>,
    /// Optional bond-table file (defaults to uniform J = 1).
    #[arg(requires = "neighbor_path")]
    bond_path: Option<PathBuf>,
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
    let shared = match (&cli.neighbor_path, &cli.bond_path) {
        (Some(neighbor_path), Some(bond_path)) => {
            let neighbors = load_neighbor_table(neighbor_path, num_spins, NUM_NEIGHBORS)?;
            let bonds = load_bond_table(bond_path, num_spins, NUM_NEIGHBORS)?;
            SharedLatticeData::new(cli.side, num_spins, NUM_NEIGHBORS, neighbors, bonds)?
        }
        _ => SharedLatticeData::cubic(cli.side, 1.0),
    };
    info!("annealing {num_spins} spins, R_nom {}", config.pop_size);

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
        let energy_per_spin = population.measure_energy(false) / num_spins as f64;

        let mut m_sum = 0.0;
        let mut m2_sum = 0.0;
        let mut m4_sum = 0.0;
        for replica in population.replicas() {
            let m = replica.measure_magnetization();
            m_sum += m;
            m2_sum += m * m;
            m4_sum += m * m * m * m;
        }
        let r = population.len() as f64;
        let m_avg = m_sum / r;
        let m2_avg = m2_sum / r;
        let m4_avg = m4_sum / r;
        let binder = 1.0 - m4_avg / (3.0 * m2_avg * m2_avg);

        let stats = population.compute_genealogy_statistics();
        println!(
            "{step} {beta:.15} {energy_per_spin:.15} {m_avg:.15} {binder:.15} {:.15} {:.15}",
            stats.rho_t, stats.rho_s
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
