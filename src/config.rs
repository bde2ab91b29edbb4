use validator::{Validate, ValidationError};

fn validate_anneal_config(cfg: &AnnealConfig) -> Result<(), ValidationError> {
    if cfg.pop_size < 1 {
        return Err(ValidationError::new("pop_size must be >= 1"));
    }
    if !(cfg.culling_frac > 0.0 && cfg.culling_frac < 1.0) {
        return Err(ValidationError::new("culling_frac must be in (0, 1)"));
    }
    if !(cfg.beta_max > 0.0) {
        return Err(ValidationError::new("beta_max must be > 0"));
    }
    if cfg.sweeps_per_step < 1 {
        return Err(ValidationError::new("sweeps_per_step must be >= 1"));
    }
    Ok(())
}

/// Parameters of one annealing run, validated before the schedule starts.
#[derive(Debug, Validate)]
#[validate(schema(function = "validate_anneal_config"))]
pub struct AnnealConfig {
    /// Nominal population size R_nom.
    pub pop_size: usize,
    /// Target culling fraction ε; sets the β step via Δβ = √(2ε)/σ_E.
    pub culling_frac: f64,
    /// Final inverse temperature.
    pub beta_max: f64,
    /// Update sweeps applied per annealing step.
    pub sweeps_per_step: usize,
    /// Base RNG seed for the population streams.
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AnnealConfig {
        AnnealConfig {
            pop_size: 100,
            culling_frac: 0.1,
            beta_max: 3.0,
            sweeps_per_step: 10,
            seed: 42,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_fail() {
        let mut cfg = base();
        cfg.pop_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.culling_frac = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.culling_frac = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.beta_max = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.sweeps_per_step = 0;
        assert!(cfg.validate().is_err());
    }
}
