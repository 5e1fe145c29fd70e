//! Budget ablation: TPR@1%FPR as a function of the attack budget (eta).
//!
//! The curve saturates exponentially from `base_tpr` toward `max_tpr`:
//! `tpr = base + (max - base) * (1 - exp(-rate * eta))`, then Gaussian noise
//! is added and the result clamped into [0, 1].

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid ablation parameters.
#[derive(Debug, Error, PartialEq)]
pub enum AblationError {
    #[error("ablation noise_std must be finite and non-negative, got {0}")]
    InvalidNoise(f64),
    #[error("ablation {name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
}

/// Parameters of the ablation curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AblationConfig {
    pub base_tpr: f64,
    pub max_tpr: f64,
    pub rate: f64,
    /// Standard deviation of the additive noise (0 disables it).
    pub noise_std: f64,
}

impl Default for AblationConfig {
    fn default() -> Self {
        Self {
            base_tpr: 0.08,
            max_tpr: 0.20,
            rate: 2.0,
            noise_std: 0.01,
        }
    }
}

/// One row of the ablation table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AblationPoint {
    pub budget: f64,
    pub tpr_1: f64,
}

impl AblationConfig {
    pub fn validate(&self) -> Result<(), AblationError> {
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(AblationError::InvalidNoise(self.noise_std));
        }
        for (name, value) in [
            ("base_tpr", self.base_tpr),
            ("max_tpr", self.max_tpr),
            ("rate", self.rate),
        ] {
            if !value.is_finite() {
                return Err(AblationError::NonFinite { name, value });
            }
        }
        Ok(())
    }

    /// Noiseless TPR at `budget`.
    pub fn expected_tpr(&self, budget: f64) -> f64 {
        self.base_tpr + (self.max_tpr - self.base_tpr) * (1.0 - (-self.rate * budget).exp())
    }

    /// One noisy ablation row per budget, drawn in budget order.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        budgets: &[f64],
        rng: &mut R,
    ) -> Result<Vec<AblationPoint>, AblationError> {
        self.validate()?;
        let noise = Normal::new(0.0, self.noise_std)
            .map_err(|_| AblationError::InvalidNoise(self.noise_std))?;
        Ok(budgets
            .iter()
            .map(|&budget| AblationPoint {
                budget,
                tpr_1: (self.expected_tpr(budget) + noise.sample(rng)).clamp(0.0, 1.0),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn expected_curve_starts_at_base_and_increases() {
        let config = AblationConfig::default();
        assert!((config.expected_tpr(0.0) - 0.08).abs() < 1e-12);
        let budgets = [0.05, 0.1, 0.2, 0.4, 0.8];
        for w in budgets.windows(2) {
            assert!(config.expected_tpr(w[0]) < config.expected_tpr(w[1]));
        }
        assert!(config.expected_tpr(100.0) <= 0.20 + 1e-12);
    }

    #[test]
    fn noiseless_sample_matches_expected_curve() {
        let config = AblationConfig {
            noise_std: 0.0,
            ..AblationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let rows = config.sample(&[0.1, 0.5], &mut rng).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].budget, 0.1);
        assert!((rows[0].tpr_1 - config.expected_tpr(0.1)).abs() < 1e-12);
        assert!((rows[1].tpr_1 - config.expected_tpr(0.5)).abs() < 1e-12);
    }

    #[test]
    fn noisy_rows_stay_in_unit_interval() {
        let config = AblationConfig {
            base_tpr: 0.0,
            max_tpr: 1.0,
            noise_std: 0.5,
            ..AblationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let budgets: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        for row in config.sample(&budgets, &mut rng).unwrap() {
            assert!((0.0..=1.0).contains(&row.tpr_1));
        }
    }

    #[test]
    fn negative_noise_rejected() {
        let config = AblationConfig {
            noise_std: -0.1,
            ..AblationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(
            config.sample(&[0.1], &mut rng),
            Err(AblationError::InvalidNoise(-0.1))
        );
    }

    #[test]
    fn non_finite_parameter_is_named() {
        let config = AblationConfig {
            rate: f64::INFINITY,
            ..AblationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            AblationError::NonFinite {
                name: "rate",
                value: f64::INFINITY
            }
        );
        assert!(err.to_string().contains("rate"));
    }
}
