//! Economic terms of a GMWB contract

use serde::{Deserialize, Serialize};

use crate::error::{GmwbError, Result};

/// Market and contract parameters for a GMWB valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    /// Contract maturity in years
    #[serde(default = "default_maturity")]
    pub maturity: f64,

    /// Risk-free rate (continuously compounded)
    #[serde(default = "default_rate")]
    pub rate: f64,

    /// Volatility of the underlying investment
    #[serde(default = "default_volatility")]
    pub volatility: f64,

    /// Proportional hedging fee deducted from the investment account
    #[serde(default)]
    pub hedging_fee: f64,

    /// Contractual withdrawal rate per year (G)
    #[serde(default = "default_contract_rate")]
    pub contract_rate: f64,

    /// Surrender penalty on excess withdrawals (kappa)
    #[serde(default = "default_penalty_rate")]
    pub penalty_rate: f64,

    /// Optional year-by-year penalty schedule replacing the flat kappa
    #[serde(default)]
    pub surrender_charges: Option<Vec<f64>>,
}

fn default_maturity() -> f64 {
    10.0
}

fn default_rate() -> f64 {
    0.05
}

fn default_volatility() -> f64 {
    0.20
}

fn default_contract_rate() -> f64 {
    10.0
}

fn default_penalty_rate() -> f64 {
    0.1
}

impl Default for ContractTerms {
    fn default() -> Self {
        Self {
            maturity: default_maturity(),
            rate: default_rate(),
            volatility: default_volatility(),
            hedging_fee: 0.0,
            contract_rate: default_contract_rate(),
            penalty_rate: default_penalty_rate(),
            surrender_charges: None,
        }
    }
}

impl ContractTerms {
    /// Penalty-free withdrawal allowance accrued over one timestep (G dt)
    pub fn allowance_per_step(&self, dt: f64) -> f64 {
        self.contract_rate * dt
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.maturity > 0.0) {
            return Err(GmwbError::InvalidConfig(format!(
                "maturity must be positive, got {}",
                self.maturity
            )));
        }
        if !(self.volatility >= 0.0) || !(self.hedging_fee >= 0.0) {
            return Err(GmwbError::InvalidConfig(
                "volatility and hedging fee must be non-negative".to_string(),
            ));
        }
        if !(self.contract_rate >= 0.0) {
            return Err(GmwbError::InvalidConfig(
                "contract rate must be non-negative".to_string(),
            ));
        }
        let rates = std::iter::once(self.penalty_rate)
            .chain(self.surrender_charges.iter().flatten().copied());
        for kappa in rates {
            if !(0.0..=1.0).contains(&kappa) {
                return Err(GmwbError::InvalidConfig(format!(
                    "penalty rate {kappa} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_contract() {
        let terms = ContractTerms::default();
        assert_eq!(terms.maturity, 10.0);
        assert_eq!(terms.contract_rate, 10.0);
        assert_eq!(terms.penalty_rate, 0.1);
        // 100 steps over 10 years
        assert!((terms.allowance_per_step(0.1) - 1.0).abs() < 1e-12);
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let terms: ContractTerms = serde_json::from_str(r#"{"volatility": 0.3}"#).unwrap();
        assert_eq!(terms.volatility, 0.3);
        assert_eq!(terms.rate, 0.05);
        assert!(terms.surrender_charges.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_penalty() {
        let terms = ContractTerms {
            surrender_charges: Some(vec![0.05, 1.5]),
            ..Default::default()
        };
        assert!(terms.validate().is_err());
    }
}
