//! Withdrawal allowance and surrender penalty schedules

use serde::{Deserialize, Serialize};

/// Per-period contractual allowance and surrender penalty as functions of
/// (time, investment, guarantee base)
pub trait ContractSchedule {
    /// Amount that may be withdrawn this period without penalty (Gdt)
    fn contract_rate(&self, t: f64, s: f64, w: f64) -> f64;

    /// Fraction of a withdrawal in excess of the allowance that is charged
    fn penalty_rate(&self, t: f64, s: f64, w: f64) -> f64;
}

/// Time- and state-independent allowance and penalty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantSchedule {
    pub contract_rate: f64,
    pub penalty_rate: f64,
}

impl ConstantSchedule {
    pub fn new(contract_rate: f64, penalty_rate: f64) -> Self {
        Self {
            contract_rate,
            penalty_rate,
        }
    }
}

impl ContractSchedule for ConstantSchedule {
    fn contract_rate(&self, _t: f64, _s: f64, _w: f64) -> f64 {
        self.contract_rate
    }

    fn penalty_rate(&self, _t: f64, _s: f64, _w: f64) -> f64 {
        self.penalty_rate
    }
}

/// Surrender penalty that steps down by contract year, with a constant
/// per-period allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurrenderSchedule {
    /// Allowance per period (Gdt)
    pub contract_rate: f64,
    /// Penalty rates by contract year (index 0 = year 1); zero afterwards
    charges: Vec<f64>,
    /// Length of a contract year in model time units
    year_length: f64,
}

impl SurrenderSchedule {
    pub fn new(contract_rate: f64, charges: Vec<f64>) -> Self {
        Self {
            contract_rate,
            charges,
            year_length: 1.0,
        }
    }

    /// Default 7-year declining schedule
    pub fn default_7_year(contract_rate: f64) -> Self {
        Self::new(contract_rate, vec![0.07, 0.06, 0.05, 0.04, 0.03, 0.02, 0.01])
    }

    pub fn with_year_length(mut self, year_length: f64) -> Self {
        self.year_length = year_length;
        self
    }

    /// Contract year (1-indexed) containing time `t`
    pub fn contract_year(&self, t: f64) -> u32 {
        (t.max(0.0) / self.year_length).floor() as u32 + 1
    }

    /// Penalty rate for a contract year (1-indexed)
    pub fn get_rate(&self, contract_year: u32) -> f64 {
        let idx = (contract_year as usize).saturating_sub(1);
        self.charges.get(idx).copied().unwrap_or(0.0)
    }

    /// Number of years with a penalty
    pub fn penalty_period_years(&self) -> u32 {
        self.charges.len() as u32
    }
}

impl ContractSchedule for SurrenderSchedule {
    fn contract_rate(&self, _t: f64, _s: f64, _w: f64) -> f64 {
        self.contract_rate
    }

    fn penalty_rate(&self, t: f64, _s: f64, _w: f64) -> f64 {
        self.get_rate(self.contract_year(t))
    }
}

/// Either schedule, chosen at configuration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Schedule {
    Constant(ConstantSchedule),
    Surrender(SurrenderSchedule),
}

impl ContractSchedule for Schedule {
    fn contract_rate(&self, t: f64, s: f64, w: f64) -> f64 {
        match self {
            Schedule::Constant(c) => c.contract_rate(t, s, w),
            Schedule::Surrender(c) => c.contract_rate(t, s, w),
        }
    }

    fn penalty_rate(&self, t: f64, s: f64, w: f64) -> f64 {
        match self {
            Schedule::Constant(c) => c.penalty_rate(t, s, w),
            Schedule::Surrender(c) => c.penalty_rate(t, s, w),
        }
    }
}
