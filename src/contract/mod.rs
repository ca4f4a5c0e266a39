//! Contract terms and the withdrawal schedules the operator queries
//!
//! A schedule answers two questions for any (t, S, W): how much may be
//! withdrawn this period without penalty (Gdt), and what fraction of any
//! excess is charged (kappa).

mod schedule;
mod terms;

pub use schedule::{ConstantSchedule, ContractSchedule, Schedule, SurrenderSchedule};
pub use terms::ContractTerms;
