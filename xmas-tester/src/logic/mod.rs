pub mod data;
pub mod invariants;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod session;
pub mod tester;

pub use data::TesterData;
pub use scenarios::{get_scenario, list_scenarios};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use tester::*;
