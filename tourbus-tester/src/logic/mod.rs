pub mod driver;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use driver::{RunSummary, SessionDriver, SessionPlan};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
