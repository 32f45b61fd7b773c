//! Database enumeration types.

mod run_state;

pub use run_state::RunState;
