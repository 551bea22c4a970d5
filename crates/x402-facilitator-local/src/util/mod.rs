//! Process plumbing shared by facilitator binaries.

mod sig_down;
mod telemetry;

pub use sig_down::*;
pub use telemetry::*;
