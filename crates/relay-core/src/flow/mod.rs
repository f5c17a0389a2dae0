//! Output pacing.

mod regulator;

pub use regulator::FlowRegulator;
