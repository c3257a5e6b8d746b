//! Simulation context: the ownership root for one hart's model state.

mod context;

pub use context::SimContext;
