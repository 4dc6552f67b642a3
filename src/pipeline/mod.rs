//! Three-pass negotiation protocol, its runner, and execution resources.

pub(crate) mod context;
pub(crate) mod progress;
pub(crate) mod runner;
pub(crate) mod stage;
