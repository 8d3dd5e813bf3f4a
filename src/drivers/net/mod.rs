//! Network device abstractions

pub mod netdev;

#[cfg(test)]
pub(crate) mod queue;

// Re-export LinkDevice trait for convenience
pub use netdev::*;
