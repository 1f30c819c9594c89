//! Reusable pieces shared by the custody services, such as bringing up the tracing stack.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
