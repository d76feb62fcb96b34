pub mod bridge;

// Shared between the CLI binaries and the integration tests
pub mod format;
pub mod tmux;

pub use bridge::Bridge;
