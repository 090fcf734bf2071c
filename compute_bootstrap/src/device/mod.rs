/// Device module - driver-facing traits and types

// Module declarations
pub mod driver;
pub mod diagnostic;
pub mod pipeline;

// Re-export everything from driver.rs
pub use driver::*;

// Re-export from other modules
pub use diagnostic::*;
pub use pipeline::*;

// Mock driver for tests (no GPU required)
#[cfg(test)]
pub mod mock_driver;
