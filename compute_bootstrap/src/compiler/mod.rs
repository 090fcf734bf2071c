/// Compiler module - toolchain services, blobs and the shader compiler

// Module declarations
pub mod blob;
pub mod profile;
pub mod toolchain;
pub mod include;
pub mod shader_compiler;

// Re-export everything
pub use blob::*;
pub use profile::*;
pub use toolchain::*;
pub use include::*;
pub use shader_compiler::*;

// Mock toolchain for tests (no compiler required)
#[cfg(test)]
pub mod mock_toolchain;
