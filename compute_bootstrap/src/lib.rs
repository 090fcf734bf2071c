/*!
# Compute Bootstrap

Core traits and types for bootstrapping a GPU compute pipeline.

This crate sequences adapter selection, device creation, compiler-toolchain
bootstrap, shader signing, shader compilation and compute-pipeline creation.
The graphics driver and the shader compiler are consumed through traits;
backend crates (Vulkan + naga) provide the concrete implementations.

## Architecture

- **AdapterSelector**: picks an adapter by index or by capability probe
- **DeviceContext**: owns the logical device, shader model and diagnostic sink
- **CompilerToolchain**: bootstraps the compile, library and validator services
- **ShaderContainer**: container header checks, signing and disassembly
- **ShaderCompiler**: source file to signed binary container
- **PipelineBuilder**: root signature + bytecode to compute pipeline
- **DiagnosticReporter**: drains driver messages when pipeline creation fails
- **Session**: the context object tying the stages together
*/

// Internal modules
mod error;
mod adapter;
mod device_context;
mod diagnostics;
mod pipeline_builder;
mod session;
pub mod log;
pub mod config;
pub mod compiler;
pub mod container;
pub mod device;
pub mod signature;

// Main bootstrap namespace module
pub mod bootstrap {
    // Error types
    pub use crate::error::{Error, ErrorKind, Result};

    // Stages
    pub use crate::adapter::AdapterSelector;
    pub use crate::device_context::DeviceContext;
    pub use crate::diagnostics::DiagnosticReporter;
    pub use crate::pipeline_builder::PipelineBuilder;
    pub use crate::session::{RunReport, Session};

    // Configuration
    pub use crate::config::{Config, DebugMessageFilter, DebugOutput, DebugSeverity};

    // Logging sub-module (types and registry, macros live at the crate root)
    pub mod log {
        pub use crate::log::{reset_logger, set_logger, DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Driver-facing traits and types
    pub mod device {
        pub use crate::device::*;
    }

    // Compiler toolchain traits and types
    pub mod compiler {
        pub use crate::compiler::*;
    }

    // Binary container helpers
    pub mod container {
        pub use crate::container::*;
    }

    // Root signature blob format
    pub mod signature {
        pub use crate::signature::*;
    }
}
