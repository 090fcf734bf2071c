//! Error types for the compute bootstrap pipeline
//!
//! Every stage of the bootstrap fails fast with its own variant. Backends
//! report `BackendError` and the stage that called them re-categorizes the
//! failure, so the variant always names the operation that failed.

use std::fmt;

/// Result type for bootstrap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Bootstrap errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Explicit adapter index is past the end of the enumeration
    AdapterNotFound(u32),

    /// Auto-selection found no hardware adapter passing the capability probe
    NoCapableAdapterFound,

    /// The driver rejected the adapter at device creation
    DeviceCreationFailed(String),

    /// Experimental shader models could not be enabled (host OS/driver too old)
    ExperimentalFeatureUnsupported(String),

    /// The compiler runtime could not be loaded
    CompilerLoadFailed(String),

    /// The compile service could not be instantiated
    CompileServiceUnavailable(String),

    /// The blob/library service could not be instantiated
    LibraryServiceUnavailable(String),

    /// The validator service could not be instantiated
    ValidatorServiceUnavailable(String),

    /// A shader source or binary file could not be read
    SourceLoadFailed(String),

    /// The compile service call itself could not be dispatched
    CompileInvocationFailed(String),

    /// Compilation ran and reported errors (full diagnostic text)
    CompileError(String),

    /// The validator reported a non-success status
    ValidationFailed(String),

    /// Disassembly failed (non-fatal, logged only)
    DisassemblyFailed(String),

    /// The device rejected the root signature blob
    RootSignatureCreationFailed(String),

    /// The device rejected the compute pipeline
    PipelineCreationFailed {
        /// Failure reported by the device call
        reason: String,
        /// Messages drained from the diagnostic sink (queue order)
        diagnostics: Vec<String>,
    },

    /// Backend-specific error (Vulkan, naga, etc.)
    BackendError(String),

    /// Configuration is incomplete or contradictory
    InvalidConfig(String),
}

/// Error category, one per variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AdapterNotFound,
    NoCapableAdapterFound,
    DeviceCreationFailed,
    ExperimentalFeatureUnsupported,
    CompilerLoadFailed,
    CompileServiceUnavailable,
    LibraryServiceUnavailable,
    ValidatorServiceUnavailable,
    SourceLoadFailed,
    CompileInvocationFailed,
    CompileError,
    ValidationFailed,
    DisassemblyFailed,
    RootSignatureCreationFailed,
    PipelineCreationFailed,
    BackendError,
    InvalidConfig,
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AdapterNotFound(_) => ErrorKind::AdapterNotFound,
            Error::NoCapableAdapterFound => ErrorKind::NoCapableAdapterFound,
            Error::DeviceCreationFailed(_) => ErrorKind::DeviceCreationFailed,
            Error::ExperimentalFeatureUnsupported(_) => ErrorKind::ExperimentalFeatureUnsupported,
            Error::CompilerLoadFailed(_) => ErrorKind::CompilerLoadFailed,
            Error::CompileServiceUnavailable(_) => ErrorKind::CompileServiceUnavailable,
            Error::LibraryServiceUnavailable(_) => ErrorKind::LibraryServiceUnavailable,
            Error::ValidatorServiceUnavailable(_) => ErrorKind::ValidatorServiceUnavailable,
            Error::SourceLoadFailed(_) => ErrorKind::SourceLoadFailed,
            Error::CompileInvocationFailed(_) => ErrorKind::CompileInvocationFailed,
            Error::CompileError(_) => ErrorKind::CompileError,
            Error::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Error::DisassemblyFailed(_) => ErrorKind::DisassemblyFailed,
            Error::RootSignatureCreationFailed(_) => ErrorKind::RootSignatureCreationFailed,
            Error::PipelineCreationFailed { .. } => ErrorKind::PipelineCreationFailed,
            Error::BackendError(_) => ErrorKind::BackendError,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// Whether this error aborts the bootstrap sequence
    ///
    /// Only disassembly degrades gracefully; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::DisassemblyFailed(_))
    }

    /// Process exit code for this error (never zero)
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::BackendError => 2,
            ErrorKind::InvalidConfig => 4,
            ErrorKind::AdapterNotFound => 10,
            ErrorKind::NoCapableAdapterFound => 11,
            ErrorKind::DeviceCreationFailed => 12,
            ErrorKind::ExperimentalFeatureUnsupported => 13,
            ErrorKind::CompilerLoadFailed => 20,
            ErrorKind::CompileServiceUnavailable => 21,
            ErrorKind::LibraryServiceUnavailable => 22,
            ErrorKind::ValidatorServiceUnavailable => 23,
            ErrorKind::SourceLoadFailed => 30,
            ErrorKind::CompileInvocationFailed => 31,
            ErrorKind::CompileError => 32,
            ErrorKind::ValidationFailed => 40,
            ErrorKind::DisassemblyFailed => 41,
            ErrorKind::RootSignatureCreationFailed => 50,
            ErrorKind::PipelineCreationFailed => 51,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AdapterNotFound(index) => {
                write!(f, "Adapter not found: invalid adapter index {}", index)
            }
            Error::NoCapableAdapterFound => write!(f, "No capable adapter found"),
            Error::DeviceCreationFailed(msg) => write!(f, "Device creation failed: {}", msg),
            Error::ExperimentalFeatureUnsupported(msg) => write!(
                f,
                "Experimental shader models unsupported (host OS/driver too old): {}",
                msg
            ),
            Error::CompilerLoadFailed(msg) => write!(f, "Compiler load failed: {}", msg),
            Error::CompileServiceUnavailable(msg) => {
                write!(f, "Compile service unavailable: {}", msg)
            }
            Error::LibraryServiceUnavailable(msg) => {
                write!(f, "Library service unavailable: {}", msg)
            }
            Error::ValidatorServiceUnavailable(msg) => {
                write!(f, "Validator service unavailable: {}", msg)
            }
            Error::SourceLoadFailed(msg) => write!(f, "Source load failed: {}", msg),
            Error::CompileInvocationFailed(msg) => {
                write!(f, "Compile invocation failed: {}", msg)
            }
            Error::CompileError(diagnostics) => write!(f, "Compile error:\n{}", diagnostics),
            Error::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            Error::DisassemblyFailed(msg) => write!(f, "Disassembly failed: {}", msg),
            Error::RootSignatureCreationFailed(msg) => {
                write!(f, "Root signature creation failed: {}", msg)
            }
            Error::PipelineCreationFailed { reason, diagnostics } => {
                write!(f, "Pipeline creation failed: {}", reason)?;
                for (index, message) in diagnostics.iter().enumerate() {
                    write!(f, "\n [{}] -- {}", index, message)?;
                }
                Ok(())
            }
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
