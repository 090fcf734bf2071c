/// Compiler toolchain - service traits and bootstrap

use std::path::{Path, PathBuf};

use bitflags::bitflags;

use crate::compiler::{Define, MutableBlob, ShaderBlob, TargetProfile};
use crate::error::{Error, Result};
use crate::{boot_debug, boot_err, boot_info};

// ============================================================================
// Operation results
// ============================================================================

/// Status of a compile or validate operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Success,
    Failure,
}

/// Outcome of a dispatched compile/validate operation
///
/// A successful operation carries a result buffer; a failed one carries an
/// error buffer. Callers branch on `status` before touching either.
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub status: OperationStatus,
    pub result: Option<ShaderBlob>,
    pub errors: Option<ShaderBlob>,
}

impl OperationResult {
    pub fn success(result: Option<ShaderBlob>) -> Self {
        Self {
            status: OperationStatus::Success,
            result,
            errors: None,
        }
    }

    pub fn failure(errors: ShaderBlob) -> Self {
        Self {
            status: OperationStatus::Failure,
            result: None,
            errors: Some(errors),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == OperationStatus::Success
    }

    /// Error buffer decoded as text (empty when absent)
    pub fn error_text(&self) -> String {
        self.errors.as_ref().map(ShaderBlob::to_text).unwrap_or_default()
    }
}

bitflags! {
    /// Validator modes
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValidatorFlags: u32 {
        /// Write the digest into the blob on success
        const IN_PLACE_EDIT = 1 << 0;
    }
}

/// Arguments of one compile call
pub struct CompileInvocation<'a> {
    /// Source text
    pub source: &'a ShaderBlob,
    /// Name used in diagnostics and as the include base
    pub source_name: &'a Path,
    /// Entry-point symbol
    pub entry_point: &'a str,
    /// Target stage and version
    pub profile: TargetProfile,
    /// Compiler flags
    pub arguments: &'a [String],
    /// Macro definitions
    pub defines: &'a [Define],
}

/// Source returned by an include handler
#[derive(Debug, Clone)]
pub struct IncludedSource {
    /// Resolved path
    pub path: PathBuf,
    /// File contents
    pub blob: ShaderBlob,
}

// ============================================================================
// Service traits
// ============================================================================

/// Resolves `#include` directives
///
/// Handlers carry per-compile state and are never shared between compiles.
pub trait IncludeHandler {
    /// Load `requested`, included from the file at `includer`
    fn load_source(&mut self, requested: &str, includer: &Path) -> Result<IncludedSource>;
}

/// Compile service
pub trait CompileService {
    /// Compile source into a binary container
    ///
    /// # Returns
    ///
    /// `Err` only when the call cannot be dispatched; compile errors come back
    /// as an `OperationResult` with a failure status.
    fn compile(
        &self,
        invocation: &CompileInvocation<'_>,
        include_handler: &mut dyn IncludeHandler,
    ) -> Result<OperationResult>;

    /// Human-readable text form of a binary container
    fn disassemble(&self, blob: &ShaderBlob) -> Result<ShaderBlob>;
}

/// Blob/library service
pub trait LibraryService {
    /// Load a file with encoding detection
    fn create_blob_from_file(&self, path: &Path) -> Result<ShaderBlob>;

    /// Fresh include handler using the default search rules
    fn create_include_handler(&self) -> Result<Box<dyn IncludeHandler>>;
}

/// Validator service
pub trait ValidatorService {
    /// Validate a container, signing it in place with `IN_PLACE_EDIT`
    fn validate(&self, blob: &mut MutableBlob, flags: ValidatorFlags) -> Result<OperationResult>;
}

/// Compiler runtime (the loadable part of a toolchain)
pub trait CompilerRuntime {
    /// Load the runtime
    fn initialize(&mut self) -> Result<()>;

    fn create_compiler(&self) -> Result<Box<dyn CompileService>>;

    fn create_library(&self) -> Result<Box<dyn LibraryService>>;

    fn create_validator(&self) -> Result<Box<dyn ValidatorService>>;
}

// ============================================================================
// Bootstrap
// ============================================================================

/// The three services every compile/validate/disassemble step uses
///
/// Only `CompilerToolchain::bootstrap` builds this, so holding one means the
/// toolchain is fully initialized.
pub struct CompilerHandles {
    compiler: Box<dyn CompileService>,
    library: Box<dyn LibraryService>,
    validator: Box<dyn ValidatorService>,
}

impl CompilerHandles {
    pub fn compiler(&self) -> &dyn CompileService {
        self.compiler.as_ref()
    }

    pub fn library(&self) -> &dyn LibraryService {
        self.library.as_ref()
    }

    pub fn validator(&self) -> &dyn ValidatorService {
        self.validator.as_ref()
    }
}

/// Toolchain bootstrap
pub struct CompilerToolchain;

impl CompilerToolchain {
    /// Load the runtime and instantiate all three services
    ///
    /// # Errors
    ///
    /// `CompilerLoadFailed`, `CompileServiceUnavailable`,
    /// `LibraryServiceUnavailable` or `ValidatorServiceUnavailable` for the
    /// first step that fails. No handles survive a partial bootstrap.
    pub fn bootstrap(runtime: &mut dyn CompilerRuntime) -> Result<CompilerHandles> {
        const SOURCE: &str = "bootstrap::CompilerToolchain";

        runtime
            .initialize()
            .map_err(|e| boot_err!(SOURCE, Error::CompilerLoadFailed(e.to_string())))?;
        boot_debug!(SOURCE, "Compiler runtime loaded");

        let compiler = runtime
            .create_compiler()
            .map_err(|e| boot_err!(SOURCE, Error::CompileServiceUnavailable(e.to_string())))?;

        let library = runtime
            .create_library()
            .map_err(|e| boot_err!(SOURCE, Error::LibraryServiceUnavailable(e.to_string())))?;

        let validator = runtime
            .create_validator()
            .map_err(|e| boot_err!(SOURCE, Error::ValidatorServiceUnavailable(e.to_string())))?;

        boot_info!(SOURCE, "Compiler toolchain ready (compiler, library, validator)");

        Ok(CompilerHandles {
            compiler,
            library,
            validator,
        })
    }
}

#[cfg(test)]
#[path = "toolchain_tests.rs"]
mod tests;
