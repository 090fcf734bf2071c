//! Compiler runtime backed by naga
//!
//! Compiles WGSL to SPIR-V wrapped in a shader container, validates and
//! signs containers, and disassembles them back to WGSL. Target profiles
//! name the SPIR-V version (`cs_1_3` is a compute shader for SPIR-V 1.3).

use compute_bootstrap::bootstrap::compiler::{
    CompileInvocation, CompileService, CompilerRuntime, IncludeHandler, LibraryService, MutableBlob,
    OperationResult, SearchPathIncludeHandler, ShaderBlob, ShaderStage, TargetProfile, ValidatorFlags,
    ValidatorService,
};
use compute_bootstrap::bootstrap::container;
use compute_bootstrap::bootstrap::{Error, Result};
use compute_bootstrap::{boot_debug, boot_info, boot_trace};
use naga::back::spv;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::fs;
use std::path::{Path, PathBuf};

use crate::preprocessor::Preprocessor;

const SOURCE: &str = "bootstrap::naga";

/// Failed operation carrying `text` as its error buffer
fn failure(text: impl AsRef<str>) -> OperationResult {
    OperationResult::failure(ShaderBlob::from_text(text.as_ref()))
}

// ============================================================================
// Compile options
// ============================================================================

/// Compiler flags understood by the naga compile service
///
/// Flags may start with `-` or `/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// `-O0`..`-O3` (`-Od` is `-O0`)
    ///
    /// naga has no optimizer passes: the level is accepted so existing
    /// flag sets keep parsing, and is only logged. Output is identical at
    /// every level.
    pub optimization: u8,
    /// `-Zi`: keep debug names in the SPIR-V
    pub debug_info: bool,
    /// `-Vd`: skip validation (the container is left unsigned)
    pub skip_validation: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            optimization: 3,
            debug_info: false,
            skip_validation: false,
        }
    }
}

impl CompileOptions {
    /// Parse compiler flags
    ///
    /// # Errors
    ///
    /// Diagnostic text naming the first unknown flag.
    pub fn parse(arguments: &[String]) -> std::result::Result<Self, String> {
        let mut options = Self::default();
        for argument in arguments {
            let flag = argument
                .strip_prefix('-')
                .or_else(|| argument.strip_prefix('/'))
                .ok_or_else(|| format!("error: unknown argument '{}'", argument))?;
            match flag {
                "Od" | "O0" => options.optimization = 0,
                "O1" => options.optimization = 1,
                "O2" => options.optimization = 2,
                "O3" => options.optimization = 3,
                "Zi" => options.debug_info = true,
                "Vd" => options.skip_validation = true,
                _ => return Err(format!("error: unknown argument '{}'", argument)),
            }
        }
        Ok(options)
    }
}

/// naga stage for a profile stage
pub fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Compute => naga::ShaderStage::Compute,
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Pixel => naga::ShaderStage::Fragment,
    }
}

/// SPIR-V version a profile targets
///
/// # Errors
///
/// Diagnostic text when the profile version is not SPIR-V 1.0 to 1.6.
pub fn spirv_version(profile: &TargetProfile) -> std::result::Result<(u8, u8), String> {
    match (profile.major, profile.minor) {
        (1, minor @ 0..=6) => Ok((1, minor as u8)),
        _ => Err(format!(
            "error: target profile '{}' does not name a SPIR-V version ({}_1_0 to {}_1_6)",
            profile,
            profile.stage.prefix(),
            profile.stage.prefix()
        )),
    }
}

fn parse_payload(payload: &[u8]) -> std::result::Result<naga::Module, String> {
    naga::front::spv::parse_u8_slice(payload, &naga::front::spv::Options::default())
        .map_err(|e| format!("error: invalid SPIR-V module: {}", e))
}

// ============================================================================
// NagaRuntime
// ============================================================================

/// naga compiler runtime
///
/// Include search paths are checked when the runtime is initialized.
#[derive(Debug, Default)]
pub struct NagaRuntime {
    search_paths: Vec<PathBuf>,
    initialized: bool,
}

impl NagaRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime whose include handlers also search `search_paths`
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            initialized: false,
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::BackendError("naga runtime is not initialized".to_string()))
        }
    }
}

impl CompilerRuntime for NagaRuntime {
    fn initialize(&mut self) -> Result<()> {
        for path in &self.search_paths {
            if !path.is_dir() {
                return Err(Error::BackendError(format!(
                    "include search path '{}' is not a directory",
                    path.display()
                )));
            }
        }
        self.initialized = true;
        boot_debug!(SOURCE, "naga runtime ready ({} include search path(s))", self.search_paths.len());
        Ok(())
    }

    fn create_compiler(&self) -> Result<Box<dyn CompileService>> {
        self.ensure_initialized()?;
        Ok(Box::new(NagaCompiler))
    }

    fn create_library(&self) -> Result<Box<dyn LibraryService>> {
        self.ensure_initialized()?;
        Ok(Box::new(NagaLibrary {
            search_paths: self.search_paths.clone(),
        }))
    }

    fn create_validator(&self) -> Result<Box<dyn ValidatorService>> {
        self.ensure_initialized()?;
        Ok(Box::new(NagaValidator))
    }
}

// ============================================================================
// NagaCompiler
// ============================================================================

/// WGSL to SPIR-V compile service
pub struct NagaCompiler;

impl CompileService for NagaCompiler {
    fn compile(
        &self,
        invocation: &CompileInvocation<'_>,
        include_handler: &mut dyn IncludeHandler,
    ) -> Result<OperationResult> {
        let options = match CompileOptions::parse(invocation.arguments) {
            Ok(options) => options,
            Err(text) => return Ok(failure(text)),
        };
        let lang_version = match spirv_version(&invocation.profile) {
            Ok(version) => version,
            Err(text) => return Ok(failure(text)),
        };
        let stage = naga_stage(invocation.profile.stage);
        boot_trace!(
            SOURCE,
            "Compiling {} ({}, entry '{}', {:?})",
            invocation.source_name.display(),
            invocation.profile,
            invocation.entry_point,
            options
        );

        let source = invocation.source.to_text();
        let text = match Preprocessor::new(invocation.defines, include_handler).run(&source, invocation.source_name) {
            Ok(text) => text,
            Err(e) => return Ok(failure(e.to_string())),
        };

        let module = match naga::front::wgsl::parse_str(&text) {
            Ok(module) => module,
            Err(e) => return Ok(failure(e.emit_to_string(&text))),
        };

        let has_entry_point = module
            .entry_points
            .iter()
            .any(|ep| ep.name == invocation.entry_point && ep.stage == stage);
        if !has_entry_point {
            return Ok(failure(format!(
                "error: entry point '{}' not found for stage {:?}",
                invocation.entry_point, stage
            )));
        }

        // Module info is needed by the SPIR-V writer even when checks are off
        let validation_flags = if options.skip_validation {
            ValidationFlags::empty()
        } else {
            ValidationFlags::all()
        };
        let info = match Validator::new(validation_flags, Capabilities::all()).validate(&module) {
            Ok(info) => info,
            Err(e) => return Ok(failure(e.emit_to_string(&text))),
        };

        let mut writer_flags = spv::WriterFlags::LABEL_VARYINGS;
        if options.debug_info {
            writer_flags |= spv::WriterFlags::DEBUG;
        }
        let spv_options = spv::Options {
            lang_version,
            flags: writer_flags,
            ..spv::Options::default()
        };
        let pipeline_options = spv::PipelineOptions {
            shader_stage: stage,
            entry_point: invocation.entry_point.to_string(),
        };

        let words = match spv::write_vec(&module, &info, &spv_options, Some(&pipeline_options)) {
            Ok(words) => words,
            Err(e) => return Ok(failure(format!("error: SPIR-V generation failed: {}", e))),
        };

        let mut bytes = container::wrap(bytemuck::cast_slice(&words));
        if !options.skip_validation {
            container::sign_in_place(&mut bytes)?;
        }

        boot_debug!(
            SOURCE,
            "Compiled {} to SPIR-V {}.{} ({} words, signed: {})",
            invocation.source_name.display(),
            lang_version.0,
            lang_version.1,
            words.len(),
            !options.skip_validation
        );
        Ok(OperationResult::success(Some(ShaderBlob::from_binary(bytes))))
    }

    fn disassemble(&self, blob: &ShaderBlob) -> Result<ShaderBlob> {
        let bytes = blob.as_bytes();
        let payload = container::payload(bytes).map_err(|e| Error::BackendError(e.to_string()))?;
        let module = parse_payload(payload).map_err(Error::BackendError)?;

        let info = Validator::new(ValidationFlags::empty(), Capabilities::all())
            .validate(&module)
            .map_err(|e| Error::BackendError(format!("module analysis failed: {}", e.as_inner())))?;
        let wgsl = naga::back::wgsl::write_string(&module, &info, naga::back::wgsl::WriterFlags::empty())
            .map_err(|e| Error::BackendError(format!("WGSL generation failed: {}", e)))?;

        let signature = match container::ContainerHeader::view(bytes) {
            Some(header) if header.has_digest() => {
                let words = header.digest_words();
                format!("digest {:08x}{:08x}{:08x}{:08x}", words[0], words[1], words[2], words[3])
            }
            _ => "unsigned".to_string(),
        };

        let text = format!(
            "// shader container v{}, {} payload bytes, {}\n{}",
            container::CONTAINER_VERSION,
            payload.len(),
            signature,
            wgsl
        );
        Ok(ShaderBlob::from_text(&text))
    }
}

// ============================================================================
// NagaLibrary
// ============================================================================

/// File loading and include handlers
pub struct NagaLibrary {
    search_paths: Vec<PathBuf>,
}

impl LibraryService for NagaLibrary {
    fn create_blob_from_file(&self, path: &Path) -> Result<ShaderBlob> {
        let bytes = fs::read(path)
            .map_err(|e| Error::SourceLoadFailed(format!("{}: {}", path.display(), e)))?;
        Ok(ShaderBlob::detect(bytes))
    }

    fn create_include_handler(&self) -> Result<Box<dyn IncludeHandler>> {
        Ok(Box::new(SearchPathIncludeHandler::new(self.search_paths.clone())))
    }
}

// ============================================================================
// NagaValidator
// ============================================================================

/// Container validator and signer
///
/// Checks the container structure, then parses and validates the SPIR-V
/// payload. With `IN_PLACE_EDIT` the digest is written on success.
pub struct NagaValidator;

impl ValidatorService for NagaValidator {
    fn validate(&self, blob: &mut MutableBlob, flags: ValidatorFlags) -> Result<OperationResult> {
        let payload = match container::payload(blob.as_bytes()) {
            Ok(payload) => payload,
            Err(e) => return Ok(failure(format!("error: {}", e))),
        };

        let module = match parse_payload(payload) {
            Ok(module) => module,
            Err(text) => return Ok(failure(text)),
        };

        if let Err(e) = Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module) {
            return Ok(failure(format!("error: module validation failed: {}", e.as_inner())));
        }

        if flags.contains(ValidatorFlags::IN_PLACE_EDIT) {
            if let Err(e) = container::sign_in_place(blob.as_mut_bytes()) {
                return Ok(failure(format!("error: {}", e)));
            }
            boot_info!(SOURCE, "Container validated and signed ({} bytes)", blob.as_bytes().len());
        }

        Ok(OperationResult::success(None))
    }
}

#[cfg(test)]
#[path = "naga_toolchain_tests.rs"]
mod tests;
