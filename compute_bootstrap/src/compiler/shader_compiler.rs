/// ShaderCompiler - source file to binary container

use crate::compiler::{CompileInvocation, CompileRequest, CompilerHandles, ShaderBlob, TargetProfile};
use crate::error::{Error, Result};
use crate::{boot_debug, boot_err, boot_info, boot_warn};

const SOURCE: &str = "bootstrap::ShaderCompiler";

/// Outcome of a compile: a binary or the diagnostic text, never both
#[derive(Debug, Clone)]
pub enum CompileResult {
    /// Compiled container
    Binary(ShaderBlob),
    /// Full diagnostic text emitted by the compiler
    Diagnostics(String),
}

impl CompileResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileResult::Binary(_))
    }

    pub fn binary(&self) -> Option<&ShaderBlob> {
        match self {
            CompileResult::Binary(blob) => Some(blob),
            CompileResult::Diagnostics(_) => None,
        }
    }

    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            CompileResult::Binary(_) => None,
            CompileResult::Diagnostics(text) => Some(text),
        }
    }
}

/// Compiles shader sources with a bootstrapped toolchain
pub struct ShaderCompiler<'a> {
    handles: &'a CompilerHandles,
}

impl<'a> ShaderCompiler<'a> {
    pub fn new(handles: &'a CompilerHandles) -> Self {
        Self { handles }
    }

    /// Compile one source file
    ///
    /// Compile errors are returned as `CompileResult::Diagnostics`, not as
    /// `Err`.
    ///
    /// # Errors
    ///
    /// - `CompileInvocationFailed` for a malformed profile, a failed include
    ///   handler, or a compile call that could not be dispatched
    /// - `SourceLoadFailed` if the source cannot be read
    pub fn compile(&self, request: &CompileRequest) -> Result<CompileResult> {
        let profile = TargetProfile::parse(&request.profile).map_err(|e| boot_err!(SOURCE, e))?;

        let source = self
            .handles
            .library()
            .create_blob_from_file(&request.source_path)
            .map_err(|e| {
                boot_err!(SOURCE, Error::SourceLoadFailed(format!(
                    "error reading {}: {}",
                    request.source_path.display(),
                    e
                )))
            })?;
        boot_debug!(SOURCE, "Loaded {} ({} bytes, {:?})",
            request.source_path.display(), source.len(), source.encoding());

        // One resolver per compile: handlers keep per-compile state
        let mut include_handler = self.handles.library().create_include_handler().map_err(|e| {
            boot_err!(SOURCE, Error::CompileInvocationFailed(format!(
                "failed to create include handler: {}",
                e
            )))
        })?;

        let invocation = CompileInvocation {
            source: &source,
            source_name: &request.source_path,
            entry_point: &request.entry_point,
            profile,
            arguments: &request.arguments,
            defines: &request.defines,
        };

        let result = self
            .handles
            .compiler()
            .compile(&invocation, include_handler.as_mut())
            .map_err(|e| {
                boot_err!(SOURCE, Error::CompileInvocationFailed(format!(
                    "failed to compile {}: {}",
                    request.source_path.display(),
                    e
                )))
            })?;

        if !result.succeeded() {
            let mut text = result.error_text();
            if text.trim().is_empty() {
                text = format!("{}: compilation failed without diagnostics", request.source_path.display());
            }
            boot_warn!(SOURCE, "Compilation of {} failed", request.source_path.display());
            return Ok(CompileResult::Diagnostics(text));
        }

        let binary = result.result.ok_or_else(|| {
            boot_err!(SOURCE, Error::CompileInvocationFailed(
                "compile succeeded without a result buffer".to_string()
            ))
        })?;

        boot_info!(SOURCE, "Compiled {} [{}] entry '{}' ({} bytes)",
            request.source_path.display(), profile, request.entry_point, binary.len());

        Ok(CompileResult::Binary(binary))
    }

    /// Compile and turn diagnostics into `CompileError`
    ///
    /// The only path from source to pipeline bytecode: a failed compile never
    /// yields a blob.
    pub fn compile_to_binary(&self, request: &CompileRequest) -> Result<ShaderBlob> {
        match self.compile(request)? {
            CompileResult::Binary(blob) => Ok(blob),
            CompileResult::Diagnostics(text) => Err(boot_err!(SOURCE, Error::CompileError(text))),
        }
    }
}

#[cfg(test)]
#[path = "shader_compiler_tests.rs"]
mod tests;
