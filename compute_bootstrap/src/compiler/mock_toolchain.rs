/// Mock compiler toolchain for unit tests (no compiler required)
///
/// The mock "compiles" by wrapping the source text into an unsigned
/// container. Sources with unbalanced braces or without the requested entry
/// point fail with a diagnostic, which is enough to drive every branch of
/// ShaderCompiler and ShaderContainer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::compiler::{
    CompileInvocation, CompileService, CompilerRuntime, IncludeHandler, IncludedSource,
    LibraryService, MutableBlob, OperationResult, ShaderBlob, ValidatorFlags, ValidatorService,
};
use crate::container;
use crate::error::{Error, Result};

/// In-memory file system shared by library and include handlers
pub type MockFiles = Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>;

// ============================================================================
// Mock Runtime
// ============================================================================

/// Which bootstrap step should fail
#[derive(Debug, Clone, Copy, Default)]
pub struct MockFailures {
    pub initialize: bool,
    pub compiler: bool,
    pub library: bool,
    pub validator: bool,
}

pub struct MockRuntime {
    pub failures: MockFailures,
    pub files: MockFiles,
    /// Validator write-path calls
    pub validate_calls: Arc<Mutex<usize>>,
    /// Include handlers handed out by the library
    pub include_handlers_created: Arc<Mutex<usize>>,
    /// Make the validator reject every container
    pub reject_validation: bool,
    initialized: bool,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            failures: MockFailures::default(),
            files: Arc::new(Mutex::new(HashMap::new())),
            validate_calls: Arc::new(Mutex::new(0)),
            include_handlers_created: Arc::new(Mutex::new(0)),
            reject_validation: false,
            initialized: false,
        }
    }

    pub fn with_failures(failures: MockFailures) -> Self {
        Self {
            failures,
            ..Self::new()
        }
    }

    /// Add a file to the in-memory file system
    pub fn add_file(&self, path: impl Into<PathBuf>, contents: &[u8]) {
        self.files.lock().unwrap().insert(path.into(), contents.to_vec());
    }

    pub fn validate_call_count(&self) -> usize {
        *self.validate_calls.lock().unwrap()
    }

    pub fn include_handler_count(&self) -> usize {
        *self.include_handlers_created.lock().unwrap()
    }
}

impl CompilerRuntime for MockRuntime {
    fn initialize(&mut self) -> Result<()> {
        if self.failures.initialize {
            return Err(Error::BackendError("mock runtime missing".to_string()));
        }
        self.initialized = true;
        Ok(())
    }

    fn create_compiler(&self) -> Result<Box<dyn CompileService>> {
        if self.failures.compiler || !self.initialized {
            return Err(Error::BackendError("mock compiler unavailable".to_string()));
        }
        Ok(Box::new(MockCompiler))
    }

    fn create_library(&self) -> Result<Box<dyn LibraryService>> {
        if self.failures.library || !self.initialized {
            return Err(Error::BackendError("mock library unavailable".to_string()));
        }
        Ok(Box::new(MockLibrary {
            files: Arc::clone(&self.files),
            include_handlers_created: Arc::clone(&self.include_handlers_created),
        }))
    }

    fn create_validator(&self) -> Result<Box<dyn ValidatorService>> {
        if self.failures.validator || !self.initialized {
            return Err(Error::BackendError("mock validator unavailable".to_string()));
        }
        Ok(Box::new(MockValidator {
            calls: Arc::clone(&self.validate_calls),
            reject: self.reject_validation,
        }))
    }
}

// ============================================================================
// Mock Compiler
// ============================================================================

pub struct MockCompiler;

impl CompileService for MockCompiler {
    fn compile(
        &self,
        invocation: &CompileInvocation<'_>,
        include_handler: &mut dyn IncludeHandler,
    ) -> Result<OperationResult> {
        let mut text = invocation.source.to_text();

        for line in text.clone().lines() {
            let Some(rest) = line.trim().strip_prefix("#include") else {
                continue;
            };
            let requested = rest.trim().trim_matches('"');
            match include_handler.load_source(requested, invocation.source_name) {
                Ok(included) => text.push_str(&included.blob.to_text()),
                Err(e) => {
                    return Ok(OperationResult::failure(ShaderBlob::from_text(&format!(
                        "{}: error: {}",
                        invocation.source_name.display(),
                        e
                    ))));
                }
            }
        }

        let opened = text.matches('{').count();
        let closed = text.matches('}').count();
        if opened != closed {
            return Ok(OperationResult::failure(ShaderBlob::from_text(&format!(
                "{}: error: expected '}}' ({} unbalanced braces)",
                invocation.source_name.display(),
                opened.abs_diff(closed)
            ))));
        }

        if !text.contains(invocation.entry_point) {
            return Ok(OperationResult::failure(ShaderBlob::from_text(&format!(
                "{}: error: missing entry point '{}'",
                invocation.source_name.display(),
                invocation.entry_point
            ))));
        }

        Ok(OperationResult::success(Some(ShaderBlob::from_binary(container::wrap(text.as_bytes())))))
    }

    fn disassemble(&self, blob: &ShaderBlob) -> Result<ShaderBlob> {
        let payload = container::payload(blob.as_bytes())
            .map_err(|e| Error::BackendError(e.to_string()))?;
        Ok(ShaderBlob::from_text(&format!(
            "; mock container, {} payload bytes\n{}",
            payload.len(),
            String::from_utf8_lossy(payload)
        )))
    }
}

// ============================================================================
// Mock Library
// ============================================================================

pub struct MockLibrary {
    files: MockFiles,
    include_handlers_created: Arc<Mutex<usize>>,
}

impl LibraryService for MockLibrary {
    fn create_blob_from_file(&self, path: &Path) -> Result<ShaderBlob> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|bytes| ShaderBlob::detect(bytes.clone()))
            .ok_or_else(|| Error::SourceLoadFailed(format!("{}: not found", path.display())))
    }

    fn create_include_handler(&self) -> Result<Box<dyn IncludeHandler>> {
        *self.include_handlers_created.lock().unwrap() += 1;
        Ok(Box::new(MockIncludeHandler {
            files: Arc::clone(&self.files),
        }))
    }
}

pub struct MockIncludeHandler {
    files: MockFiles,
}

impl IncludeHandler for MockIncludeHandler {
    fn load_source(&mut self, requested: &str, includer: &Path) -> Result<IncludedSource> {
        let path = includer
            .parent()
            .map(|dir| dir.join(requested))
            .unwrap_or_else(|| PathBuf::from(requested));
        let bytes = self
            .files
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or_else(|| Error::SourceLoadFailed(format!("cannot open include file '{}'", requested)))?;
        Ok(IncludedSource {
            path,
            blob: ShaderBlob::detect(bytes),
        })
    }
}

// ============================================================================
// Mock Validator
// ============================================================================

pub struct MockValidator {
    pub calls: Arc<Mutex<usize>>,
    pub reject: bool,
}

impl ValidatorService for MockValidator {
    fn validate(&self, blob: &mut MutableBlob, flags: ValidatorFlags) -> Result<OperationResult> {
        *self.calls.lock().unwrap() += 1;

        if self.reject {
            return Ok(OperationResult::failure(ShaderBlob::from_text("validation error: rejected by mock")));
        }
        if let Err(e) = container::payload(blob.as_bytes()) {
            return Ok(OperationResult::failure(ShaderBlob::from_text(&e.to_string())));
        }
        if flags.contains(ValidatorFlags::IN_PLACE_EDIT) {
            container::sign_in_place(blob.as_mut_bytes())?;
        }
        Ok(OperationResult::success(None))
    }
}
