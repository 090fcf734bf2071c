/// Session - the explicit context object of one bootstrap run
///
/// Built once from a driver, a compiler runtime and a `Config`, then borrowed
/// by every stage. Nothing here is global: dropping the session releases the
/// device and the compiler services.

use std::path::Path;
use std::sync::Arc;

use crate::adapter::AdapterSelector;
use crate::compiler::{CompileRequest, CompileResult, CompilerHandles, CompilerRuntime, CompilerToolchain, ShaderBlob, ShaderCompiler};
use crate::config::Config;
use crate::container::ShaderContainer;
use crate::device::{AdapterDescriptor, ComputePipeline, Driver, ShaderModel};
use crate::device_context::DeviceContext;
use crate::diagnostics::DiagnosticReporter;
use crate::error::{Error, Result};
use crate::pipeline_builder::PipelineBuilder;
use crate::{boot_debug, boot_err, boot_info, boot_warn};

const SOURCE: &str = "bootstrap::Session";

/// Outcome of a successful run
pub struct RunReport {
    /// Adapter the device was created on
    pub adapter: AdapterDescriptor,
    /// Highest shader model reported by the device (advisory)
    pub shader_model: Option<ShaderModel>,
    /// Signed precompiled container, when one was configured
    pub precompiled: Option<ShaderBlob>,
    /// Signed container compiled from source, when a source was configured
    pub compiled: Option<ShaderBlob>,
    /// Text form of the precompiled container, after validation
    pub precompiled_disassembly: Option<String>,
    /// Text form of the container the pipeline was built from
    pub disassembly: Option<String>,
    /// The pipeline object
    pub pipeline: Arc<dyn ComputePipeline>,
    /// Driver messages left in the queue after pipeline creation
    pub diagnostics: Vec<String>,
}

pub struct Session {
    context: DeviceContext,
    compiler: CompilerHandles,
}

impl Session {
    /// Select an adapter, create the device and bootstrap the compiler
    ///
    /// # Errors
    ///
    /// The error of the first stage that fails.
    pub fn bootstrap(driver: &mut dyn Driver, runtime: &mut dyn CompilerRuntime, config: &Config) -> Result<Self> {
        let adapter = AdapterSelector::select(driver, config.adapter_index, config.feature_level)?;
        let context = DeviceContext::create(driver, &adapter, config.feature_level)?;
        let compiler = CompilerToolchain::bootstrap(runtime)?;

        boot_info!(SOURCE, "Session ready on adapter {} ({})", adapter.index, adapter.name);
        Ok(Self { context, compiler })
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn compiler(&self) -> &CompilerHandles {
        &self.compiler
    }

    /// Load a binary file through the library service
    fn load_file(&self, path: &Path) -> Result<ShaderBlob> {
        self.compiler
            .library()
            .create_blob_from_file(path)
            .map_err(|e| boot_err!(SOURCE, Error::SourceLoadFailed(format!("{}: {}", path.display(), e))))
    }

    /// Text form of a container, logged on failure
    fn try_disassemble(&self, blob: &ShaderBlob) -> Option<String> {
        match ShaderContainer::disassemble(blob, self.compiler.compiler()) {
            Ok(text) => {
                boot_debug!(SOURCE, "Disassembly:\n{}", text);
                Some(text)
            }
            Err(e) => {
                boot_warn!(SOURCE, "{}", e);
                None
            }
        }
    }

    /// Load a precompiled container, make sure it is signed and log its
    /// disassembly
    pub fn load_precompiled(&self, path: &Path) -> Result<ShaderBlob> {
        self.load_precompiled_inspected(path).map(|(blob, _)| blob)
    }

    fn load_precompiled_inspected(&self, path: &Path) -> Result<(ShaderBlob, Option<String>)> {
        let blob = self.load_file(path)?;
        let signed = ShaderContainer::ensure_signed(blob, self.compiler.validator())?;
        let text = self.try_disassemble(&signed);
        Ok((signed, text))
    }

    /// Compile a source file
    pub fn compile(&self, request: &CompileRequest) -> Result<CompileResult> {
        ShaderCompiler::new(&self.compiler).compile(request)
    }

    /// Compile a source file into a signed container
    ///
    /// # Errors
    ///
    /// `CompileError` with the full diagnostic text when compilation fails.
    pub fn compile_to_binary(&self, request: &CompileRequest) -> Result<ShaderBlob> {
        let binary = ShaderCompiler::new(&self.compiler).compile_to_binary(request)?;
        ShaderContainer::ensure_signed(binary, self.compiler.validator())
    }

    /// Create the root signature and the compute pipeline
    pub fn build_pipeline(&self, bytecode: &ShaderBlob, signature: &ShaderBlob) -> Result<Arc<dyn ComputePipeline>> {
        let builder = PipelineBuilder::new(&self.context);
        let root_signature = builder.build_root_signature(signature)?;
        builder.build_compute_pipeline(bytecode, &root_signature)
    }

    /// Run every configured stage
    ///
    /// The pipeline is built from the compiled source when one is configured,
    /// otherwise from the precompiled container.
    pub fn run(&self, config: &Config) -> Result<RunReport> {
        config.validate()?;

        let (precompiled, precompiled_disassembly) = match config.precompiled_shader.as_deref() {
            Some(path) => {
                let (blob, text) = self.load_precompiled_inspected(path)?;
                (Some(blob), text)
            }
            None => (None, None),
        };

        let compiled = config
            .compile
            .as_ref()
            .map(|request| self.compile_to_binary(request))
            .transpose()?;

        let bytecode = match compiled.as_ref().or(precompiled.as_ref()) {
            Some(blob) => blob,
            None => return Err(Error::InvalidConfig("no shader to build a pipeline from".to_string())),
        };
        let disassembly = match &compiled {
            Some(blob) => self.try_disassemble(blob),
            None => precompiled_disassembly.clone(),
        };

        let signature_path = config
            .root_signature
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("a root signature blob is required".to_string()))?;
        let signature = self.load_file(signature_path)?;

        let pipeline = self.build_pipeline(bytecode, &signature)?;
        let diagnostics = DiagnosticReporter::drain(self.context.diagnostic_sink().map(Arc::as_ref));

        Ok(RunReport {
            adapter: self.context.adapter().clone(),
            shader_model: self.context.shader_model(),
            precompiled,
            compiled,
            precompiled_disassembly,
            disassembly,
            pipeline,
            diagnostics,
        })
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
