/// PipelineBuilder - root signature and compute pipeline creation

use std::sync::Arc;

use crate::compiler::ShaderBlob;
use crate::device::{ComputePipeline, ComputePipelineDesc, RootSignature};
use crate::device_context::DeviceContext;
use crate::diagnostics::DiagnosticReporter;
use crate::error::{Error, Result};
use crate::{boot_err, boot_error, boot_info};

const SOURCE: &str = "bootstrap::PipelineBuilder";

/// Builds pipeline objects on a device context
pub struct PipelineBuilder<'a> {
    context: &'a DeviceContext,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(context: &'a DeviceContext) -> Self {
        Self { context }
    }

    /// Materialize a root signature from its blob
    ///
    /// # Errors
    ///
    /// `RootSignatureCreationFailed` for malformed or incompatible blobs.
    pub fn build_root_signature(&self, blob: &ShaderBlob) -> Result<Arc<dyn RootSignature>> {
        let root_signature = self
            .context
            .device()
            .create_root_signature(blob.as_bytes())
            .map_err(|e| {
                let reason = match e {
                    Error::RootSignatureCreationFailed(reason) => reason,
                    other => other.to_string(),
                };
                boot_err!(SOURCE, Error::RootSignatureCreationFailed(reason))
            })?;

        let layout = root_signature.layout();
        boot_info!(SOURCE, "Root signature created ({} bindings, {} bytes of push constants)",
            layout.bindings.len(), layout.push_constant_size);
        Ok(root_signature)
    }

    /// Materialize a compute pipeline
    ///
    /// The cause of a rejection is not interpreted here: the device's
    /// diagnostic queue is drained into the error instead.
    ///
    /// # Errors
    ///
    /// `PipelineCreationFailed` carrying every drained driver message.
    pub fn build_compute_pipeline(
        &self,
        bytecode: &ShaderBlob,
        root_signature: &Arc<dyn RootSignature>,
    ) -> Result<Arc<dyn ComputePipeline>> {
        let desc = ComputePipelineDesc {
            bytecode,
            root_signature,
        };

        match self.context.device().create_compute_pipeline(&desc) {
            Ok(pipeline) => {
                boot_info!(SOURCE, "Compute pipeline created (entry point '{}')", pipeline.entry_point());
                Ok(pipeline)
            }
            Err(e) => {
                boot_error!(SOURCE, "Failed to compile pipeline: {}", e);

                let diagnostics = DiagnosticReporter::drain(self.context.diagnostic_sink().map(Arc::as_ref));
                for (index, message) in diagnostics.iter().enumerate() {
                    boot_error!(SOURCE, " [{}] -- {}", index, message);
                }

                Err(Error::PipelineCreationFailed {
                    reason: e.to_string(),
                    diagnostics,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_builder_tests.rs"]
mod tests;
