/// Root signature and compute pipeline traits

use std::any::Any;
use std::sync::Arc;

use crate::compiler::ShaderBlob;
use crate::signature::SignatureLayout;

/// Resource-binding layout materialized by a device
pub trait RootSignature {
    /// Layout the signature was created from
    fn layout(&self) -> &SignatureLayout;

    /// Concrete backend type (for backend-side downcasts)
    fn as_any(&self) -> &dyn Any;
}

/// Executable compute pipeline object
pub trait ComputePipeline {
    /// Entry point the pipeline dispatches
    fn entry_point(&self) -> &str;

    /// Concrete backend type (for backend-side downcasts)
    fn as_any(&self) -> &dyn Any;
}

/// Compute pipeline descriptor
///
/// Transient: built right before pipeline creation and dropped after.
pub struct ComputePipelineDesc<'a> {
    /// Compiled, signed shader container
    pub bytecode: &'a ShaderBlob,
    /// Binding layout the shader runs against
    pub root_signature: &'a Arc<dyn RootSignature>,
}
