/// Driver and Device traits - the graphics runtime capability provider

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::device::{ComputePipeline, ComputePipelineDesc, DiagnosticQueue, RootSignature};
use crate::error::Result;

// ============================================================================
// Common types
// ============================================================================

/// Versioned capability tier a device is created at
///
/// Backends interpret the pair in their own terms (the Vulkan backend reads it
/// as an API version).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureLevel {
    pub major: u32,
    pub minor: u32,
}

impl FeatureLevel {
    /// Level every bootstrap device is created at unless configured otherwise
    pub const BASELINE: FeatureLevel = FeatureLevel { major: 1, minor: 1 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.major, self.minor)
    }
}

/// Highest shader model a device accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderModel {
    pub major: u32,
    pub minor: u32,
}

impl ShaderModel {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ShaderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SM {}.{}", self.major, self.minor)
    }
}

bitflags! {
    /// Adapter flags reported at enumeration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AdapterFlags: u32 {
        /// Software emulation (never auto-selected)
        const SOFTWARE = 1 << 0;
        /// Integrated GPU sharing memory with the host
        const INTEGRATED = 1 << 1;
    }
}

/// Adapter as reported by the driver at enumeration time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDescriptor {
    /// Enumeration position
    pub index: u32,
    /// Human-readable name
    pub name: String,
    /// PCI vendor id
    pub vendor_id: u32,
    /// PCI device id
    pub device_id: u32,
    /// Adapter flags
    pub flags: AdapterFlags,
    /// Highest feature level the adapter reports
    pub max_feature_level: FeatureLevel,
}

impl AdapterDescriptor {
    /// Whether this adapter is a software emulation
    pub fn is_software(&self) -> bool {
        self.flags.contains(AdapterFlags::SOFTWARE)
    }
}

// ============================================================================
// Driver trait
// ============================================================================

/// Graphics driver/runtime
///
/// Implemented by backends (e.g., VulkanDriver). Only the bootstrap path is
/// exposed: adapter enumeration, capability probing, device creation and the
/// experimental shader-model switch.
pub trait Driver {
    /// Adapter at an enumeration position
    ///
    /// # Returns
    ///
    /// `Ok(None)` once `index` is past the last adapter
    fn adapter(&self, index: u32) -> Result<Option<AdapterDescriptor>>;

    /// Test whether a device could be created on `adapter` at `level`
    ///
    /// Must not materialize a usable device.
    fn probe(&self, adapter: &AdapterDescriptor, level: FeatureLevel) -> bool;

    /// Create a logical device on `adapter` at `level`
    fn create_device(&self, adapter: &AdapterDescriptor, level: FeatureLevel) -> Result<Box<dyn Device>>;

    /// Enable experimental shader models for devices created afterwards
    fn enable_experimental_shader_models(&mut self, adapter: &AdapterDescriptor) -> Result<()>;
}

// ============================================================================
// Device trait
// ============================================================================

/// Logical device
pub trait Device {
    /// Adapter this device was created on
    fn adapter(&self) -> &AdapterDescriptor;

    /// Whether the extended-capability interface is available
    ///
    /// When it is not, shader models beyond the baseline must be enabled
    /// explicitly through the driver.
    fn has_extended_interface(&self) -> bool;

    /// Highest supported shader model
    fn highest_shader_model(&self) -> Result<ShaderModel>;

    /// Driver message queue, present only with a debug-capable driver
    fn diagnostic_queue(&self) -> Option<Arc<dyn DiagnosticQueue>>;

    /// Materialize a resource-binding layout from a signature blob
    fn create_root_signature(&self, blob: &[u8]) -> Result<Arc<dyn RootSignature>>;

    /// Materialize a compute pipeline object
    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc<'_>) -> Result<Arc<dyn ComputePipeline>>;
}
