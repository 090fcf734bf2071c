/// Vulkan root signature and compute pipeline objects

use ash::vk;
use compute_bootstrap::bootstrap::device::{ComputePipeline, RootSignature};
use compute_bootstrap::bootstrap::signature::{BindingKind, SignatureLayout};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::DeviceShared;

/// Descriptor type a signature binding kind maps to
pub fn binding_kind_to_vk(kind: BindingKind) -> vk::DescriptorType {
    match kind {
        BindingKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingKind::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        BindingKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        BindingKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        BindingKind::Sampler => vk::DescriptorType::SAMPLER,
        BindingKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

// ============================================================================
// VulkanRootSignature
// ============================================================================

/// Root signature: one descriptor set layout per set plus the pipeline layout
///
/// Handles left null are skipped at drop, so a partially built signature
/// cleans up after itself.
pub struct VulkanRootSignature {
    pub(crate) layout: SignatureLayout,
    pub(crate) set_layouts: Vec<vk::DescriptorSetLayout>,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    pub(crate) shared: Arc<DeviceShared>,
}

impl VulkanRootSignature {
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn set_layouts(&self) -> &[vk::DescriptorSetLayout] {
        &self.set_layouts
    }
}

impl RootSignature for VulkanRootSignature {
    fn layout(&self) -> &SignatureLayout {
        &self.layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRootSignature {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline_layout != vk::PipelineLayout::null() {
                self.shared.device.destroy_pipeline_layout(self.pipeline_layout, None);
            }
            for set_layout in self.set_layouts.drain(..) {
                self.shared.device.destroy_descriptor_set_layout(set_layout, None);
            }
        }
    }
}

// ============================================================================
// VulkanComputePipeline
// ============================================================================

/// Compute pipeline object
pub struct VulkanComputePipeline {
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) entry_point: String,
    /// Keeps the pipeline layout alive
    pub(crate) _root_signature: Arc<dyn RootSignature>,
    pub(crate) shared: Arc<DeviceShared>,
}

impl VulkanComputePipeline {
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl ComputePipeline for VulkanComputePipeline {
    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanComputePipeline {
    fn drop(&mut self) {
        unsafe {
            self.shared.device.destroy_pipeline(self.pipeline, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
