/// VulkanDevice - Device trait implementation

use ash::vk;
use compute_bootstrap::bootstrap::container;
use compute_bootstrap::bootstrap::device::{
    AdapterDescriptor, ComputePipeline, ComputePipelineDesc, DiagnosticQueue, Device, FeatureLevel, RootSignature,
    ShaderModel,
};
use compute_bootstrap::bootstrap::signature::SignatureLayout;
use compute_bootstrap::bootstrap::{Error, Result};
use compute_bootstrap::{boot_debug, boot_error};
use std::ffi::CString;
use std::sync::Arc;

use crate::debug::{format_stored, MessageStore};
use crate::reflect::{check_interface, reflect_shader};
use crate::vulkan_context::DeviceShared;
use crate::vulkan_pipeline::{binding_kind_to_vk, VulkanComputePipeline, VulkanRootSignature};

const SOURCE: &str = "bootstrap::vulkan";

/// Message id used for problems the backend detects itself
const BACKEND_MESSAGE_ID: &str = "Bootstrap-PipelineCreation";

/// Highest SPIR-V version a device at `api` accepts
///
/// Vulkan 1.0 consumes SPIR-V 1.0, 1.1 consumes 1.3 (1.4 with the
/// experimental extensions), 1.2 consumes 1.5 and 1.3+ consumes 1.6.
pub fn shader_model_for(api: FeatureLevel, experimental: bool) -> Result<ShaderModel> {
    match (api.major, api.minor) {
        (1, 0) => Ok(ShaderModel::new(1, 0)),
        (1, 1) if experimental => Ok(ShaderModel::new(1, 4)),
        (1, 1) => Ok(ShaderModel::new(1, 3)),
        (1, 2) => Ok(ShaderModel::new(1, 5)),
        (1, _) => Ok(ShaderModel::new(1, 6)),
        _ => Err(Error::BackendError(format!("unknown Vulkan API version {}", api))),
    }
}

/// Logical device on one adapter
pub struct VulkanDevice {
    shared: Arc<DeviceShared>,
    adapter: AdapterDescriptor,
    experimental: bool,
    store: Arc<MessageStore>,
}

impl VulkanDevice {
    pub(crate) fn new(
        shared: Arc<DeviceShared>,
        adapter: AdapterDescriptor,
        experimental: bool,
        store: Arc<MessageStore>,
    ) -> Self {
        Self {
            shared,
            adapter,
            experimental,
            store,
        }
    }

    /// Raw device handle
    pub fn handle(&self) -> &ash::Device {
        &self.shared.device
    }

    /// Record a problem the backend found in the diagnostic queue
    fn report(&self, message: &str) {
        boot_error!(SOURCE, "{}", message);
        self.store.push(
            &format_stored(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                BACKEND_MESSAGE_ID,
                message,
            ),
            true,
        );
    }

    fn error_count(&self) -> u32 {
        self.store.error_count()
    }

    /// Check the container and return its payload as SPIR-V words
    fn spirv_words(&self, bytes: &[u8]) -> Result<Vec<u32>> {
        if !container::verify_digest(bytes) {
            let message = if container::is_signed(bytes) {
                "Shader container digest does not match its contents"
            } else {
                "Shader container is unsigned"
            };
            self.report(message);
            return Err(Error::BackendError(message.to_string()));
        }

        let payload = container::payload(bytes).map_err(|e| {
            self.report(&format!("Malformed shader container: {}", e));
            Error::BackendError(e.to_string())
        })?;

        if payload.len() % 4 != 0 {
            let message = format!("SPIR-V payload of {} bytes is not a whole number of words", payload.len());
            self.report(&message);
            return Err(Error::BackendError(message));
        }

        Ok(bytemuck::pod_collect_to_vec::<u8, u32>(payload))
    }
}

impl Device for VulkanDevice {
    fn adapter(&self) -> &AdapterDescriptor {
        &self.adapter
    }

    fn has_extended_interface(&self) -> bool {
        self.adapter.max_feature_level >= FeatureLevel::new(1, 2)
    }

    fn highest_shader_model(&self) -> Result<ShaderModel> {
        let props = unsafe {
            self.shared
                .instance
                .instance
                .get_physical_device_properties(self.shared.physical_device)
        };
        let api = crate::vulkan::feature_level_from_api_version(props.api_version).min(self.adapter.max_feature_level);
        shader_model_for(api, self.experimental)
    }

    fn diagnostic_queue(&self) -> Option<Arc<dyn DiagnosticQueue>> {
        Some(Arc::clone(&self.store) as Arc<dyn DiagnosticQueue>)
    }

    fn create_root_signature(&self, blob: &[u8]) -> Result<Arc<dyn RootSignature>> {
        let layout = SignatureLayout::parse(blob)?;
        let set_count = layout.set_count();

        let max_sets = unsafe {
            self.shared
                .instance
                .instance
                .get_physical_device_properties(self.shared.physical_device)
        }
        .limits
        .max_bound_descriptor_sets;
        if set_count > max_sets {
            return Err(Error::RootSignatureCreationFailed(format!(
                "root signature uses {} descriptor sets, device binds at most {}",
                set_count, max_sets
            )));
        }

        let mut root_signature = VulkanRootSignature {
            layout,
            set_layouts: Vec::with_capacity(set_count as usize),
            pipeline_layout: vk::PipelineLayout::null(),
            shared: Arc::clone(&self.shared),
        };

        for set in 0..set_count {
            let bindings: Vec<vk::DescriptorSetLayoutBinding> = root_signature
                .layout
                .bindings
                .iter()
                .filter(|binding| binding.set == set)
                .map(|binding| {
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(binding.binding)
                        .descriptor_type(binding_kind_to_vk(binding.kind))
                        .descriptor_count(binding.count)
                        .stage_flags(vk::ShaderStageFlags::COMPUTE)
                })
                .collect();

            let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let set_layout = unsafe {
                self.shared
                    .device
                    .create_descriptor_set_layout(&create_info, None)
                    .map_err(|e| {
                        boot_error!(SOURCE, "Failed to create descriptor set layout {}: {:?}", set, e);
                        Error::BackendError(format!("Failed to create descriptor set layout {}: {:?}", set, e))
                    })?
            };
            root_signature.set_layouts.push(set_layout);
        }

        let push_constant_ranges = if root_signature.layout.push_constant_size > 0 {
            vec![vk::PushConstantRange::default()
                .stage_flags(vk::ShaderStageFlags::COMPUTE)
                .offset(0)
                .size(root_signature.layout.push_constant_size)]
        } else {
            vec![]
        };

        let layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&root_signature.set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        root_signature.pipeline_layout = unsafe {
            self.shared
                .device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| {
                    boot_error!(SOURCE, "Failed to create pipeline layout: {:?}", e);
                    Error::BackendError(format!("Failed to create pipeline layout: {:?}", e))
                })?
        };

        boot_debug!(
            SOURCE,
            "Root signature created ({} set layout(s), {} push constant bytes)",
            root_signature.set_layouts.len(),
            root_signature.layout.push_constant_size
        );

        Ok(Arc::new(root_signature))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc<'_>) -> Result<Arc<dyn ComputePipeline>> {
        let root_signature = desc
            .root_signature
            .as_any()
            .downcast_ref::<VulkanRootSignature>()
            .ok_or_else(|| Error::BackendError("Root signature was not created by the Vulkan backend".to_string()))?;

        let code = self.spirv_words(desc.bytecode.as_bytes())?;

        let interface = reflect_shader(&code).inspect_err(|e| self.report(&e.to_string()))?;
        let problems = check_interface(&interface, &root_signature.layout);
        if !problems.is_empty() {
            for problem in &problems {
                self.report(problem);
            }
            return Err(Error::BackendError(format!(
                "shader interface does not match the root signature ({} problem(s))",
                problems.len()
            )));
        }

        let entry_point = CString::new(interface.entry_point.as_str())
            .map_err(|_| Error::BackendError(format!("invalid entry point name '{}'", interface.entry_point)))?;

        let errors_before = self.error_count();
        let device = &self.shared.device;

        unsafe {
            let module_info = vk::ShaderModuleCreateInfo::default().code(&code);
            let module = device
                .create_shader_module(&module_info, None)
                .map_err(|e| {
                    boot_error!(SOURCE, "Failed to create shader module: {:?}", e);
                    Error::BackendError(format!("Failed to create shader module: {:?}", e))
                })?;

            let stage = vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::COMPUTE)
                .module(module)
                .name(&entry_point);

            let create_info = vk::ComputePipelineCreateInfo::default()
                .stage(stage)
                .layout(root_signature.pipeline_layout);

            let result = device.create_compute_pipelines(vk::PipelineCache::null(), &[create_info], None);
            device.destroy_shader_module(module, None);

            let pipeline = match result {
                Ok(pipelines) => pipelines.into_iter().next().ok_or_else(|| {
                    Error::BackendError("Driver returned no pipeline".to_string())
                })?,
                Err((_, e)) => {
                    boot_error!(SOURCE, "Failed to create compute pipeline: {:?}", e);
                    return Err(Error::BackendError(format!("Failed to create compute pipeline: {:?}", e)));
                }
            };

            if self.error_count() > errors_before {
                device.destroy_pipeline(pipeline, None);
                return Err(Error::BackendError(
                    "validation layer reported errors during pipeline creation".to_string(),
                ));
            }

            boot_debug!(SOURCE, "Compute pipeline created (entry point '{}')", interface.entry_point);

            Ok(Arc::new(VulkanComputePipeline {
                pipeline,
                entry_point: interface.entry_point,
                _root_signature: Arc::clone(desc.root_signature),
                shared: Arc::clone(&self.shared),
            }))
        }
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
