/// VulkanDriver - instance creation, adapter enumeration and device creation

use ash::vk;
use compute_bootstrap::bootstrap::device::{AdapterDescriptor, AdapterFlags, Device, Driver, FeatureLevel};
use compute_bootstrap::bootstrap::{Config, Error, Result};
use compute_bootstrap::{boot_debug, boot_error, boot_info, boot_warn};
use std::ffi::{c_char, CStr, CString};
use std::sync::Arc;

use crate::debug::{EchoConfig, MessageStore};
use crate::vulkan_context::{DebugMessenger, DeviceShared, InstanceShared};
use crate::vulkan_device::VulkanDevice;

const SOURCE: &str = "bootstrap::vulkan";

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Device extensions behind the experimental shader-model switch
///
/// Together they raise the SPIR-V version a Vulkan 1.1 device accepts from
/// 1.3 to 1.4.
pub const EXPERIMENTAL_SHADER_MODEL_EXTENSIONS: [&CStr; 2] = [
    ash::khr::spirv_1_4::NAME,
    ash::khr::shader_float_controls::NAME,
];

/// Convert a packed Vulkan API version to a feature level
pub fn feature_level_from_api_version(api_version: u32) -> FeatureLevel {
    FeatureLevel::new(vk::api_version_major(api_version), vk::api_version_minor(api_version))
}

/// Adapter flags for a Vulkan device type
pub fn adapter_flags(device_type: vk::PhysicalDeviceType) -> AdapterFlags {
    match device_type {
        vk::PhysicalDeviceType::CPU => AdapterFlags::SOFTWARE,
        vk::PhysicalDeviceType::INTEGRATED_GPU => AdapterFlags::INTEGRATED,
        _ => AdapterFlags::empty(),
    }
}

/// Vulkan driver
///
/// Owns the instance (and the debug messenger when validation is enabled).
/// Devices created through it keep the instance alive.
pub struct VulkanDriver {
    shared: Arc<InstanceShared>,
    physical_devices: Vec<vk::PhysicalDevice>,
    /// Instance API version (caps every adapter's feature level)
    api_version: u32,
    /// Adapters with the experimental shader-model switch on
    experimental: Vec<u32>,
}

impl VulkanDriver {
    /// Create the instance and enumerate physical devices
    ///
    /// Validation is enabled only when requested and the Khronos validation
    /// layer is installed. Devices always get a diagnostic queue: without the
    /// layer it holds only the problems the backend detects itself.
    ///
    /// # Errors
    ///
    /// `BackendError` if the Vulkan library cannot be loaded or the instance
    /// cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    boot_error!(SOURCE, "Failed to load Vulkan library: {:?}", e);
                    Error::BackendError(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let api_version = entry
                .try_enumerate_instance_version()
                .ok()
                .flatten()
                .unwrap_or(vk::API_VERSION_1_0)
                .min(vk::API_VERSION_1_3);

            // Application Info
            let app_name = CString::new(config.app_name.as_str())
                .unwrap_or_else(|_| c"Compute Bootstrap".to_owned());
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Compute Bootstrap")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(api_version);

            let validation = config.enable_validation && Self::validation_layer_available(&entry);
            if config.enable_validation && !validation {
                boot_warn!(SOURCE, "Validation layer not installed, validation-layer diagnostics disabled");
            }

            let extension_names: Vec<*const c_char> = if validation {
                vec![ash::ext::debug_utils::NAME.as_ptr()]
            } else {
                vec![]
            };
            let layer_names: Vec<*const c_char> = if validation {
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    boot_error!(SOURCE, "Failed to create Vulkan instance: {:?}", e);
                    Error::BackendError(format!("Failed to create instance: {:?}", e))
                })?;

            // Backend checks report here even without the validation layer
            let store = if validation {
                Arc::new(MessageStore::with_echo(EchoConfig {
                    severity: config.debug_severity,
                    output: config.debug_output.clone(),
                    message_filter: config.debug_message_filter,
                }))
            } else {
                Arc::new(MessageStore::new())
            };

            let mut shared = InstanceShared {
                entry,
                instance,
                store,
                debug: None,
            };

            // Setup debug messenger if validation is enabled
            if validation {
                let loader = ash::ext::debug_utils::Instance::new(&shared.entry, &shared.instance);

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::messenger_severity(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback))
                    .user_data(Arc::as_ptr(&shared.store) as *mut std::os::raw::c_void);

                let messenger = loader
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        boot_error!(SOURCE, "Failed to create debug messenger: {:?}", e);
                        Error::BackendError(format!("Failed to create debug messenger: {:?}", e))
                    })?;

                shared.debug = Some(DebugMessenger { loader, messenger });
            }

            let physical_devices = shared
                .instance
                .enumerate_physical_devices()
                .map_err(|e| {
                    boot_error!(SOURCE, "Failed to enumerate physical devices: {:?}", e);
                    Error::BackendError(format!("Failed to enumerate physical devices: {:?}", e))
                })?;

            boot_info!(
                SOURCE,
                "Vulkan instance created (API {}, validation: {}, {} physical device(s))",
                feature_level_from_api_version(api_version),
                validation,
                physical_devices.len()
            );

            Ok(Self {
                shared: Arc::new(shared),
                physical_devices,
                api_version,
                experimental: Vec::new(),
            })
        }
    }

    /// Whether the validation layer feeds the diagnostic queue
    pub fn validation_enabled(&self) -> bool {
        self.shared.debug.is_some()
    }

    fn validation_layer_available(entry: &ash::Entry) -> bool {
        let layers = match unsafe { entry.enumerate_instance_layer_properties() } {
            Ok(layers) => layers,
            Err(_) => return false,
        };
        layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER))
    }

    fn physical_device(&self, adapter: &AdapterDescriptor) -> Result<vk::PhysicalDevice> {
        self.physical_devices
            .get(adapter.index as usize)
            .copied()
            .ok_or_else(|| Error::BackendError(format!("no physical device at index {}", adapter.index)))
    }

    /// First queue family with compute support
    fn compute_queue_family(&self, physical_device: vk::PhysicalDevice) -> Option<u32> {
        let families = unsafe {
            self.shared
                .instance
                .get_physical_device_queue_family_properties(physical_device)
        };
        families
            .iter()
            .position(|family| family.queue_flags.contains(vk::QueueFlags::COMPUTE))
            .map(|index| index as u32)
    }
}

impl Driver for VulkanDriver {
    fn adapter(&self, index: u32) -> Result<Option<AdapterDescriptor>> {
        let Some(&physical_device) = self.physical_devices.get(index as usize) else {
            return Ok(None);
        };

        let props = unsafe { self.shared.instance.get_physical_device_properties(physical_device) };
        let name = props
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| format!("Adapter {}", index));

        Ok(Some(AdapterDescriptor {
            index,
            name,
            vendor_id: props.vendor_id,
            device_id: props.device_id,
            flags: adapter_flags(props.device_type),
            max_feature_level: feature_level_from_api_version(props.api_version.min(self.api_version)),
        }))
    }

    fn probe(&self, adapter: &AdapterDescriptor, level: FeatureLevel) -> bool {
        let Ok(physical_device) = self.physical_device(adapter) else {
            return false;
        };
        adapter.max_feature_level >= level && self.compute_queue_family(physical_device).is_some()
    }

    fn create_device(&self, adapter: &AdapterDescriptor, level: FeatureLevel) -> Result<Box<dyn Device>> {
        let physical_device = self.physical_device(adapter)?;
        if adapter.max_feature_level < level {
            return Err(Error::BackendError(format!(
                "adapter supports feature level {} but {} was requested",
                adapter.max_feature_level, level
            )));
        }

        let queue_family = self
            .compute_queue_family(physical_device)
            .ok_or_else(|| Error::BackendError("No queue family with compute support".to_string()))?;

        let experimental = self.experimental.contains(&adapter.index);
        let extension_names: Vec<*const c_char> = if experimental {
            EXPERIMENTAL_SHADER_MODEL_EXTENSIONS.iter().map(|name| name.as_ptr()).collect()
        } else {
            vec![]
        };

        let queue_priorities = [1.0];
        let queue_create_info = vk::DeviceQueueCreateInfo::default()
            .queue_family_index(queue_family)
            .queue_priorities(&queue_priorities);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&extension_names);

        let device = unsafe {
            self.shared
                .instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    boot_error!(SOURCE, "Failed to create logical device: {:?}", e);
                    Error::BackendError(format!("Failed to create device: {:?}", e))
                })?
        };

        boot_debug!(
            SOURCE,
            "Logical device created on '{}' (queue family {}, experimental shader models: {})",
            adapter.name,
            queue_family,
            experimental
        );

        let shared = Arc::new(DeviceShared {
            device,
            physical_device,
            instance: Arc::clone(&self.shared),
        });

        Ok(Box::new(VulkanDevice::new(
            shared,
            adapter.clone(),
            experimental,
            self.shared.message_store(),
        )))
    }

    fn enable_experimental_shader_models(&mut self, adapter: &AdapterDescriptor) -> Result<()> {
        let physical_device = self.physical_device(adapter)?;

        let available = unsafe {
            self.shared
                .instance
                .enumerate_device_extension_properties(physical_device)
                .map_err(|e| Error::BackendError(format!("Failed to enumerate device extensions: {:?}", e)))?
        };

        for required in EXPERIMENTAL_SHADER_MODEL_EXTENSIONS {
            let present = available
                .iter()
                .any(|ext| ext.extension_name_as_c_str().is_ok_and(|name| name == required));
            if !present {
                return Err(Error::BackendError(format!(
                    "device extension {} not available",
                    required.to_string_lossy()
                )));
            }
        }

        if !self.experimental.contains(&adapter.index) {
            self.experimental.push(adapter.index);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "vulkan_tests.rs"]
mod tests;
