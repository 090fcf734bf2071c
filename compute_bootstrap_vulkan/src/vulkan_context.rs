/// Shared Vulkan handles - instance and device lifetimes
///
/// Every Vulkan object holds an `Arc` to the context it was created from, so
/// destruction always runs child-first: pipelines and layouts, then the
/// device, then the debug messenger and finally the instance.

use ash::vk;
use std::sync::Arc;

use crate::debug::MessageStore;

/// Debug messenger registered on an instance
pub(crate) struct DebugMessenger {
    pub loader: ash::ext::debug_utils::Instance,
    pub messenger: vk::DebugUtilsMessengerEXT,
}

/// Instance-level state shared by the driver and every device
pub(crate) struct InstanceShared {
    /// Keeps the Vulkan library loaded
    #[allow(dead_code)]
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    /// Diagnostic queue of every device; the messenger's user data points here
    pub store: Arc<MessageStore>,
    /// Present only with validation enabled
    pub debug: Option<DebugMessenger>,
}

impl InstanceShared {
    pub fn message_store(&self) -> Arc<MessageStore> {
        Arc::clone(&self.store)
    }
}

impl Drop for InstanceShared {
    fn drop(&mut self) {
        unsafe {
            if let Some(debug) = self.debug.take() {
                debug.loader.destroy_debug_utils_messenger(debug.messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Device-level state shared by every object created on a device
pub(crate) struct DeviceShared {
    pub device: ash::Device,
    pub physical_device: vk::PhysicalDevice,
    /// Destroyed after the device
    pub instance: Arc<InstanceShared>,
}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}
