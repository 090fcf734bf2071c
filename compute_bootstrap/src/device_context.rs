/// DeviceContext - owns the logical device and its capability queries

use std::sync::Arc;

use crate::device::{AdapterDescriptor, DiagnosticQueue, Device, Driver, FeatureLevel, ShaderModel};
use crate::error::{Error, Result};
use crate::{boot_err, boot_info, boot_warn};

const SOURCE: &str = "bootstrap::DeviceContext";

/// Logical device plus everything derived from it at creation
///
/// The device is released when the context is dropped.
pub struct DeviceContext {
    adapter: AdapterDescriptor,
    feature_level: FeatureLevel,
    device: Box<dyn Device>,
    shader_model: Option<ShaderModel>,
    diagnostic_sink: Option<Arc<dyn DiagnosticQueue>>,
    experimental_shader_models: bool,
}

impl DeviceContext {
    /// Create the device on `adapter` at `level`
    ///
    /// Enables experimental shader models and recreates the device when the
    /// extended interface is missing.
    ///
    /// # Errors
    ///
    /// * `DeviceCreationFailed` - the driver rejected the adapter
    /// * `ExperimentalFeatureUnsupported` - the experimental switch or the
    ///   recreation failed
    pub fn create(driver: &mut dyn Driver, adapter: &AdapterDescriptor, level: FeatureLevel) -> Result<Self> {
        boot_info!(SOURCE, "Creating device using adapter {} at feature level {}", adapter.index, level);

        let mut device = driver
            .create_device(adapter, level)
            .map_err(|e| boot_err!(SOURCE, Error::DeviceCreationFailed(e.to_string())))?;

        let mut experimental_shader_models = false;
        if device.has_extended_interface() {
            boot_info!(SOURCE, "Extended device interface available");
        } else {
            boot_info!(SOURCE, "Extended device interface missing, enabling experimental shader models");

            driver.enable_experimental_shader_models(adapter).map_err(|e| {
                boot_err!(SOURCE, Error::ExperimentalFeatureUnsupported(format!(
                    "host OS/driver too old: {}",
                    e
                )))
            })?;

            // Old device first: some drivers allow one device per adapter
            drop(device);
            device = driver.create_device(adapter, level).map_err(|e| {
                boot_err!(SOURCE, Error::ExperimentalFeatureUnsupported(format!(
                    "device recreation with experimental shader models failed: {}",
                    e
                )))
            })?;
            experimental_shader_models = true;
            boot_info!(SOURCE, "Enabled experimental shader models");
        }

        let shader_model = match Self::query_shader_model(device.as_ref()) {
            Ok(model) => {
                boot_info!(SOURCE, "Highest supported shader model version: {}", model);
                Some(model)
            }
            Err(e) => {
                boot_warn!(SOURCE, "Shader model query failed: {}", e);
                None
            }
        };

        let diagnostic_sink = Self::try_acquire_diagnostic_sink(device.as_ref());

        Ok(Self {
            adapter: adapter.clone(),
            feature_level: level,
            device,
            shader_model,
            diagnostic_sink,
            experimental_shader_models,
        })
    }

    /// Highest shader model the device supports (advisory)
    pub fn query_shader_model(device: &dyn Device) -> Result<ShaderModel> {
        device.highest_shader_model()
    }

    /// Driver message queue, if the driver is debug-capable
    pub fn try_acquire_diagnostic_sink(device: &dyn Device) -> Option<Arc<dyn DiagnosticQueue>> {
        let sink = device.diagnostic_queue();
        if sink.is_none() {
            boot_warn!(SOURCE, "Missing debug layer. Driver diagnostics will be unavailable");
        }
        sink
    }

    pub fn adapter(&self) -> &AdapterDescriptor {
        &self.adapter
    }

    pub fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    pub fn shader_model(&self) -> Option<ShaderModel> {
        self.shader_model
    }

    pub fn diagnostic_sink(&self) -> Option<&Arc<dyn DiagnosticQueue>> {
        self.diagnostic_sink.as_ref()
    }

    /// Whether the device was recreated with experimental shader models
    pub fn experimental_shader_models(&self) -> bool {
        self.experimental_shader_models
    }
}

#[cfg(test)]
#[path = "device_context_tests.rs"]
mod tests;
