/// Mock driver for unit tests (no GPU required)
///
/// Adapters, probe results and device behavior are configured up front.
/// The mock device "reflects" a container payload by scanning it for
/// `@group(N) @binding(M)` pairs and checks them against the root signature,
/// recording mismatches in its diagnostic queue.

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::container;
use crate::device::{
    AdapterDescriptor, AdapterFlags, ComputePipeline, ComputePipelineDesc, DiagnosticQueue,
    Device, Driver, FeatureLevel, RootSignature, ShaderModel,
};
use crate::error::{Error, Result};
use crate::signature::SignatureLayout;

// ============================================================================
// Mock Driver
// ============================================================================

pub struct MockDriver {
    pub adapters: Vec<AdapterDescriptor>,
    /// Indices whose probe succeeds
    pub capable: Vec<u32>,
    /// Indices passed to `probe`, in call order
    pub probe_calls: Arc<Mutex<Vec<u32>>>,
    /// Devices created so far
    pub devices_created: Arc<Mutex<usize>>,
    pub reject_device: bool,
    /// Devices expose the extended interface without any switch
    pub extended_interface: bool,
    pub experimental_supported: bool,
    pub experimental_enabled: bool,
    /// Fail device creation once experimental shader models are on
    pub reject_after_experimental: bool,
    pub shader_model: Option<ShaderModel>,
    /// Devices expose a diagnostic queue
    pub debug_layer: bool,
    /// Messages already stored when a device is created
    pub preset_messages: Vec<String>,
}

impl MockDriver {
    /// Driver exposing `adapters`, all capable, with a debug layer
    pub fn new(adapters: Vec<AdapterDescriptor>) -> Self {
        let capable = adapters.iter().map(|a| a.index).collect();
        Self {
            adapters,
            capable,
            probe_calls: Arc::new(Mutex::new(Vec::new())),
            devices_created: Arc::new(Mutex::new(0)),
            reject_device: false,
            extended_interface: true,
            experimental_supported: true,
            experimental_enabled: false,
            reject_after_experimental: false,
            shader_model: Some(ShaderModel::new(1, 5)),
            debug_layer: true,
            preset_messages: Vec::new(),
        }
    }

    /// Single hardware adapter at index 0
    pub fn single() -> Self {
        Self::new(vec![mock_adapter(0, "Mock GPU", AdapterFlags::empty())])
    }

    pub fn probe_call_count(&self) -> usize {
        self.probe_calls.lock().unwrap().len()
    }

    pub fn device_count(&self) -> usize {
        *self.devices_created.lock().unwrap()
    }
}

/// Adapter descriptor for tests
pub fn mock_adapter(index: u32, name: &str, flags: AdapterFlags) -> AdapterDescriptor {
    AdapterDescriptor {
        index,
        name: name.to_string(),
        vendor_id: 0x1234,
        device_id: 0x5678 + index,
        flags,
        max_feature_level: FeatureLevel::new(1, 3),
    }
}

impl Driver for MockDriver {
    fn adapter(&self, index: u32) -> Result<Option<AdapterDescriptor>> {
        Ok(self.adapters.get(index as usize).cloned())
    }

    fn probe(&self, adapter: &AdapterDescriptor, level: FeatureLevel) -> bool {
        self.probe_calls.lock().unwrap().push(adapter.index);
        self.capable.contains(&adapter.index) && adapter.max_feature_level >= level
    }

    fn create_device(&self, adapter: &AdapterDescriptor, _level: FeatureLevel) -> Result<Box<dyn Device>> {
        if self.reject_device || (self.experimental_enabled && self.reject_after_experimental) {
            return Err(Error::BackendError("mock device creation rejected".to_string()));
        }
        *self.devices_created.lock().unwrap() += 1;

        let queue = MockDiagnosticQueue::with_messages(self.preset_messages.clone());
        Ok(Box::new(MockDevice {
            adapter: adapter.clone(),
            extended_interface: self.extended_interface,
            shader_model: self.shader_model,
            queue: self.debug_layer.then(|| Arc::new(queue)),
        }))
    }

    fn enable_experimental_shader_models(&mut self, _adapter: &AdapterDescriptor) -> Result<()> {
        if !self.experimental_supported {
            return Err(Error::BackendError("experimental shader models unsupported".to_string()));
        }
        self.experimental_enabled = true;
        Ok(())
    }
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockDevice {
    adapter: AdapterDescriptor,
    extended_interface: bool,
    shader_model: Option<ShaderModel>,
    queue: Option<Arc<MockDiagnosticQueue>>,
}

impl MockDevice {
    fn report(&self, message: String) {
        if let Some(queue) = &self.queue {
            queue.push(message);
        }
    }
}

impl Device for MockDevice {
    fn adapter(&self) -> &AdapterDescriptor {
        &self.adapter
    }

    fn has_extended_interface(&self) -> bool {
        self.extended_interface
    }

    fn highest_shader_model(&self) -> Result<ShaderModel> {
        self.shader_model
            .ok_or_else(|| Error::BackendError("shader model query unsupported".to_string()))
    }

    fn diagnostic_queue(&self) -> Option<Arc<dyn DiagnosticQueue>> {
        self.queue.clone().map(|q| q as Arc<dyn DiagnosticQueue>)
    }

    fn create_root_signature(&self, blob: &[u8]) -> Result<Arc<dyn RootSignature>> {
        let layout = SignatureLayout::parse(blob)?;
        Ok(Arc::new(MockRootSignature { layout }))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc<'_>) -> Result<Arc<dyn ComputePipeline>> {
        let bytes = desc.bytecode.as_bytes();
        if !container::verify_digest(bytes) {
            self.report("shader container is unsigned or its digest does not match".to_string());
            return Err(Error::BackendError("invalid shader bytecode".to_string()));
        }
        let payload = container::payload(bytes).map_err(|e| Error::BackendError(e.to_string()))?;

        let layout = desc.root_signature.layout();
        let mut mismatches = 0;
        for (set, binding) in scan_bindings(&String::from_utf8_lossy(payload)) {
            if layout.find(set, binding).is_none() {
                self.report(format!(
                    "shader uses set {} binding {} which the root signature does not declare",
                    set, binding
                ));
                mismatches += 1;
            }
        }
        if mismatches > 0 {
            return Err(Error::BackendError(format!("{} binding mismatches", mismatches)));
        }

        Ok(Arc::new(MockComputePipeline {
            entry_point: "main".to_string(),
        }))
    }
}

/// `(group, binding)` pairs declared as `@group(N) @binding(M)`
fn scan_bindings(text: &str) -> Vec<(u32, u32)> {
    fn number_after(line: &str, attribute: &str) -> Option<u32> {
        let start = line.find(attribute)? + attribute.len();
        let end = line[start..].find(')')? + start;
        line[start..end].trim().parse().ok()
    }

    text.lines()
        .filter_map(|line| Some((number_after(line, "@group(")?, number_after(line, "@binding(")?)))
        .collect()
}

// ============================================================================
// Mock resources
// ============================================================================

pub struct MockRootSignature {
    pub layout: SignatureLayout,
}

impl RootSignature for MockRootSignature {
    fn layout(&self) -> &SignatureLayout {
        &self.layout
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockComputePipeline {
    pub entry_point: String,
}

impl ComputePipeline for MockComputePipeline {
    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Diagnostic Queue
// ============================================================================

/// Message store recording every protocol call
#[derive(Default)]
pub struct MockDiagnosticQueue {
    messages: Mutex<Vec<String>>,
    /// `"size <i>"` / `"fetch <i>"` / `"clear"` in call order
    pub calls: Mutex<Vec<String>>,
}

impl MockDiagnosticQueue {
    pub fn with_messages(messages: Vec<String>) -> Self {
        Self {
            messages: Mutex::new(messages),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, message: String) {
        self.messages.lock().unwrap().push(message);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl DiagnosticQueue for MockDiagnosticQueue {
    fn stored_message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    fn message_size(&self, index: usize) -> Result<usize> {
        self.calls.lock().unwrap().push(format!("size {}", index));
        self.messages
            .lock()
            .unwrap()
            .get(index)
            .map(String::len)
            .ok_or_else(|| Error::BackendError(format!("no message at {}", index)))
    }

    fn fetch_message(&self, index: usize, buffer: &mut [u8]) -> Result<usize> {
        self.calls.lock().unwrap().push(format!("fetch {}", index));
        let messages = self.messages.lock().unwrap();
        let message = messages
            .get(index)
            .ok_or_else(|| Error::BackendError(format!("no message at {}", index)))?;
        if buffer.len() < message.len() {
            return Err(Error::BackendError("buffer too small".to_string()));
        }
        buffer[..message.len()].copy_from_slice(message.as_bytes());
        Ok(message.len())
    }

    fn clear(&self) {
        self.calls.lock().unwrap().push("clear".to_string());
        self.messages.lock().unwrap().clear();
    }
}
