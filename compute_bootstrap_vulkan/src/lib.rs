/*!
# Compute Bootstrap - Vulkan + naga Backend

Concrete implementations of the compute_bootstrap traits.

- **VulkanDriver** / **VulkanDevice**: the graphics driver through Ash. With
  validation enabled, the Khronos validation layer feeds a message store that
  serves as the device's diagnostic queue.
- **NagaRuntime**: the compiler toolchain through naga (WGSL in, SPIR-V out,
  wrapped in a signed shader container).

```no_run
use compute_bootstrap::bootstrap::{Config, Session};
use compute_bootstrap_vulkan::{NagaRuntime, VulkanDriver};

let config = Config {
    root_signature: Some("shaders/RootSignature.rsig".into()),
    ..Config::default()
}
.with_source("shaders/ComputeShader.wgsl", "main", "cs_1_3");

let mut driver = VulkanDriver::new(&config)?;
let mut runtime = NagaRuntime::new();
let session = Session::bootstrap(&mut driver, &mut runtime, &config)?;
let report = session.run(&config)?;
# Ok::<(), compute_bootstrap::bootstrap::Error>(())
```
*/

// Vulkan implementation modules
mod vulkan;
mod vulkan_context;
mod vulkan_device;
mod vulkan_pipeline;
mod reflect;
mod debug;

// Compiler toolchain modules
mod naga_toolchain;
mod preprocessor;

pub use vulkan::VulkanDriver;
pub use vulkan_device::VulkanDevice;
pub use vulkan_pipeline::{VulkanComputePipeline, VulkanRootSignature};
pub use naga_toolchain::{CompileOptions, NagaCompiler, NagaLibrary, NagaRuntime, NagaValidator};
pub use preprocessor::{PreprocessError, Preprocessor};

// Re-export reflection and debug utilities
pub use reflect::{check_interface, reflect_shader, ReflectedResource, ShaderInterface};
pub use debug::{EchoConfig, MessageStore};
