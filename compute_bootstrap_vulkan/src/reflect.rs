/// SPIR-V reflection - shader interface extraction and root signature checks

use compute_bootstrap::bootstrap::signature::{BindingKind, SignatureLayout};
use compute_bootstrap::bootstrap::{Error, Result};
use compute_bootstrap::boot_err;

/// Descriptor a shader declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectedResource {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    /// `None` for descriptor types a root signature cannot express
    pub kind: Option<BindingKind>,
    /// Descriptor type as reported by the reflector (for messages)
    pub type_name: String,
}

/// Resource interface of a compiled shader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    /// First entry point in the module
    pub entry_point: String,
    pub resources: Vec<ReflectedResource>,
    /// Largest push-constant block, in bytes
    pub push_constant_size: u32,
}

/// Reflect the resource interface of a SPIR-V module
///
/// # Errors
///
/// `BackendError` if the module cannot be parsed or has no entry point.
pub fn reflect_shader(code: &[u32]) -> Result<ShaderInterface> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(code)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| boot_err!("bootstrap::vulkan", Error::BackendError(format!(
            "SPIR-V reflection failed: {:?}", e
        ))))?;

    let entry_point = entry_points
        .first()
        .ok_or_else(|| Error::BackendError("SPIR-V module has no entry point".to_string()))?;

    let mut interface = ShaderInterface {
        entry_point: entry_point.name.clone(),
        ..ShaderInterface::default()
    };

    for var in entry_point.vars.iter() {
        match var {
            spirq::var::Variable::Descriptor {
                name, desc_bind, desc_ty, ..
            } => {
                interface.resources.push(ReflectedResource {
                    name: name.clone().unwrap_or_default(),
                    set: desc_bind.set(),
                    binding: desc_bind.bind(),
                    kind: spirq_desc_type_to_binding_kind(desc_ty),
                    type_name: format!("{:?}", desc_ty),
                });
            }
            spirq::var::Variable::PushConstant { ty, .. } => {
                let size = ty.nbyte().unwrap_or(0) as u32;
                interface.push_constant_size = interface.push_constant_size.max(size);
            }
            _ => {}
        }
    }

    Ok(interface)
}

/// Convert spirq descriptor type to a signature binding kind
fn spirq_desc_type_to_binding_kind(desc_ty: &spirq::ty::DescriptorType) -> Option<BindingKind> {
    use spirq::ty::DescriptorType;
    match desc_ty {
        DescriptorType::UniformBuffer(..) => Some(BindingKind::UniformBuffer),
        DescriptorType::StorageBuffer(..) => Some(BindingKind::StorageBuffer),
        DescriptorType::SampledImage(..) => Some(BindingKind::SampledImage),
        DescriptorType::StorageImage(..) => Some(BindingKind::StorageImage),
        DescriptorType::Sampler(..) => Some(BindingKind::Sampler),
        DescriptorType::CombinedImageSampler(..) => Some(BindingKind::CombinedImageSampler),
        _ => None,
    }
}

/// Every way `interface` disagrees with `layout`
///
/// One message per problem, in resource order. An empty result means the
/// shader can run against the layout.
pub fn check_interface(interface: &ShaderInterface, layout: &SignatureLayout) -> Vec<String> {
    let mut problems = Vec::new();

    for resource in &interface.resources {
        let label = if resource.name.is_empty() {
            format!("set {} binding {}", resource.set, resource.binding)
        } else {
            format!("set {} binding {} ('{}')", resource.set, resource.binding, resource.name)
        };

        let Some(kind) = resource.kind else {
            problems.push(format!(
                "Shader resource {} has unsupported descriptor type {}",
                label, resource.type_name
            ));
            continue;
        };

        match layout.find(resource.set, resource.binding) {
            None => problems.push(format!(
                "Shader resource {} ({}) is not declared in the root signature",
                label, kind
            )),
            Some(declared) if declared.kind != kind => problems.push(format!(
                "Shader resource {} is a {} but the root signature declares a {}",
                label, kind, declared.kind
            )),
            Some(_) => {}
        }
    }

    if interface.push_constant_size > layout.push_constant_size {
        problems.push(format!(
            "Shader uses {} bytes of push constants but the root signature provides {}",
            interface.push_constant_size, layout.push_constant_size
        ));
    }

    problems
}

#[cfg(test)]
#[path = "reflect_tests.rs"]
mod tests;
