//! Unit tests for vulkan_device.rs (no GPU required)

use compute_bootstrap::bootstrap::device::{FeatureLevel, ShaderModel};

use crate::vulkan_device::shader_model_for;

#[test]
fn test_shader_model_per_api_version() {
    assert_eq!(shader_model_for(FeatureLevel::new(1, 0), false).unwrap(), ShaderModel::new(1, 0));
    assert_eq!(shader_model_for(FeatureLevel::new(1, 1), false).unwrap(), ShaderModel::new(1, 3));
    assert_eq!(shader_model_for(FeatureLevel::new(1, 2), false).unwrap(), ShaderModel::new(1, 5));
    assert_eq!(shader_model_for(FeatureLevel::new(1, 3), false).unwrap(), ShaderModel::new(1, 6));
    assert_eq!(shader_model_for(FeatureLevel::new(1, 4), true).unwrap(), ShaderModel::new(1, 6));
}

#[test]
fn test_experimental_raises_vulkan_1_1() {
    assert_eq!(shader_model_for(FeatureLevel::new(1, 1), true).unwrap(), ShaderModel::new(1, 4));
    assert_eq!(shader_model_for(FeatureLevel::new(1, 0), true).unwrap(), ShaderModel::new(1, 0));
}

#[test]
fn test_unknown_api_version() {
    assert!(shader_model_for(FeatureLevel::new(0, 9), false).is_err());
    assert!(shader_model_for(FeatureLevel::new(2, 0), false).is_err());
}
