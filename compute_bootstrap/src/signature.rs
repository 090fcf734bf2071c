//! Root signature blob format
//!
//! A root signature describes the resource-binding layout a compiled shader
//! expects. The blob is a 16-byte header followed by one 16-byte record per
//! binding; every field is a little-endian `u32`.

use std::collections::HashSet;
use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};

/// Tag at the start of every signature blob
pub const SIGNATURE_FOUR_CC: [u8; 4] = *b"RSIG";

/// Current blob version
pub const SIGNATURE_VERSION: u32 = 1;

/// Exclusive upper bound on descriptor set indices
pub const MAX_DESCRIPTOR_SETS: u32 = 32;

const HEADER_SIZE: usize = std::mem::size_of::<RawSignatureHeader>();
const BINDING_SIZE: usize = std::mem::size_of::<RawBinding>();

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawSignatureHeader {
    four_cc: [u8; 4],
    version: [u8; 4],
    binding_count: [u8; 4],
    push_constant_size: [u8; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct RawBinding {
    set: [u8; 4],
    binding: [u8; 4],
    kind: [u8; 4],
    count: [u8; 4],
}

/// Kind of resource bound at a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    UniformBuffer,
    StorageBuffer,
    SampledImage,
    StorageImage,
    Sampler,
    CombinedImageSampler,
}

impl BindingKind {
    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(BindingKind::UniformBuffer),
            1 => Some(BindingKind::StorageBuffer),
            2 => Some(BindingKind::SampledImage),
            3 => Some(BindingKind::StorageImage),
            4 => Some(BindingKind::Sampler),
            5 => Some(BindingKind::CombinedImageSampler),
            _ => None,
        }
    }

    fn to_raw(self) -> u32 {
        match self {
            BindingKind::UniformBuffer => 0,
            BindingKind::StorageBuffer => 1,
            BindingKind::SampledImage => 2,
            BindingKind::StorageImage => 3,
            BindingKind::Sampler => 4,
            BindingKind::CombinedImageSampler => 5,
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BindingKind::UniformBuffer => "uniform buffer",
            BindingKind::StorageBuffer => "storage buffer",
            BindingKind::SampledImage => "sampled image",
            BindingKind::StorageImage => "storage image",
            BindingKind::Sampler => "sampler",
            BindingKind::CombinedImageSampler => "combined image sampler",
        };
        f.write_str(name)
    }
}

/// One binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureBinding {
    /// Descriptor set / register space
    pub set: u32,
    /// Binding slot within the set
    pub binding: u32,
    /// Resource kind
    pub kind: BindingKind,
    /// Array size (at least 1)
    pub count: u32,
}

/// Parsed root signature
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureLayout {
    /// Binding slots, in blob order
    pub bindings: Vec<SignatureBinding>,
    /// Bytes of push constants visible to the shader
    pub push_constant_size: u32,
}

impl SignatureLayout {
    /// Parse a signature blob
    ///
    /// # Errors
    ///
    /// `RootSignatureCreationFailed` for a bad tag or version, a truncated or
    /// oversized blob, an unknown binding kind, a set index at or above
    /// `MAX_DESCRIPTOR_SETS`, a zero-sized binding or a slot declared twice.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::RootSignatureCreationFailed(format!(
                "blob is {} bytes, header needs {}",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let header: &RawSignatureHeader = bytemuck::from_bytes(&bytes[..HEADER_SIZE]);
        if header.four_cc != SIGNATURE_FOUR_CC {
            return Err(Error::RootSignatureCreationFailed(format!(
                "bad tag {:?}",
                String::from_utf8_lossy(&header.four_cc)
            )));
        }

        let version = u32::from_le_bytes(header.version);
        if version != SIGNATURE_VERSION {
            return Err(Error::RootSignatureCreationFailed(format!(
                "unsupported version {}",
                version
            )));
        }

        let binding_count = u32::from_le_bytes(header.binding_count) as usize;
        let expected_len = binding_count
            .checked_mul(BINDING_SIZE)
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or_else(|| Error::RootSignatureCreationFailed("binding count overflows".to_string()))?;
        if bytes.len() != expected_len {
            return Err(Error::RootSignatureCreationFailed(format!(
                "blob is {} bytes, {} bindings need {}",
                bytes.len(),
                binding_count,
                expected_len
            )));
        }

        let raw_bindings: &[RawBinding] = bytemuck::cast_slice(&bytes[HEADER_SIZE..]);
        let mut seen = HashSet::new();
        let mut bindings = Vec::with_capacity(binding_count);

        for raw in raw_bindings {
            let set = u32::from_le_bytes(raw.set);
            let binding = u32::from_le_bytes(raw.binding);
            let raw_kind = u32::from_le_bytes(raw.kind);
            let count = u32::from_le_bytes(raw.count);

            let kind = BindingKind::from_raw(raw_kind).ok_or_else(|| {
                Error::RootSignatureCreationFailed(format!(
                    "set {} binding {}: unknown kind {}",
                    set, binding, raw_kind
                ))
            })?;
            if set >= MAX_DESCRIPTOR_SETS {
                return Err(Error::RootSignatureCreationFailed(format!(
                    "set {} binding {}: set index exceeds the limit of {} sets",
                    set, binding, MAX_DESCRIPTOR_SETS
                )));
            }
            if count == 0 {
                return Err(Error::RootSignatureCreationFailed(format!(
                    "set {} binding {}: zero-sized binding",
                    set, binding
                )));
            }
            if !seen.insert((set, binding)) {
                return Err(Error::RootSignatureCreationFailed(format!(
                    "set {} binding {} declared twice",
                    set, binding
                )));
            }

            bindings.push(SignatureBinding { set, binding, kind, count });
        }

        Ok(Self {
            bindings,
            push_constant_size: u32::from_le_bytes(header.push_constant_size),
        })
    }

    /// Serialize to the blob format
    pub fn to_bytes(&self) -> Vec<u8> {
        let header = RawSignatureHeader {
            four_cc: SIGNATURE_FOUR_CC,
            version: SIGNATURE_VERSION.to_le_bytes(),
            binding_count: (self.bindings.len() as u32).to_le_bytes(),
            push_constant_size: self.push_constant_size.to_le_bytes(),
        };

        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.bindings.len() * BINDING_SIZE);
        bytes.extend_from_slice(bytemuck::bytes_of(&header));
        for binding in &self.bindings {
            let raw = RawBinding {
                set: binding.set.to_le_bytes(),
                binding: binding.binding.to_le_bytes(),
                kind: binding.kind.to_raw().to_le_bytes(),
                count: binding.count.to_le_bytes(),
            };
            bytes.extend_from_slice(bytemuck::bytes_of(&raw));
        }
        bytes
    }

    /// Binding declared at `(set, binding)`, if any
    pub fn find(&self, set: u32, binding: u32) -> Option<&SignatureBinding> {
        self.bindings.iter().find(|b| b.set == set && b.binding == binding)
    }

    /// Number of descriptor sets (highest set index + 1)
    pub fn set_count(&self) -> u32 {
        self.bindings.iter().map(|b| b.set.saturating_add(1)).max().unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
