//! Binary shader container
//!
//! Layout (all integers little-endian):
//!
//! | offset | size | field                        |
//! |--------|------|------------------------------|
//! | 0      | 4    | tag `CSBC`                   |
//! | 4      | 16   | digest (four 32-bit words)   |
//! | 20     | 4    | format version               |
//! | 24     | 4    | payload size                 |
//! | 28     | n    | payload                      |
//!
//! The digest is the first 16 bytes of SHA-256 over everything after the
//! digest field. An all-zero digest marks an unsigned container.

use bytemuck::{Pod, Zeroable};
use sha2::{Digest, Sha256};

use crate::compiler::{CompileService, ShaderBlob, ValidatorFlags, ValidatorService};
use crate::error::{Error, Result};
use crate::{boot_debug, boot_err, boot_info};

const SOURCE: &str = "bootstrap::ShaderContainer";

/// Tag at the start of every container
pub const CONTAINER_FOUR_CC: [u8; 4] = *b"CSBC";

/// Current container version
pub const CONTAINER_VERSION: u32 = 1;

/// Size of the tag + digest prefix
pub const CONTAINER_HEADER_SIZE: usize = std::mem::size_of::<ContainerHeader>();

/// Offset of the payload
pub const CONTAINER_PAYLOAD_OFFSET: usize = CONTAINER_HEADER_SIZE + 8;

/// Read-only view of a container prefix
///
/// Byte arrays keep the alignment at 1 so the view can be taken on any
/// buffer without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ContainerHeader {
    pub four_cc: [u8; 4],
    pub hash_digest: [[u8; 4]; 4],
}

impl ContainerHeader {
    /// View the prefix of `bytes`, or `None` if it is too short
    pub fn view(bytes: &[u8]) -> Option<&ContainerHeader> {
        bytes
            .get(..CONTAINER_HEADER_SIZE)
            .map(bytemuck::from_bytes::<ContainerHeader>)
    }

    /// Digest as four 32-bit words
    pub fn digest_words(&self) -> [u32; 4] {
        self.hash_digest.map(u32::from_le_bytes)
    }

    /// Whether any digest word is non-zero
    pub fn has_digest(&self) -> bool {
        self.digest_words().iter().any(|&word| word != 0)
    }
}

// ============================================================================
// Header checks and signing primitives
// ============================================================================

/// Whether the container carries a digest
///
/// Structural check only: the digest is not verified. Blobs shorter than the
/// header are unsigned.
pub fn is_signed(bytes: &[u8]) -> bool {
    ContainerHeader::view(bytes).is_some_and(ContainerHeader::has_digest)
}

/// Digest of everything after the digest field
///
/// # Errors
///
/// `ValidationFailed` if `bytes` is shorter than the header.
pub fn compute_digest(bytes: &[u8]) -> Result<[u8; 16]> {
    let body = bytes.get(CONTAINER_HEADER_SIZE..).ok_or_else(|| {
        Error::ValidationFailed(format!(
            "container is {} bytes, header needs {}",
            bytes.len(),
            CONTAINER_HEADER_SIZE
        ))
    })?;

    let hash = Sha256::digest(body);
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&hash[..16]);
    Ok(digest)
}

/// Whether the stored digest matches the container body
pub fn verify_digest(bytes: &[u8]) -> bool {
    match (ContainerHeader::view(bytes), compute_digest(bytes)) {
        (Some(header), Ok(digest)) => header.has_digest() && bytemuck::bytes_of(&header.hash_digest) == digest,
        _ => false,
    }
}

/// Compute and write the digest into `bytes`
pub fn sign_in_place(bytes: &mut [u8]) -> Result<()> {
    let digest = compute_digest(bytes)?;
    bytes[4..CONTAINER_HEADER_SIZE].copy_from_slice(&digest);
    Ok(())
}

/// Check tag, version and payload size; returns the payload
///
/// # Errors
///
/// `ValidationFailed` describing the first structural problem.
pub fn payload(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < CONTAINER_PAYLOAD_OFFSET {
        return Err(Error::ValidationFailed(format!(
            "container is {} bytes, header needs {}",
            bytes.len(),
            CONTAINER_PAYLOAD_OFFSET
        )));
    }
    if bytes[..4] != CONTAINER_FOUR_CC {
        return Err(Error::ValidationFailed(format!(
            "bad container tag {:?}",
            String::from_utf8_lossy(&bytes[..4])
        )));
    }

    let version = read_u32(bytes, CONTAINER_HEADER_SIZE);
    if version != CONTAINER_VERSION {
        return Err(Error::ValidationFailed(format!("unsupported container version {}", version)));
    }

    let size = read_u32(bytes, CONTAINER_HEADER_SIZE + 4) as usize;
    let body = &bytes[CONTAINER_PAYLOAD_OFFSET..];
    if body.len() != size {
        return Err(Error::ValidationFailed(format!(
            "payload size field says {} bytes, container holds {}",
            size,
            body.len()
        )));
    }
    Ok(body)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// Wrap a payload into an unsigned container
pub fn wrap(payload: &[u8]) -> Vec<u8> {
    let header = ContainerHeader {
        four_cc: CONTAINER_FOUR_CC,
        hash_digest: [[0; 4]; 4],
    };

    let mut bytes = Vec::with_capacity(CONTAINER_PAYLOAD_OFFSET + payload.len());
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

// ============================================================================
// ShaderContainer
// ============================================================================

/// Signing and inspection of compiled containers
pub struct ShaderContainer;

impl ShaderContainer {
    /// Whether `blob` carries a digest
    pub fn is_signed(blob: &ShaderBlob) -> bool {
        is_signed(blob.as_bytes())
    }

    /// Sign `blob` through the validator unless it already carries a digest
    ///
    /// Already-signed blobs are returned unchanged without calling the
    /// validator.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if the validator reports failure or leaves the
    /// digest empty.
    pub fn ensure_signed(blob: ShaderBlob, validator: &dyn ValidatorService) -> Result<ShaderBlob> {
        let signed = Self::is_signed(&blob);
        boot_info!(SOURCE, "Container signing status: {}", signed);
        if signed {
            return Ok(blob);
        }

        let mut buffer = blob.into_mutable();
        let result = validator
            .validate(&mut buffer, ValidatorFlags::IN_PLACE_EDIT)
            .map_err(|e| boot_err!(SOURCE, Error::ValidationFailed(e.to_string())))?;

        if !result.succeeded() {
            let text = result.error_text();
            let text = if text.trim().is_empty() {
                "validator reported failure".to_string()
            } else {
                text
            };
            return Err(boot_err!(SOURCE, Error::ValidationFailed(text)));
        }

        let signed = buffer.freeze();
        if !Self::is_signed(&signed) {
            return Err(boot_err!(SOURCE, Error::ValidationFailed(
                "validator succeeded but left the digest empty".to_string()
            )));
        }

        boot_debug!(SOURCE, "Container signed ({} bytes)", signed.len());
        Ok(signed)
    }

    /// Text form of a container, for inspection only
    ///
    /// # Errors
    ///
    /// `DisassemblyFailed`. Non-fatal: callers log it and keep the blob.
    pub fn disassemble(blob: &ShaderBlob, compiler: &dyn CompileService) -> Result<String> {
        let text = compiler
            .disassemble(blob)
            .map_err(|e| Error::DisassemblyFailed(e.to_string()))?;
        Ok(text.to_text())
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
