//! Unit tests for signature.rs

use crate::error::Error;
use crate::signature::{BindingKind, SignatureBinding, SignatureLayout, MAX_DESCRIPTOR_SETS};

fn storage(set: u32, binding: u32) -> SignatureBinding {
    SignatureBinding {
        set,
        binding,
        kind: BindingKind::StorageBuffer,
        count: 1,
    }
}

fn layout() -> SignatureLayout {
    SignatureLayout {
        bindings: vec![
            storage(0, 0),
            SignatureBinding {
                set: 0,
                binding: 1,
                kind: BindingKind::UniformBuffer,
                count: 1,
            },
            SignatureBinding {
                set: 1,
                binding: 0,
                kind: BindingKind::StorageImage,
                count: 4,
            },
        ],
        push_constant_size: 16,
    }
}

#[test]
fn test_blob_layout_matches_format() {
    let bytes = layout().to_bytes();

    assert_eq!(bytes.len(), 16 + 3 * 16);
    assert_eq!(&bytes[0..4], b"RSIG");
    assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
    assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 3);
    assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), 16);
    // Third record: set 1, binding 0, storage image, count 4
    assert_eq!(&bytes[48..64], &[1, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]);
}

#[test]
fn test_parse_written_blob() {
    let parsed = SignatureLayout::parse(&layout().to_bytes()).unwrap();
    assert_eq!(parsed, layout());
    assert_eq!(parsed.set_count(), 2);
    assert_eq!(parsed.find(0, 1).map(|b| b.kind), Some(BindingKind::UniformBuffer));
    assert!(parsed.find(2, 0).is_none());
}

#[test]
fn test_empty_layout() {
    let empty = SignatureLayout::default();
    let parsed = SignatureLayout::parse(&empty.to_bytes()).unwrap();
    assert!(parsed.bindings.is_empty());
    assert_eq!(parsed.set_count(), 0);
}

#[test]
fn test_truncated_blob_rejected() {
    let bytes = layout().to_bytes();
    for len in [0, 8, 15, bytes.len() - 1] {
        let result = SignatureLayout::parse(&bytes[..len]);
        assert!(matches!(result, Err(Error::RootSignatureCreationFailed(_))), "len {}", len);
    }
}

#[test]
fn test_bad_tag_rejected() {
    let mut bytes = layout().to_bytes();
    bytes[0] = b'X';
    let err = SignatureLayout::parse(&bytes).unwrap_err();
    assert!(err.to_string().contains("bad tag"));
}

#[test]
fn test_bad_version_rejected() {
    let mut bytes = layout().to_bytes();
    bytes[4] = 2;
    let err = SignatureLayout::parse(&bytes).unwrap_err();
    assert!(err.to_string().contains("unsupported version 2"));
}

#[test]
fn test_unknown_kind_rejected() {
    let mut bytes = layout().to_bytes();
    bytes[16 + 8] = 9;
    let err = SignatureLayout::parse(&bytes).unwrap_err();
    assert!(err.to_string().contains("unknown kind 9"));
}

#[test]
fn test_zero_count_rejected() {
    let mut sig = layout();
    sig.bindings[0].count = 0;
    assert!(SignatureLayout::parse(&sig.to_bytes()).is_err());
}

#[test]
fn test_duplicate_slot_rejected() {
    let sig = SignatureLayout {
        bindings: vec![storage(0, 0), storage(0, 0)],
        push_constant_size: 0,
    };
    let err = SignatureLayout::parse(&sig.to_bytes()).unwrap_err();
    assert!(err.to_string().contains("declared twice"));
}

#[test]
fn test_set_index_limit() {
    for set in [MAX_DESCRIPTOR_SETS, 1_000_000, u32::MAX] {
        let blob = SignatureLayout {
            bindings: vec![storage(set, 0)],
            push_constant_size: 0,
        }
        .to_bytes();
        let err = SignatureLayout::parse(&blob).unwrap_err();
        assert!(matches!(err, Error::RootSignatureCreationFailed(_)), "set {}", set);
        assert!(err.to_string().contains("exceeds the limit"));
    }

    let highest = SignatureLayout {
        bindings: vec![storage(MAX_DESCRIPTOR_SETS - 1, 0)],
        push_constant_size: 0,
    };
    assert_eq!(SignatureLayout::parse(&highest.to_bytes()).unwrap().set_count(), MAX_DESCRIPTOR_SETS);
}

#[test]
fn test_set_count_saturates_for_hand_built_layouts() {
    let layout = SignatureLayout {
        bindings: vec![storage(u32::MAX, 0)],
        push_constant_size: 0,
    };
    assert_eq!(layout.set_count(), u32::MAX);
}
