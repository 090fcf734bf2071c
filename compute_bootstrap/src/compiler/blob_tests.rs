//! Unit tests for blob.rs

use crate::compiler::{Encoding, ShaderBlob};

#[test]
fn test_detect_boms() {
    assert_eq!(Encoding::detect(&[0xEF, 0xBB, 0xBF, b'a']), Encoding::Utf8);
    assert_eq!(Encoding::detect(&[0xFF, 0xFE, b'a', 0]), Encoding::Utf16Le);
    assert_eq!(Encoding::detect(&[0xFE, 0xFF, 0, b'a']), Encoding::Utf16Be);
}

#[test]
fn test_detect_plain_text_and_binary() {
    assert_eq!(Encoding::detect(b"fn main() {}"), Encoding::Utf8);
    assert_eq!(Encoding::detect(&[0x03, 0x02, 0x23, 0x07, 0x00]), Encoding::Unknown);
    assert_eq!(Encoding::detect(&[0xC3, 0x28]), Encoding::Unknown);
    assert!(!Encoding::Unknown.is_known());
    assert!(Encoding::Utf16Le.is_known());
}

#[test]
fn test_to_text_strips_bom() {
    let blob = ShaderBlob::detect(vec![0xEF, 0xBB, 0xBF, b'o', b'k']);
    assert_eq!(blob.to_text(), "ok");
}

#[test]
fn test_to_text_decodes_utf16() {
    let mut le = vec![0xFF, 0xFE];
    let mut be = vec![0xFE, 0xFF];
    for unit in "cs_1_3".encode_utf16() {
        le.extend_from_slice(&unit.to_le_bytes());
        be.extend_from_slice(&unit.to_be_bytes());
    }

    assert_eq!(ShaderBlob::detect(le).to_text(), "cs_1_3");
    assert_eq!(ShaderBlob::detect(be).to_text(), "cs_1_3");
}

#[test]
fn test_clone_shares_bytes() {
    let blob = ShaderBlob::from_text("shared");
    let copy = blob.clone();
    assert_eq!(blob, copy);
    assert_eq!(blob.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
}

#[test]
fn test_mutable_blob_does_not_alias_original() {
    let original = ShaderBlob::from_binary(vec![0u8; 8]);
    let mut mutable = original.clone().into_mutable();
    mutable.as_mut_bytes()[0] = 0xAA;

    let frozen = mutable.freeze();
    assert_eq!(original.as_bytes()[0], 0);
    assert_eq!(frozen.as_bytes()[0], 0xAA);
    assert_eq!(frozen.encoding(), Encoding::Unknown);
}
