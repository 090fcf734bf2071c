//! Unit tests for toolchain.rs

use crate::compiler::mock_toolchain::{MockFailures, MockRuntime};
use crate::compiler::{CompilerToolchain, OperationResult, OperationStatus, ShaderBlob};
use crate::error::Error;

#[test]
fn test_bootstrap_success() {
    let mut runtime = MockRuntime::new();
    let handles = CompilerToolchain::bootstrap(&mut runtime).unwrap();

    assert!(handles.library().create_include_handler().is_ok());
    assert!(handles.compiler().disassemble(&ShaderBlob::from_binary(vec![0u8; 4])).is_err());
}

#[test]
fn test_bootstrap_load_failure() {
    let mut runtime = MockRuntime::with_failures(MockFailures {
        initialize: true,
        ..Default::default()
    });
    let result = CompilerToolchain::bootstrap(&mut runtime);
    assert!(matches!(result, Err(Error::CompilerLoadFailed(_))));
}

#[test]
fn test_bootstrap_reports_each_service() {
    let cases: [(MockFailures, fn(&Error) -> bool); 3] = [
        (
            MockFailures { compiler: true, ..Default::default() },
            |e| matches!(e, Error::CompileServiceUnavailable(_)),
        ),
        (
            MockFailures { library: true, ..Default::default() },
            |e| matches!(e, Error::LibraryServiceUnavailable(_)),
        ),
        (
            MockFailures { validator: true, ..Default::default() },
            |e| matches!(e, Error::ValidatorServiceUnavailable(_)),
        ),
    ];

    for (failures, expected) in cases {
        let mut runtime = MockRuntime::with_failures(failures);
        match CompilerToolchain::bootstrap(&mut runtime) {
            Err(e) => assert!(expected(&e), "unexpected error {:?}", e),
            Ok(_) => panic!("partial bootstrap must fail"),
        }
    }
}

#[test]
fn test_operation_result_accessors() {
    let ok = OperationResult::success(Some(ShaderBlob::from_binary(vec![1, 2, 3])));
    assert!(ok.succeeded());
    assert_eq!(ok.error_text(), "");

    let failed = OperationResult::failure(ShaderBlob::from_text("error: nope"));
    assert_eq!(failed.status, OperationStatus::Failure);
    assert!(failed.result.is_none());
    assert_eq!(failed.error_text(), "error: nope");
}
