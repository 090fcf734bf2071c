//! Unit tests for shader_compiler.rs

use crate::compiler::mock_toolchain::MockRuntime;
use crate::compiler::{CompileRequest, CompileResult, CompilerHandles, CompilerToolchain, ShaderCompiler};
use crate::container;
use crate::error::Error;

const GOOD_SOURCE: &str = "@compute @workgroup_size(1)\nfn main() {\n}\n";
const BROKEN_SOURCE: &str = "@compute @workgroup_size(1)\nfn main() {\n";

fn toolchain(files: &[(&str, &str)]) -> (MockRuntime, CompilerHandles) {
    let mut runtime = MockRuntime::new();
    for (path, contents) in files {
        runtime.add_file(*path, contents.as_bytes());
    }
    let handles = CompilerToolchain::bootstrap(&mut runtime).unwrap();
    (runtime, handles)
}

#[test]
fn test_known_good_source_yields_binary() {
    let (_runtime, handles) = toolchain(&[("shaders/cs.wgsl", GOOD_SOURCE)]);
    let request = CompileRequest::new("shaders/cs.wgsl", "main", "cs_6_0");

    let result = ShaderCompiler::new(&handles).compile(&request).unwrap();

    assert!(result.is_success());
    assert!(result.diagnostics().is_none());
    let binary = result.binary().unwrap();
    assert!(!binary.is_empty());
    assert!(container::payload(binary.as_bytes()).is_ok());
}

#[test]
fn test_syntax_error_yields_diagnostics() {
    let (_runtime, handles) = toolchain(&[("shaders/cs.wgsl", BROKEN_SOURCE)]);
    let request = CompileRequest::new("shaders/cs.wgsl", "main", "cs_6_0");

    let result = ShaderCompiler::new(&handles).compile(&request).unwrap();

    match result {
        CompileResult::Diagnostics(text) => {
            assert!(!text.is_empty());
            assert!(text.contains("expected '}'"));
        }
        CompileResult::Binary(_) => panic!("broken source must not produce a binary"),
    }
}

#[test]
fn test_compile_to_binary_short_circuits_on_diagnostics() {
    let (_runtime, handles) = toolchain(&[("shaders/cs.wgsl", BROKEN_SOURCE)]);
    let request = CompileRequest::new("shaders/cs.wgsl", "main", "cs_6_0");

    let err = ShaderCompiler::new(&handles).compile_to_binary(&request).unwrap_err();
    assert!(matches!(err, Error::CompileError(ref text) if text.contains("unbalanced braces")));
}

#[test]
fn test_missing_source_is_load_failure() {
    let (_runtime, handles) = toolchain(&[]);
    let request = CompileRequest::new("shaders/missing.wgsl", "main", "cs_6_0");

    let err = ShaderCompiler::new(&handles).compile(&request).unwrap_err();
    assert!(matches!(err, Error::SourceLoadFailed(_)));
}

#[test]
fn test_bad_profile_is_invocation_failure() {
    let (_runtime, handles) = toolchain(&[("shaders/cs.wgsl", GOOD_SOURCE)]);
    let request = CompileRequest::new("shaders/cs.wgsl", "main", "compute");

    let err = ShaderCompiler::new(&handles).compile(&request).unwrap_err();
    assert!(matches!(err, Error::CompileInvocationFailed(_)));
}

#[test]
fn test_missing_entry_point_is_diagnostic() {
    let (_runtime, handles) = toolchain(&[("shaders/cs.wgsl", GOOD_SOURCE)]);
    let request = CompileRequest::new("shaders/cs.wgsl", "CSMain", "cs_6_0");

    let result = ShaderCompiler::new(&handles).compile(&request).unwrap();
    assert!(result.diagnostics().is_some_and(|text| text.contains("CSMain")));
}

#[test]
fn test_includes_resolve_through_fresh_handler_per_compile() {
    let (runtime, handles) = toolchain(&[
        ("shaders/cs.wgsl", "#include \"common.wgsl\"\n@compute @workgroup_size(1)\nfn main() {}\n"),
        ("shaders/common.wgsl", "const SCALE: f32 = 2.0;\n"),
    ]);
    let request = CompileRequest::new("shaders/cs.wgsl", "main", "cs_6_0");
    let compiler = ShaderCompiler::new(&handles);

    let first = compiler.compile_to_binary(&request).unwrap();
    let payload = container::payload(first.as_bytes()).unwrap();
    assert!(String::from_utf8_lossy(payload).contains("SCALE"));

    compiler.compile_to_binary(&request).unwrap();
    assert_eq!(runtime.include_handler_count(), 2);
}

#[test]
fn test_missing_include_is_diagnostic() {
    let (_runtime, handles) = toolchain(&[("shaders/cs.wgsl", "#include \"nope.wgsl\"\nfn main() {}\n")]);
    let request = CompileRequest::new("shaders/cs.wgsl", "main", "cs_6_0");

    let result = ShaderCompiler::new(&handles).compile(&request).unwrap();
    assert!(result.diagnostics().is_some_and(|text| text.contains("nope.wgsl")));
}
