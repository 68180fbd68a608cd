//! End-to-end CLI integration tests
//!
//! Tests the complete runtime through the fjord_cli Runtime API. This is
//! the highest level suite: source string or script file to final value.

use std::io::Write;

use fjord_cli::{CliError, OutputFormat, Runtime};
use object_system::{ExecError, Value};

/// Test: Simple number execution
#[test]
fn test_e2e_simple_number() {
    let mut runtime = Runtime::new(true);
    let result = runtime.execute_string("42").expect("execution failed");
    assert_eq!(result, Value::Int(42));
}

/// Test: Complex arithmetic
#[test]
fn test_e2e_complex_arithmetic() {
    let mut runtime = Runtime::new(true);
    let result = runtime.execute_string("(10 + 20) * 2 - 18").expect("execution failed");
    assert_eq!(result, Value::Int(42));
}

/// Test: Variables within one submission
#[test]
fn test_e2e_variables() {
    let mut runtime = Runtime::new(true);
    let result = runtime
        .execute_string("a := 10\nb := 20\nc := 30\na + b + c")
        .expect("execution failed");
    assert_eq!(result, Value::Int(60));
}

/// Test: Empty program yields nil
#[test]
fn test_e2e_empty_program() {
    let mut runtime = Runtime::new(true);
    let result = runtime.execute_string("").expect("execution failed");
    assert!(result.is_nil());
}

/// Test: Builtins are reachable by default
#[test]
fn test_e2e_builtins_available() {
    let mut runtime = Runtime::new(true);
    let result = runtime
        .execute_string("sprintf(\"%d fathoms\", len([1, 2, 3]))")
        .expect("execution failed");
    assert_eq!(result, Value::string("3 fathoms"));
}

/// Test: The bare runtime has no builtin table
#[test]
fn test_e2e_no_default_builtins() {
    let mut runtime = Runtime::new(false);
    assert!(!runtime.has_builtins());
    assert_eq!(runtime.execute_string("1 + 2").expect("execution failed"), Value::Int(3));
    let err = runtime.execute_string("len(\"x\")").expect_err("len should be unknown");
    assert!(matches!(err, CliError::Compile(_)));
}

/// Test: Consecutive submissions share one session
#[test]
fn test_e2e_session_persistence() {
    let mut runtime = Runtime::new(true);
    runtime.execute_string("func volume(w, h, d) { return w * h * d }").expect("line failed");
    runtime.execute_string("box := volume(2, 3, 4)").expect("line failed");
    assert_eq!(runtime.execute_string("box").expect("line failed"), Value::Int(24));
}

/// Test: Script files execute from disk
#[test]
fn test_e2e_execute_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "# measured at the narrows").expect("write failed");
    writeln!(file, "depths := [12, 98, 44]").expect("write failed");
    writeln!(file, "math.max(depths)").expect("write failed");

    let mut runtime = Runtime::new(true);
    let path = file.path().to_str().expect("utf-8 path");
    assert_eq!(runtime.execute_file(path).expect("execution failed"), Value::Int(98));
}

/// Test: A missing file reports an I/O error, not a panic
#[test]
fn test_e2e_missing_file() {
    let mut runtime = Runtime::new(true);
    let err = runtime.execute_file("/no/such/script.fj").expect_err("must fail");
    assert!(matches!(err, CliError::Io(_)));
}

/// Test: Text rendering matches inspect, JSON goes through to_native
#[test]
fn test_e2e_output_formats() {
    let mut runtime = Runtime::new(true);
    let value = runtime
        .execute_string("{name: \"fjord\", depths: [12, 98]}")
        .expect("execution failed");

    assert_eq!(runtime.render(&value), "{\"depths\": [12, 98], \"name\": \"fjord\"}");

    let runtime = runtime.with_output(OutputFormat::Json);
    let parsed: serde_json::Value =
        serde_json::from_str(&runtime.render(&value)).expect("valid JSON");
    assert_eq!(parsed["name"], serde_json::json!("fjord"));
    assert_eq!(parsed["depths"], serde_json::json!([12, 98]));
}

/// Test: Raised script errors map to the run error variant
#[test]
fn test_e2e_raised_error() {
    let mut runtime = Runtime::new(true);
    let err = runtime.execute_string("error(\"silted up\")").expect_err("must fail");
    match err {
        CliError::Run(ExecError::Raised(e)) => assert_eq!(e.message(), "silted up"),
        other => panic!("expected a raised error, got {other:?}"),
    }
}

/// Test: Parse errors map to the parse variant with a position
#[test]
fn test_e2e_parse_error() {
    let mut runtime = Runtime::new(true);
    let err = runtime.execute_string("1 +").expect_err("must fail");
    match err {
        CliError::Parse(e) => assert!(e.message().contains("end of input")),
        other => panic!("expected a parse error, got {other:?}"),
    }
}
