//! Full pipeline integration tests
//!
//! Tests the complete flow: source -> parser -> compiler -> bytecode ->
//! VM -> result value, with the standard builtin table installed.

use builtins::default_builtins;
use compiler::{Compiler, CompilerOptions};
use interpreter::{Vm, VmOptions};
use object_system::{RunContext, Value};

/// Execute fjord source with the standard builtin table
fn execute(source: &str) -> Result<Value, String> {
    let program = parser::parse(source).map_err(|e| format!("parse error: {e}"))?;
    let code = Compiler::new(CompilerOptions::default())
        .compile(&program)
        .map_err(|e| format!("compile error: {e}"))?;
    let mut vm = Vm::with_options(
        code,
        VmOptions { builtins: default_builtins(), ..VmOptions::default() },
    );
    vm.run(&RunContext::new()).map_err(|e| format!("execution error: {e}"))
}

/// Test: Integer literal
#[test]
fn test_pipeline_literal() {
    let result = execute("42").expect("execution failed");
    assert_eq!(result, Value::Int(42));
}

/// Test: Arithmetic with precedence and grouping
#[test]
fn test_pipeline_arithmetic() {
    let result = execute("(10 + 20) * 2 - 18").expect("execution failed");
    assert_eq!(result, Value::Int(42));
}

/// Test: Integer division truncates; float operands promote
#[test]
fn test_pipeline_division() {
    assert_eq!(execute("7 / 2").expect("execution failed"), Value::Int(3));
    assert_eq!(execute("7.0 / 2").expect("execution failed"), Value::Float(3.5));
}

/// Test: String concatenation and methods
#[test]
fn test_pipeline_strings() {
    let result = execute("\"fj\" + \"ord\"").expect("execution failed");
    assert_eq!(result, Value::string("fjord"));

    let result = execute("\"a,b,c\".split(\",\")").expect("execution failed");
    assert_eq!(
        result,
        Value::list(vec![Value::string("a"), Value::string("b"), Value::string("c")])
    );
}

/// Test: If is an expression
#[test]
fn test_pipeline_if_expression() {
    let source = "\
a := 3
b := 7
if a > b { a } else { b }";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(7));
}

/// Test: Variables and reassignment
#[test]
fn test_pipeline_variables() {
    let source = "\
x := 10
y := 20
x = x + y
x";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(30));
}

/// Test: Classic for loop
#[test]
fn test_pipeline_for_loop() {
    let source = "\
total := 0
for i := 1; i <= 10; i++ {
    total = total + i
}
total";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(55));
}

/// Test: Range loop over a list with index and value
#[test]
fn test_pipeline_range_loop() {
    let source = "\
weights := [2, 3, 5]
weighted := 0
for i, w := range weights {
    weighted = weighted + i * w
}
weighted";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(13));
}

/// Test: Functions and closures
#[test]
fn test_pipeline_closures() {
    let source = "\
func make_counter() {
    count := 0
    return func() {
        count = count + 1
        return count
    }
}
tick := make_counter()
tick()
tick()
tick()";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(3));
}

/// Test: Recursion
#[test]
fn test_pipeline_recursion() {
    let source = "\
func fact(n) {
    if n <= 1 { return 1 }
    return n * fact(n - 1)
}
fact(10)";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(3_628_800));
}

/// Test: Indexing, negative indices, and slices
#[test]
fn test_pipeline_indexing() {
    assert_eq!(execute("[1, 2, 3][0]").expect("execution failed"), Value::Int(1));
    assert_eq!(execute("[1, 2, 3][-1]").expect("execution failed"), Value::Int(3));
    assert_eq!(
        execute("[1, 2, 3, 4][1:3]").expect("execution failed"),
        Value::list(vec![Value::Int(2), Value::Int(3)])
    );
    assert_eq!(execute("\"fjord\"[1:4]").expect("execution failed"), Value::string("jor"));
}

/// Test: Map construction, key access, and membership
#[test]
fn test_pipeline_maps() {
    let source = "\
m := {name: \"fjord\", depth: 812}
m[\"depth\"]";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(812));

    assert_eq!(
        execute("\"a\" in {a: 1, b: 2}").expect("execution failed"),
        Value::Bool(true)
    );
}

/// Test: Builtins reachable from scripts
#[test]
fn test_pipeline_builtins() {
    assert_eq!(execute("len(\"fjord\")").expect("execution failed"), Value::Int(5));
    assert_eq!(
        execute("sorted([3, 1, 2])").expect("execution failed"),
        Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
    assert_eq!(
        execute("sprintf(\"%s has %d letters\", \"fjord\", 5)").expect("execution failed"),
        Value::string("fjord has 5 letters")
    );
}

/// Test: Bound list methods re-enter the VM to run script callbacks,
/// and the callback can call builtins of its own
#[test]
fn test_pipeline_callback_methods() {
    let source = "\
names := [\"pike\", \"char\", \"grayling\"]
names.map(func(s) { len(s) })";
    assert_eq!(
        execute(source).expect("execution failed"),
        Value::list(vec![Value::Int(4), Value::Int(4), Value::Int(8)])
    );

    let source = "[1, 2, 3, 4].filter(func(n) { n % 2 == 0 })";
    assert_eq!(
        execute(source).expect("execution failed"),
        Value::list(vec![Value::Int(2), Value::Int(4)])
    );
}

/// Test: Module values resolve through attribute access
#[test]
fn test_pipeline_math_module() {
    assert_eq!(execute("math.sqrt(16.0)").expect("execution failed"), Value::Float(4.0));
    assert_eq!(execute("math.max([3, 9, 4])").expect("execution failed"), Value::Int(9));
}

/// Test: JSON module round trip inside a script
#[test]
fn test_pipeline_json_module() {
    let result = execute("json.unmarshal(json.marshal({xs: [1, 2]}))[\"xs\"]")
        .expect("execution failed");
    assert_eq!(result, Value::list(vec![Value::Int(1), Value::Int(2)]));
}

/// Test: A raised error aborts the run with its message
#[test]
fn test_pipeline_raised_error() {
    let err = execute("error(\"the bottom fell out\")").expect_err("run should fail");
    assert!(err.contains("the bottom fell out"), "got: {err}");
}

/// Test: try() intercepts a raised error and falls back
#[test]
fn test_pipeline_try_recovers() {
    let source = "try(func() { error(\"nope\") }, 42)";
    assert_eq!(execute(source).expect("execution failed"), Value::Int(42));
}

/// Test: Division by zero raises, and try() can see the message
#[test]
fn test_pipeline_division_by_zero() {
    let err = execute("1 / 0").expect_err("run should fail");
    assert!(err.contains("division by zero"), "got: {err}");

    let source = "try(func() { 1 / 0 }, func(e) { e.message })";
    let result = execute(source).expect("execution failed");
    assert_eq!(result, Value::string("value error: division by zero"));
}

/// Test: Truthiness drives conditionals for every value family
#[test]
fn test_pipeline_truthiness() {
    let cases = [
        ("if 0 { 1 } else { 2 }", 2),
        ("if 0.0 { 1 } else { 2 }", 2),
        ("if \"\" { 1 } else { 2 }", 2),
        ("if [] { 1 } else { 2 }", 2),
        ("m := {}\nif m { 1 } else { 2 }", 2),
        ("if nil { 1 } else { 2 }", 2),
        ("if 7 { 1 } else { 2 }", 1),
        ("if \"x\" { 1 } else { 2 }", 1),
        ("if [0] { 1 } else { 2 }", 1),
    ];
    for (source, want) in cases {
        assert_eq!(
            execute(source).expect("execution failed"),
            Value::Int(want),
            "source: {source}"
        );
    }
}

/// Test: Compile errors carry the offending name
#[test]
fn test_pipeline_compile_error() {
    let err = execute("1 + missing").expect_err("compile should fail");
    assert!(err.contains("undefined variable \"missing\""), "got: {err}");
}

/// Test: Parse errors carry position information
#[test]
fn test_pipeline_parse_error() {
    let err = execute("func (").expect_err("parse should fail");
    assert!(err.starts_with("parse error:"), "got: {err}");
}
