//! Unit tests for the builtin table: behaviors that need a call
//! dispatcher, and composition across the table.

use builtins::{builtin_names, default_builtins};
use object_system::{
    Builtin, CallDispatcher, ErrorKind, ExecEnv, ExecError, RunContext, RuntimeError, Value,
};

/// Minimal dispatcher that can invoke builtin values, with the same
/// raise-on-error-return contract the machine applies.
struct BuiltinDispatcher;

impl CallDispatcher for BuiltinDispatcher {
    fn call_value(
        &mut self,
        ctx: &RunContext,
        callable: &Value,
        args: Vec<Value>,
    ) -> Result<Value, ExecError> {
        match callable {
            Value::Builtin(b) => {
                let mut env = ExecEnv::with_dispatcher(ctx, self);
                let result = b.call(&mut env, &args);
                if let Some(failure) = env.take_failure() {
                    return Err(failure);
                }
                match result {
                    Value::Error(err) => Err(ExecError::Raised((*err).clone())),
                    value => Ok(value),
                }
            }
            other => Err(ExecError::internal(format!("cannot call {}", other.type_name()))),
        }
    }
}

fn table_entry(name: &str) -> Value {
    let names = builtin_names();
    let table = default_builtins();
    let position = names.iter().position(|n| n == name).unwrap();
    table[position].clone()
}

fn run(f: &Value, args: &[Value]) -> (Value, Option<ExecError>) {
    let ctx = RunContext::new();
    let mut dispatcher = BuiltinDispatcher;
    let mut env = ExecEnv::with_dispatcher(&ctx, &mut dispatcher);
    let result = match f {
        Value::Builtin(b) => b.call(&mut env, args),
        other => panic!("not a builtin: {other:?}"),
    };
    let failure = env.take_failure();
    (result, failure)
}

fn failing(message: &'static str) -> Value {
    Value::builtin(Builtin::new("failing", move |_env, _args| {
        Value::error(RuntimeError::generic(message))
    }))
}

// ============================================================================
// try
// ============================================================================

#[test]
fn test_try_returns_first_success() {
    let ok = Value::builtin(Builtin::new("ok", |_env, _args| Value::Int(7)));
    let (result, failure) = run(&table_entry("try"), &[failing("boom"), ok]);
    assert_eq!(result, Value::Int(7));
    assert!(failure.is_none());
}

#[test]
fn test_try_falls_back_to_plain_value() {
    let (result, failure) = run(&table_entry("try"), &[failing("boom"), Value::Int(-1)]);
    assert_eq!(result, Value::Int(-1));
    assert!(failure.is_none());
}

#[test]
fn test_try_handler_receives_the_error() {
    let handler = Value::builtin(Builtin::new("handler", |_env, args| match args.first() {
        Some(Value::Error(e)) => Value::string(e.message()),
        other => panic!("handler expected an error, got {other:?}"),
    }));
    let (result, _) = run(&table_entry("try"), &[failing("boom"), handler]);
    assert_eq!(result, Value::string("boom"));
}

#[test]
fn test_try_total_failure_yields_nil() {
    let (result, failure) = run(&table_entry("try"), &[failing("a"), failing("b")]);
    assert_eq!(result, Value::Nil);
    assert!(failure.is_none());
}

#[test]
fn test_try_does_not_intercept_cancellation() {
    let aborting = Value::builtin(Builtin::new("aborting", |env, _args| {
        env.fail(ExecError::Cancelled)
    }));
    let (result, failure) = run(&table_entry("try"), &[aborting, Value::Int(-1)]);
    // The fallback is never consulted; the recorded failure wins.
    assert_eq!(failure, Some(ExecError::Cancelled));
    assert!(result.is_error());
}

// ============================================================================
// call
// ============================================================================

#[test]
fn test_call_forwards_arguments() {
    let (result, failure) = run(
        &table_entry("call"),
        &[table_entry("sprintf"), Value::string("%s-%d"), Value::string("run"), Value::Int(2)],
    );
    assert_eq!(result, Value::string("run-2"));
    assert!(failure.is_none());
}

#[test]
fn test_call_propagates_raised_errors() {
    let (result, failure) = run(&table_entry("call"), &[failing("boom")]);
    assert!(result.is_error());
    match failure {
        Some(ExecError::Raised(err)) => {
            assert_eq!(err.kind(), ErrorKind::Generic);
            assert_eq!(err.message(), "boom");
        }
        other => panic!("expected raised failure, got {other:?}"),
    }
}

#[test]
fn test_call_without_dispatcher_is_a_host_error() {
    let ctx = RunContext::new();
    let mut env = ExecEnv::new(&ctx);
    let result = match table_entry("call") {
        Value::Builtin(b) => b.call(&mut env, &[failing("unused")]),
        other => panic!("not a builtin: {other:?}"),
    };
    match result {
        Value::Error(e) => assert_eq!(e.kind(), ErrorKind::Host),
        other => panic!("expected error, got {other:?}"),
    }
}

// ============================================================================
// Composition across the table
// ============================================================================

#[test]
fn test_map_keys_sorted_pipeline() {
    let pairs = Value::list(vec![
        Value::list(vec![Value::string("zeta"), Value::Int(1)]),
        Value::list(vec![Value::string("alpha"), Value::Int(2)]),
        Value::list(vec![Value::string("mid"), Value::Int(3)]),
    ]);
    let (built, _) = run(&table_entry("map"), &[pairs]);
    let (keys, _) = run(&table_entry("keys"), &[built]);
    let (reversed, _) = run(&table_entry("reversed"), &[keys]);
    assert_eq!(
        reversed,
        Value::list(vec![Value::string("zeta"), Value::string("mid"), Value::string("alpha")])
    );
}

#[test]
fn test_conversion_chain() {
    let (as_string, _) = run(&table_entry("string"), &[Value::Int(42)]);
    let (back, _) = run(&table_entry("int"), &[as_string]);
    assert_eq!(back, Value::Int(42));
}

#[test]
fn test_table_order_is_stable_across_calls() {
    assert_eq!(builtin_names(), builtin_names());
}
