//! Unit tests for the value catalog and its contracts

use std::time::Duration as StdDuration;

use bytecode_system::BinaryOp;
use object_system::{
    resolve_attr, CancelToken, ExecEnv, ExecError, RunContext, Slice, Value,
};

fn int(i: i64) -> Value {
    Value::Int(i)
}

fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Value {
    let ctx = RunContext::new();
    let mut env = ExecEnv::new(&ctx);
    match resolve_attr(receiver, &ctx, name).unwrap() {
        Value::Builtin(method) => method.call(&mut env, args),
        other => panic!("expected bound method, got {}", other.type_name()),
    }
}

// ============================================================================
// Value Contract Tests
// ============================================================================

#[test]
fn test_equality_is_strict_about_types() {
    assert!(int(1).equals(&int(1)));
    assert!(!int(1).equals(&Value::Float(1.0)));
    assert!(!Value::Byte(1).equals(&int(1)));
    assert!(!Value::Float(f64::NAN).equals(&Value::Float(f64::NAN)));
}

#[test]
fn test_comparison_promotes_across_numeric_types() {
    use std::cmp::Ordering;
    assert_eq!(int(1).compare(&Value::Float(1.5)).unwrap(), Ordering::Less);
    assert_eq!(Value::Byte(2).compare(&int(2)).unwrap(), Ordering::Equal);
    assert!(Value::string("a").compare(&int(1)).is_err());
}

#[test]
fn test_container_equality_recurses() {
    let a = Value::list(vec![int(1), Value::string("x")]);
    let b = Value::list(vec![int(1), Value::string("x")]);
    let c = Value::list(vec![int(1)]);
    assert!(a.equals(&b));
    assert!(!a.equals(&c));
}

#[test]
fn test_inspect_is_deterministic_for_maps_and_sets() {
    let map = Value::empty_map();
    map.set_item(&Value::string("b"), int(2)).unwrap();
    map.set_item(&Value::string("a"), int(1)).unwrap();
    assert_eq!(map.inspect(), "{\"a\": 1, \"b\": 2}");

    let set = Value::set_from(vec![int(3), int(1), int(2)]).unwrap();
    assert_eq!(set.inspect(), "{1, 2, 3}");
}

#[test]
fn test_to_native_round_trips_through_serde_json() {
    let map = Value::empty_map();
    map.set_item(&Value::string("n"), int(1)).unwrap();
    map.set_item(&int(2), Value::list(vec![Value::Bool(true), Value::Nil]))
        .unwrap();
    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, "{\"2\":[true,null],\"n\":1}");
}

// ============================================================================
// Operator Tests
// ============================================================================

#[test]
fn test_arithmetic_and_concatenation() {
    assert_eq!(int(7).run_operation(BinaryOp::Mod, &int(3)), int(1));
    assert_eq!(
        Value::string("ab").run_operation(BinaryOp::Add, &Value::string("cd")),
        Value::string("abcd")
    );
    let doubled = Value::list(vec![int(1)]).run_operation(BinaryOp::Mul, &int(2));
    assert_eq!(doubled.inspect(), "[1, 1]");
}

#[test]
fn test_operator_failures_are_error_values() {
    let result = int(1).run_operation(BinaryOp::Add, &Value::Nil);
    assert_eq!(
        result.inspect(),
        "error(\"type error: unsupported operand types for +: int and nil\")"
    );
    let result = int(1).run_operation(BinaryOp::Div, &int(0));
    assert_eq!(result.inspect(), "error(\"value error: division by zero\")");
}

#[test]
fn test_set_algebra_operators() {
    let a = Value::set_from(vec![int(1), int(2)]).unwrap();
    let b = Value::set_from(vec![int(2), int(3)]).unwrap();
    assert_eq!(a.run_operation(BinaryOp::BitOr, &b).inspect(), "{1, 2, 3}");
    assert_eq!(a.run_operation(BinaryOp::BitAnd, &b).inspect(), "{2}");
    assert_eq!(a.run_operation(BinaryOp::Sub, &b).inspect(), "{1}");
}

// ============================================================================
// Container Access Tests
// ============================================================================

#[test]
fn test_indexing_and_slicing() {
    let list = Value::list(vec![int(1), int(2), int(3)]);
    assert_eq!(list.get_item(&int(-1)).unwrap(), int(3));
    let slice = list
        .get_slice(Slice { start: Some(int(1)), stop: None })
        .unwrap();
    assert_eq!(slice.inspect(), "[2, 3]");

    let s = Value::string("héllo");
    assert_eq!(s.get_item(&int(1)).unwrap(), Value::string("é"));
    assert_eq!(
        s.get_slice(Slice { start: None, stop: Some(int(2)) }).unwrap(),
        Value::string("hé")
    );
}

#[test]
fn test_membership() {
    let map = Value::empty_map();
    map.set_item(&Value::string("k"), int(1)).unwrap();
    assert!(map.contains(&Value::string("k")).unwrap());
    assert!(!map.contains(&Value::string("z")).unwrap());
    assert!(Value::string("fjord").contains(&Value::string("jo")).unwrap());
}

// ============================================================================
// Iterator Protocol Tests
// ============================================================================

#[test]
fn test_iteration_yields_entries_with_keys() {
    let list = Value::list(vec![Value::string("a"), Value::string("b")]);
    let iter = list.iter().unwrap();
    let mut seen = Vec::new();
    while let Some(item) = iter.iter_next().unwrap() {
        let entry = iter.iter_entry().unwrap().unwrap();
        seen.push((entry.get_attr("key").unwrap(), item));
    }
    assert_eq!(
        seen,
        vec![(int(0), Value::string("a")), (int(1), Value::string("b"))]
    );
}

#[test]
fn test_map_iteration_order_is_sorted() {
    let map = Value::empty_map();
    for key in [3, 1, 2] {
        map.set_item(&int(key), int(key * 10)).unwrap();
    }
    let iter = map.iter().unwrap();
    let mut keys = Vec::new();
    while let Some(key) = iter.iter_next().unwrap() {
        keys.push(key);
    }
    assert_eq!(keys, vec![int(1), int(2), int(3)]);
}

// ============================================================================
// Method Table Tests
// ============================================================================

#[test]
fn test_bound_methods_share_the_receiver() {
    let list = Value::list(vec![int(1)]);
    let ctx = RunContext::new();
    let append = resolve_attr(&list, &ctx, "append").unwrap();
    let mut env = ExecEnv::new(&ctx);
    if let Value::Builtin(method) = &append {
        method.call(&mut env, &[int(2)]);
        method.call(&mut env, &[int(3)]);
    }
    assert_eq!(list.inspect(), "[1, 2, 3]");
}

#[test]
fn test_string_methods_compose() {
    let fields = call_method(&Value::string("  a B c  "), "fields", &[]);
    let upper = call_method(&fields.get_item(&int(1)).unwrap(), "to_upper", &[]);
    assert_eq!(upper, Value::string("B"));
}

#[test]
fn test_error_values_expose_message_and_kind() {
    let err = int(1).run_operation(BinaryOp::Add, &Value::Nil);
    assert_eq!(
        err.get_attr("kind").unwrap(),
        Value::string("type error")
    );
    assert!(err
        .get_attr("message")
        .unwrap()
        .equals(&Value::string("type error: unsupported operand types for +: int and nil")));
}

// ============================================================================
// Context Tests
// ============================================================================

#[test]
fn test_cancel_token_crosses_threads() {
    let token = CancelToken::new();
    let remote = token.clone();
    let handle = std::thread::spawn(move || remote.cancel());
    handle.join().unwrap();
    assert_eq!(token.check(), Err(ExecError::Cancelled));
}

#[test]
fn test_deadline_contexts_expire() {
    let ctx = RunContext::new().with_timeout(StdDuration::from_millis(0));
    assert_eq!(ctx.check_cancelled(), Err(ExecError::DeadlineExceeded));
}

#[test]
fn test_cost_scales_with_payload() {
    assert_eq!(int(1).cost(), 1);
    assert!(Value::string("0123456789").cost() > 10);
    let nested = Value::list(vec![Value::list(vec![int(1), int(2)])]);
    assert_eq!(nested.cost(), 1 + 1 + 2);
}
