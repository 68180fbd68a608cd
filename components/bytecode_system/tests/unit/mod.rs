//! Unit tests for bytecode artifacts

use std::sync::Arc;

use bytecode_system::{BinaryOp, Code, Constant, FunctionUnit, Instruction};

// ============================================================================
// Code Snapshot Tests
// ============================================================================

#[test]
fn test_code_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Code>();
    assert_send_sync::<Arc<Code>>();
}

#[test]
fn test_shared_code_across_threads() {
    let mut code = Code::default();
    code.constants.push(Constant::Str("hello".into()));
    code.main.instructions.push(Instruction::LoadConst(0));
    code.main.instructions.push(Instruction::ReturnValue);
    let code = Arc::new(code);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let code = Arc::clone(&code);
            std::thread::spawn(move || code.main.instructions.len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}

#[test]
fn test_appending_preserves_existing_offsets() {
    // The incremental-session contract: instructions from an earlier pass
    // keep their offsets when more are appended.
    let mut code = Code::default();
    code.main.instructions.push(Instruction::LoadNil);
    code.main.instructions.push(Instruction::Pop);
    let snapshot: Vec<_> = code.main.instructions.clone();

    code.main.instructions.push(Instruction::LoadTrue);
    code.main.instructions.push(Instruction::ReturnValue);
    assert_eq!(&code.main.instructions[..2], &snapshot[..]);
}

// ============================================================================
// Constant Pool Tests
// ============================================================================

#[test]
fn test_scalar_constant_dedup_equality() {
    assert_eq!(Constant::Int(7), Constant::Int(7));
    assert_ne!(Constant::Int(7), Constant::Float(7.0));
    assert_eq!(Constant::Str("a".into()), Constant::Str("a".into()));
    assert_ne!(Constant::Nil, Constant::Bool(false));
}

#[test]
fn test_function_unit_metadata() {
    let mut unit = FunctionUnit::new("worker", vec!["svc".into()]);
    unit.locals = 3;
    unit.frees = 1;
    unit.instructions.push(Instruction::LoadFree(0));
    assert_eq!(unit.arity(), 1);
    assert_eq!(unit.signature(), "func worker(svc)");
}

// ============================================================================
// Instruction Tests
// ============================================================================

#[test]
fn test_checkpoint_instructions() {
    assert!(Instruction::PopJumpIfFalse(3).is_jump());
    assert!(Instruction::PopJumpIfTrue(3).is_jump());
    assert!(!Instruction::BinaryOp(BinaryOp::Add).is_jump());
    assert!(!Instruction::ReturnValue.is_jump());
}

#[test]
fn test_disassembly_output() {
    let mut code = Code::default();
    code.globals.push("x".to_string());
    code.main.instructions.push(Instruction::LoadBuiltin(2));
    code.main.instructions.push(Instruction::StoreGlobal(0));
    let listing = code.disassemble();
    assert!(listing.contains("0000  LOAD_BUILTIN 2"));
    assert!(listing.contains("0001  STORE_GLOBAL 0"));
}
