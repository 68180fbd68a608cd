//! Unit tests exercising the compiler session through its public API

use bytecode_system::{Constant, Instruction};
use compiler::{Compiler, CompilerOptions};
use object_system::FriendlyError;
use parser::parse;

fn session() -> Compiler {
    Compiler::new(CompilerOptions { builtins: Vec::new() })
}

fn session_with(builtins: &[&str]) -> Compiler {
    Compiler::new(CompilerOptions {
        builtins: builtins.iter().map(|s| s.to_string()).collect(),
    })
}

// ============================================================================
// Session Contract Tests
// ============================================================================

#[test]
fn test_snapshots_accumulate_monotonically() {
    let mut compiler = session();
    let mut lengths = Vec::new();
    for source in ["a := 1", "b := a + 1", "a * b"] {
        let code = compiler.compile(&parse(source).unwrap()).unwrap();
        lengths.push(code.main.instructions.len());
    }
    assert!(lengths.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(lengths[2], compiler.main_instructions());
}

#[test]
fn test_earlier_snapshots_stay_valid() {
    let mut compiler = session();
    let first = compiler.compile(&parse("x := 10").unwrap()).unwrap();
    let second = compiler.compile(&parse("x * 2").unwrap()).unwrap();
    // The first snapshot is untouched by the second pass.
    assert_eq!(first.main.instructions.len(), 2);
    assert_eq!(
        &second.main.instructions[..2],
        &first.main.instructions[..]
    );
}

#[test]
fn test_globals_survive_across_passes() {
    let mut compiler = session();
    compiler.compile(&parse("counter := 0").unwrap()).unwrap();
    compiler.compile(&parse("helper := 1").unwrap()).unwrap();
    let code = compiler
        .compile(&parse("counter = counter + helper").unwrap())
        .unwrap();
    assert_eq!(code.globals, ["counter", "helper"]);
    // counter still writes slot 0.
    assert_eq!(
        code.main.instructions.last(),
        Some(&Instruction::StoreGlobal(0))
    );
}

#[test]
fn test_closures_see_global_redefinitions() {
    // The closure compiled in pass one loads the slot, not a copy, so
    // a later pass that rebinds the global is observed.
    let mut compiler = session();
    let code = compiler.compile(&parse("g := 1\nf := func() { g }").unwrap()).unwrap();
    let unit = code
        .constants
        .iter()
        .find_map(|c| match c {
            Constant::Function(unit) => Some(unit.clone()),
            _ => None,
        })
        .expect("function constant");
    assert_eq!(unit.instructions[0], Instruction::LoadGlobal(0));

    let code = compiler.compile(&parse("g = 2").unwrap()).unwrap();
    assert_eq!(
        code.main.instructions.last(),
        Some(&Instruction::StoreGlobal(0))
    );
}

#[test]
fn test_repl_result_is_last_expression() {
    let mut compiler = session();
    let code = compiler.compile(&parse("x := 1\nx + 1").unwrap()).unwrap();
    // No trailing Pop: the sum stays for the VM to return.
    assert!(!matches!(code.main.instructions.last(), Some(Instruction::Pop)));
}

#[test]
fn test_error_passes_do_not_leak_globals() {
    let mut compiler = session();
    compiler.compile(&parse("a := 1").unwrap()).unwrap();
    let err = compiler.compile(&parse("b := missing").unwrap()).unwrap_err();
    assert_eq!(err.message(), "undefined variable \"missing\"");
    let code = compiler.compile(&parse("c := 2").unwrap()).unwrap();
    // "b" was rolled back with the failed pass.
    assert_eq!(code.globals, ["a", "c"]);
}

// ============================================================================
// Program Shape Tests
// ============================================================================

#[test]
fn test_fibonacci_compiles_to_one_function_unit() {
    let source = "\
func fib(n) {
    if n < 2 {
        return n
    }
    return fib(n - 1) + fib(n - 2)
}
fib(10)
";
    let code = session().compile(&parse(source).unwrap()).unwrap();
    let units: Vec<_> = code
        .constants
        .iter()
        .filter(|c| matches!(c, Constant::Function(_)))
        .collect();
    assert_eq!(units.len(), 1);
    assert!(code.main.instructions.contains(&Instruction::Call(1)));
}

#[test]
fn test_disassembly_names_functions() {
    let code = session()
        .compile(&parse("func greet(who) { who }").unwrap())
        .unwrap();
    let listing = code.disassemble();
    assert!(listing.contains("func main():"));
    assert!(listing.contains("func greet(who):"));
    assert!(listing.contains("RETURN_VALUE"));
}

#[test]
fn test_nested_loops_patch_their_own_breaks() {
    let source = "\
total := 0
for i := 0; i < 3; i++ {
    for j := 0; j < 3; j++ {
        if j > i {
            break
        }
        total = total + 1
    }
}
total
";
    let code = session().compile(&parse(source).unwrap()).unwrap();
    // Every jump target must land inside the stream.
    let len = code.main.instructions.len() as u32;
    for instruction in &code.main.instructions {
        let target = match instruction {
            Instruction::Jump(t)
            | Instruction::PopJumpIfFalse(t)
            | Instruction::PopJumpIfTrue(t) => *t,
            Instruction::ForRange { exit, .. } => *exit,
            _ => continue,
        };
        assert!(target <= len, "jump target {target} out of range {len}");
    }
    assert!(!code.main.instructions.contains(&Instruction::Nop));
}

#[test]
fn test_no_placeholders_survive_compilation() {
    let source = "\
for x := range [1, 2, 3] {
    if x == 2 {
        continue
    }
    for {
        break
    }
}
";
    let code = session().compile(&parse(source).unwrap()).unwrap();
    assert!(!code.main.instructions.contains(&Instruction::Nop));
}

#[test]
fn test_builtin_table_is_stable_across_passes() {
    let mut compiler = session_with(&["len", "print", "type"]);
    let first = compiler.compile(&parse("len([])").unwrap()).unwrap();
    let second = compiler.compile(&parse("type(1)").unwrap()).unwrap();
    assert_eq!(first.builtins, second.builtins);
    assert!(second.main.instructions.contains(&Instruction::LoadBuiltin(2)));
}

#[test]
fn test_friendly_compile_error() {
    let err = session()
        .compile(&parse("x := 1\ny := nope").unwrap())
        .unwrap_err();
    assert_eq!(
        err.friendly_message(),
        "compile error: undefined variable \"nope\" (line 2, column 6)"
    );
}
