//! Unit tests exercising the parser through its public API

use bytecode_system::BinaryOp;
use object_system::FriendlyError;
use parser::{parse, Expression, ParseError, Position, Program, Statement};

fn parse_source(source: &str) -> Program {
    match parse(source) {
        Ok(program) => program,
        Err(err) => panic!("parse error for {source:?}: {err} at {}", err.position()),
    }
}

fn parse_error(source: &str) -> ParseError {
    match parse(source) {
        Ok(program) => panic!("expected a parse error for {source:?}, got {program:?}"),
        Err(err) => err,
    }
}

// ============================================================================
// Whole Program Tests
// ============================================================================

#[test]
fn test_fibonacci_program() {
    let source = r#"
func fib(n) {
    if n < 2 {
        return n
    }
    return fib(n - 1) + fib(n - 2)
}

results := []
for i := 0; i < 10; i++ {
    results = results + [fib(i)]
}
results
"#;
    let program = parse_source(source);
    assert_eq!(program.statements.len(), 4);
    assert!(matches!(&program.statements[0], Statement::Function { name, .. } if name == "fib"));
    assert!(matches!(&program.statements[2], Statement::For { .. }));
    assert!(matches!(&program.statements[3], Statement::Expression { .. }));
}

#[test]
fn test_counter_closure_program() {
    let source = r#"
func make_counter() {
    count := 0
    return func() {
        count = count + 1
        count
    }
}
next := make_counter()
next()
next()
"#;
    let program = parse_source(source);
    assert_eq!(program.statements.len(), 4);
    let Statement::Function { body, .. } = &program.statements[0] else {
        panic!("expected a function declaration");
    };
    assert!(matches!(
        &body[1],
        Statement::Return { value: Some(Expression::Func { .. }), .. }
    ));
}

#[test]
fn test_data_heavy_script() {
    let source = r#"
config := {
    name: "worker",
    "max retries": 3,
    tags: ["a", "b"],
}
hosts := ["alpha", "beta", "gamma"]
first_two := hosts[:2]
for i, host := range hosts {
    label := config.name + "-" + host
    label
}
"#;
    let program = parse_source(source);
    assert_eq!(program.statements.len(), 4);
    let Statement::Declare { value: Expression::Map { entries, .. }, .. } = &program.statements[0]
    else {
        panic!("expected a map declaration");
    };
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].0, "max retries");
    assert!(matches!(
        &program.statements[2],
        Statement::Declare { value: Expression::Slice { .. }, .. }
    ));
    assert!(matches!(
        &program.statements[3],
        Statement::ForRange { second: Some(_), .. }
    ));
}

#[test]
fn test_method_call_chains() {
    let program = parse_source("\"a,b,c\".split(\",\")[1].to_upper()");
    let Statement::Expression { expression, .. } = &program.statements[0] else {
        panic!("expected an expression statement");
    };
    let Expression::Call { callee, .. } = expression else {
        panic!("expected an outer call");
    };
    let Expression::Attr { object, name, .. } = callee.as_ref() else {
        panic!("expected an attribute below the call");
    };
    assert_eq!(name, "to_upper");
    assert!(matches!(object.as_ref(), Expression::Index { .. }));
}

#[test]
fn test_repl_style_fragments() {
    for fragment in [
        "x := 1",
        "x + 1",
        "x",
        "[1, 2, 3] | 0",
        "func(a) { a * 2 }(21)",
        "if x > 0 { \"pos\" } else { \"neg\" }",
        "try(func() { error(\"boom\") }, \"fallback\")",
    ] {
        assert!(parse(fragment).is_ok(), "failed to parse fragment {fragment:?}");
    }
}

#[test]
fn test_reparse_is_deterministic() {
    let source = "x := [1, 2]\nfor v := range x { v ** 2 }";
    assert_eq!(parse_source(source), parse_source(source));
}

#[test]
fn test_large_program() {
    let mut source = String::new();
    for i in 0..200 {
        source.push_str(&format!("v{i} := {i} * 2\n"));
    }
    let program = parse_source(&source);
    assert_eq!(program.statements.len(), 200);
}

// ============================================================================
// Statement Boundary Tests
// ============================================================================

#[test]
fn test_semicolons_and_newlines_both_terminate() {
    let with_semicolons = parse_source("a := 1; b := 2; a + b");
    let with_newlines = parse_source("a := 1\nb := 2\na + b");
    assert_eq!(with_semicolons, with_newlines);
}

#[test]
fn test_comments_do_not_join_statements() {
    let program = parse_source("x := 1 // trailing\n# full line\ny := 2");
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn test_blank_lines_between_statements() {
    let program = parse_source("x := 1\n\n\ny := 2\n");
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn test_empty_and_whitespace_sources() {
    assert_eq!(parse_source("").statements.len(), 0);
    assert_eq!(parse_source("\n\n  \n").statements.len(), 0);
    assert_eq!(parse_source("# only a comment\n").statements.len(), 0);
}

#[test]
fn test_multiline_expression_with_trailing_operators() {
    let program = parse_source("total := 1 +\n    2 +\n    3");
    assert_eq!(program.statements.len(), 1);
}

// ============================================================================
// Error Reporting Tests
// ============================================================================

#[test]
fn test_keywords_cannot_be_declared() {
    let err = parse_error("func := 1");
    assert_eq!(err.message(), "expected '(', got ':='");
}

#[test]
fn test_error_carries_position_across_lines() {
    let err = parse_error("ok := 1\nalso_ok := 2\nbad := ]");
    assert_eq!(err.position(), Position { line: 3, column: 8 });
    assert_eq!(err.message(), "expected an expression, got ']'");
}

#[test]
fn test_friendly_message_includes_position() {
    let err = parse_error("x := )");
    assert_eq!(
        err.friendly_message(),
        "parse error: expected an expression, got ')' (line 1, column 6)"
    );
}

#[test]
fn test_unclosed_delimiters() {
    assert_eq!(
        parse_error("f(1, 2").message(),
        "expected ')', got end of input"
    );
    assert_eq!(
        parse_error("[1, 2").message(),
        "expected ']', got end of input"
    );
    assert_eq!(
        parse_error("{a: 1").message(),
        "expected '}', got end of input"
    );
}

#[test]
fn test_unterminated_string_is_reported() {
    let err = parse_error("x := \"oops");
    assert_eq!(err.message(), "unterminated string literal");
}

#[test]
fn test_operator_without_operand() {
    let err = parse_error("1 + * 2");
    assert_eq!(err.message(), "expected an expression, got '*'");
}

// ============================================================================
// Grammar Shape Tests
// ============================================================================

#[test]
fn test_in_operator_parses_as_comparison() {
    let program = parse_source("\"key\" in {key: 1}");
    assert!(matches!(
        &program.statements[0],
        Statement::Expression {
            expression: Expression::Infix { operator: BinaryOp::In, .. },
            ..
        }
    ));
}

#[test]
fn test_nested_function_literals() {
    let source = "compose := func(f, g) { func(x) { f(g(x)) } }";
    let program = parse_source(source);
    let Statement::Declare { value: Expression::Func { body, .. }, .. } = &program.statements[0]
    else {
        panic!("expected a function literal declaration");
    };
    assert!(matches!(
        &body[0],
        Statement::Expression { expression: Expression::Func { .. }, .. }
    ));
}

#[test]
fn test_index_assignment_forms() {
    let program = parse_source("m[\"k\"] = 1\nl[0] += 2\np.field = 3");
    assert_eq!(program.statements.len(), 3);
    for statement in &program.statements {
        assert!(matches!(statement, Statement::Assign { .. }));
    }
}

#[test]
fn test_for_loop_over_call_result() {
    let program = parse_source("for line := range read_lines(\"x\") { line }");
    assert!(matches!(
        &program.statements[0],
        Statement::ForRange { iterable: Expression::Call { .. }, .. }
    ));
}
