//! Abstract syntax tree node definitions.
//!
//! `if` is an expression: each branch block yields the value of its
//! final expression statement (or nil), which is what makes
//! `x := if c { 1 } else { 2 }` work. Loops and assignments are
//! statements. Compound assignment and `++`/`--` never reach the tree;
//! the parser rewrites them into plain assignments.

use bytecode_system::BinaryOp;

use crate::lexer::Position;

/// A parsed source text: the top-level statements in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Top-level statements.
    pub statements: Vec<Statement>,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Declaration `name := value`
    Declare {
        /// Declared name
        name: String,
        /// Initial value
        value: Expression,
        /// Source location
        position: Position,
    },

    /// Assignment `target = value`; the target is an identifier, an
    /// index expression, or an attribute expression
    Assign {
        /// Assignment target
        target: Expression,
        /// Assigned value
        value: Expression,
        /// Source location
        position: Position,
    },

    /// Function declaration `func name(params) { body }`
    Function {
        /// Function name
        name: String,
        /// Parameter names
        params: Vec<String>,
        /// Function body
        body: Vec<Statement>,
        /// Source location
        position: Position,
    },

    /// Return statement
    Return {
        /// Return value, nil when absent
        value: Option<Expression>,
        /// Source location
        position: Position,
    },

    /// Three-clause or condition-only loop; all clauses optional, so
    /// `for { }` loops forever
    For {
        /// Initialization statement
        init: Option<Box<Statement>>,
        /// Loop condition
        condition: Option<Expression>,
        /// Post statement run after each iteration
        post: Option<Box<Statement>>,
        /// Loop body
        body: Vec<Statement>,
        /// Source location
        position: Position,
    },

    /// Range loop `for x := range c { }` or `for k, v := range c { }`
    ForRange {
        /// First loop variable
        first: String,
        /// Second loop variable, when present
        second: Option<String>,
        /// Container or iterator to walk
        iterable: Expression,
        /// Loop body
        body: Vec<Statement>,
        /// Source location
        position: Position,
    },

    /// Break statement
    Break {
        /// Source location
        position: Position,
    },

    /// Continue statement
    Continue {
        /// Source location
        position: Position,
    },

    /// Expression statement
    Expression {
        /// The expression
        expression: Expression,
        /// Source location
        position: Position,
    },
}

impl Statement {
    /// Source location of the statement.
    pub fn position(&self) -> Position {
        match self {
            Statement::Declare { position, .. }
            | Statement::Assign { position, .. }
            | Statement::Function { position, .. }
            | Statement::Return { position, .. }
            | Statement::For { position, .. }
            | Statement::ForRange { position, .. }
            | Statement::Break { position }
            | Statement::Continue { position }
            | Statement::Expression { position, .. } => *position,
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    /// Arithmetic negation `-`
    Minus,
    /// Logical negation `!`
    Not,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// nil literal
    Nil {
        /// Source location
        position: Position,
    },

    /// Boolean literal
    Bool {
        /// Literal value
        value: bool,
        /// Source location
        position: Position,
    },

    /// Integer literal
    Int {
        /// Literal value
        value: i64,
        /// Source location
        position: Position,
    },

    /// Float literal
    Float {
        /// Literal value
        value: f64,
        /// Source location
        position: Position,
    },

    /// String literal
    Str {
        /// Literal value with escapes resolved
        value: String,
        /// Source location
        position: Position,
    },

    /// Identifier reference
    Ident {
        /// Referenced name
        name: String,
        /// Source location
        position: Position,
    },

    /// List literal
    List {
        /// Element expressions
        elements: Vec<Expression>,
        /// Source location
        position: Position,
    },

    /// Map literal; keys are identifiers or string literals
    Map {
        /// Key/value pairs in source order
        entries: Vec<(String, Expression)>,
        /// Source location
        position: Position,
    },

    /// Prefix operation `-x` or `!x`
    Prefix {
        /// The operator
        operator: PrefixOperator,
        /// The operand
        operand: Box<Expression>,
        /// Source location
        position: Position,
    },

    /// Binary operation, including `&&`, `||`, and `in`
    Infix {
        /// Left operand
        left: Box<Expression>,
        /// The operator
        operator: BinaryOp,
        /// Right operand
        right: Box<Expression>,
        /// Source location
        position: Position,
    },

    /// Conditional expression `if cond { } else { }`; a missing or
    /// not-taken branch yields nil
    If {
        /// Condition
        condition: Box<Expression>,
        /// Block run when the condition is truthy
        consequence: Vec<Statement>,
        /// Block run otherwise; `else if` nests another `If` expression
        /// as the block's only statement
        alternative: Option<Vec<Statement>>,
        /// Source location
        position: Position,
    },

    /// Function literal `func(params) { body }`
    Func {
        /// Display name, when written
        name: Option<String>,
        /// Parameter names
        params: Vec<String>,
        /// Function body
        body: Vec<Statement>,
        /// Source location
        position: Position,
    },

    /// Call expression
    Call {
        /// Called expression
        callee: Box<Expression>,
        /// Argument expressions
        arguments: Vec<Expression>,
        /// Source location
        position: Position,
    },

    /// Index expression `object[index]`
    Index {
        /// Indexed expression
        object: Box<Expression>,
        /// Index expression
        index: Box<Expression>,
        /// Source location
        position: Position,
    },

    /// Slice expression `object[start:stop]` with optional bounds
    Slice {
        /// Sliced expression
        object: Box<Expression>,
        /// Lower bound
        start: Option<Box<Expression>>,
        /// Upper bound
        stop: Option<Box<Expression>>,
        /// Source location
        position: Position,
    },

    /// Attribute access `object.name`
    Attr {
        /// Receiver expression
        object: Box<Expression>,
        /// Attribute name
        name: String,
        /// Source location
        position: Position,
    },
}

impl Expression {
    /// Source location of the expression.
    pub fn position(&self) -> Position {
        match self {
            Expression::Nil { position }
            | Expression::Bool { position, .. }
            | Expression::Int { position, .. }
            | Expression::Float { position, .. }
            | Expression::Str { position, .. }
            | Expression::Ident { position, .. }
            | Expression::List { position, .. }
            | Expression::Map { position, .. }
            | Expression::Prefix { position, .. }
            | Expression::Infix { position, .. }
            | Expression::If { position, .. }
            | Expression::Func { position, .. }
            | Expression::Call { position, .. }
            | Expression::Index { position, .. }
            | Expression::Slice { position, .. }
            | Expression::Attr { position, .. } => *position,
        }
    }
}
