//! Compiled-code artifacts.
//!
//! A [`Code`] value is an immutable snapshot of one compile pass: the main
//! instruction stream, the shared constant pool, and the global/builtin
//! name tables. Everything in it is `Send + Sync`, so a single
//! `Arc<Code>` can back any number of VM instances across threads.
//! Runtime values are materialized from [`Constant`]s at execution time,
//! which is what keeps the compiled artifact shareable while live values
//! stay single-threaded.

use std::fmt;
use std::sync::Arc;

use crate::instruction::Instruction;

/// A compiled function body.
///
/// Function units are created by the compiler and never mutated afterwards.
/// Instruction offsets (jump targets) are local to `instructions`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionUnit {
    /// Function name; empty for anonymous functions, `"main"` for the
    /// top-level stream.
    pub name: String,
    /// Parameter names, in declaration order. Calls are exact-arity.
    pub params: Vec<String>,
    /// Total local slot count, parameters included.
    pub locals: u16,
    /// Number of captured cells a closure over this unit carries.
    pub frees: u16,
    /// The body.
    pub instructions: Vec<Instruction>,
}

impl FunctionUnit {
    /// New empty unit with the given name and parameters. Local slot
    /// count starts at the parameter count and is raised by the compiler
    /// as declarations are seen.
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        let locals = params.len() as u16;
        Self { name: name.into(), params, locals, frees: 0, instructions: Vec::new() }
    }

    /// Required argument count.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Render for tracing and the disassembly listing, e.g.
    /// `func fib(n)`.
    pub fn signature(&self) -> String {
        if self.name.is_empty() {
            format!("func({})", self.params.join(", "))
        } else {
            format!("func {}({})", self.name, self.params.join(", "))
        }
    }
}

/// A constant pool entry.
///
/// Function constants share the pool of the `Code` that contains them;
/// nested functions do not carry pools of their own.
#[derive(Debug, Clone)]
pub enum Constant {
    /// nil
    Nil,
    /// true / false
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Immutable string (also used for attribute names)
    Str(Arc<str>),
    /// Compiled function body
    Function(Arc<FunctionUnit>),
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constant::Nil, Constant::Nil) => true,
            (Constant::Bool(a), Constant::Bool(b)) => a == b,
            (Constant::Int(a), Constant::Int(b)) => a == b,
            // Bit equality so that deduplication never conflates 0.0
            // with -0.0 or drops NaN constants.
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Str(a), Constant::Str(b)) => a == b,
            (Constant::Function(a), Constant::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Nil => write!(f, "nil"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Float(x) => write!(f, "{x}"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::Function(unit) => write!(f, "{}", unit.signature()),
        }
    }
}

/// An immutable compiled-code snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    /// Top-level instruction stream. Grows monotonically across
    /// incremental compile passes; earlier offsets remain valid.
    pub main: FunctionUnit,
    /// Constant pool shared by `main` and every function constant.
    pub constants: Vec<Constant>,
    /// Global slot names, indexed by slot.
    pub globals: Vec<String>,
    /// Builtin names, indexed by `LoadBuiltin` operand. Fixed when the
    /// compiler session is created.
    pub builtins: Vec<String>,
}

impl Default for FunctionUnit {
    fn default() -> Self {
        FunctionUnit::new("main", Vec::new())
    }
}

impl Code {
    /// Look up a constant pool entry.
    pub fn constant(&self, index: u16) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Resolve a `GetAttr`/`SetAttr` name operand.
    pub fn attr_name(&self, index: u16) -> Option<&str> {
        match self.constants.get(index as usize) {
            Some(Constant::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Number of global slots referenced by the code.
    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    /// Human-readable listing of the main stream and all function
    /// constants, for `--dis` style debugging output.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        Self::write_unit(&mut out, &self.main);
        for constant in &self.constants {
            if let Constant::Function(unit) = constant {
                out.push('\n');
                Self::write_unit(&mut out, unit);
            }
        }
        out
    }

    fn write_unit(out: &mut String, unit: &FunctionUnit) {
        use fmt::Write;
        let _ = writeln!(out, "{}:", unit.signature());
        for (offset, instruction) in unit.instructions.iter().enumerate() {
            let _ = writeln!(out, "  {offset:04}  {instruction}");
        }
    }
}
