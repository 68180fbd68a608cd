//! Instruction set of the stack VM.
//!
//! Instructions are plain enum values with embedded operands; the
//! in-memory representation is the only representation, there is no
//! binary wire format. Jump targets are absolute offsets into the owning
//! function's instruction stream, which keeps previously issued code
//! valid when an incremental compile appends to the main stream.

use std::fmt;

/// Binary operators dispatched through the object model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `in` (membership)
    In,
}

impl BinaryOp {
    /// Source-level operator symbol, used in error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::In => "in",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One VM instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // Literals
    /// Push constant pool entry.
    LoadConst(u16),
    /// Push nil.
    LoadNil,
    /// Push true.
    LoadTrue,
    /// Push false.
    LoadFalse,

    // Variables
    /// Push global slot.
    LoadGlobal(u16),
    /// Pop into global slot.
    StoreGlobal(u16),
    /// Push local slot, reading through a cell if the slot holds one.
    LoadLocal(u16),
    /// Pop into local slot, writing through a cell if the slot holds one.
    StoreLocal(u16),
    /// Push builtin table entry.
    LoadBuiltin(u16),

    // Closures
    /// Wrap the current value of a local slot in a fresh cell, in place.
    MakeCell(u16),
    /// Push the cell stored in a local slot, without dereferencing.
    LoadLocalCell(u16),
    /// Push captured cell `index` of the running closure, dereferenced.
    LoadFree(u16),
    /// Pop and write through captured cell `index`.
    StoreFree(u16),
    /// Push captured cell `index` itself, for transitive capture.
    LoadFreeCell(u16),
    /// Pop `frees` cells and build a closure over function constant
    /// `function`.
    MakeClosure {
        /// Constant pool index of the function unit.
        function: u16,
        /// Number of captured cells on the stack.
        frees: u8,
    },

    // Composite construction
    /// Pop `n` values, push a list.
    MakeList(u16),
    /// Pop `2n` values (key/value pairs), push a map.
    MakeMap(u16),
    /// Pop `n` values, push a set.
    MakeSet(u16),

    // Operators
    /// Pop right then left, push `left <op> right` via object dispatch.
    BinaryOp(BinaryOp),
    /// Arithmetic negation of the top of stack.
    Negate,
    /// Logical negation of the top of stack.
    Not,

    // Control flow
    /// Unconditional jump to absolute offset.
    Jump(u32),
    /// Pop; jump if falsy.
    PopJumpIfFalse(u32),
    /// Pop; jump if truthy.
    PopJumpIfTrue(u32),

    // Containers and attributes
    /// Pop key and container, push `container[key]`.
    GetItem,
    /// Pop value, key, container; store `container[key] = value`.
    SetItem,
    /// Pop present bounds then the container, push the slice copy.
    GetSlice {
        /// Whether a start bound was pushed.
        has_start: bool,
        /// Whether a stop bound was pushed.
        has_stop: bool,
    },
    /// Pop object, push attribute named by constant pool entry.
    GetAttr(u16),
    /// Pop value then object, set attribute named by constant pool entry.
    SetAttr(u16),

    // Iteration
    /// Pop a value, push a fresh iterator over it.
    GetIter,
    /// Advance the iterator at the top of stack. On exhaustion pop it and
    /// jump to `exit`; otherwise push the entry key/value (`vars` = 2) or
    /// just the primary value (`vars` = 1), leaving the iterator below.
    ForRange {
        /// Absolute offset of the first instruction after the loop.
        exit: u32,
        /// Number of loop variables, 1 or 2.
        vars: u8,
    },

    // Calls
    /// Pop `argc` arguments then the callable, push the result.
    Call(u8),
    /// Return the top of stack from the current function.
    ReturnValue,

    // Stack management
    /// Discard the top of stack.
    Pop,
    /// Placeholder emitted while a forward jump target is unknown.
    Nop,
}

impl Instruction {
    /// True for instructions that may transfer control backwards, which
    /// makes them cancellation checkpoints.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Instruction::Jump(_)
                | Instruction::PopJumpIfFalse(_)
                | Instruction::PopJumpIfTrue(_)
                | Instruction::ForRange { .. }
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadConst(i) => write!(f, "LOAD_CONST {i}"),
            Instruction::LoadNil => write!(f, "LOAD_NIL"),
            Instruction::LoadTrue => write!(f, "LOAD_TRUE"),
            Instruction::LoadFalse => write!(f, "LOAD_FALSE"),
            Instruction::LoadGlobal(i) => write!(f, "LOAD_GLOBAL {i}"),
            Instruction::StoreGlobal(i) => write!(f, "STORE_GLOBAL {i}"),
            Instruction::LoadLocal(i) => write!(f, "LOAD_LOCAL {i}"),
            Instruction::StoreLocal(i) => write!(f, "STORE_LOCAL {i}"),
            Instruction::LoadBuiltin(i) => write!(f, "LOAD_BUILTIN {i}"),
            Instruction::MakeCell(i) => write!(f, "MAKE_CELL {i}"),
            Instruction::LoadLocalCell(i) => write!(f, "LOAD_LOCAL_CELL {i}"),
            Instruction::LoadFree(i) => write!(f, "LOAD_FREE {i}"),
            Instruction::StoreFree(i) => write!(f, "STORE_FREE {i}"),
            Instruction::LoadFreeCell(i) => write!(f, "LOAD_FREE_CELL {i}"),
            Instruction::MakeClosure { function, frees } => {
                write!(f, "MAKE_CLOSURE {function} {frees}")
            }
            Instruction::MakeList(n) => write!(f, "MAKE_LIST {n}"),
            Instruction::MakeMap(n) => write!(f, "MAKE_MAP {n}"),
            Instruction::MakeSet(n) => write!(f, "MAKE_SET {n}"),
            Instruction::BinaryOp(op) => write!(f, "BINARY_OP {op}"),
            Instruction::Negate => write!(f, "NEGATE"),
            Instruction::Not => write!(f, "NOT"),
            Instruction::Jump(t) => write!(f, "JUMP {t}"),
            Instruction::PopJumpIfFalse(t) => write!(f, "POP_JUMP_IF_FALSE {t}"),
            Instruction::PopJumpIfTrue(t) => write!(f, "POP_JUMP_IF_TRUE {t}"),
            Instruction::GetItem => write!(f, "GET_ITEM"),
            Instruction::SetItem => write!(f, "SET_ITEM"),
            Instruction::GetSlice { has_start, has_stop } => {
                write!(f, "GET_SLICE {has_start} {has_stop}")
            }
            Instruction::GetAttr(i) => write!(f, "GET_ATTR {i}"),
            Instruction::SetAttr(i) => write!(f, "SET_ATTR {i}"),
            Instruction::GetIter => write!(f, "GET_ITER"),
            Instruction::ForRange { exit, vars } => write!(f, "FOR_RANGE {exit} {vars}"),
            Instruction::Call(argc) => write!(f, "CALL {argc}"),
            Instruction::ReturnValue => write!(f, "RETURN_VALUE"),
            Instruction::Pop => write!(f, "POP"),
            Instruction::Nop => write!(f, "NOP"),
        }
    }
}
