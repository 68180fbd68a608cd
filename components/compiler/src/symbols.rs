//! Scoped symbol resolution.
//!
//! The table tracks one [`FunctionScope`] per function being compiled,
//! innermost last; index zero is the top level, which persists across
//! incremental compile passes. Top-level names are storage-global even
//! when declared inside a block, so only their visibility is lexical.
//! Names referenced from an enclosing function resolve to free
//! variables, recording the capture chain the compiler turns into cell
//! instructions.

use std::collections::{HashMap, HashSet};

/// Where a resolved name lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    /// Slot in the session-wide globals vector.
    Global,
    /// Slot in the current function's frame.
    Local,
    /// Captured cell of the current function.
    Free,
    /// Entry in the fixed builtin table.
    Builtin,
}

/// A resolved name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Storage class.
    pub scope: SymbolScope,
    /// Slot or table index within that storage class.
    pub index: u16,
}

/// A name captured from an enclosing function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeVariable {
    /// The captured name.
    pub name: String,
    /// How the name resolves in the enclosing function: a local to be
    /// celled there, or one of its own free variables.
    pub parent: Symbol,
}

/// Why a declaration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareError {
    /// The name is already declared in the current block.
    Duplicate,
    /// The global or local slot space is exhausted.
    Overflow,
}

#[derive(Debug, Clone, Default)]
struct Block {
    names: HashMap<String, u16>,
}

/// Per-function symbol state.
#[derive(Debug, Clone)]
pub struct FunctionScope {
    blocks: Vec<Block>,
    num_locals: u16,
    free: Vec<FreeVariable>,
    celled: HashSet<u16>,
}

impl FunctionScope {
    fn new() -> Self {
        Self {
            blocks: vec![Block::default()],
            num_locals: 0,
            free: Vec::new(),
            celled: HashSet::new(),
        }
    }

    fn lookup(&self, name: &str) -> Option<u16> {
        self.blocks.iter().rev().find_map(|block| block.names.get(name).copied())
    }

    /// Local slot count, parameters included.
    pub fn num_locals(&self) -> u16 {
        self.num_locals
    }

    /// Captured names in discovery order, which is also the order the
    /// capture cells are pushed before `MakeClosure`.
    pub fn free_variables(&self) -> &[FreeVariable] {
        &self.free
    }
}

/// Scoped symbol table for one compiler session.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    global_names: Vec<String>,
    builtins: HashMap<String, u16>,
    functions: Vec<FunctionScope>,
}

impl SymbolTable {
    /// New table with the given builtin name order, which is fixed for
    /// the life of the session.
    pub fn new(builtin_names: &[String]) -> Self {
        let builtins = builtin_names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index as u16))
            .collect();
        Self {
            global_names: Vec::new(),
            builtins,
            functions: vec![FunctionScope::new()],
        }
    }

    /// Global slot names, indexed by slot.
    pub fn global_names(&self) -> &[String] {
        &self.global_names
    }

    /// True when compiling top-level code rather than a function body.
    pub fn at_top_level(&self) -> bool {
        self.functions.len() == 1
    }

    pub fn enter_function(&mut self) {
        self.functions.push(FunctionScope::new());
    }

    /// Pop the innermost function scope, returning it so the caller can
    /// read the local count and capture list.
    pub fn exit_function(&mut self) -> FunctionScope {
        self.functions.pop().unwrap()
    }

    pub fn enter_block(&mut self) {
        self.current().blocks.push(Block::default());
    }

    pub fn exit_block(&mut self) {
        self.current().blocks.pop();
    }

    fn current(&mut self) -> &mut FunctionScope {
        self.functions.last_mut().unwrap()
    }

    /// Declare `name` in the current block.
    ///
    /// At the top level the outermost block reuses an existing slot, so
    /// re-declaring a name in a later pass (or later in the same pass)
    /// keeps its storage and every closure over it observes the new
    /// value. Everywhere else a same-block duplicate is an error.
    pub fn declare(&mut self, name: &str) -> Result<Symbol, DeclareError> {
        if self.at_top_level() {
            let scope = &self.functions[0];
            if scope.blocks.len() == 1 {
                if let Some(&slot) = scope.blocks[0].names.get(name) {
                    return Ok(Symbol { scope: SymbolScope::Global, index: slot });
                }
            } else if let Some(block) = scope.blocks.last() {
                if block.names.contains_key(name) {
                    return Err(DeclareError::Duplicate);
                }
            }
            if self.global_names.len() > u16::MAX as usize {
                return Err(DeclareError::Overflow);
            }
            let slot = self.global_names.len() as u16;
            self.global_names.push(name.to_string());
            if let Some(block) = self.current().blocks.last_mut() {
                block.names.insert(name.to_string(), slot);
            }
            Ok(Symbol { scope: SymbolScope::Global, index: slot })
        } else {
            let scope = self.current();
            if let Some(block) = scope.blocks.last() {
                if block.names.contains_key(name) {
                    return Err(DeclareError::Duplicate);
                }
            }
            if scope.num_locals == u16::MAX {
                return Err(DeclareError::Overflow);
            }
            let slot = scope.num_locals;
            scope.num_locals += 1;
            if let Some(block) = scope.blocks.last_mut() {
                block.names.insert(name.to_string(), slot);
            }
            Ok(Symbol { scope: SymbolScope::Local, index: slot })
        }
    }

    /// Resolve `name` from the innermost scope outward. Names found in
    /// enclosing functions are recorded as free variables along the
    /// whole chain; top-level and builtin names resolve directly and
    /// are never captured.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        self.resolve_at(self.functions.len() - 1, name)
    }

    fn resolve_at(&mut self, depth: usize, name: &str) -> Option<Symbol> {
        if let Some(slot) = self.functions[depth].lookup(name) {
            let scope = if depth == 0 { SymbolScope::Global } else { SymbolScope::Local };
            return Some(Symbol { scope, index: slot });
        }
        if depth == 0 {
            return self
                .builtins
                .get(name)
                .map(|&index| Symbol { scope: SymbolScope::Builtin, index });
        }
        let parent = self.resolve_at(depth - 1, name)?;
        match parent.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(parent),
            SymbolScope::Local | SymbolScope::Free => Some(self.define_free(depth, name, parent)),
        }
    }

    fn define_free(&mut self, depth: usize, name: &str, parent: Symbol) -> Symbol {
        let scope = &mut self.functions[depth];
        if let Some(index) = scope.free.iter().position(|free| free.name == name) {
            return Symbol { scope: SymbolScope::Free, index: index as u16 };
        }
        scope.free.push(FreeVariable { name: name.to_string(), parent });
        Symbol {
            scope: SymbolScope::Free,
            index: (scope.free.len() - 1) as u16,
        }
    }

    /// Record that a local slot of the current function has been
    /// wrapped in a cell. Returns true the first time, which is when
    /// the compiler emits the `MakeCell`.
    pub fn mark_celled(&mut self, slot: u16) -> bool {
        self.current().celled.insert(slot)
    }
}
