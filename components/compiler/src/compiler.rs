//! AST to bytecode lowering.
//!
//! A [`Compiler`] is an incremental session: every [`Compiler::compile`]
//! pass appends to the same main instruction stream and returns a full
//! snapshot, so a REPL can keep one session alive and re-run only the
//! new tail. Jump targets are absolute within each instruction stream,
//! which is what keeps earlier offsets valid as the stream grows.

use std::sync::Arc;

use bytecode_system::{Code, Constant, FunctionUnit, Instruction};
use parser::{Expression, Position, PrefixOperator, Program, Statement};
use tracing::debug;

use crate::error::CompileError;
use crate::symbols::{DeclareError, Symbol, SymbolScope, SymbolTable};

/// Session construction options.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Builtin names in `LoadBuiltin` table order. The order is fixed
    /// when the session is created and must match the builtin values
    /// handed to the VM.
    pub builtins: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self { builtins: builtins::builtin_names() }
    }
}

/// One-shot compilation with the default builtin names.
pub fn compile(program: &Program) -> Result<Arc<Code>, CompileError> {
    Compiler::new(CompilerOptions::default()).compile(program)
}

struct LoopContext {
    breaks: Vec<usize>,
    continues: Vec<usize>,
    /// Range loops keep their iterator on the stack, so break has to
    /// pop it before jumping out.
    pops_iterator: bool,
}

/// An incremental compiler session.
pub struct Compiler {
    code: Code,
    table: SymbolTable,
    /// Instruction streams of function literals being compiled,
    /// innermost last. Empty means instructions go to `main`.
    functions: Vec<Vec<Instruction>>,
    loops: Vec<LoopContext>,
}

impl Compiler {
    /// Create a session. The builtin table order is fixed here.
    pub fn new(options: CompilerOptions) -> Self {
        let table = SymbolTable::new(&options.builtins);
        let code = Code {
            main: FunctionUnit::new("main", Vec::new()),
            constants: Vec::new(),
            globals: Vec::new(),
            builtins: options.builtins,
        };
        Self { code, table, functions: Vec::new(), loops: Vec::new() }
    }

    /// Length of the accumulated main stream. Taken before a pass this
    /// is the offset the new pass starts at; the value never shrinks.
    pub fn main_instructions(&self) -> usize {
        self.code.main.instructions.len()
    }

    /// Append `program` to the session and return a snapshot of the
    /// accumulated code. A failed pass leaves the session exactly as it
    /// was, so a REPL can keep going after an error.
    pub fn compile(&mut self, program: &Program) -> Result<Arc<Code>, CompileError> {
        let code_before = self.code.clone();
        let table_before = self.table.clone();
        match self.compile_pass(program) {
            Ok(()) => {
                self.code.globals = self.table.global_names().to_vec();
                debug!(
                    target: "fjord::session",
                    "pass added {} statement(s), main stream at {} instruction(s)",
                    program.statements.len(),
                    self.code.main.instructions.len()
                );
                Ok(Arc::new(self.code.clone()))
            }
            Err(err) => {
                self.code = code_before;
                self.table = table_before;
                self.functions.clear();
                self.loops.clear();
                Err(err)
            }
        }
    }

    fn compile_pass(&mut self, program: &Program) -> Result<(), CompileError> {
        let count = program.statements.len();
        for (i, statement) in program.statements.iter().enumerate() {
            self.compile_statement(statement)?;
            // The final expression of a pass stays on the stack as the
            // run result.
            if matches!(statement, Statement::Expression { .. }) && i + 1 != count {
                self.emit(Instruction::Pop);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Declare { name, value, position } => {
                self.compile_expression(value)?;
                let symbol = self.declare(name, *position)?;
                self.emit_store(symbol);
            }
            Statement::Assign { target, value, .. } => {
                self.compile_assign(target, value)?;
            }
            Statement::Function { name, params, body, position } => {
                // Declared before the body compiles so the function can
                // call itself.
                let symbol = self.declare(name, *position)?;
                self.compile_function(name.clone(), params, body, *position)?;
                self.emit_store(symbol);
            }
            Statement::Return { value, .. } => {
                match value {
                    Some(expression) => self.compile_expression(expression)?,
                    None => {
                        self.emit(Instruction::LoadNil);
                    }
                }
                self.emit(Instruction::ReturnValue);
            }
            Statement::For { init, condition, post, body, .. } => {
                self.compile_for(init, condition, post, body)?;
            }
            Statement::ForRange { first, second, iterable, body, position } => {
                self.compile_for_range(first, second.as_deref(), iterable, body, *position)?;
            }
            Statement::Break { position } => self.compile_break(*position)?,
            Statement::Continue { position } => self.compile_continue(*position)?,
            Statement::Expression { expression, .. } => self.compile_expression(expression)?,
        }
        Ok(())
    }

    fn compile_assign(&mut self, target: &Expression, value: &Expression) -> Result<(), CompileError> {
        match target {
            Expression::Ident { name, position } => {
                let symbol = self.resolve(name, *position)?;
                if symbol.scope == SymbolScope::Builtin {
                    return Err(CompileError::new(
                        format!("cannot assign to builtin \"{name}\""),
                        *position,
                    ));
                }
                self.compile_expression(value)?;
                self.emit_store(symbol);
            }
            Expression::Index { object, index, .. } => {
                self.compile_expression(object)?;
                self.compile_expression(index)?;
                self.compile_expression(value)?;
                self.emit(Instruction::SetItem);
            }
            Expression::Attr { object, name, position } => {
                self.compile_expression(object)?;
                self.compile_expression(value)?;
                let name = self.add_constant(Constant::Str(name.as_str().into()), *position)?;
                self.emit(Instruction::SetAttr(name));
            }
            other => {
                return Err(CompileError::new("invalid assignment target", other.position()));
            }
        }
        Ok(())
    }

    fn compile_for(
        &mut self,
        init: &Option<Box<Statement>>,
        condition: &Option<Expression>,
        post: &Option<Box<Statement>>,
        body: &[Statement],
    ) -> Result<(), CompileError> {
        self.table.enter_block();
        if let Some(init) = init {
            self.compile_statement(init)?;
            if matches!(init.as_ref(), Statement::Expression { .. }) {
                self.emit(Instruction::Pop);
            }
        }

        let loop_start = self.offset();
        let exit_jump = match condition {
            Some(condition) => {
                self.compile_expression(condition)?;
                Some(self.emit(Instruction::Nop))
            }
            None => None,
        };

        self.loops.push(LoopContext {
            breaks: Vec::new(),
            continues: Vec::new(),
            pops_iterator: false,
        });
        let body_result = self.compile_block_statements(body);

        // Post clause runs at the continue target, then control goes
        // back to the condition.
        let continue_target = self.offset();
        let tail_result = body_result.and_then(|()| {
            if let Some(post) = post {
                self.compile_statement(post)?;
                if matches!(post.as_ref(), Statement::Expression { .. }) {
                    self.emit(Instruction::Pop);
                }
            }
            Ok(())
        });
        self.emit(Instruction::Jump(loop_start as u32));

        let exit = self.offset() as u32;
        if let Some(at) = exit_jump {
            self.patch(at, Instruction::PopJumpIfFalse(exit));
        }
        let context = self.loops.pop().unwrap();
        for at in context.breaks {
            self.patch(at, Instruction::Jump(exit));
        }
        for at in context.continues {
            self.patch(at, Instruction::Jump(continue_target as u32));
        }
        self.table.exit_block();
        tail_result
    }

    fn compile_for_range(
        &mut self,
        first: &str,
        second: Option<&str>,
        iterable: &Expression,
        body: &[Statement],
        position: Position,
    ) -> Result<(), CompileError> {
        self.table.enter_block();
        self.compile_expression(iterable)?;
        self.emit(Instruction::GetIter);

        let head = self.offset();
        let range_at = self.emit(Instruction::Nop);
        let first_symbol = self.declare(first, position)?;
        let vars = match second {
            Some(second) => {
                // The key sits under the value, so the value variable
                // stores first.
                let second_symbol = self.declare(second, position)?;
                self.emit_store(second_symbol);
                self.emit_store(first_symbol);
                2
            }
            None => {
                self.emit_store(first_symbol);
                1
            }
        };

        self.loops.push(LoopContext {
            breaks: Vec::new(),
            continues: Vec::new(),
            pops_iterator: true,
        });
        let body_result = self.compile_block_statements(body);
        self.emit(Instruction::Jump(head as u32));

        let exit = self.offset() as u32;
        self.patch(range_at, Instruction::ForRange { exit, vars });
        let context = self.loops.pop().unwrap();
        for at in context.breaks {
            self.patch(at, Instruction::Jump(exit));
        }
        for at in context.continues {
            self.patch(at, Instruction::Jump(head as u32));
        }
        self.table.exit_block();
        body_result
    }

    fn compile_break(&mut self, position: Position) -> Result<(), CompileError> {
        let pops_iterator = match self.loops.last() {
            Some(context) => context.pops_iterator,
            None => return Err(CompileError::new("break outside of a loop", position)),
        };
        if pops_iterator {
            self.emit(Instruction::Pop);
        }
        let at = self.emit(Instruction::Nop);
        self.loops.last_mut().unwrap().breaks.push(at);
        Ok(())
    }

    fn compile_continue(&mut self, position: Position) -> Result<(), CompileError> {
        if self.loops.is_empty() {
            return Err(CompileError::new("continue outside of a loop", position));
        }
        let at = self.emit(Instruction::Nop);
        self.loops.last_mut().unwrap().continues.push(at);
        Ok(())
    }

    /// Compile a loop body. Every expression statement pops; loop
    /// bodies never produce a value.
    fn compile_block_statements(&mut self, body: &[Statement]) -> Result<(), CompileError> {
        self.table.enter_block();
        let result = (|| {
            for statement in body {
                self.compile_statement(statement)?;
                if matches!(statement, Statement::Expression { .. }) {
                    self.emit(Instruction::Pop);
                }
            }
            Ok(())
        })();
        self.table.exit_block();
        result
    }

    /// Compile a value-producing block: an if branch or a function
    /// body. Exactly one value is left on the stack, the final
    /// expression statement's or nil.
    fn compile_block_value(&mut self, body: &[Statement]) -> Result<(), CompileError> {
        self.table.enter_block();
        let result = (|| {
            let mut has_value = false;
            if let Some((last, rest)) = body.split_last() {
                for statement in rest {
                    self.compile_statement(statement)?;
                    if matches!(statement, Statement::Expression { .. }) {
                        self.emit(Instruction::Pop);
                    }
                }
                self.compile_statement(last)?;
                has_value = matches!(last, Statement::Expression { .. });
            }
            if !has_value {
                self.emit(Instruction::LoadNil);
            }
            Ok(())
        })();
        self.table.exit_block();
        result
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn compile_expression(&mut self, expression: &Expression) -> Result<(), CompileError> {
        match expression {
            Expression::Nil { .. } => {
                self.emit(Instruction::LoadNil);
            }
            Expression::Bool { value, .. } => {
                self.emit(if *value { Instruction::LoadTrue } else { Instruction::LoadFalse });
            }
            Expression::Int { value, position } => {
                let index = self.add_constant(Constant::Int(*value), *position)?;
                self.emit(Instruction::LoadConst(index));
            }
            Expression::Float { value, position } => {
                let index = self.add_constant(Constant::Float(*value), *position)?;
                self.emit(Instruction::LoadConst(index));
            }
            Expression::Str { value, position } => {
                let index = self.add_constant(Constant::Str(value.as_str().into()), *position)?;
                self.emit(Instruction::LoadConst(index));
            }
            Expression::Ident { name, position } => {
                let symbol = self.resolve(name, *position)?;
                self.emit_load(symbol);
            }
            Expression::List { elements, position } => {
                if elements.len() > u16::MAX as usize {
                    return Err(CompileError::new("too many list elements", *position));
                }
                for element in elements {
                    self.compile_expression(element)?;
                }
                self.emit(Instruction::MakeList(elements.len() as u16));
            }
            Expression::Map { entries, position } => {
                if entries.len() > u16::MAX as usize {
                    return Err(CompileError::new("too many map entries", *position));
                }
                for (key, value) in entries {
                    let index = self.add_constant(Constant::Str(key.as_str().into()), *position)?;
                    self.emit(Instruction::LoadConst(index));
                    self.compile_expression(value)?;
                }
                self.emit(Instruction::MakeMap(entries.len() as u16));
            }
            Expression::Prefix { operator, operand, .. } => {
                self.compile_expression(operand)?;
                self.emit(match operator {
                    PrefixOperator::Minus => Instruction::Negate,
                    PrefixOperator::Not => Instruction::Not,
                });
            }
            Expression::Infix { left, operator, right, .. } => {
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                self.emit(Instruction::BinaryOp(*operator));
            }
            Expression::If { condition, consequence, alternative, .. } => {
                self.compile_if(condition, consequence, alternative.as_deref())?;
            }
            Expression::Func { name, params, body, position } => {
                self.compile_function(name.clone().unwrap_or_default(), params, body, *position)?;
            }
            Expression::Call { callee, arguments, position } => {
                self.compile_expression(callee)?;
                if arguments.len() > u8::MAX as usize {
                    return Err(CompileError::new("too many arguments", *position));
                }
                for argument in arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Instruction::Call(arguments.len() as u8));
            }
            Expression::Index { object, index, .. } => {
                self.compile_expression(object)?;
                self.compile_expression(index)?;
                self.emit(Instruction::GetItem);
            }
            Expression::Slice { object, start, stop, .. } => {
                self.compile_expression(object)?;
                if let Some(start) = start {
                    self.compile_expression(start)?;
                }
                if let Some(stop) = stop {
                    self.compile_expression(stop)?;
                }
                self.emit(Instruction::GetSlice {
                    has_start: start.is_some(),
                    has_stop: stop.is_some(),
                });
            }
            Expression::Attr { object, name, position } => {
                self.compile_expression(object)?;
                let name = self.add_constant(Constant::Str(name.as_str().into()), *position)?;
                self.emit(Instruction::GetAttr(name));
            }
        }
        Ok(())
    }

    fn compile_if(
        &mut self,
        condition: &Expression,
        consequence: &[Statement],
        alternative: Option<&[Statement]>,
    ) -> Result<(), CompileError> {
        self.compile_expression(condition)?;
        let jump_false = self.emit(Instruction::Nop);
        self.compile_block_value(consequence)?;
        let jump_end = self.emit(Instruction::Nop);

        let else_offset = self.offset() as u32;
        self.patch(jump_false, Instruction::PopJumpIfFalse(else_offset));
        match alternative {
            Some(block) => self.compile_block_value(block)?,
            None => {
                self.emit(Instruction::LoadNil);
            }
        }
        let end = self.offset() as u32;
        self.patch(jump_end, Instruction::Jump(end));
        Ok(())
    }

    fn compile_function(
        &mut self,
        name: String,
        params: &[String],
        body: &[Statement],
        position: Position,
    ) -> Result<(), CompileError> {
        self.table.enter_function();
        self.functions.push(Vec::new());
        let body_result = self.compile_function_body(params, body, position);
        let instructions = self.functions.pop().unwrap();
        let scope = self.table.exit_function();
        body_result?;

        let frees = scope.free_variables();
        if frees.len() > u8::MAX as usize {
            return Err(CompileError::new("too many captured variables", position));
        }
        let unit = FunctionUnit {
            name,
            params: params.to_vec(),
            locals: scope.num_locals(),
            frees: frees.len() as u16,
            instructions,
        };

        // Push capture cells in free-variable order, celling parent
        // locals on first capture.
        for free in frees {
            match free.parent.scope {
                SymbolScope::Local => {
                    if self.table.mark_celled(free.parent.index) {
                        self.emit(Instruction::MakeCell(free.parent.index));
                    }
                    self.emit(Instruction::LoadLocalCell(free.parent.index));
                }
                SymbolScope::Free => {
                    self.emit(Instruction::LoadFreeCell(free.parent.index));
                }
                SymbolScope::Global | SymbolScope::Builtin => {
                    unreachable!("globals and builtins are never captured")
                }
            }
        }

        let function = self.add_constant(Constant::Function(Arc::new(unit)), position)?;
        self.emit(Instruction::MakeClosure { function, frees: frees.len() as u8 });
        Ok(())
    }

    fn compile_function_body(
        &mut self,
        params: &[String],
        body: &[Statement],
        position: Position,
    ) -> Result<(), CompileError> {
        for param in params {
            self.declare(param, position)?;
        }
        let mut returned = false;
        if let Some((last, rest)) = body.split_last() {
            for statement in rest {
                self.compile_statement(statement)?;
                if matches!(statement, Statement::Expression { .. }) {
                    self.emit(Instruction::Pop);
                }
            }
            self.compile_statement(last)?;
            match last {
                // The final expression is the implicit return value.
                Statement::Expression { .. } => {
                    self.emit(Instruction::ReturnValue);
                    returned = true;
                }
                Statement::Return { .. } => returned = true,
                _ => {}
            }
        }
        if !returned {
            self.emit(Instruction::LoadNil);
            self.emit(Instruction::ReturnValue);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Emission helpers
    // ------------------------------------------------------------------

    fn emit(&mut self, instruction: Instruction) -> usize {
        let stream = self.current_stream();
        stream.push(instruction);
        stream.len() - 1
    }

    fn patch(&mut self, at: usize, instruction: Instruction) {
        self.current_stream()[at] = instruction;
    }

    fn offset(&self) -> usize {
        match self.functions.last() {
            Some(stream) => stream.len(),
            None => self.code.main.instructions.len(),
        }
    }

    fn current_stream(&mut self) -> &mut Vec<Instruction> {
        match self.functions.last_mut() {
            Some(stream) => stream,
            None => &mut self.code.main.instructions,
        }
    }

    fn emit_load(&mut self, symbol: Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Instruction::LoadGlobal(symbol.index)),
            SymbolScope::Local => self.emit(Instruction::LoadLocal(symbol.index)),
            SymbolScope::Free => self.emit(Instruction::LoadFree(symbol.index)),
            SymbolScope::Builtin => self.emit(Instruction::LoadBuiltin(symbol.index)),
        };
    }

    fn emit_store(&mut self, symbol: Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Instruction::StoreGlobal(symbol.index)),
            SymbolScope::Local => self.emit(Instruction::StoreLocal(symbol.index)),
            SymbolScope::Free => self.emit(Instruction::StoreFree(symbol.index)),
            SymbolScope::Builtin => unreachable!("builtins are not assignable"),
        };
    }

    fn declare(&mut self, name: &str, position: Position) -> Result<Symbol, CompileError> {
        self.table.declare(name).map_err(|err| match err {
            DeclareError::Duplicate => {
                CompileError::new(format!("variable \"{name}\" already declared"), position)
            }
            DeclareError::Overflow => CompileError::new("too many variables", position),
        })
    }

    fn resolve(&mut self, name: &str, position: Position) -> Result<Symbol, CompileError> {
        self.table
            .resolve(name)
            .ok_or_else(|| CompileError::new(format!("undefined variable \"{name}\""), position))
    }

    fn add_constant(&mut self, constant: Constant, position: Position) -> Result<u16, CompileError> {
        if let Some(index) = self.code.constants.iter().position(|c| c == &constant) {
            return Ok(index as u16);
        }
        if self.code.constants.len() > u16::MAX as usize {
            return Err(CompileError::new("too many constants", position));
        }
        self.code.constants.push(constant);
        Ok((self.code.constants.len() - 1) as u16)
    }
}
