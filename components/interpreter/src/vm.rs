//! Stack-based bytecode virtual machine.
//!
//! A [`Vm`] executes one `Arc<Code>` snapshot. Operands and locals share
//! a single value stack: each call frame roots its locals region at the
//! frame base and expressions evaluate above it, so returning truncates
//! everything the callee produced in one step. Compiled code is immutable
//! and shared; the VM materializes [`Value`]s from the constant pool at
//! execution time, keeping runtime values single-threaded while snapshots
//! travel across worker threads freely.
//!
//! Backward jumps, range loops, calls, and attribute resolution double as
//! checkpoints where the run's [`RunContext`] is consulted, which bounds
//! how long a cancelled or over-budget script keeps running. Builtins are
//! invoked with the VM attached as [`CallDispatcher`], so host code can
//! re-enter script callables; a failed nested call restores the caller's
//! stack and frame depth before the failure propagates.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use arrayvec::ArrayVec;
use bytecode_system::{Code, Constant, Instruction};
use object_system::{
    resolve_attr, Builtin, CallDispatcher, ExecEnv, ExecError, Function, MapValue, RunContext,
    RuntimeError, Slice, Value,
};
use tracing::{debug, trace};

use crate::frame::Frame;

/// Maximum call depth; exceeding it fails the run with a stack overflow.
pub const MAX_FRAMES: usize = 1024;
/// Maximum operand stack height, locals included.
pub const MAX_STACK: usize = 65_536;

/// Per-run configuration.
#[derive(Debug, Clone, Default)]
pub struct VmOptions {
    /// Builtin values, in the order of the name table the code was
    /// compiled against. Values are per-VM because they are not `Send`;
    /// only the name order is fixed by compilation.
    pub builtins: Vec<Value>,
    /// Offset into the main instruction stream to start from. A REPL
    /// passes the previous pass's end so only new statements run.
    pub instruction_offset: usize,
    /// Initial global slot values, usually carried over from an earlier
    /// run of the same compiler session.
    pub globals: Vec<Value>,
    /// Evaluation cost budget for the run.
    pub budget: Option<usize>,
}

/// The virtual machine for one code snapshot.
pub struct Vm {
    code: Arc<Code>,
    globals: Vec<Value>,
    builtins: Vec<Value>,
    start: usize,
    budget: Option<usize>,
    stack: Vec<Value>,
    frames: ArrayVec<Frame, MAX_FRAMES>,
    ip: usize,
    limit: Option<usize>,
    spent: usize,
}

impl Vm {
    /// VM over `code` with default options: no builtins, no carried
    /// globals, full stream, no budget.
    pub fn new(code: Arc<Code>) -> Self {
        Self::with_options(code, VmOptions::default())
    }

    /// VM over `code` with explicit options. Missing global slots are
    /// filled with nil so a shorter carried vector stays valid.
    pub fn with_options(code: Arc<Code>, options: VmOptions) -> Self {
        let mut globals = options.globals;
        globals.resize(code.global_count(), Value::Nil);
        Self {
            code,
            globals,
            builtins: options.builtins,
            start: options.instruction_offset,
            budget: options.budget,
            stack: Vec::new(),
            frames: ArrayVec::new(),
            ip: 0,
            limit: None,
            spent: 0,
        }
    }

    /// Current global slot values.
    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// Consume the VM, keeping the globals for the next run of the same
    /// session.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// Execute the main stream from the configured offset to its end and
    /// return the value of the final expression statement, or nil.
    ///
    /// The effective budget is the tighter of the context's and the
    /// options'. Cancellation, deadline expiry, budget exhaustion, and
    /// stack overflow abort the run; a raised error that nothing
    /// intercepted comes back as [`ExecError::Raised`].
    pub fn run(&mut self, ctx: &RunContext) -> Result<Value, ExecError> {
        self.stack.clear();
        self.frames.clear();
        self.ip = self.start;
        self.spent = 0;
        self.limit = match (ctx.budget(), self.budget) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.execute(ctx, 0)
    }

    /// The dispatch loop. Runs until the main stream ends (`floor` 0) or
    /// until a return drops the frame stack below `floor` (re-entrant
    /// calls).
    fn execute(&mut self, ctx: &RunContext, floor: usize) -> Result<Value, ExecError> {
        loop {
            let inst = match self.fetch() {
                Some(inst) => inst,
                None => {
                    if !self.frames.is_empty() {
                        return Err(ExecError::internal("function body ended without a return"));
                    }
                    return Ok(self.stack.pop().unwrap_or(Value::Nil));
                }
            };
            trace!(target: "fjord::vm", "{:>4}  {}", self.ip - 1, inst);
            self.charge(1)?;
            if inst.is_jump()
                || matches!(
                    inst,
                    Instruction::Call(_) | Instruction::GetAttr(_) | Instruction::SetAttr(_)
                )
            {
                ctx.check_cancelled()?;
            }

            match inst {
                Instruction::LoadConst(index) => {
                    let value = self.constant_value(index)?;
                    self.stack.push(value);
                }
                Instruction::LoadNil => {
                    self.stack.push(Value::Nil);
                }
                Instruction::LoadTrue => {
                    self.stack.push(Value::Bool(true));
                }
                Instruction::LoadFalse => {
                    self.stack.push(Value::Bool(false));
                }
                Instruction::LoadGlobal(slot) => {
                    let value = self.globals.get(slot as usize).cloned().ok_or_else(|| {
                        ExecError::internal(format!("global slot {slot} out of range"))
                    })?;
                    self.stack.push(value);
                }
                Instruction::StoreGlobal(slot) => {
                    let value = self.pop()?;
                    match self.globals.get_mut(slot as usize) {
                        Some(dest) => *dest = value,
                        None => {
                            return Err(ExecError::internal(format!(
                                "global slot {slot} out of range"
                            )))
                        }
                    }
                }
                Instruction::LoadLocal(slot) => {
                    let index = self.local_index(slot)?;
                    let value = match &self.stack[index] {
                        Value::Cell(inner) => inner.borrow().clone(),
                        other => other.clone(),
                    };
                    self.stack.push(value);
                }
                Instruction::StoreLocal(slot) => {
                    let value = self.pop()?;
                    let index = self.local_index(slot)?;
                    match &self.stack[index] {
                        Value::Cell(inner) => *inner.borrow_mut() = value,
                        _ => self.stack[index] = value,
                    }
                }
                Instruction::LoadBuiltin(slot) => {
                    let value = self.builtins.get(slot as usize).cloned().ok_or_else(|| {
                        ExecError::internal(format!("builtin {slot} not provided to this VM"))
                    })?;
                    self.stack.push(value);
                }
                Instruction::MakeCell(slot) => {
                    let index = self.local_index(slot)?;
                    // A slot that already holds a cell keeps it: re-wrapping
                    // on a later loop iteration would detach closures that
                    // captured the slot earlier.
                    if !matches!(self.stack[index], Value::Cell(_)) {
                        let current = std::mem::replace(&mut self.stack[index], Value::Nil);
                        self.stack[index] = Value::cell(current);
                    }
                }
                Instruction::LoadLocalCell(slot) => {
                    let index = self.local_index(slot)?;
                    let value = self.stack[index].clone();
                    if !matches!(value, Value::Cell(_)) {
                        return Err(ExecError::internal(format!(
                            "local slot {slot} holds no cell"
                        )));
                    }
                    self.stack.push(value);
                }
                Instruction::LoadFree(index) => match self.free_value(index)? {
                    Value::Cell(inner) => {
                        let value = inner.borrow().clone();
                        self.stack.push(value);
                    }
                    _ => {
                        return Err(ExecError::internal(format!(
                            "captured slot {index} holds no cell"
                        )))
                    }
                },
                Instruction::StoreFree(index) => {
                    let value = self.pop()?;
                    match self.free_value(index)? {
                        Value::Cell(inner) => *inner.borrow_mut() = value,
                        _ => {
                            return Err(ExecError::internal(format!(
                                "captured slot {index} holds no cell"
                            )))
                        }
                    }
                }
                Instruction::LoadFreeCell(index) => {
                    let cell = self.free_value(index)?;
                    if !matches!(cell, Value::Cell(_)) {
                        return Err(ExecError::internal(format!(
                            "captured slot {index} holds no cell"
                        )));
                    }
                    self.stack.push(cell);
                }
                Instruction::MakeClosure { function, frees } => {
                    let unit = match self.current_code().constant(function) {
                        Some(Constant::Function(unit)) => unit.clone(),
                        _ => {
                            return Err(ExecError::internal(format!(
                                "constant {function} is not a function"
                            )))
                        }
                    };
                    let captured = self.pop_n(frees as usize)?;
                    if captured.iter().any(|value| !matches!(value, Value::Cell(_))) {
                        return Err(ExecError::internal("closure captures must be cells"));
                    }
                    let code = self.current_code().clone();
                    self.stack.push(Value::Function(Rc::new(Function::new(unit, code, captured))));
                }
                Instruction::MakeList(n) => {
                    let items = self.pop_n(n as usize)?;
                    let value = Value::list(items);
                    self.charge(value.cost())?;
                    self.stack.push(value);
                }
                Instruction::MakeMap(n) => {
                    let mut entries = self.pop_n(2 * n as usize)?.into_iter();
                    let mut map = MapValue::new();
                    while let (Some(key), Some(value)) = (entries.next(), entries.next()) {
                        map.insert(key, value)?;
                    }
                    let value = Value::map(map);
                    self.charge(value.cost())?;
                    self.stack.push(value);
                }
                Instruction::MakeSet(n) => {
                    let items = self.pop_n(n as usize)?;
                    let value = Value::set_from(items)?;
                    self.charge(value.cost())?;
                    self.stack.push(value);
                }
                Instruction::BinaryOp(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let result = raise_if_error(left.run_operation(op, &right))?;
                    self.charge(result.cost())?;
                    self.stack.push(result);
                }
                Instruction::Negate => {
                    let value = self.pop()?;
                    let result = raise_if_error(value.negate())?;
                    self.stack.push(result);
                }
                Instruction::Not => {
                    let value = self.pop()?;
                    self.stack.push(value.not());
                }
                Instruction::Jump(target) => {
                    self.ip = target as usize;
                }
                Instruction::PopJumpIfFalse(target) => {
                    let value = self.pop()?;
                    if !value.is_truthy() {
                        self.ip = target as usize;
                    }
                }
                Instruction::PopJumpIfTrue(target) => {
                    let value = self.pop()?;
                    if value.is_truthy() {
                        self.ip = target as usize;
                    }
                }
                Instruction::GetItem => {
                    let key = self.pop()?;
                    let container = self.pop()?;
                    let value = container.get_item(&key)?;
                    self.stack.push(value);
                }
                Instruction::SetItem => {
                    let value = self.pop()?;
                    let key = self.pop()?;
                    let container = self.pop()?;
                    container.set_item(&key, value)?;
                }
                Instruction::GetSlice { has_start, has_stop } => {
                    let stop = if has_stop { Some(self.pop()?) } else { None };
                    let start = if has_start { Some(self.pop()?) } else { None };
                    let container = self.pop()?;
                    let value = container.get_slice(Slice { start, stop })?;
                    self.stack.push(value);
                }
                Instruction::GetAttr(name) => {
                    let object = self.pop()?;
                    let value = {
                        let code = self.current_code();
                        let attr = code.attr_name(name).ok_or_else(|| {
                            ExecError::internal(format!(
                                "constant {name} is not an attribute name"
                            ))
                        })?;
                        resolve_attr(&object, ctx, attr)?
                    };
                    self.stack.push(value);
                }
                Instruction::SetAttr(name) => {
                    let value = self.pop()?;
                    let object = self.pop()?;
                    let code = self.current_code();
                    let attr = code.attr_name(name).ok_or_else(|| {
                        ExecError::internal(format!("constant {name} is not an attribute name"))
                    })?;
                    object.set_attr(attr, value)?;
                }
                Instruction::GetIter => {
                    let value = self.pop()?;
                    let iter = value.iter()?;
                    self.stack.push(iter);
                }
                Instruction::ForRange { exit, vars } => {
                    let iterator = self.top()?.clone();
                    match iterator.iter_next()? {
                        Some(primary) => {
                            if vars == 2 {
                                match iterator.iter_entry()? {
                                    Some(Value::Entry(entry)) => {
                                        self.stack.push(entry.key().clone());
                                        self.stack.push(entry.value().clone());
                                    }
                                    _ => {
                                        return Err(ExecError::internal(
                                            "iterator has no current entry",
                                        ))
                                    }
                                }
                            } else {
                                self.stack.push(primary);
                            }
                        }
                        None => {
                            self.pop()?;
                            self.ip = exit as usize;
                        }
                    }
                }
                Instruction::Call(argc) => {
                    let args = self.pop_n(argc as usize)?;
                    let callable = self.pop()?;
                    self.enter_call(ctx, callable, args)?;
                }
                Instruction::ReturnValue => {
                    let result = self.pop()?;
                    let frame = self
                        .frames
                        .pop()
                        .ok_or_else(|| ExecError::internal("return outside a function"))?;
                    debug!(
                        target: "fjord::vm",
                        "leave {}, depth {}",
                        frame.function().unit().signature(),
                        self.frames.len()
                    );
                    self.stack.truncate(frame.base());
                    self.ip = frame.return_ip();
                    if self.frames.len() < floor {
                        return Ok(result);
                    }
                    self.stack.push(result);
                }
                Instruction::Pop => {
                    self.pop()?;
                }
                Instruction::Nop => {
                    return Err(ExecError::internal("unpatched jump placeholder"));
                }
            }
        }
    }

    /// Begin a call from the dispatch loop. Script functions push a frame
    /// and continue in the same loop, so deep script recursion never
    /// consumes host stack; builtins run to completion here.
    fn enter_call(
        &mut self,
        ctx: &RunContext,
        callable: Value,
        args: Vec<Value>,
    ) -> Result<(), ExecError> {
        let (callable, args) = flatten_partial(callable, args);
        match callable {
            Value::Function(function) => self.push_frame(function, args),
            Value::Builtin(builtin) => {
                let result = self.call_builtin(ctx, &builtin, &args)?;
                self.stack.push(result);
                Ok(())
            }
            other => Err(RuntimeError::type_error(format!(
                "{} is not callable",
                other.type_name()
            ))
            .into()),
        }
    }

    /// Run a script function to completion, as required by re-entrant
    /// host calls. On failure the caller's stack, frames, and instruction
    /// pointer are restored before the error propagates.
    fn call_function(
        &mut self,
        ctx: &RunContext,
        function: Rc<Function>,
        args: Vec<Value>,
    ) -> Result<Value, ExecError> {
        let saved_stack = self.stack.len();
        let saved_ip = self.ip;
        let saved_frames = self.frames.len();
        self.push_frame(function, args)?;
        match self.execute(ctx, saved_frames + 1) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.frames.truncate(saved_frames);
                self.stack.truncate(saved_stack);
                self.ip = saved_ip;
                Err(err)
            }
        }
    }

    /// Invoke a builtin with the VM attached as its dispatcher. A
    /// recorded host-level failure takes precedence over the returned
    /// placeholder; an error value returned without one raises.
    fn call_builtin(
        &mut self,
        ctx: &RunContext,
        builtin: &Builtin,
        args: &[Value],
    ) -> Result<Value, ExecError> {
        let result = {
            let mut env = ExecEnv::with_dispatcher(ctx, self);
            let result = builtin.call(&mut env, args);
            if let Some(failure) = env.take_failure() {
                return Err(failure);
            }
            result
        };
        raise_if_error(result)
    }

    fn push_frame(&mut self, function: Rc<Function>, args: Vec<Value>) -> Result<(), ExecError> {
        if args.len() != function.arity() {
            return Err(arity_error(&function, args.len()).into());
        }
        if self.frames.is_full() {
            return Err(ExecError::StackOverflow);
        }
        let locals = function.unit().locals as usize;
        let base = self.stack.len();
        if base + locals > MAX_STACK {
            return Err(ExecError::StackOverflow);
        }
        self.stack.extend(args);
        self.stack.resize(base + locals, Value::Nil);
        debug!(
            target: "fjord::vm",
            "enter {}, depth {}",
            function.unit().signature(),
            self.frames.len() + 1
        );
        self.frames.push(Frame::new(function, self.ip, base));
        self.ip = 0;
        Ok(())
    }

    fn fetch(&mut self) -> Option<Instruction> {
        let inst = match self.frames.last() {
            Some(frame) => frame.function().unit().instructions.get(self.ip).copied(),
            None => self.code.main.instructions.get(self.ip).copied(),
        }?;
        self.ip += 1;
        Some(inst)
    }

    /// The code snapshot whose constant pool the executing instructions
    /// index into.
    fn current_code(&self) -> &Arc<Code> {
        match self.frames.last() {
            Some(frame) => frame.function().code(),
            None => &self.code,
        }
    }

    fn constant_value(&self, index: u16) -> Result<Value, ExecError> {
        let constant = self
            .current_code()
            .constant(index)
            .ok_or_else(|| ExecError::internal(format!("constant {index} out of range")))?;
        let value = match constant {
            Constant::Nil => Value::Nil,
            Constant::Bool(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::Float(x) => Value::Float(*x),
            Constant::Str(s) => Value::string(&**s),
            Constant::Function(unit) => {
                if unit.frees != 0 {
                    return Err(ExecError::internal(
                        "capturing function referenced as a plain constant",
                    ));
                }
                Value::Function(Rc::new(Function::new(
                    unit.clone(),
                    self.current_code().clone(),
                    Vec::new(),
                )))
            }
        };
        Ok(value)
    }

    fn local_index(&self, slot: u16) -> Result<usize, ExecError> {
        let frame = self
            .frames
            .last()
            .ok_or_else(|| ExecError::internal("local access outside a function"))?;
        let index = frame.base() + slot as usize;
        if index >= self.stack.len() {
            return Err(ExecError::internal(format!("local slot {slot} out of range")));
        }
        Ok(index)
    }

    fn free_value(&self, index: u16) -> Result<Value, ExecError> {
        let frame = self
            .frames
            .last()
            .ok_or_else(|| ExecError::internal("free variable access outside a function"))?;
        frame
            .function()
            .free(index as usize)
            .cloned()
            .ok_or_else(|| ExecError::internal(format!("captured slot {index} out of range")))
    }

    fn pop(&mut self) -> Result<Value, ExecError> {
        self.stack.pop().ok_or_else(|| ExecError::internal("operand stack underflow"))
    }

    fn top(&self) -> Result<&Value, ExecError> {
        self.stack.last().ok_or_else(|| ExecError::internal("operand stack underflow"))
    }

    fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, ExecError> {
        if self.stack.len() < n {
            return Err(ExecError::internal("operand stack underflow"));
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn charge(&mut self, amount: usize) -> Result<(), ExecError> {
        if let Some(limit) = self.limit {
            self.spent = self.spent.saturating_add(amount);
            if self.spent > limit {
                return Err(ExecError::BudgetExceeded(limit));
            }
        }
        Ok(())
    }
}

impl CallDispatcher for Vm {
    fn call_value(
        &mut self,
        ctx: &RunContext,
        callable: &Value,
        args: Vec<Value>,
    ) -> Result<Value, ExecError> {
        let (callable, args) = flatten_partial(callable.clone(), args);
        match callable {
            Value::Function(function) => self.call_function(ctx, function, args),
            Value::Builtin(builtin) => self.call_builtin(ctx, &builtin, &args),
            other => Err(RuntimeError::type_error(format!(
                "{} is not callable",
                other.type_name()
            ))
            .into()),
        }
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("ip", &self.ip)
            .field("stack_depth", &self.stack.len())
            .field("frame_depth", &self.frames.len())
            .field("globals", &self.globals.len())
            .finish()
    }
}

/// Unwrap partial applications, concatenating bound and fresh arguments,
/// until the underlying function or builtin surfaces.
fn flatten_partial(mut callable: Value, mut args: Vec<Value>) -> (Value, Vec<Value>) {
    while let Value::Partial(partial) = callable {
        let mut combined = partial.bound_args().to_vec();
        combined.append(&mut args);
        args = combined;
        callable = partial.callable().clone();
    }
    (callable, args)
}

fn raise_if_error(value: Value) -> Result<Value, ExecError> {
    match value {
        Value::Error(err) => Err(ExecError::Raised((*err).clone())),
        other => Ok(other),
    }
}

fn arity_error(function: &Function, got: usize) -> RuntimeError {
    let name = if function.name().is_empty() { "function" } else { function.name() };
    let want = match function.arity() {
        0 => "no arguments".to_string(),
        1 => "exactly 1 argument".to_string(),
        n => format!("exactly {n} arguments"),
    };
    RuntimeError::arity(name, &want, got)
}
