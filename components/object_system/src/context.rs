//! Execution context passed through every run.
//!
//! The capabilities a running script depends on are carried explicitly
//! rather than discovered in an ambient bag: [`RunContext`] holds the
//! cancellation token and cost budget, and [`ExecEnv`] adds the optional
//! re-entrant call dispatcher that builtins use to invoke script
//! callables. [`CancelToken`] is cheap to clone and safe to trigger from
//! any thread while the owning VM runs on its own.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ExecError;
use crate::value::Value;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Shared cancellation flag with an optional deadline.
///
/// Cloning shares the flag, so a token handed to another thread can stop
/// a VM mid-run. Once triggered the token stays triggered; a VM observing
/// it aborts at its next checkpoint and every later checkpoint re-aborts,
/// which is what keeps cancellation impossible to swallow in script code.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    /// A token that never expires on its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that additionally trips once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            state: Arc::new(TokenState {
                cancelled: AtomicBool::new(false),
                deadline: Some(Instant::now() + timeout),
            }),
        }
    }

    /// Trigger the token. Idempotent.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// True once the token has been triggered or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire) || self.deadline_passed()
    }

    /// Checkpoint form: distinguishes explicit cancellation from deadline
    /// expiry.
    pub fn check(&self) -> Result<(), ExecError> {
        if self.state.cancelled.load(Ordering::Acquire) {
            return Err(ExecError::Cancelled);
        }
        if self.deadline_passed() {
            return Err(ExecError::DeadlineExceeded);
        }
        Ok(())
    }

    fn deadline_passed(&self) -> bool {
        match self.state.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

/// Per-run execution parameters: cancellation and an optional cost
/// budget. Shared by reference down the whole call tree of one run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    cancel: CancelToken,
    budget: Option<usize>,
}

impl RunContext {
    /// Context with no deadline and no budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an existing cancellation token.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Convenience for a fresh token with a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cancel = CancelToken::with_timeout(timeout);
        self
    }

    /// Cap the total evaluation cost of the run.
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = Some(budget);
        self
    }

    /// The cancellation token for this run.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// The cost budget, if one was set.
    pub fn budget(&self) -> Option<usize> {
        self.budget
    }

    /// Shorthand for `cancel_token().check()`.
    pub fn check_cancelled(&self) -> Result<(), ExecError> {
        self.cancel.check()
    }
}

/// Re-entrant dispatch of script callables, implemented by the VM.
///
/// Host code and builtins never walk frames themselves; they hand the
/// callable and arguments back through this trait and get a finished
/// value or a host-level failure.
pub trait CallDispatcher {
    /// Invoke `callable` (function, builtin, or partial) with `args`.
    fn call_value(
        &mut self,
        ctx: &RunContext,
        callable: &Value,
        args: Vec<Value>,
    ) -> Result<Value, ExecError>;
}

/// Environment handed to builtins: the run context plus, when the caller
/// is a VM, a dispatcher for calling back into script code.
///
/// Builtins return plain values, so a host-level failure from a nested
/// call (cancellation, budget exhaustion) cannot travel through the
/// return type. [`ExecEnv::fail`] records the failure on the environment
/// and hands back a placeholder; the VM consults [`ExecEnv::take_failure`]
/// after the builtin returns and propagates the recorded failure instead
/// of the placeholder, keeping those aborts out of reach of `try`.
pub struct ExecEnv<'a> {
    ctx: &'a RunContext,
    calls: Option<&'a mut dyn CallDispatcher>,
    failure: Option<ExecError>,
}

impl<'a> ExecEnv<'a> {
    /// Environment without a dispatcher; `call` reports unavailable.
    pub fn new(ctx: &'a RunContext) -> Self {
        Self { ctx, calls: None, failure: None }
    }

    /// Environment with a dispatcher attached.
    pub fn with_dispatcher(ctx: &'a RunContext, calls: &'a mut dyn CallDispatcher) -> Self {
        Self { ctx, calls: Some(calls), failure: None }
    }

    /// The run context.
    pub fn ctx(&self) -> &RunContext {
        self.ctx
    }

    /// Whether script callables can be invoked from here.
    pub fn can_call(&self) -> bool {
        self.calls.is_some()
    }

    /// Invoke a script callable. `None` means no dispatcher is attached
    /// to this environment.
    pub fn call(
        &mut self,
        callable: &Value,
        args: Vec<Value>,
    ) -> Option<Result<Value, ExecError>> {
        let ctx = self.ctx;
        match self.calls.as_mut() {
            Some(dispatcher) => Some(dispatcher.call_value(ctx, callable, args)),
            None => None,
        }
    }

    /// Record a host-level failure and return the value the builtin
    /// should hand back in its place. A raised error keeps its payload;
    /// every other failure is represented by a host-error placeholder
    /// that the VM discards in favor of the recorded failure.
    pub fn fail(&mut self, err: ExecError) -> Value {
        let placeholder = match &err {
            ExecError::Raised(raised) => Value::error(raised.clone()),
            other => Value::error(crate::errors::RuntimeError::host(other.to_string())),
        };
        self.failure = Some(err);
        placeholder
    }

    /// Take the failure recorded by [`ExecEnv::fail`], if any.
    pub fn take_failure(&mut self) -> Option<ExecError> {
        self.failure.take()
    }
}

/// Implementation type of a builtin function.
pub type BuiltinFn = Rc<dyn Fn(&mut ExecEnv<'_>, &[Value]) -> Value>;

/// A named host function callable from scripts.
///
/// Builtins signal failure by returning an error value; the VM raises
/// such returns. They receive an [`ExecEnv`] so container callbacks like
/// `list.map` can re-enter the VM.
#[derive(Clone)]
pub struct Builtin {
    name: Rc<str>,
    func: BuiltinFn,
}

impl Builtin {
    /// Wrap a closure as a named builtin.
    pub fn new(
        name: impl Into<Rc<str>>,
        func: impl Fn(&mut ExecEnv<'_>, &[Value]) -> Value + 'static,
    ) -> Self {
        Self { name: name.into(), func: Rc::new(func) }
    }

    /// The registered name, e.g. `len` or `list.append`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the builtin.
    pub fn call(&self, env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
        (self.func)(env, args)
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}
