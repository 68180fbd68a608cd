//! Call frame for the function call stack.

use std::rc::Rc;

use object_system::Function;

/// One function invocation in flight.
///
/// The frame pins the closure being executed (which owns both the
/// instruction stream and the code snapshot its constants index into),
/// the instruction pointer to resume in the caller, and the operand
/// stack index where this frame's locals region begins.
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    function: Rc<Function>,
    return_ip: usize,
    base: usize,
}

impl Frame {
    /// Create a frame for `function` with its locals rooted at `base`.
    pub(crate) fn new(function: Rc<Function>, return_ip: usize, base: usize) -> Self {
        Self { function, return_ip, base }
    }

    /// The executing closure.
    pub(crate) fn function(&self) -> &Rc<Function> {
        &self.function
    }

    /// Caller instruction pointer to restore on return.
    pub(crate) fn return_ip(&self) -> usize {
        self.return_ip
    }

    /// Operand stack index of local slot zero.
    pub(crate) fn base(&self) -> usize {
        self.base
    }
}
