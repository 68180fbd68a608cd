//! Integration test suite for the fjord runtime
//!
//! This crate provides integration tests that verify the components
//! work together correctly across component boundaries: source through
//! parser, compiler session, and VM to final values.

/// Re-export components for test convenience
pub mod components {
    pub use builtins;
    pub use bytecode_system;
    pub use compiler;
    pub use fjord_cli;
    pub use interpreter;
    pub use object_system;
    pub use parser;
}
