pub mod api;
pub mod ast;
pub mod config;
pub mod error;
pub mod tac;

// Public API: `tacc::compile()` and friends.
pub use api::*;
pub use ast::Program;
pub use config::{CompileOptions, ReturnProtocol};
pub use error::{ArithmeticError, CompileError, CompileResult, InterpError};
pub use tac::optimize::Pass;
