#![forbid(unsafe_code)]

use brook_ast::Span;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("codegen error: {message}")]
#[diagnostic(code(brook::codegen))]
pub struct CodegenError {
    pub message: String,
    #[label]
    pub span: Span,
}

impl CodegenError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Fatal runtime errors. There is no catch mechanism; the dispatcher returns
/// the error from `run` and the VM terminates.
#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("division by zero")]
    #[diagnostic(code(brook::vm::div_zero))]
    DivisionByZero,

    #[error("invalid operands: {message}")]
    #[diagnostic(code(brook::vm::invalid_operands))]
    InvalidOperands { message: String },

    #[error("cannot call a value of kind '{found}'")]
    #[diagnostic(code(brook::vm::invalid_callee))]
    InvalidCallee { found: String },

    #[error("stack overflow")]
    #[diagnostic(code(brook::vm::stack_overflow))]
    StackOverflow,

    #[error("malformed return instruction")]
    #[diagnostic(code(brook::vm::malformed_return))]
    MalformedReturn,

    #[error("unknown built-in function '{0}'")]
    #[diagnostic(code(brook::vm::unknown_builtin))]
    UnknownBuiltin(String),

    #[error("constant index {index} out of range in '{function}'")]
    #[diagnostic(code(brook::vm::bad_constant))]
    UnknownConstant { function: String, index: usize },

    #[error("jump target {target} is past the end of '{function}'")]
    #[diagnostic(code(brook::vm::bad_jump))]
    JumpOutOfBounds { function: String, target: usize },

    #[error("instruction fetch past the end of '{function}'")]
    #[diagnostic(code(brook::vm::bad_fetch))]
    FetchPastEnd { function: String },

    #[error("io error: {0}")]
    #[diagnostic(code(brook::vm::io))]
    Io(String),
}
