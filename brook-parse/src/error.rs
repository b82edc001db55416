#![forbid(unsafe_code)]

use brook_ast::Span;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("parse error: {message}")]
#[diagnostic(code(brook::parse))]
pub struct ParseError {
    pub message: String,
    #[label]
    pub span: Span,
}
