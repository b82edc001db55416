#![forbid(unsafe_code)]

mod error;
mod parser;

use brook_lex::Lexer;
use miette::IntoDiagnostic;

pub use error::ParseError;
pub use parser::Parser;

pub fn parse_source(src: &str) -> miette::Result<brook_ast::Program> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new(&tokens);
    parser.parse_program().into_diagnostic()
}

/// Parse a source file while attempting to recover from errors.
///
/// Returns a best-effort AST and every `ParseError` encountered.
pub fn parse_source_with_recovery(
    src: &str,
) -> miette::Result<(brook_ast::Program, Vec<ParseError>)> {
    let tokens = Lexer::new(src).lex().into_diagnostic()?;
    let mut parser = Parser::new(&tokens);
    Ok(parser.parse_program_with_recovery())
}
