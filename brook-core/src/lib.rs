#![forbid(unsafe_code)]

mod check;
mod env;
mod error;
mod fold;
mod types;

pub use check::{Analysis, CheckOutcome, Checker};
pub use env::{Env, SymbolId, SymbolInfo, SymbolKind, TypeId, TypeInfo};
pub use error::{SemanticError, SemanticWarning};
pub use fold::fold_program;
pub use types::{is_compatible, is_left_compatible, FuncType, PrimType, Type};
