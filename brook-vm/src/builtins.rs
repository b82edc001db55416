#![forbid(unsafe_code)]

use crate::error::RuntimeError;
use crate::value::Value;
use crate::vm::Output;

pub type BuiltinFn = fn(&[Value], &mut Output) -> Result<(), RuntimeError>;

/// Name-keyed built-in registry. The code generator registers one named
/// constant per entry in the module's pool; the VM dispatches here when the
/// callee is a builtin reference.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    match name {
        "println" => Some(builtin_println),
        _ => None,
    }
}

pub fn names() -> &'static [&'static str] {
    &["println"]
}

/// Variadic print: arguments rendered space-separated, one line per call,
/// flushed immediately.
fn builtin_println(args: &[Value], out: &mut Output) -> Result<(), RuntimeError> {
    let mut line = String::new();
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            line.push(' ');
        }
        line.push_str(&display_value(arg));
    }
    out.write_line(&line)
}

/// Display form of a runtime value. Strings are stored as source literals,
/// so the surrounding quotes are stripped and standard escapes decoded here.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::I8(v) | Value::I16(v) | Value::I32(v) | Value::I64(v) => v.to_string(),
        Value::F32(v) | Value::F64(v) => v.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Str(raw) => decode_string_literal(raw),
        Value::Func(_) => "function".to_string(),
        Value::Builtin(_) => "build-in-function".to_string(),
    }
}

fn decode_string_literal(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            // Unknown escapes pass through unchanged.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
