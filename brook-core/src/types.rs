#![forbid(unsafe_code)]

use std::fmt;

use brook_ast::NumSuffix;

/// Primitive type ladder. The derived ordering is the widening order used by
/// [`PrimType::max`]; it is only meaningful within one family (signed,
/// unsigned, float).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrimType {
    Invalid,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Str,
    Void,
}

impl PrimType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "i8" => PrimType::I8,
            "i16" => PrimType::I16,
            "i32" => PrimType::I32,
            "i64" => PrimType::I64,
            "u8" => PrimType::U8,
            "u16" => PrimType::U16,
            "u32" => PrimType::U32,
            "u64" => PrimType::U64,
            "f32" => PrimType::F32,
            "f64" => PrimType::F64,
            "bool" => PrimType::Bool,
            "string" => PrimType::Str,
            "void" => PrimType::Void,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimType::Invalid => "<invalid>",
            PrimType::I8 => "i8",
            PrimType::I16 => "i16",
            PrimType::I32 => "i32",
            PrimType::I64 => "i64",
            PrimType::U8 => "u8",
            PrimType::U16 => "u16",
            PrimType::U32 => "u32",
            PrimType::U64 => "u64",
            PrimType::F32 => "f32",
            PrimType::F64 => "f64",
            PrimType::Bool => "bool",
            PrimType::Str => "string",
            PrimType::Void => "void",
        }
    }

    pub fn from_suffix(suffix: NumSuffix) -> Self {
        match suffix {
            NumSuffix::I8 => PrimType::I8,
            NumSuffix::I16 => PrimType::I16,
            NumSuffix::I32 => PrimType::I32,
            NumSuffix::I64 => PrimType::I64,
            NumSuffix::U8 => PrimType::U8,
            NumSuffix::U16 => PrimType::U16,
            NumSuffix::U32 => PrimType::U32,
            NumSuffix::U64 => PrimType::U64,
            NumSuffix::F32 => PrimType::F32,
            NumSuffix::F64 => PrimType::F64,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimType::I8 | PrimType::I16 | PrimType::I32 | PrimType::I64
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            PrimType::U8 | PrimType::U16 | PrimType::U32 | PrimType::U64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimType::F32 | PrimType::F64)
    }

    pub fn is_integer(self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn bit_size(self) -> u32 {
        match self {
            PrimType::I8 | PrimType::U8 => 8,
            PrimType::I16 | PrimType::U16 => 16,
            PrimType::I32 | PrimType::U32 | PrimType::F32 => 32,
            PrimType::I64 | PrimType::U64 | PrimType::F64 => 64,
            _ => 0,
        }
    }

    /// The wider of the two in ladder order.
    pub fn max(a: Self, b: Self) -> Self {
        if a > b {
            a
        } else {
            b
        }
    }
}

impl fmt::Display for PrimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuncType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    /// Present for variadic builtins; the element type is not consulted when
    /// checking arguments.
    pub spread: Option<Box<Type>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Prim(PrimType),
    /// `len == 0` denotes an open length.
    Array { elem: Box<Type>, len: usize },
    Func(FuncType),
}

impl Type {
    pub const INVALID: Type = Type::Prim(PrimType::Invalid);
    pub const VOID: Type = Type::Prim(PrimType::Void);
    pub const BOOL: Type = Type::Prim(PrimType::Bool);

    pub fn as_prim(&self) -> Option<PrimType> {
        match self {
            Type::Prim(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Prim(PrimType::Invalid))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Prim(PrimType::Void))
    }

    pub fn is_numeric(&self) -> bool {
        self.as_prim().map(PrimType::is_numeric).unwrap_or(false)
    }

    pub fn is_integer(&self) -> bool {
        self.as_prim().map(PrimType::is_integer).unwrap_or(false)
    }

    pub fn is_float(&self) -> bool {
        self.as_prim().map(PrimType::is_float).unwrap_or(false)
    }

    /// Widen inferred declaration types: signed integers to at least `i32`,
    /// unsigned to at least `u32`, floats to `f64`; arrays generalize their
    /// element type.
    pub fn generalized(&self) -> Type {
        match self {
            Type::Prim(p) if p.is_signed() => Type::Prim(PrimType::max(*p, PrimType::I32)),
            Type::Prim(p) if p.is_unsigned() => Type::Prim(PrimType::max(*p, PrimType::U32)),
            Type::Prim(p) if p.is_float() => Type::Prim(PrimType::F64),
            Type::Array { elem, len } => Type::Array {
                elem: Box::new(elem.generalized()),
                len: *len,
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Prim(p) => write!(f, "{p}"),
            Type::Array { elem, len } => {
                if *len > 0 {
                    write!(f, "{elem}[{len}]")
                } else {
                    write!(f, "{elem}[]")
                }
            }
            Type::Func(func) => {
                write!(f, "(")?;
                for (i, arg) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                if func.spread.is_some() {
                    if !func.params.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "...")?;
                }
                write!(f, ") -> {}", func.ret)
            }
        }
    }
}

/// Can a value of `right`'s type be stored into a target of `left`'s type
/// without truncation or sign change? Asymmetric; used for assignment,
/// return values and argument passing.
pub fn is_left_compatible(left: &Type, right: &Type) -> bool {
    if left == right {
        return true;
    }

    match (left, right) {
        (Type::Prim(l), Type::Prim(r)) => {
            if (l.is_float() && r.is_float())
                || (l.is_signed() && r.is_signed())
                || (l.is_unsigned() && r.is_unsigned())
            {
                l >= r
            } else {
                false
            }
        }
        (Type::Array { elem: le, len: ll }, Type::Array { elem: re, len: rl }) => {
            is_left_compatible(le, re) && (ll == rl || *ll == 0)
        }
        _ => false,
    }
}

/// Symmetric compatibility, used for equality comparisons and branch-merge
/// typing: any two numerics are compatible regardless of family.
pub fn is_compatible(a: &Type, b: &Type) -> bool {
    if a == b {
        return true;
    }

    match (a, b) {
        (Type::Prim(l), Type::Prim(r)) => l.is_numeric() && r.is_numeric(),
        (Type::Array { elem: le, len: ll }, Type::Array { elem: re, len: rl }) => {
            is_compatible(le, re) && (ll == rl || *ll == 0 || *rl == 0)
        }
        (Type::Func(l), Type::Func(r)) => {
            l.params.len() == r.params.len()
                && l.params
                    .iter()
                    .zip(r.params.iter())
                    .all(|(a, b)| is_compatible(a, b))
                && is_compatible(&l.ret, &r.ret)
        }
        _ => false,
    }
}
