#![forbid(unsafe_code)]

use std::fmt;

/// Frame-relative register index. Registers are slots in the VM stack,
/// addressed from the current frame's base pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reg(pub usize);

/// Index into a function's constant pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstIdx(pub usize);

/// The three-address binary operators. One opcode each; `and`/`or` select
/// bitwise or logical behavior by operand kind at execution time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte
        )
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::Div => "Div",
            BinaryOp::Mod => "Mod",
            BinaryOp::Pow => "Pow",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
            BinaryOp::Xor => "Xor",
            BinaryOp::Shl => "Shl",
            BinaryOp::Shr => "Shr",
            BinaryOp::Eq => "Eq",
            BinaryOp::Neq => "Neq",
            BinaryOp::Lt => "Lt",
            BinaryOp::Lte => "Lte",
            BinaryOp::Gt => "Gt",
            BinaryOp::Gte => "Gte",
        }
    }
}

/// One VM instruction with its operands. Branch targets are zero-based
/// indices into the owning function's instruction list; placeholders are
/// emitted with `PATCH_TARGET` and overwritten once the destination address
/// is known.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    Halt,
    Move { dst: Reg, src: Reg },
    LoadConst { dst: Reg, idx: ConstIdx },
    LoadBool { dst: Reg, imm: bool },
    LoadString { dst: Reg, imm: String },
    LoadImm32 { dst: Reg, imm: i32 },
    Binary { op: BinaryOp, dst: Reg, a: Reg, b: Reg },
    Not { dst: Reg, src: Reg },
    Neg { dst: Reg, src: Reg },
    Jump { target: usize },
    JumpIf { cond: Reg, imm: bool, target: usize },
    Call { callee: Reg, argc: usize, retc: usize },
    Return { from: Reg, count: usize },
    Nop,
}

/// Placeholder branch target; always overwritten by a patch before the VM
/// sees it.
pub const PATCH_TARGET: usize = usize::MAX;

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Halt => write!(f, "Halt"),
            Instr::Move { dst, src } => write!(f, "Move       r{}, r{}", dst.0, src.0),
            Instr::LoadConst { dst, idx } => {
                write!(f, "LoadConst  r{}, const#{}", dst.0, idx.0)
            }
            Instr::LoadBool { dst, imm } => write!(f, "LoadBool   r{}, {}", dst.0, imm),
            Instr::LoadString { dst, imm } => write!(f, "LoadString r{}, {}", dst.0, imm),
            Instr::LoadImm32 { dst, imm } => write!(f, "LoadImm32  r{}, {}", dst.0, imm),
            Instr::Binary { op, dst, a, b } => write!(
                f,
                "{:<10} r{}, r{}, r{}",
                op.mnemonic(),
                dst.0,
                a.0,
                b.0
            ),
            Instr::Not { dst, src } => write!(f, "Not        r{}, r{}", dst.0, src.0),
            Instr::Neg { dst, src } => write!(f, "Neg        r{}, r{}", dst.0, src.0),
            Instr::Jump { target } => write!(f, "Jump       {target}"),
            Instr::JumpIf { cond, imm, target } => {
                write!(f, "JumpIf     r{}, {}, {}", cond.0, imm, target)
            }
            Instr::Call { callee, argc, retc } => {
                write!(f, "Call       r{}, {}, {}", callee.0, argc, retc)
            }
            Instr::Return { from, count } => write!(f, "Return     r{}, {}", from.0, count),
            Instr::Nop => write!(f, "Nop"),
        }
    }
}
