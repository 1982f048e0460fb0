//! TM operation codes and instructions.
//!
//! The TM is a register machine with eight registers and two instruction
//! formats. Register-only (RO) instructions take three registers
//! `r,s,t`; register-memory (RM) instructions take a register, a
//! displacement and a base register, written `r,d(s)`.

use std::fmt;

/// TM operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    // =========================================================================
    // Register-only
    // =========================================================================
    /// Stop execution.
    Halt,
    /// Read an integer into `r`.
    In,
    /// Write the integer in `r`.
    Out,
    /// `r = s + t`
    Add,
    /// `r = s - t`
    Sub,
    /// `r = s * t`
    Mul,
    /// `r = s / t`
    Div,

    // =========================================================================
    // Register-memory
    // =========================================================================
    /// `r = dMem[d + s]`
    Ld,
    /// `r = d + s`
    Lda,
    /// `r = d`
    Ldc,
    /// `dMem[d + s] = r`
    St,
    /// `if r < 0 { pc = d + s }`
    Jlt,
    /// `if r <= 0 { pc = d + s }`
    Jle,
    /// `if r > 0 { pc = d + s }`
    Jgt,
    /// `if r >= 0 { pc = d + s }`
    Jge,
    /// `if r == 0 { pc = d + s }`
    Jeq,
    /// `if r != 0 { pc = d + s }`
    Jne,
}

/// Instruction format of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    RegisterOnly,
    RegisterMemory,
}

impl OpCode {
    /// Get the assembler mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Halt => "HALT",
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Div => "DIV",
            OpCode::Ld => "LD",
            OpCode::Lda => "LDA",
            OpCode::Ldc => "LDC",
            OpCode::St => "ST",
            OpCode::Jlt => "JLT",
            OpCode::Jle => "JLE",
            OpCode::Jgt => "JGT",
            OpCode::Jge => "JGE",
            OpCode::Jeq => "JEQ",
            OpCode::Jne => "JNE",
        }
    }

    pub fn format(self) -> Format {
        match self {
            OpCode::Halt
            | OpCode::In
            | OpCode::Out
            | OpCode::Add
            | OpCode::Sub
            | OpCode::Mul
            | OpCode::Div => Format::RegisterOnly,
            _ => Format::RegisterMemory,
        }
    }

    /// Whether this is a conditional jump on a register.
    pub fn is_conditional_jump(self) -> bool {
        matches!(
            self,
            OpCode::Jlt | OpCode::Jle | OpCode::Jgt | OpCode::Jge | OpCode::Jeq | OpCode::Jne
        )
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operands of one instruction, by format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// `r,s,t`
    Ro { r: u8, s: u8, t: u8 },
    /// `r,d(s)`
    Rm { r: u8, d: i32, s: u8 },
}

/// One TM instruction with its listing comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub op: OpCode,
    pub operands: Operands,
    pub comment: String,
}

impl Instruction {
    /// Build a register-only instruction.
    pub fn ro(op: OpCode, r: u8, s: u8, t: u8, comment: impl Into<String>) -> Self {
        debug_assert_eq!(op.format(), Format::RegisterOnly, "{op} is not an RO opcode");
        Self {
            op,
            operands: Operands::Ro { r, s, t },
            comment: comment.into(),
        }
    }

    /// Build a register-memory instruction.
    pub fn rm(op: OpCode, r: u8, d: i32, s: u8, comment: impl Into<String>) -> Self {
        debug_assert_eq!(op.format(), Format::RegisterMemory, "{op} is not an RM opcode");
        Self {
            op,
            operands: Operands::Rm { r, d, s },
            comment: comment.into(),
        }
    }

    /// The `r` register, common to both formats.
    pub fn target(&self) -> u8 {
        match self.operands {
            Operands::Ro { r, .. } | Operands::Rm { r, .. } => r,
        }
    }

    /// Displacement of an RM instruction.
    pub fn displacement(&self) -> Option<i32> {
        match self.operands {
            Operands::Rm { d, .. } => Some(d),
            Operands::Ro { .. } => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operands {
            Operands::Ro { r, s, t } => {
                write!(f, "{:>5} {},{},{} \t{}", self.op.name(), r, s, t, self.comment)
            }
            Operands::Rm { r, d, s } => {
                write!(f, "{:>5} {},{}({}) \t{}", self.op.name(), r, d, s, self.comment)
            }
        }
    }
}
