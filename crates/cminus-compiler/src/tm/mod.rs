//! The TM target machine: registers, instructions and the instruction stream.
//!
//! Memory layout used by generated code:
//!
//! ```text
//! dMem[max] <- GP      globals at 0, -1, -2, ... from GP
//!             FP       frame: 0 = old FP, -1 = return address,
//!                      -2.. = parameters, locals, temporaries
//! ```

mod opcode;
mod stream;

pub use opcode::{Format, Instruction, OpCode, Operands};
pub use stream::{InstructionStream, JumpKind, JumpLabel, Listing, ListingLine, PatchError};

/// Accumulator.
pub const AC: u8 = 0;
/// Second accumulator.
pub const AC1: u8 = 1;
/// Frame pointer.
pub const FP: u8 = 5;
/// Global pointer.
pub const GP: u8 = 6;
/// Program counter.
pub const PC: u8 = 7;

/// Frame slot holding the caller's frame pointer.
pub const OLD_FRAME_OFFSET: i32 = 0;
/// Frame slot holding the return address.
pub const RETURN_OFFSET: i32 = -1;
/// First frame slot available for parameters and locals.
pub const FIRST_LOCAL_OFFSET: i32 = -2;
