//! Test harness: compile helpers and a TM simulator.
//!
//! The simulator runs the instruction vector of a [`Listing`] directly. Data
//! memory starts zeroed with its highest address stored in location 0; all
//! registers start at 0.

#![allow(dead_code)]

use std::collections::VecDeque;

use cminus::ast::Program;
use cminus::tm::PC;
use cminus::{
    AnalyzerConfig, CompilationResult, Compiler, CompilerOptions, Listing, LookupPolicy, OpCode,
    Operands,
};
use thiserror::Error;

/// Words of data memory.
pub const DATA_SIZE: usize = 1024;

/// Instructions executed before a run is considered stuck.
pub const STEP_LIMIT: usize = 200_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrapError {
    #[error("instruction fetch out of range at {0}")]
    FetchOutOfRange(i64),

    #[error("data access out of range at {address} (pc {pc})")]
    DataOutOfRange { address: i64, pc: usize },

    #[error("division by zero at {0}")]
    DivideByZero(usize),

    #[error("input exhausted at {0}")]
    InputExhausted(usize),

    #[error("step limit exceeded")]
    StepLimit,
}

/// A TM machine loaded with one program.
pub struct Machine<'a> {
    code: &'a Listing,
    reg: [i64; 8],
    dmem: Vec<i64>,
    input: VecDeque<i64>,
    output: Vec<i64>,
    steps: usize,
}

impl<'a> Machine<'a> {
    pub fn new(code: &'a Listing, input: &[i64]) -> Self {
        let mut dmem = vec![0; DATA_SIZE];
        dmem[0] = (DATA_SIZE - 1) as i64;
        Self {
            code,
            reg: [0; 8],
            dmem,
            input: input.iter().copied().collect(),
            output: Vec::new(),
            steps: 0,
        }
    }

    pub fn output(&self) -> &[i64] {
        &self.output
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Run until `HALT`.
    pub fn run(&mut self) -> Result<(), TrapError> {
        loop {
            if self.steps >= STEP_LIMIT {
                return Err(TrapError::StepLimit);
            }
            self.steps += 1;
            if !self.step()? {
                return Ok(());
            }
        }
    }

    /// Execute one instruction; `false` once halted.
    fn step(&mut self) -> Result<bool, TrapError> {
        let code = self.code;
        let pc = self.reg[PC as usize];
        let instr = usize::try_from(pc)
            .ok()
            .and_then(|addr| code.get(addr))
            .ok_or(TrapError::FetchOutOfRange(pc))?;
        let pc = pc as usize;
        self.reg[PC as usize] += 1;

        match instr.operands {
            Operands::Ro { r, s, t } => {
                let (r, s, t) = (r as usize, s as usize, t as usize);
                match instr.op {
                    OpCode::Halt => return Ok(false),
                    OpCode::In => {
                        self.reg[r] = self
                            .input
                            .pop_front()
                            .ok_or(TrapError::InputExhausted(pc))?;
                    }
                    OpCode::Out => self.output.push(self.reg[r]),
                    OpCode::Add => self.reg[r] = self.reg[s].wrapping_add(self.reg[t]),
                    OpCode::Sub => self.reg[r] = self.reg[s].wrapping_sub(self.reg[t]),
                    OpCode::Mul => self.reg[r] = self.reg[s].wrapping_mul(self.reg[t]),
                    OpCode::Div => {
                        if self.reg[t] == 0 {
                            return Err(TrapError::DivideByZero(pc));
                        }
                        self.reg[r] = self.reg[s] / self.reg[t];
                    }
                    other => unreachable!("{} is not a register-only opcode", other.name()),
                }
            }
            Operands::Rm { r, d, s } => {
                let r = r as usize;
                let address = i64::from(d) + self.reg[s as usize];
                match instr.op {
                    OpCode::Ld => self.reg[r] = self.dmem[self.data_index(address, pc)?],
                    OpCode::Lda => self.reg[r] = address,
                    OpCode::Ldc => self.reg[r] = i64::from(d),
                    OpCode::St => {
                        let index = self.data_index(address, pc)?;
                        self.dmem[index] = self.reg[r];
                    }
                    op => {
                        let value = self.reg[r];
                        let taken = match op {
                            OpCode::Jlt => value < 0,
                            OpCode::Jle => value <= 0,
                            OpCode::Jgt => value > 0,
                            OpCode::Jge => value >= 0,
                            OpCode::Jeq => value == 0,
                            OpCode::Jne => value != 0,
                            other => unreachable!("{} is not a memory opcode", other.name()),
                        };
                        if taken {
                            self.reg[PC as usize] = address;
                        }
                    }
                }
            }
        }
        Ok(true)
    }

    fn data_index(&self, address: i64, pc: usize) -> Result<usize, TrapError> {
        usize::try_from(address)
            .ok()
            .filter(|index| *index < self.dmem.len())
            .ok_or(TrapError::DataOutOfRange { address, pc })
    }
}

/// Route `log` output through the test harness; `RUST_LOG=trace` shows every
/// emitted instruction.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Options resolving names through every enclosing scope.
pub fn lexical_options() -> CompilerOptions {
    CompilerOptions {
        analyzer: AnalyzerConfig {
            lookup: LookupPolicy::Lexical,
            ..AnalyzerConfig::default()
        },
        ..CompilerOptions::default()
    }
}

/// Compile with lexical lookup, panicking on any diagnostic.
pub fn compile_ok<'ast>(program: &Program<'ast>) -> CompilationResult<'ast> {
    init_logging();
    let result = Compiler::new(lexical_options()).compile(program);
    assert!(
        result.is_success(),
        "unexpected diagnostics:\n{}",
        result.diagnostics()
    );
    result
}

/// Compile, run with the given input and return everything written by `output`.
pub fn run(program: &Program<'_>, input: &[i64]) -> Vec<i64> {
    let result = compile_ok(program);
    let listing = result.listing().expect("code was generated");
    let mut machine = Machine::new(listing, input);
    if let Err(trap) = machine.run() {
        panic!("program trapped: {}\n{}", trap, listing);
    }
    machine.output().to_vec()
}
