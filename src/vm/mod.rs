use tracing::info;

use crate::ast::Span;

mod compile;
mod regalloc;

pub use compile::{compile, Compiler};
pub use regalloc::RegisterAllocator;

/// Size of the register file: the accumulator `r0` plus scratch registers.
pub const REGISTER_COUNT: usize = 16;

/// Index of the accumulator. Every load and arithmetic result lands here.
pub const ACC: u8 = 0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("malformed number literal '{raw}'")]
    MalformedLiteral { raw: String, span: Span },
    #[error("expression nests too deeply: all {} scratch registers are in use", REGISTER_COUNT - 1)]
    RegistersExhausted,
    #[error("register r{register} released while not allocated")]
    DoubleFree { register: u8 },
    #[error("registers still allocated after compilation: {registers:?}")]
    LeakedRegisters { registers: Vec<u8> },
    #[error("too many distinct literals: the constant pool holds at most {} entries", u16::MAX as usize + 1)]
    TooManyConstants,
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::MalformedLiteral { .. } => "CALC-C001",
            CompileError::RegistersExhausted => "CALC-C002",
            CompileError::DoubleFree { .. } => "CALC-C003",
            CompileError::LeakedRegisters { .. } => "CALC-C004",
            CompileError::TooManyConstants => "CALC-C005",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    #[error("out of bounds register access: r{register} at instruction {ip}")]
    RegisterOutOfBounds { register: u8, ip: usize },
    #[error("unknown opcode: {op} at instruction {ip}")]
    UnknownOpcode { op: u8, ip: usize },
    #[error("constant index {index} out of range at instruction {ip}")]
    BadConstant { index: u16, ip: usize },
}

impl VmError {
    pub fn code(&self) -> &'static str {
        match self {
            VmError::RegisterOutOfBounds { .. } => "CALC-R001",
            VmError::UnknownOpcode { .. } => "CALC-R002",
            VmError::BadConstant { .. } => "CALC-R003",
        }
    }
}

type VmResult<T> = Result<T, VmError>;

// ── Opcodes (32-bit packed instructions) ────────────────────────────
//
// [OP:8 | A:8 | Bx:16]
//
// A:  register operand (STORE, ADD, SUBTRACT, MULTIPLY, DIVIDE, INSPECT)
// Bx: constant pool index (LOAD)

pub(crate) const OP_NOP: u8 = 0;
pub(crate) const OP_LOAD: u8 = 1; // R[0] = K[Bx]
pub(crate) const OP_STORE: u8 = 2; // R[A] = R[0]; R[0] = 0
pub(crate) const OP_ADD: u8 = 3; // R[0] = R[A] + R[0]
pub(crate) const OP_SUBTRACT: u8 = 4; // R[0] = R[A] - R[0]
pub(crate) const OP_MULTIPLY: u8 = 5; // R[0] = R[A] * R[0]
pub(crate) const OP_DIVIDE: u8 = 6; // R[0] = R[A] / R[0]
pub(crate) const OP_NEGATE: u8 = 7; // R[0] = -R[0]
pub(crate) const OP_INSPECT: u8 = 8;
pub(crate) const OP_END: u8 = 9;

#[inline(always)]
fn encode_abx(op: u8, a: u8, bx: u16) -> u32 {
    (op as u32) << 24 | (a as u32) << 16 | bx as u32
}

// ── Instructions ────────────────────────────────────────────────────

/// What an instruction's operand means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    None,
    Literal(f64),
    Register(u8),
}

/// Decoded, typed form of one packed instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    Nop,
    Load(f64),
    Store(u8),
    Add(u8),
    Subtract(u8),
    Multiply(u8),
    Divide(u8),
    Negate,
    Inspect(u8),
    End,
}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::Nop => OP_NOP,
            Instruction::Load(_) => OP_LOAD,
            Instruction::Store(_) => OP_STORE,
            Instruction::Add(_) => OP_ADD,
            Instruction::Subtract(_) => OP_SUBTRACT,
            Instruction::Multiply(_) => OP_MULTIPLY,
            Instruction::Divide(_) => OP_DIVIDE,
            Instruction::Negate => OP_NEGATE,
            Instruction::Inspect(_) => OP_INSPECT,
            Instruction::End => OP_END,
        }
    }

    pub fn operand(&self) -> Operand {
        match *self {
            Instruction::Load(v) => Operand::Literal(v),
            Instruction::Store(r)
            | Instruction::Add(r)
            | Instruction::Subtract(r)
            | Instruction::Multiply(r)
            | Instruction::Divide(r)
            | Instruction::Inspect(r) => Operand::Register(r),
            Instruction::Nop | Instruction::Negate | Instruction::End => Operand::None,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Nop => "NOP",
            Instruction::Load(_) => "LOAD",
            Instruction::Store(_) => "STORE",
            Instruction::Add(_) => "ADD",
            Instruction::Subtract(_) => "SUBTRACT",
            Instruction::Multiply(_) => "MULTIPLY",
            Instruction::Divide(_) => "DIVIDE",
            Instruction::Negate => "NEGATE",
            Instruction::Inspect(_) => "INSPECT",
            Instruction::End => "END",
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operand() {
            Operand::None => write!(f, "{}", self.mnemonic()),
            Operand::Literal(v) => write!(f, "{} {}", self.mnemonic(), v),
            Operand::Register(r) => write!(f, "{} r{}", self.mnemonic(), r),
        }
    }
}

// ── Chunk ────────────────────────────────────────────────────────────

/// A compiled instruction stream plus the literal values it loads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    pub code: Vec<u32>,
    pub constants: Vec<f64>,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk::default()
    }

    /// Build a chunk from typed instructions, in order.
    pub fn assemble(instructions: &[Instruction]) -> Result<Chunk, CompileError> {
        let mut chunk = Chunk::new();
        for &inst in instructions {
            chunk.push(inst)?;
        }
        Ok(chunk)
    }

    /// Identical literals (by bit pattern) share one pool slot.
    fn add_const(&mut self, val: f64) -> Result<u16, CompileError> {
        if let Some(i) = self.constants.iter().position(|c| c.to_bits() == val.to_bits()) {
            return Ok(i as u16);
        }
        let idx = u16::try_from(self.constants.len()).map_err(|_| CompileError::TooManyConstants)?;
        self.constants.push(val);
        Ok(idx)
    }

    fn emit(&mut self, inst: u32) -> usize {
        let idx = self.code.len();
        self.code.push(inst);
        idx
    }

    /// Encode and append one instruction, returning its position.
    pub fn push(&mut self, inst: Instruction) -> Result<usize, CompileError> {
        let word = match inst.operand() {
            Operand::None => encode_abx(inst.opcode(), 0, 0),
            Operand::Literal(v) => {
                let ki = self.add_const(v)?;
                encode_abx(inst.opcode(), ACC, ki)
            }
            Operand::Register(r) => encode_abx(inst.opcode(), r, 0),
        };
        Ok(self.emit(word))
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Decode the instruction at `ip`. Reading past the end yields `End`.
    pub fn decode(&self, ip: usize) -> VmResult<Instruction> {
        let Some(&inst) = self.code.get(ip) else {
            return Ok(Instruction::End);
        };
        let op = (inst >> 24) as u8;
        let a = ((inst >> 16) & 0xFF) as u8;
        let bx = (inst & 0xFFFF) as u16;
        Ok(match op {
            OP_NOP => Instruction::Nop,
            OP_LOAD => {
                let v = self.constants.get(bx as usize).ok_or(VmError::BadConstant { index: bx, ip })?;
                Instruction::Load(*v)
            }
            OP_STORE => Instruction::Store(a),
            OP_ADD => Instruction::Add(a),
            OP_SUBTRACT => Instruction::Subtract(a),
            OP_MULTIPLY => Instruction::Multiply(a),
            OP_DIVIDE => Instruction::Divide(a),
            OP_NEGATE => Instruction::Negate,
            OP_INSPECT => Instruction::Inspect(a),
            OP_END => Instruction::End,
            _ => return Err(VmError::UnknownOpcode { op, ip }),
        })
    }

    pub fn instructions(&self) -> impl Iterator<Item = VmResult<Instruction>> + '_ {
        (0..self.code.len()).map(|ip| self.decode(ip))
    }

    /// One line per instruction: `0003  STORE r1`.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (ip, inst) in self.instructions().enumerate() {
            match inst {
                Ok(inst) => out.push_str(&format!("{ip:04}  {inst}\n")),
                Err(e) => out.push_str(&format!("{ip:04}  ??? ({e})\n")),
            }
        }
        out
    }

    /// Big-endian byte stream: the code words followed by the constant pool.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.code.len() * 4 + self.constants.len() * 8);
        for word in &self.code {
            bytes.extend_from_slice(&word.to_be_bytes());
        }
        for k in &self.constants {
            bytes.extend_from_slice(&k.to_bits().to_be_bytes());
        }
        bytes
    }
}

// ── VM ───────────────────────────────────────────────────────────────

/// Execute a chunk on a fresh VM and return the accumulator.
pub fn run(chunk: &Chunk) -> VmResult<f64> {
    Vm::new().execute(chunk)
}

/// Accumulator machine over a fixed register file.
#[derive(Debug, Clone)]
pub struct Vm {
    reg: [f64; REGISTER_COUNT],
    ip: usize,
    trace: bool,
    inspections: Vec<(u8, f64)>,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm { reg: [0.0; REGISTER_COUNT], ip: 0, trace: false, inspections: Vec::new() }
    }

    /// Log every executed instruction at `info` level.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Zero the registers, rewind to the first instruction and forget inspections.
    pub fn reset(&mut self) {
        self.reg = [0.0; REGISTER_COUNT];
        self.ip = 0;
        self.inspections.clear();
    }

    pub fn accumulator(&self) -> f64 {
        self.reg[ACC as usize]
    }

    pub fn register(&self, index: usize) -> Option<f64> {
        self.reg.get(index).copied()
    }

    /// Values reported by `INSPECT`, in execution order.
    pub fn inspections(&self) -> &[(u8, f64)] {
        &self.inspections
    }

    fn slot(&self, register: u8) -> VmResult<usize> {
        let i = register as usize;
        if i < REGISTER_COUNT {
            Ok(i)
        } else {
            Err(VmError::RegisterOutOfBounds { register, ip: self.ip })
        }
    }

    /// Run `chunk` from a fresh state until `END` or the end of the code.
    /// Returns the accumulator.
    pub fn execute(&mut self, chunk: &Chunk) -> VmResult<f64> {
        self.reset();

        while self.ip < chunk.len() {
            let inst = chunk.decode(self.ip)?;
            if self.trace {
                info!(target: "calc::vm", "{:04}  {:<14} acc={}", self.ip, inst.to_string(), self.accumulator());
            }

            match inst {
                Instruction::Nop => {}
                Instruction::Load(v) => self.reg[0] = v,
                Instruction::Store(r) => {
                    let i = self.slot(r)?;
                    self.reg[i] = self.reg[0];
                    self.reg[0] = 0.0;
                }
                Instruction::Add(r) => {
                    let i = self.slot(r)?;
                    self.reg[0] = self.reg[i] + self.reg[0];
                }
                Instruction::Subtract(r) => {
                    let i = self.slot(r)?;
                    self.reg[0] = self.reg[i] - self.reg[0];
                }
                Instruction::Multiply(r) => {
                    let i = self.slot(r)?;
                    self.reg[0] = self.reg[i] * self.reg[0];
                }
                Instruction::Divide(r) => {
                    let i = self.slot(r)?;
                    self.reg[0] = self.reg[i] / self.reg[0];
                }
                Instruction::Negate => self.reg[0] = -self.reg[0],
                Instruction::Inspect(r) => {
                    let i = self.slot(r)?;
                    info!(target: "calc::vm", register = r, value = self.reg[i], "inspect");
                    self.inspections.push((r, self.reg[i]));
                }
                Instruction::End => break,
            }
            self.ip += 1;
        }

        Ok(self.accumulator())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
