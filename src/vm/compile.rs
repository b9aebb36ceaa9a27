use tracing::debug;

use crate::ast::*;

use super::{Chunk, CompileError, Instruction, RegisterAllocator, ACC};

/// Compile a program with default options.
pub fn compile(program: &Program) -> Result<Chunk, CompileError> {
    Compiler::new().compile(program)
}

/// Single-pass AST → bytecode compiler.
///
/// Every expression leaves its value in the accumulator. A binary node parks
/// its left value in a scratch register while the right side is computed,
/// then combines `reg <op> acc`, so the register always holds the LEFT operand.
#[derive(Debug, Default)]
pub struct Compiler {
    chunk: Chunk,
    regs: RegisterAllocator,
    inspect: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler::default()
    }

    /// Emit `INSPECT r0` after each top-level statement.
    pub fn with_inspect(mut self, inspect: bool) -> Self {
        self.inspect = inspect;
        self
    }

    pub fn allocator(&self) -> &RegisterAllocator {
        &self.regs
    }

    pub fn compile(&mut self, program: &Program) -> Result<Chunk, CompileError> {
        self.chunk = Chunk::new();
        let result = self.compile_program(program);
        if result.is_err() {
            // An aborted compile leaves registers held mid-expression.
            self.regs = RegisterAllocator::new();
        }
        result?;
        Ok(std::mem::take(&mut self.chunk))
    }

    fn compile_program(&mut self, program: &Program) -> Result<(), CompileError> {
        self.check_clear()?;

        for (i, stmt) in program.statements.iter().enumerate() {
            let start = self.chunk.len();
            self.compile_expr(stmt)?;
            if self.inspect {
                self.chunk.push(Instruction::Inspect(ACC))?;
            }
            debug!(statement = i, instructions = self.chunk.len() - start, "compiled statement");
        }
        self.chunk.push(Instruction::End)?;

        self.check_clear()?;
        debug!(instructions = self.chunk.len(), constants = self.chunk.constants.len(), "compiled program");
        Ok(())
    }

    fn check_clear(&self) -> Result<(), CompileError> {
        if self.regs.is_clear() {
            Ok(())
        } else {
            Err(CompileError::LeakedRegisters { registers: self.regs.in_use() })
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Number { raw, span } => {
                let value = parse_literal(raw)
                    .ok_or_else(|| CompileError::MalformedLiteral { raw: raw.clone(), span: *span })?;
                self.chunk.push(Instruction::Load(value))?;
            }

            Expr::Binary { op, left, right } => {
                self.compile_expr(left)?;
                let r = self.regs.alloc()?;
                self.chunk.push(Instruction::Store(r))?;
                self.compile_expr(right)?;
                let inst = match op {
                    BinOp::Add => Instruction::Add(r),
                    BinOp::Subtract => Instruction::Subtract(r),
                    BinOp::Multiply => Instruction::Multiply(r),
                    BinOp::Divide => Instruction::Divide(r),
                };
                self.chunk.push(inst)?;
                self.regs.free(r)?;
            }

            Expr::Unary { op: UnaryOp::Negate, operand } => {
                self.compile_expr(operand)?;
                self.chunk.push(Instruction::Negate)?;
            }
        }
        Ok(())
    }
}
