//! Arithmetic expressions compiled to a register bytecode and run on a small VM.
//!
//! ```
//! let value = calc::eval("(1 + 2) * 3").unwrap();
//! assert_eq!(value, 9.0);
//! ```

pub mod ast;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod vm;

use ast::Program;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] lexer::LexError),
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    #[error(transparent)]
    Compile(#[from] vm::CompileError),
    #[error(transparent)]
    Vm(#[from] vm::VmError),
    #[error(transparent)]
    Runtime(#[from] interpreter::RuntimeError),
    #[error("cannot serialize program: {0}")]
    Emit(#[from] serde_json::Error),
}

/// Lex and parse `source`, keeping the text on the program for diagnostics.
pub fn parse_source(source: &str) -> Result<Program, Error> {
    let tokens = lexer::lex(source)?;
    let mut program = parser::parse(tokens)?;
    program.source = Some(source.to_string());
    Ok(program)
}

/// Compile `source` and run it on a fresh VM. Returns the final accumulator.
pub fn eval(source: &str) -> Result<f64, Error> {
    let program = parse_source(source)?;
    let chunk = vm::compile(&program)?;
    Ok(vm::run(&chunk)?)
}

/// The program as pretty-printed JSON, spans omitted.
pub fn emit_json(program: &Program) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(program)?)
}

/// Shortest form that reads back as the same value. Whole numbers print
/// without a fractional part and negative zero keeps its sign.
pub fn format_number(value: f64) -> String {
    value.to_string()
}
