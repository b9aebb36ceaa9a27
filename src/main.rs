use std::io::{BufRead, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::Level;

use calc::ast::Program;
use calc::diagnostic::{ansi::AnsiRenderer, json, registry, Diagnostic};
use calc::vm::{Compiler, Vm};
use calc::{emit_json, format_number, interpreter, parse_source, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Engine {
    /// Compile to bytecode and run on the register VM
    Vm,
    /// Walk the syntax tree directly
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// The parsed program as JSON
    Json,
    /// The compiled chunk, one instruction per line
    Bytecode,
}

/// Compile arithmetic expressions to register bytecode and run them.
#[derive(Debug, Parser)]
#[command(name = "calc", version, about)]
struct Cli {
    /// Expression text, a path to a file, or `-` for stdin
    #[arg(allow_hyphen_values = true)]
    input: Option<String>,

    #[arg(long, value_enum, default_value_t = Engine::Vm)]
    engine: Engine,

    /// Print the AST or bytecode instead of running
    #[arg(long, value_enum)]
    emit: Option<Emit>,

    /// Log each executed instruction
    #[arg(long)]
    trace: bool,

    /// Debug-level logging
    #[arg(long)]
    verbose: bool,

    /// Render errors as JSON diagnostics
    #[arg(long)]
    json: bool,

    /// Print the explanation for an error code
    #[arg(long, value_name = "CODE")]
    explain: Option<String>,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.trace {
        Level::INFO
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .without_time()
        .init();
}

fn report(cli: &Cli, err: &Error, source: &str) {
    let d = Diagnostic::from(err).with_source(source);
    if cli.json {
        eprintln!("{}", json::render(&d));
    } else {
        let renderer = AnsiRenderer { use_color: std::io::stderr().is_terminal() };
        eprint!("{}", renderer.render(&d));
    }
}

fn run_vm(cli: &Cli, program: &Program) -> Result<Vec<f64>, Error> {
    // A single statement is reported through the accumulator; more need INSPECT.
    let multi = program.statements.len() > 1;
    let chunk = Compiler::new().with_inspect(multi).compile(program)?;
    let mut vm = Vm::new().with_trace(cli.trace);
    let result = vm.execute(&chunk)?;
    if multi {
        Ok(vm.inspections().iter().map(|&(_, v)| v).collect())
    } else {
        Ok(vec![result])
    }
}

/// Run one program and write its output to stdout.
fn process(cli: &Cli, source: &str) -> Result<(), Error> {
    let program = parse_source(source)?;

    match cli.emit {
        Some(Emit::Json) => {
            println!("{}", emit_json(&program)?);
            return Ok(());
        }
        Some(Emit::Bytecode) => {
            let chunk = Compiler::new()
                .with_inspect(program.statements.len() > 1)
                .compile(&program)?;
            print!("{}", chunk.disassemble());
            return Ok(());
        }
        None => {}
    }

    let values = match cli.engine {
        Engine::Vm => run_vm(cli, &program)?,
        Engine::Tree => interpreter::evaluate_each(&program)?,
    };

    if values.is_empty() {
        println!("{}", format_number(0.0));
    }
    for v in values {
        println!("{}", format_number(v));
    }
    Ok(())
}

fn run_source(cli: &Cli, source: &str) -> bool {
    match process(cli, source) {
        Ok(()) => true,
        Err(e) => {
            report(cli, &e, source);
            false
        }
    }
}

fn run_stdin(cli: &Cli) -> bool {
    let mut ok = true;
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading stdin: {e}");
                return false;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        ok &= run_source(cli, &line);
    }
    ok
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(code) = &cli.explain {
        return match registry::lookup(code) {
            Some(entry) => {
                print!("{}", entry.long);
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("Unknown error code: {code}");
                ExitCode::FAILURE
            }
        };
    }

    init_logging(&cli);

    let ok = match cli.input.as_deref() {
        None | Some("-") => run_stdin(&cli),
        Some(input) if Path::new(input).is_file() => match std::fs::read_to_string(input) {
            Ok(source) => run_source(&cli, &source),
            Err(e) => {
                eprintln!("Error reading {input}: {e}");
                false
            }
        },
        Some(input) => run_source(&cli, input),
    };

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
