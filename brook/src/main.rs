#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use miette::{NamedSource, Report};

use brook_core::{fold_program, CheckOutcome, Checker};
use brook_vm::{Generator, Module, Vm};

#[derive(Parser, Debug)]
#[command(name = "brook", version, about = "Compiler and register VM for the Brook language")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Type-check a source file and report diagnostics.
    Check { path: PathBuf },
    /// Compile and execute a source file.
    Run {
        path: PathBuf,
        /// Print every generated function object before executing.
        #[arg(long)]
        dump_bytecode: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Check { path } => check_cmd(&path),
        Cmd::Run {
            path,
            dump_bytecode,
        } => run_cmd(&path, dump_bytecode),
    }
}

fn read_source(path: &Path) -> Result<String, ExitCode> {
    match fs::read_to_string(path) {
        Ok(src) => Ok(src),
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", path.display());
            Err(ExitCode::FAILURE)
        }
    }
}

fn print_diag(diag: Report, path: &Path, src: &str) {
    let named = NamedSource::new(path.display().to_string(), src.to_string());
    eprintln!("{:?}", diag.with_source_code(named));
}

/// Front half of the pipeline: lex, parse (with recovery), check. Each pass
/// reports every diagnostic it produced; later passes are skipped as soon as
/// one pass ends with errors.
fn analyze(path: &Path, src: &str) -> Result<(brook_ast::Program, CheckOutcome), ExitCode> {
    let (program, parse_errors) = match brook_parse::parse_source_with_recovery(src) {
        Ok(parsed) => parsed,
        Err(lex_error) => {
            print_diag(lex_error, path, src);
            return Err(ExitCode::FAILURE);
        }
    };
    if !parse_errors.is_empty() {
        for err in parse_errors {
            print_diag(Report::new(err), path, src);
        }
        return Err(ExitCode::FAILURE);
    }

    let mut outcome = Checker::new().check_program(&program);
    for warning in outcome.warnings.drain(..) {
        print_diag(Report::new(warning), path, src);
    }
    if !outcome.is_ok() {
        for err in outcome.errors {
            print_diag(Report::new(err), path, src);
        }
        return Err(ExitCode::FAILURE);
    }

    Ok((program, outcome))
}

fn compile(path: &Path, src: &str) -> Result<Module, ExitCode> {
    let (program, outcome) = analyze(path, src)?;
    let program = fold_program(program);
    match Generator::new(&outcome.analysis, &outcome.env).generate(&program) {
        Ok(module) => Ok(module),
        Err(err) => {
            print_diag(Report::new(err), path, src);
            Err(ExitCode::FAILURE)
        }
    }
}

fn check_cmd(path: &Path) -> ExitCode {
    let src = match read_source(path) {
        Ok(src) => src,
        Err(code) => return code,
    };
    match analyze(path, &src) {
        Ok(_) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}

fn run_cmd(path: &Path, dump_bytecode: bool) -> ExitCode {
    let src = match read_source(path) {
        Ok(src) => src,
        Err(code) => return code,
    };
    let module = match compile(path, &src) {
        Ok(module) => module,
        Err(code) => return code,
    };

    if dump_bytecode {
        eprint!("{}", module.dump());
    }

    let mut vm = Vm::new(module);
    match vm.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", Report::new(err));
            ExitCode::FAILURE
        }
    }
}
