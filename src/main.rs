use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nebula::config::{LOG_ENV, SOURCE_EXTENSION};
use nebula::{Assembler, ErrorKind, Evaluator, NebulaError};

#[derive(Parser, Debug)]
#[command(name = "nebula")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interpreter for Nebula API scripts", long_about = None)]
struct Args {
    /// Source files, run in the order given. Only `.neb` files are read.
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,
}

fn install_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    install_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let files: Vec<&PathBuf> = args
        .files
        .iter()
        .filter(|path| {
            let usable = path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION);
            if !usable {
                debug!(path = %path.display(), "skipping non-source file");
            }
            usable
        })
        .collect();

    if files.is_empty() {
        eprintln!("{}", NebulaError::from(ErrorKind::NoSourceFiles));
        return Ok(ExitCode::FAILURE);
    }

    let mut eval = Evaluator::new();
    let mut assembler = Assembler::new();
    for path in files {
        let source = fs::read_to_string(path)
            .with_context(|| format!("could not read source file {}", path.display()))?;
        if let Err(e) = assembler.append_source(&mut eval, &source, &path.display().to_string()) {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    }

    let program = match assembler.finish() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Err(e) = eval.run(&program) {
        eprint!("{}", eval.stack_trace(&e));
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
