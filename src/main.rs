mod repl;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use breeze::{interpreter::Evaluator, Lexer, Parser};
use clap::{Parser as ClapParser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// run a file
    Run {
        #[arg(name = "FILE")]
        file: PathBuf,
        /// print the parsed syntax tree to stderr before running
        #[arg(long)]
        ast: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run { file, ast }) => match run_file(&file, ast) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {:#}", err);
                ExitCode::FAILURE
            }
        },
        None => {
            repl::start();
            ExitCode::SUCCESS
        }
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (warnings by default).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn run_file(file: &Path, print_ast: bool) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let lexer = Lexer::new(&source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program().context("parse error")?;

    if print_ast {
        eprintln!("{:#?}", program);
    }

    let mut evaluator = Evaluator::new();
    evaluator.eval(&program).context("runtime error")?;
    Ok(())
}
