use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use byteflow::bf::OptimizationFlags;
use byteflow::{compile_with_options, CompileOptions, Error};

/// Exit codes per the CLI contract: `0` success, `1` user error (bad args,
/// file missing), `2` compilation error (syntax or semantic), `3` internal
/// error.
const EXIT_USER_ERROR: u8 = 1;

#[derive(Parser)]
#[command(name = "compile")]
#[command(about = "ByteFlow compiler: lowers source to a tape-machine program")]
struct Cli {
    /// Source file to compile.
    input: PathBuf,

    /// Run the peephole optimizer before emitting output.
    #[arg(short = 'o', long)]
    optimize: bool,

    /// Emit annotated, human-readable output instead of minified opcodes.
    #[arg(short, long)]
    verbose: bool,

    /// Disable the adjacent-pair cancellation pass (requires --optimize).
    #[arg(long)]
    no_peephole: bool,

    /// Disable the dead-zero-loop elimination pass (requires --optimize).
    #[arg(long)]
    no_dead_zero_loop_elim: bool,

    /// Disable pointer-motion folding (requires --optimize; currently a no-op pass).
    #[arg(long)]
    no_pointer_fold: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap renders usage/help text itself; only the exit code needs
            // to follow our contract rather than clap's own convention.
            eprint!("{err}");
            return ExitCode::from(EXIT_USER_ERROR);
        }
    };

    let source = match fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {err}", cli.input.display());
            return ExitCode::from(EXIT_USER_ERROR);
        }
    };

    let options = CompileOptions {
        optimize: cli.optimize,
        optimizations: OptimizationFlags {
            peephole: !cli.no_peephole,
            dead_zero_loop_elim: !cli.no_dead_zero_loop_elim,
            pointer_fold: !cli.no_pointer_fold,
        },
        verbose: cli.verbose,
        ..CompileOptions::default()
    };

    match compile_with_options(&source, &options) {
        Ok(output) => {
            println!("{}", output.source);
            tracing::info!(cells = output.cell_count, "compiled");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {err}", cli.input.display());
            exit_code_for(&err)
        }
    }
}

fn exit_code_for(err: &Error) -> ExitCode {
    ExitCode::from(err.exit_code() as u8)
}
