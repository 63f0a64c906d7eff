//! CLI entry point for the `vpc` binary.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
#[cfg(test)]
use tempfile as _;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vpc_asm::{assemble_file, AssembleError};
use vpc_core::{
    catalog, listing, EngineConfig, Machine, MachineConfig, MachineError, Program, RunBoundary,
    Status, StepOutcome, StoreMissPolicy,
};

#[derive(Debug, Parser)]
#[command(
    name = "vpc",
    version,
    about = "Assemble and run programs on the virtual PC register machine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the built-in programs.
    List,
    /// Run a built-in program or an assembly source file.
    Run(RunArgs),
    /// Assemble a source file and print its listing.
    Asm {
        /// Source file.
        file: PathBuf,
        /// Print the listing as JSON rows.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Catalog program name or path to a source file.
    program: String,
    /// Stop after this many cycles.
    #[arg(long, default_value_t = 10_000)]
    max_steps: u64,
    /// Clock period in milliseconds (clamped to 50..=1000).
    #[arg(long, default_value_t = vpc_core::machine::DEFAULT_SPEED_MS)]
    speed_ms: u64,
    /// Sleep one clock period between cycles.
    #[arg(long)]
    realtime: bool,
    /// Seed for boot memory noise and heat.
    #[arg(long, default_value_t = vpc_core::DEFAULT_SEED)]
    seed: u64,
    /// Print the final processor state as JSON.
    #[arg(long)]
    json: bool,
    /// Number of trace lines kept.
    #[arg(long, default_value_t = vpc_core::machine::LOG_CAPACITY)]
    log_lines: usize,
    /// Report out-of-range STORE as a segfault line.
    #[arg(long)]
    log_store_misses: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Machine(#[from] MachineError),
    #[error("cannot encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RunArgs {
    const fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            speed_ms: self.speed_ms,
            seed: self.seed,
            engine: EngineConfig {
                store_miss: if self.log_store_misses {
                    StoreMissPolicy::Log
                } else {
                    StoreMissPolicy::Drop
                },
            },
            log_capacity: self.log_lines,
        }
    }
}

fn resolve_program(name: &str) -> Result<Program, CliError> {
    let path = Path::new(name);
    if path.is_file() {
        return Ok(assemble_file(path)?);
    }
    catalog::find(name).ok_or_else(|| MachineError::UnknownProgram(name.to_owned()).into())
}

fn run_list() {
    for program in catalog::programs() {
        println!(
            "{:<10} {:>3} instructions  {}",
            program.name(),
            program.len(),
            program.description()
        );
    }
}

fn run_asm(file: &Path, json: bool) -> Result<(), CliError> {
    let program = assemble_file(file)?;
    let rows = listing(program.instructions());
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        println!("{:>4}  {}", row.index, row.text);
    }
    Ok(())
}

fn run_realtime(machine: &mut Machine, max_steps: u64) -> Result<(), CliError> {
    let period = Duration::from_millis(machine.speed_ms());
    machine.toggle_run()?;
    let mut steps = 0;
    let mut mark = machine.log().pushed();
    for line in machine.log().lines() {
        println!("{line}");
    }
    while machine.is_running() && steps < max_steps {
        if let Some(outcome) = machine.tick()? {
            steps += 1;
            for line in machine.log().since(mark) {
                println!("{line}");
            }
            mark = machine.log().pushed();
            if outcome.is_terminal() {
                break;
            }
        }
        thread::sleep(period);
    }
    Ok(())
}

fn run_program(args: &RunArgs) -> Result<Status, CliError> {
    let program = resolve_program(&args.program)?;
    let mut machine = Machine::new(args.machine_config());
    machine.power_on();
    machine.load_program(program)?;

    if args.realtime {
        run_realtime(&mut machine, args.max_steps)?;
    } else {
        let outcome = machine.run(RunBoundary::Terminal, args.max_steps)?;
        debug!(steps = outcome.steps, "run finished");
        if outcome.final_step == StepOutcome::Retired {
            info!(max_steps = args.max_steps, "step limit reached");
        }
        for line in machine.log().lines() {
            println!("{line}");
        }
    }

    let state = machine.state();
    if args.json {
        println!("{}", serde_json::to_string_pretty(state)?);
    }
    if let Some(error) = &state.last_error {
        eprintln!("error: {error}");
    }
    Ok(state.status)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::List => {
            run_list();
            Ok(Status::Halted)
        }
        Command::Run(args) => run_program(&args),
        Command::Asm { file, json } => run_asm(&file, json).map(|()| Status::Halted),
    };

    match result {
        Ok(Status::Error) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
