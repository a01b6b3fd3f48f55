use std::fs;
use std::io::{stdin, BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use console::{Key, Term};
use miette::{IntoDiagnostic, Result};

use vcpu::driver::{self, RunOutcome};
use vcpu::output::{self, is_minimal};
use vcpu::{AsmParser, Engine};

/// vcpu runs programs for a small virtual CPU with a code and a data segment.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a source file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a source file until it halts, then show registers and memory
    Run {
        /// Source file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Show the effect of every instruction
        #[arg(short, long)]
        trace: bool,
        /// Pause between instructions, in milliseconds
        #[arg(short, long)]
        delay: Option<u64>,
        /// Show all data slots instead of only non-zero ones
        #[arg(long)]
        memory: bool,
    },
    /// Execute a source file one instruction at a time
    Step {
        /// Source file to step through
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Show the effect of every instruction
        #[arg(short, long)]
        trace: bool,
    },
    /// Check a source file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    vcpu::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(vcpu::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let Some(command) = args.command else {
        if let Some(path) = args.path {
            return run(&path, RunOptions::default());
        }
        println!("\n~ vcpu v{VERSION} ~");
        println!("{SHORT_INFO}");
        return Ok(());
    };

    match command {
        Command::Run {
            name,
            minimal,
            trace,
            delay,
            memory,
        } => run(
            &name,
            RunOptions {
                minimal,
                trace,
                delay,
                memory,
            },
        ),
        Command::Step {
            name,
            minimal,
            trace,
        } => step(&name, minimal, trace),
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let src = fs::read_to_string(&name).into_diagnostic()?;
            let program = AsmParser::new(&src).parse()?;
            for diagnostic in program.diagnostics() {
                output::print_diagnostic(diagnostic, false);
            }
            message(Green, "Success", "no errors found!");
            Ok(())
        }
    }
}

#[derive(Default)]
struct RunOptions {
    minimal: bool,
    trace: bool,
    delay: Option<u64>,
    memory: bool,
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &PathBuf) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if is_minimal::get() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn trace_enabled(flag: bool) -> bool {
    flag || vcpu::env::is_trace_enabled()
}

/// Continuous run mode. Ctrl-C stops at the next instruction boundary.
fn run(name: &PathBuf, opts: RunOptions) -> Result<()> {
    is_minimal::set(opts.minimal);
    let trace = trace_enabled(opts.trace);
    let mut engine = load(name)?;
    output::flush_diagnostics(&mut engine, trace);

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .into_diagnostic()?;

    let delay = opts
        .delay
        .map(Duration::from_millis)
        .unwrap_or_else(vcpu::env::default_delay);

    message(MsgColor::Green, "Running", "until halt");
    let outcome = driver::run(&mut engine, delay, &cancel, |engine| {
        output::flush_diagnostics(engine, trace);
    });
    output::flush_diagnostics(&mut engine, trace);

    match outcome {
        RunOutcome::Halted => message(MsgColor::Cyan, "Halted", &steps_taken(&engine)),
        RunOutcome::Cancelled => message(MsgColor::Red, "Cancelled", &steps_taken(&engine)),
    }
    output::print_registers(&engine);
    output::print_data(&engine, opts.memory);
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

/// Single-step mode, one instruction per key press or per line of piped input.
fn step(name: &PathBuf, minimal: bool, trace: bool) -> Result<()> {
    is_minimal::set(minimal);
    let trace = trace_enabled(trace);
    let mut engine = load(name)?;
    output::flush_diagnostics(&mut engine, trace);

    if !minimal {
        message(
            MsgColor::Cyan,
            "Help",
            "enter/space/s: step, c: continue to halt, q: quit",
        );
    }
    output::print_labels(&engine);
    output::print_next(&engine);
    // Piped input drives one action per line
    let mut lines = (!stdin().is_terminal()).then(|| stdin().lock().lines());
    while !engine.is_halted() {
        let action = match lines.as_mut() {
            None => read_key().into_diagnostic()?,
            Some(lines) => match lines.next() {
                Some(line) => parse_action(line.into_diagnostic()?.trim()),
                None => StepAction::Quit,
            },
        };
        match action {
            StepAction::Step => driver::step_once(&mut engine),
            StepAction::Continue => {
                while !engine.is_halted() {
                    driver::step_once(&mut engine);
                    output::flush_diagnostics(&mut engine, trace);
                }
            }
            StepAction::Quit => break,
            StepAction::Ignore => continue,
        }
        output::flush_diagnostics(&mut engine, trace);
        output::print_registers(&engine);
        output::print_next(&engine);
    }
    message(MsgColor::Cyan, "Stopped", &steps_taken(&engine));
    Ok(())
}

enum StepAction {
    Step,
    Continue,
    Quit,
    Ignore,
}

fn parse_action(input: &str) -> StepAction {
    match input {
        "" | "s" | "step" => StepAction::Step,
        "c" | "continue" => StepAction::Continue,
        "q" | "quit" => StepAction::Quit,
        _ => StepAction::Ignore,
    }
}

// Read one key from an unbuffered terminal
fn read_key() -> std::io::Result<StepAction> {
    let key = Term::stdout().read_key()?;
    Ok(match key {
        Key::Enter | Key::Char(' ') | Key::Char('s') => StepAction::Step,
        Key::Char('c') => StepAction::Continue,
        Key::Char('q') | Key::Escape => StepAction::Quit,
        _ => StepAction::Ignore,
    })
}

fn steps_taken(engine: &Engine) -> String {
    format!("after {} instructions, IP {}", engine.steps(), engine.ip())
}

fn load(name: &PathBuf) -> Result<Engine> {
    file_message(MsgColor::Green, "Loading", name);
    let src = fs::read_to_string(name).into_diagnostic()?;
    Engine::load(&src)
}

const SHORT_INFO: &str = r"
A stepping interpreter for a small register machine with [CODE] and [DATA] segments.
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
