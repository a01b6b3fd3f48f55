use colored::{ColoredString, Colorize};

use crate::image::DATA_SIZE;
use crate::log::{Diagnostic, Level};
use crate::runtime::Engine;
use crate::symbol::Register;

pub mod is_minimal {
    use std::cell::RefCell;
    thread_local! {
        static VALUE: RefCell<bool> = const { RefCell::new(false) };
    }
    /// May be called multiple times. Minimal output is never colored.
    pub fn set(new_value: bool) {
        VALUE.with(|value| *value.borrow_mut() = new_value);
        if new_value {
            colored::control::set_override(false);
        } else {
            colored::control::unset_override();
        }
    }
    pub fn get() -> bool {
        VALUE.with(|value| *value.borrow())
    }
}

/// Print one diagnostic line to stderr. Trace lines are skipped unless `trace` is set.
pub fn print_diagnostic(diagnostic: &Diagnostic, trace: bool) {
    if diagnostic.level == Level::Trace && !trace {
        return;
    }
    if is_minimal::get() {
        eprintln!("{}", diagnostic);
        return;
    }
    let left = format!("{:>12}", level_name(diagnostic.level));
    let left = left.as_str();
    let left = match diagnostic.level {
        Level::Trace => left.dimmed(),
        Level::Info => left.cyan(),
        Level::Warn => left.yellow(),
        Level::Error => left.red().bold(),
    };
    eprintln!("{left} {}", diagnostic.message);
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Trace => "Trace",
        Level::Info => "Info",
        Level::Warn => "Warning",
        Level::Error => "Fault",
    }
}

/// Drain and print everything the engine recorded since the last call.
pub fn flush_diagnostics(engine: &mut Engine, trace: bool) {
    for diagnostic in engine.take_diagnostics() {
        print_diagnostic(&diagnostic, trace);
    }
}

pub fn format_register(reg: Register, val: f64) -> String {
    format!("{} = {:.4}", reg, val)
}

pub fn format_slot(addr: usize, val: f64) -> String {
    format!("[{:03}] = {:.4}", addr, val)
}

pub fn print_registers(engine: &Engine) {
    if is_minimal::get() {
        for (i, val) in engine.registers().iter().enumerate() {
            println!("R{} {}", i, val);
        }
        println!("IP {}", engine.ip());
        println!("SP {}", engine.sp());
        println!("FLAGS 0x{:X}", engine.flags());
        return;
    }

    let rule = "─".repeat(28);
    println!("{}", format!("┌{rule}┐").as_str().dimmed());
    for (reg, val) in Register::ALL.iter().zip(engine.registers()) {
        let line = format!("{:<26}", format_register(*reg, *val));
        println!("{} {} {}", "│".dimmed(), line.as_str().bold(), "│".dimmed());
    }
    let pointers = format!(
        "IP = {:<5} SP = {:<4} FLAGS = 0x{:X}",
        engine.ip(),
        engine.sp(),
        engine.flags()
    );
    println!("{} {:<26} {}", "│".dimmed(), pointers, "│".dimmed());
    println!("{}", format!("└{rule}┘").as_str().dimmed());
}

/// Source line the instruction pointer is at, `None` once it left the code segment.
pub fn current_line(engine: &Engine) -> Option<&str> {
    usize::try_from(engine.ip())
        .ok()
        .and_then(|ip| engine.code().get(ip))
        .map(String::as_str)
}

/// Show the instruction that the next step executes.
pub fn print_next(engine: &Engine) {
    if engine.is_halted() {
        return;
    }
    let Some(line) = current_line(engine) else {
        return;
    };
    if is_minimal::get() {
        println!("NEXT {line}");
    } else {
        println!("{:>12} {:04}  {}", "Next".cyan(), engine.ip(), line.bold());
    }
}

pub fn print_labels(engine: &Engine) {
    for (name, addr) in engine.labels().iter() {
        if is_minimal::get() {
            println!("{name} -> {addr}");
        } else {
            println!("{:>12} {:04}", name.magenta(), addr);
        }
    }
}

/// Print the data segment. Unless `all` is set only non-zero slots are shown.
pub fn print_data(engine: &Engine, all: bool) {
    let data = engine.data().as_slice();
    let mut shown = 0;
    for (addr, val) in data.iter().enumerate() {
        if !all && *val == 0.0 {
            continue;
        }
        let line = format_slot(addr, *val);
        if is_minimal::get() {
            println!("{line}");
        } else {
            println!("{}", slot_color(addr, engine.sp(), line));
        }
        shown += 1;
    }
    if shown == 0 && !is_minimal::get() {
        println!("{}", format!("(all {DATA_SIZE} data slots are zero)").as_str().dimmed());
    }
}

/// Slots at or below the stack pointer are static data, the rest is live stack.
fn slot_color(addr: usize, sp: i32, line: String) -> ColoredString {
    if addr as i32 > sp {
        line.as_str().magenta()
    } else {
        ColoredString::from(line)
    }
}
