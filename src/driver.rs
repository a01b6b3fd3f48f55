//! Ways of driving an [`Engine`] from the outside.
//!
//! The engine never waits or loops by itself; both modes here are plain loops around
//! [`Engine::step`], owned by whoever holds the engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::sleep;
use std::time::Duration;

use crate::runtime::Engine;

/// Why [`run`] returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunOutcome {
    Halted,
    /// The cancel flag was raised before the machine halted.
    Cancelled,
}

/// Execute a single instruction, marking the engine as running only while it does so.
pub fn step_once(engine: &mut Engine) {
    engine.set_running(true);
    engine.step();
    engine.set_running(false);
}

/// Step until the engine halts or `cancel` is raised.
///
/// `on_step` runs after every instruction, e.g. to print new diagnostics. A non-zero `delay`
/// paces execution so it can be followed by a human.
pub fn run<F>(engine: &mut Engine, delay: Duration, cancel: &AtomicBool, mut on_step: F) -> RunOutcome
where
    F: FnMut(&mut Engine),
{
    engine.set_running(true);
    while !engine.is_halted() && engine.is_running() {
        if cancel.load(Ordering::SeqCst) {
            engine.set_running(false);
            break;
        }
        engine.step();
        on_step(engine);
        if !delay.is_zero() && !engine.is_halted() {
            sleep(delay);
        }
    }
    engine.set_running(false);

    if engine.is_halted() {
        RunOutcome::Halted
    } else {
        RunOutcome::Cancelled
    }
}
