use std::{cell::RefCell, ffi::OsStr, time::Duration};

#[derive(Clone, Copy, Debug)]
struct Env {
    trace: bool,
    delay: Duration,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        trace: var_is("VCPU_TRACE", "1"),
        delay: Duration::from_millis(var_parse("VCPU_DELAY").unwrap_or(0)),
    };
    set_env(value);
}

/// Show per-instruction trace lines.
pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace)
}

/// Default pause between instructions in continuous run mode.
pub fn default_delay() -> Duration {
    with_env(|env| env.delay)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

fn var_parse(name: impl AsRef<OsStr>) -> Option<u64> {
    std::env::var(name.as_ref()).ok()?.trim().parse().ok()
}
