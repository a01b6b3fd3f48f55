use miette::Result;

use crate::{
    diag,
    fault::ExecFault,
    image::{DataSegment, Program},
    log::Diagnostic,
    ops::{ArithKind, BitKind, Op},
    parser::AsmParser,
    state::State,
    symbol::{LabelTable, Register},
};

/// Instructions a single engine executes before it is forced to halt.
pub const STEP_BUDGET: u32 = 2000;

/// Lifecycle of a loaded program.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    /// Parsed, nothing executed yet.
    Loaded,
    Running,
    /// Terminal.
    Halted,
}

/// What the machine does after an instruction completed without a fault.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Continue,
    Halt,
}

/// Interprets a loaded program one instruction at a time.
///
/// The engine owns the code, label table and all machine state. It is driven externally by
/// repeated calls to [`Engine::step`]; faults never escape `step`, they halt the machine and
/// show up in [`Engine::diagnostics`].
pub struct Engine {
    code: Vec<String>,
    labels: LabelTable,
    state: State,
    /// Set by the driver, only reported back
    running: bool,
    halted: bool,
    /// Whether a step after halting was already reported
    halt_noted: bool,
    /// Instructions started over the lifetime of this engine
    steps: u32,
    log: Vec<Diagnostic>,
}

impl Engine {
    /// Parse `src` and build a fresh engine. Nothing is returned if the source is rejected.
    pub fn load(src: &str) -> Result<Engine> {
        let program = AsmParser::new(src).parse()?;
        Ok(Engine::new(program))
    }

    pub fn new(program: Program) -> Self {
        let Program {
            code,
            labels,
            data,
            diagnostics,
            ..
        } = program;
        Engine {
            code,
            labels,
            state: State::new(data),
            running: false,
            halted: false,
            halt_noted: false,
            steps: 0,
            log: diagnostics,
        }
    }

    /// Execute at most one instruction.
    pub fn step(&mut self) {
        if self.halted {
            if !self.halt_noted {
                diag!(self.log, Info, "Already halted");
                self.halt_noted = true;
            }
            return;
        }
        let ip = self.state.ip;
        let Some(line) = usize::try_from(ip).ok().and_then(|ip| self.code.get(ip)) else {
            diag!(self.log, Info, "IP {} is outside the code segment, halting", ip);
            self.halted = true;
            return;
        };
        self.steps += 1;
        if self.steps > STEP_BUDGET {
            self.fault(ExecFault::StepBudget(STEP_BUDGET), ip);
            return;
        }

        // IP incremented before the instruction is performed; jumps overwrite it
        self.state.ip += 1;
        let result = Op::decode(line).and_then(|op| self.execute(op));
        match result {
            Ok(Flow::Continue) => (),
            Ok(Flow::Halt) => {
                diag!(self.log, Info, "HLT");
                self.halted = true;
            }
            Err(fault) => self.fault(fault, ip),
        }
    }

    fn fault(&mut self, fault: ExecFault, ip: i32) {
        diag!(self.log, Error, "{} (at IP {})", fault, ip);
        self.halted = true;
    }

    fn execute(&mut self, op: Op) -> Result<Flow, ExecFault> {
        match op {
            Op::Halt => return Ok(Flow::Halt),
            Op::Nop => diag!(self.log, Trace, "NOP"),
            Op::MovI { dest, value } => {
                self.write(dest, value);
                diag!(self.log, Trace, "MOVI => {}={:.4}", dest, self.state.reg(dest));
            }
            Op::MovR { dest, src } => {
                self.write(dest, self.state.reg(src));
                diag!(self.log, Trace, "MOVR => {}={}({:.4})", dest, src, self.state.reg(dest));
            }
            Op::Arith { kind, dest, src } => self.arith(kind, dest, src),
            Op::Shift { dest, dir, count } => {
                let val = dir.apply(self.state.reg(dest) as i32, count);
                self.state.set_reg(dest, val.into());
                diag!(self.log, Trace, "SHIFT => {}={}", dest, val);
            }
            Op::Bitwise { kind, dest, src } => {
                let (a, b) = (self.state.reg(dest) as i32, self.state.reg(src) as i32);
                let (name, val) = match kind {
                    BitKind::And => ("AND", a & b),
                    BitKind::Or => ("OR", a | b),
                    BitKind::Xor => ("XOR", a ^ b),
                };
                self.state.set_reg(dest, val.into());
                diag!(self.log, Trace, "{} => {}={}", name, dest, val);
            }
            Op::Jump { label } => self.jump(&label)?,
            Op::JumpZero { cond, label } => {
                if self.state.reg(cond) == 0.0 {
                    self.jump(&label)?;
                } else {
                    diag!(self.log, Trace, "JMPZ => {} is not zero", cond);
                }
            }
            Op::Call { label, params } => {
                let addr = self.resolve(&label)?;
                self.state.push(self.state.ip.into())?;
                self.state.push(params.into())?;
                self.state.ip = addr;
                diag!(self.log, Trace, "CALL => IP={} ({}), params={}", addr, label, params);
            }
            Op::Return => {
                let params = self.state.pop()? as i32;
                for _ in 0..params {
                    self.state.pop()?;
                }
                self.state.ip = self.state.pop()? as i32;
                diag!(self.log, Trace, "RET => IP={} (params={})", self.state.ip, params);
            }
            Op::Push { src } => {
                let val = self.state.reg(src);
                self.state.push(val)?;
                diag!(self.log, Trace, "PUSH => SP={} val={:.4}", self.state.sp(), val);
            }
            Op::Pop { dest } => {
                let val = self.state.pop().inspect_err(|_| self.state.set_reg(dest, 0.0))?;
                self.write(dest, val);
                diag!(self.log, Trace, "POP => {}={:.4}", dest, self.state.reg(dest));
            }
            Op::Store { src, addr } => {
                let val = self.state.reg(src);
                self.state.store(addr, val)?;
                diag!(self.log, Trace, "STORE => data[{}]={:.4}", addr, val);
            }
            Op::Load { dest, addr } => {
                self.write(dest, self.state.load(addr)?);
                diag!(self.log, Trace, "LOAD => {}={:.4}", dest, self.state.reg(dest));
            }
        }
        Ok(Flow::Continue)
    }

    fn arith(&mut self, kind: ArithKind, dest: Register, src: Register) {
        let (a, b) = (self.state.reg(dest), self.state.reg(src));
        let (name, val) = match kind {
            ArithKind::Add => ("ADD", a + b),
            ArithKind::Sub => ("SUB", a - b),
            ArithKind::Mul => ("MUL", a * b),
            ArithKind::Div if b == 0.0 => {
                diag!(self.log, Warn, "DIV by zero => {}=0", dest);
                ("DIV", 0.0)
            }
            ArithKind::Div => ("DIV", a / b),
            ArithKind::Mod => match b as i32 {
                0 => {
                    diag!(self.log, Warn, "MOD by zero => {}=0", dest);
                    ("MOD", 0.0)
                }
                b => ("MOD", f64::from((a as i32).wrapping_rem(b))),
            },
        };
        self.write(dest, val);
        diag!(self.log, Trace, "{} => {}={:.4}", name, dest, self.state.reg(dest));
    }

    /// Overflow-checked register write.
    fn write(&mut self, dest: Register, val: f64) {
        if self.state.write_checked(dest, val) {
            diag!(self.log, Warn, "Overflow/NaN in {} => set to 0", dest);
        }
    }

    fn resolve(&self, label: &str) -> Result<i32, ExecFault> {
        self.labels
            .get(label)
            .map(|addr| addr as i32)
            .ok_or_else(|| ExecFault::UnknownLabel(label.to_string()))
    }

    fn jump(&mut self, label: &str) -> Result<(), ExecFault> {
        self.state.ip = self.resolve(label)?;
        diag!(self.log, Trace, "JMP => IP={} ({})", self.state.ip, label);
        Ok(())
    }

    /// Value of register `index`, `None` past R7.
    pub fn register(&self, index: usize) -> Option<f64> {
        self.state.registers().get(index).copied()
    }

    pub fn registers(&self) -> &[f64; Register::COUNT] {
        self.state.registers()
    }

    pub fn data(&self) -> &DataSegment {
        self.state.mem()
    }

    pub fn ip(&self) -> i32 {
        self.state.ip()
    }

    pub fn sp(&self) -> i32 {
        self.state.sp()
    }

    pub fn flags(&self) -> u32 {
        self.state.flags()
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn code(&self) -> &[String] {
        &self.code
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Lets a driver record whether it intends to keep stepping.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn status(&self) -> Status {
        if self.halted {
            Status::Halted
        } else if self.running || self.steps > 0 {
            Status::Running
        } else {
            Status::Loaded
        }
    }

    /// Complete diagnostic history, oldest first.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.log
    }

    /// Remove and return everything recorded so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.log)
    }

    /// Snapshot of the machine state, for comparisons.
    pub fn state(&self) -> &State {
        &self.state
    }
}
