use std::{error::Error, fmt};

/// Reason an instruction could not be carried out.
///
/// Every fault is fatal: the engine halts as soon as one is returned from dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecFault {
    UnknownOpcode(String),
    UnknownLabel(String),
    MissingOperand {
        opcode: String,
        position: usize,
    },
    MalformedRegister(String),
    RegisterOutOfRange(i32),
    BadLiteral(String),
    UnknownShift(String),
    AddressOutOfRange(i32),
    /// Push with no free slot left below the static data.
    StackOverflow,
    /// Pop with nothing on the stack.
    StackUnderflow,
    StepBudget(u32),
}

impl Error for ExecFault {}

impl fmt::Display for ExecFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode(opcode) => write!(f, "Unknown instruction `{}`", opcode),
            Self::UnknownLabel(label) => write!(f, "Unknown label `{}`", label),
            Self::MissingOperand { opcode, position } => {
                write!(f, "Missing operand {} for `{}`", position, opcode)
            }
            Self::MalformedRegister(token) => write!(f, "Not a register: `{}`", token),
            Self::RegisterOutOfRange(index) => write!(f, "Register out of range: R{}", index),
            Self::BadLiteral(token) => write!(f, "Not a valid number: `{}`", token),
            Self::UnknownShift(dir) => write!(f, "Unknown shift direction `{}`", dir),
            Self::AddressOutOfRange(addr) => write!(f, "Data address out of range: {}", addr),
            Self::StackOverflow => write!(f, "Stack overflow"),
            Self::StackUnderflow => write!(f, "Stack underflow"),
            Self::StepBudget(budget) => {
                write!(f, "Too many instructions executed (> {}), halting", budget)
            }
        }
    }
}
