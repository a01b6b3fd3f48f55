use std::str::FromStr;

use crate::{
    fault::ExecFault,
    symbol::{Register, ShiftDir},
};

/// Two-register arithmetic, `Rd = Rd ∘ Rs`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithKind {
    Add,
    Sub,
    Mul,
    /// Division by zero yields zero.
    Div,
    /// Integer remainder of the truncated operands, zero for a zero divisor.
    Mod,
}

/// Bitwise operation on the 32-bit truncation of both registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BitKind {
    And,
    Or,
    Xor,
}

/// A single decoded instruction.
///
/// Lines are kept as raw text in the program image and only decoded right before they run,
/// so a malformed line is a run-time fault and only if it is reached.
#[derive(Clone, PartialEq, Debug)]
pub enum Op {
    Halt,
    Nop,
    MovI {
        dest: Register,
        value: f64,
    },
    MovR {
        dest: Register,
        src: Register,
    },
    Arith {
        kind: ArithKind,
        dest: Register,
        src: Register,
    },
    Shift {
        dest: Register,
        dir: ShiftDir,
        count: i32,
    },
    Bitwise {
        kind: BitKind,
        dest: Register,
        src: Register,
    },
    /// `GOTO`/`JMP`
    Jump {
        label: String,
    },
    /// Jump if `cond` holds exactly zero
    JumpZero {
        cond: Register,
        label: String,
    },
    Call {
        label: String,
        params: i32,
    },
    Return,
    Push {
        src: Register,
    },
    Pop {
        dest: Register,
    },
    Store {
        src: Register,
        addr: i32,
    },
    Load {
        dest: Register,
        addr: i32,
    },
}

/// Operands of a line, split on commas and whitespace.
struct Operands<'a> {
    opcode: &'a str,
    parts: Vec<&'a str>,
}

impl<'a> Operands<'a> {
    fn get(&self, position: usize) -> Result<&'a str, ExecFault> {
        self.parts
            .get(position)
            .copied()
            .ok_or_else(|| ExecFault::MissingOperand {
                opcode: self.opcode.to_uppercase(),
                position,
            })
    }

    fn reg(&self, position: usize) -> Result<Register, ExecFault> {
        self.get(position)?.parse()
    }

    fn num<T: FromStr>(&self, position: usize) -> Result<T, ExecFault> {
        let token = self.get(position)?;
        token
            .parse()
            .map_err(|_| ExecFault::BadLiteral(token.to_string()))
    }

    fn float(&self, position: usize) -> Result<f64, ExecFault> {
        let token = self.get(position)?;
        parse_literal(token).ok_or_else(|| ExecFault::BadLiteral(token.to_string()))
    }

    fn label(&self, position: usize) -> Result<String, ExecFault> {
        Ok(self.get(position)?.to_uppercase())
    }
}

/// Decimal or scientific float literal. Of the special values only the exact spellings `NaN` and
/// `Infinity` are accepted, optionally signed.
pub(crate) fn parse_literal(token: &str) -> Option<f64> {
    let unsigned = token.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(token);
    let special = unsigned == "NaN" || unsigned == "Infinity";
    if !special && unsigned.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    token.parse().ok()
}

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

impl Op {
    pub fn decode(line: &str) -> Result<Op, ExecFault> {
        let line = line.trim();
        let opcode = line.split(is_separator).next().unwrap_or_default();
        let upper = opcode.to_uppercase();

        // `LABEL(count)` is one operand, keep it away from the comma split
        if upper == "CALL" {
            return Self::decode_call(line[opcode.len()..].trim());
        }

        let ops = Operands {
            opcode,
            parts: line.split(is_separator).filter(|s| !s.is_empty()).collect(),
        };
        let arith = |kind| -> Result<Op, ExecFault> {
            Ok(Op::Arith {
                kind,
                dest: ops.reg(1)?,
                src: ops.reg(2)?,
            })
        };
        let bitwise = |kind| -> Result<Op, ExecFault> {
            Ok(Op::Bitwise {
                kind,
                dest: ops.reg(1)?,
                src: ops.reg(2)?,
            })
        };

        let op = match upper.as_str() {
            "HLT" => Op::Halt,
            "NOP" => Op::Nop,
            "MOVI" => Op::MovI {
                dest: ops.reg(1)?,
                value: ops.float(2)?,
            },
            "MOVR" => Op::MovR {
                dest: ops.reg(1)?,
                src: ops.reg(2)?,
            },
            "ADD" => arith(ArithKind::Add)?,
            "SUB" => arith(ArithKind::Sub)?,
            "MUL" => arith(ArithKind::Mul)?,
            "DIV" => arith(ArithKind::Div)?,
            "MOD" => arith(ArithKind::Mod)?,
            "SHIFT" => {
                let dest = ops.reg(1)?;
                let dir = ops.get(2)?;
                let count = ops.num(3)?;
                Op::Shift {
                    dest,
                    dir: dir.parse()?,
                    count,
                }
            }
            "AND" => bitwise(BitKind::And)?,
            "OR" => bitwise(BitKind::Or)?,
            "XOR" => bitwise(BitKind::Xor)?,
            "GOTO" | "JMP" => Op::Jump {
                label: ops.label(1)?,
            },
            "JMPZ" => Op::JumpZero {
                cond: ops.reg(1)?,
                label: ops.label(2)?,
            },
            "RET" => Op::Return,
            "PUSH" => Op::Push { src: ops.reg(1)? },
            "POP" => Op::Pop { dest: ops.reg(1)? },
            "STORE" => Op::Store {
                src: ops.reg(1)?,
                addr: ops.num(2)?,
            },
            "LOAD" => Op::Load {
                dest: ops.reg(1)?,
                addr: ops.num(2)?,
            },
            _ => return Err(ExecFault::UnknownOpcode(upper)),
        };
        Ok(op)
    }

    /// `LABEL(count)`; without a well-formed parenthesis pair the whole operand is the label.
    fn decode_call(operand: &str) -> Result<Op, ExecFault> {
        let (label, params) = match (operand.find('('), operand.find(')')) {
            (Some(open), Some(close)) if open > 0 && close > open => {
                let count = operand[open + 1..close].trim();
                let params = if count.is_empty() {
                    0
                } else {
                    count
                        .parse()
                        .map_err(|_| ExecFault::BadLiteral(count.to_string()))?
                };
                (&operand[..open], params)
            }
            _ => (operand, 0),
        };
        Ok(Op::Call {
            label: label.trim().to_uppercase(),
            params,
        })
    }
}
