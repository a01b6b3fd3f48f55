use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::fault::ExecFault;

// Symbol table of LABEL -> code address
type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Maps code segment labels to instruction addresses.
///
/// Names are stored upper-cased, so lookups are case-insensitive. Defining the same label twice
/// silently moves it to the newer address.
#[derive(Clone, Debug, Default)]
pub struct LabelTable {
    table: FxMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable {
            table: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Bind `name` to `addr`, returning the address it previously pointed at.
    pub fn insert(&mut self, name: &str, addr: usize) -> Option<usize> {
        self.table.insert(name.trim().to_uppercase(), addr)
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.table.get(&name.trim().to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Labels in order of first definition.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.table.iter().map(|(name, addr)| (name.as_str(), *addr))
    }
}

/// Represents the CPU registers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    pub const COUNT: usize = 8;

    pub const ALL: [Register; Register::COUNT] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<i32> for Register {
    type Error = ExecFault;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Register::R0,
            1 => Register::R1,
            2 => Register::R2,
            3 => Register::R3,
            4 => Register::R4,
            5 => Register::R5,
            6 => Register::R6,
            7 => Register::R7,
            _ => return Err(ExecFault::RegisterOutOfRange(value)),
        })
    }
}

impl FromStr for Register {
    type Err = ExecFault;

    /// Accepts `R3`, `r3` and `R3,`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_uppercase();
        let digits = token
            .strip_prefix('R')
            .ok_or_else(|| ExecFault::MalformedRegister(s.to_string()))?;
        let digits = digits.strip_suffix(',').unwrap_or(digits);
        let index: i32 = digits
            .parse()
            .map_err(|_| ExecFault::MalformedRegister(s.to_string()))?;
        Register::try_from(index)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// Direction operand of `SHIFT`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShiftDir {
    /// `<<`
    Left,
    /// Unsigned `>>`, fills with zeroes.
    Right,
    /// Signed `>>`, keeps the sign bit.
    Arith,
}

impl FromStr for ShiftDir {
    type Err = ExecFault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LEFT" => Ok(ShiftDir::Left),
            "RIGHT" => Ok(ShiftDir::Right),
            "ARITH" => Ok(ShiftDir::Arith),
            _ => Err(ExecFault::UnknownShift(s.to_string())),
        }
    }
}

impl ShiftDir {
    pub fn apply(self, val: i32, count: i32) -> i32 {
        // Only the low five bits of the count are used
        let count = count as u32;
        match self {
            ShiftDir::Left => val.wrapping_shl(count),
            ShiftDir::Right => (val as u32).wrapping_shr(count) as i32,
            ShiftDir::Arith => val.wrapping_shr(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_case_insensitive() {
        let mut labels = LabelTable::new();
        labels.insert("loop", 3);
        assert_eq!(labels.get("LOOP"), Some(3));
        assert_eq!(labels.get("Loop"), Some(3));
        assert_eq!(labels.get("other"), None);
    }

    #[test]
    fn label_redefinition_overwrites() {
        let mut labels = LabelTable::new();
        assert_eq!(labels.insert("a", 1), None);
        assert_eq!(labels.insert("A", 5), Some(1));
        assert_eq!(labels.get("a"), Some(5));
        assert_eq!(labels.len(), 1);
    }

    #[test]
    fn parse_register() {
        assert_eq!("R0".parse::<Register>(), Ok(Register::R0));
        assert_eq!("r7".parse::<Register>(), Ok(Register::R7));
        assert_eq!(" R3, ".parse::<Register>(), Ok(Register::R3));
        assert_eq!(
            "R8".parse::<Register>(),
            Err(ExecFault::RegisterOutOfRange(8))
        );
        assert_eq!(
            "R-1".parse::<Register>(),
            Err(ExecFault::RegisterOutOfRange(-1))
        );
        assert!(matches!(
            "X1".parse::<Register>(),
            Err(ExecFault::MalformedRegister(_))
        ));
        assert!(matches!(
            "R".parse::<Register>(),
            Err(ExecFault::MalformedRegister(_))
        ));
    }

    #[test]
    fn shifts() {
        assert_eq!(ShiftDir::Left.apply(1, 4), 16);
        assert_eq!(ShiftDir::Right.apply(-16, 28), 0xF);
        assert_eq!(ShiftDir::Arith.apply(-16, 2), -4);
        // Count wraps at 32
        assert_eq!(ShiftDir::Left.apply(1, 33), 2);
        assert_eq!("arith".parse::<ShiftDir>(), Ok(ShiftDir::Arith));
        assert!("UP".parse::<ShiftDir>().is_err());
    }
}
