use std::ops::{Index, IndexMut};

use crate::log::Diagnostic;
use crate::symbol::LabelTable;

/// Amount of slots in the data segment. The stack shares the same slots, growing down from the top.
pub const DATA_SIZE: usize = 256;

/// Fixed-size numeric memory backing both static data and the call/operand stack.
#[derive(Clone, PartialEq, Debug)]
pub struct DataSegment(Box<[f64; DATA_SIZE]>);

impl DataSegment {
    pub fn new() -> Self {
        DataSegment(Box::new([0.0; DATA_SIZE]))
    }

    /// Slot at `addr`, or `None` outside `0..DATA_SIZE`.
    pub fn get(&self, addr: i32) -> Option<f64> {
        usize::try_from(addr).ok().and_then(|addr| self.0.get(addr)).copied()
    }

    pub fn get_mut(&mut self, addr: i32) -> Option<&mut f64> {
        usize::try_from(addr).ok().and_then(|addr| self.0.get_mut(addr))
    }

    pub fn as_slice(&self) -> &[f64; DATA_SIZE] {
        &self.0
    }
}

impl Default for DataSegment {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for DataSegment {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for DataSegment {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

/// Parsed program: raw code lines addressed by position, label table, and initial data.
#[derive(Clone, Debug, Default)]
pub struct Program {
    /// Instruction lines, decoded only when executed.
    pub(crate) code: Vec<String>,
    pub(crate) labels: LabelTable,
    pub(crate) data: DataSegment,
    /// Slots `0..data_count` came from the `[DATA]` segment.
    pub(crate) data_count: usize,
    /// Non-fatal notes produced while loading.
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Program {
    pub fn code(&self) -> &[String] {
        &self.code
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn data(&self) -> &DataSegment {
        &self.data
    }

    pub fn data_count(&self) -> usize {
        self.data_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn add_instr(&mut self, instr: &str) {
        self.code.push(instr.to_string())
    }

    /// Append one static value. Returns `false` when the segment is already full.
    pub(crate) fn add_data(&mut self, val: f64) -> bool {
        if self.data_count >= DATA_SIZE {
            return false;
        }
        self.data[self.data_count] = val;
        self.data_count += 1;
        true
    }
}
