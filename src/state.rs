use crate::{
    fault::ExecFault,
    image::{DataSegment, DATA_SIZE},
    symbol::Register,
};

/// Set when a register write produced NaN or an infinity. Never cleared by the machine.
pub const FLAG_OVERFLOW: u32 = 0b1;

/// Stack pointer of an empty stack. The stack grows down from here into the data segment.
pub const SP_EMPTY: i32 = DATA_SIZE as i32 - 1;

/// Registers, pointers, flags and memory of a running program.
#[derive(Clone, PartialEq, Debug)]
pub struct State {
    /// 8x double precision registers
    reg: [f64; Register::COUNT],
    /// Instruction pointer, an index into the code segment
    pub(crate) ip: i32,
    /// Sticky status bits
    flags: u32,
    /// Next free stack slot, -1 when full
    sp: i32,
    /// Static data, shared with the stack
    mem: DataSegment,
}

impl State {
    pub fn new(mem: DataSegment) -> Self {
        State {
            reg: [0.0; Register::COUNT],
            ip: 0,
            flags: 0,
            sp: SP_EMPTY,
            mem,
        }
    }

    pub fn reg(&self, reg: Register) -> f64 {
        self.reg[reg.index()]
    }

    /// Plain write, for results that cannot be NaN or infinite.
    pub fn set_reg(&mut self, reg: Register, val: f64) {
        self.reg[reg.index()] = val;
    }

    /// Write `val`, replacing NaN and infinities with 0 and raising [`FLAG_OVERFLOW`].
    ///
    /// Returns whether the value had to be corrected.
    pub fn write_checked(&mut self, reg: Register, val: f64) -> bool {
        if val.is_finite() {
            self.reg[reg.index()] = val;
            return false;
        }
        self.reg[reg.index()] = 0.0;
        self.flags |= FLAG_OVERFLOW;
        true
    }

    pub fn registers(&self) -> &[f64; Register::COUNT] {
        &self.reg
    }

    pub fn ip(&self) -> i32 {
        self.ip
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn sp(&self) -> i32 {
        self.sp
    }

    pub fn mem(&self) -> &DataSegment {
        &self.mem
    }

    pub fn load(&self, addr: i32) -> Result<f64, ExecFault> {
        self.mem.get(addr).ok_or(ExecFault::AddressOutOfRange(addr))
    }

    pub fn store(&mut self, addr: i32, val: f64) -> Result<(), ExecFault> {
        let slot = self
            .mem
            .get_mut(addr)
            .ok_or(ExecFault::AddressOutOfRange(addr))?;
        *slot = val;
        Ok(())
    }

    /// Save `val` at the stack pointer, then move it down. Memory is untouched on overflow.
    pub fn push(&mut self, val: f64) -> Result<(), ExecFault> {
        let slot = self.mem.get_mut(self.sp).ok_or(ExecFault::StackOverflow)?;
        *slot = val;
        self.sp -= 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<f64, ExecFault> {
        if self.sp >= SP_EMPTY {
            return Err(ExecFault::StackUnderflow);
        }
        self.sp += 1;
        Ok(self.mem[self.sp as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Register::*;

    fn state() -> State {
        State::new(DataSegment::new())
    }

    #[test]
    fn overflow_is_corrected_and_sticky() {
        let mut state = state();
        assert!(!state.write_checked(R0, 1.5));
        assert_eq!(state.flags(), 0);

        assert!(state.write_checked(R1, f64::INFINITY));
        assert_eq!(state.reg(R1), 0.0);
        assert_eq!(state.flags(), FLAG_OVERFLOW);

        assert!(!state.write_checked(R1, 2.0));
        assert_eq!(state.flags(), FLAG_OVERFLOW);

        assert!(state.write_checked(R2, f64::NAN));
        assert_eq!(state.reg(R2), 0.0);
    }

    #[test]
    fn stack_grows_down_from_top() {
        let mut state = state();
        state.push(1.0).unwrap();
        state.push(2.0).unwrap();
        assert_eq!(state.sp(), SP_EMPTY - 2);
        assert_eq!(state.mem()[255], 1.0);
        assert_eq!(state.mem()[254], 2.0);
        assert_eq!(state.pop(), Ok(2.0));
        assert_eq!(state.pop(), Ok(1.0));
        assert_eq!(state.sp(), SP_EMPTY);
    }

    #[test]
    fn underflow_on_empty_stack() {
        let mut state = state();
        assert_eq!(state.pop(), Err(ExecFault::StackUnderflow));
        assert_eq!(state.sp(), SP_EMPTY);
    }

    #[test]
    fn overflow_on_full_stack() {
        let mut state = state();
        for i in 0..DATA_SIZE {
            state.push(i as f64).unwrap();
        }
        assert_eq!(state.sp(), -1);
        let before = state.mem().clone();
        assert_eq!(state.push(99.0), Err(ExecFault::StackOverflow));
        assert_eq!(state.mem(), &before);
        assert_eq!(state.sp(), -1);
    }

    #[test]
    fn stack_shares_data_addresses() {
        let mut state = state();
        state.push(7.0).unwrap();
        assert_eq!(state.load(255), Ok(7.0));
        state.store(254, 3.0).unwrap();
        state.push(0.0).unwrap();
        assert_eq!(state.load(254), Ok(0.0));
        assert_eq!(state.load(256), Err(ExecFault::AddressOutOfRange(256)));
        assert_eq!(state.store(-1, 1.0), Err(ExecFault::AddressOutOfRange(-1)));
    }
}
