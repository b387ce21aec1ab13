//! Local copies of the expander's registers.
//!
//! Bus writes always replace a whole register byte, so changing a single pin needs the current
//! contents of the other seven.  Reading them back from the chip would double the bus traffic;
//! instead the driver keeps the last value it successfully wrote for each port.

use crate::dev::MAX_PORTS;

/// Which shadowed register to access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// I/O direction, bit set = input
    Direction,
    /// Last value commanded for the port
    OutputLatch,
    /// Last byte sampled from the port
    InputSnapshot,
    /// Pull-up enable, bit set = enabled
    PullUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowRegisters {
    direction: [u8; MAX_PORTS],
    output_latch: [u8; MAX_PORTS],
    input_snapshot: [u8; MAX_PORTS],
    pull_up: [u8; MAX_PORTS],
}

impl ShadowRegisters {
    /// Power-on state of the chip: all pins inputs, latches high, pull-ups off.
    pub const fn new() -> Self {
        Self {
            direction: [0xff; MAX_PORTS],
            output_latch: [0xff; MAX_PORTS],
            input_snapshot: [0xff; MAX_PORTS],
            pull_up: [0x00; MAX_PORTS],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn get(&self, reg: Register, port: usize) -> u8 {
        self.bank(reg)[port]
    }

    /// Current byte of `reg` with `bit` set or cleared.  Does not modify the shadow.
    pub fn with_bit(&self, reg: Register, port: usize, bit: u8, set: bool) -> u8 {
        let byte = self.get(reg, port);
        if set {
            byte | (1 << bit)
        } else {
            byte & !(1 << bit)
        }
    }

    /// Record `value` as the register's contents.  Only call after the chip accepted the write.
    pub fn store(&mut self, reg: Register, port: usize, value: u8) {
        self.bank_mut(reg)[port] = value;
    }

    pub fn direction(&self, port: usize) -> u8 {
        self.direction[port]
    }

    pub fn output_latch(&self, port: usize) -> u8 {
        self.output_latch[port]
    }

    pub fn input_snapshot(&self, port: usize) -> u8 {
        self.input_snapshot[port]
    }

    pub fn pull_up(&self, port: usize) -> u8 {
        self.pull_up[port]
    }

    fn bank(&self, reg: Register) -> &[u8; MAX_PORTS] {
        match reg {
            Register::Direction => &self.direction,
            Register::OutputLatch => &self.output_latch,
            Register::InputSnapshot => &self.input_snapshot,
            Register::PullUp => &self.pull_up,
        }
    }

    fn bank_mut(&mut self, reg: Register) -> &mut [u8; MAX_PORTS] {
        match reg {
            Register::Direction => &mut self.direction,
            Register::OutputLatch => &mut self.output_latch,
            Register::InputSnapshot => &mut self.input_snapshot,
            Register::PullUp => &mut self.pull_up,
        }
    }
}

impl Default for ShadowRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_state() {
        let shadow = ShadowRegisters::new();
        for port in 0..MAX_PORTS {
            assert_eq!(shadow.direction(port), 0xff);
            assert_eq!(shadow.output_latch(port), 0xff);
            assert_eq!(shadow.input_snapshot(port), 0xff);
            assert_eq!(shadow.pull_up(port), 0x00);
        }
    }

    #[test]
    fn with_bit_keeps_other_bits() {
        let mut shadow = ShadowRegisters::new();
        shadow.store(Register::OutputLatch, 1, 0b1010_0000);

        let b = shadow.with_bit(Register::OutputLatch, 1, 0, true);
        assert_eq!(b, 0b1010_0001);
        // not committed yet
        assert_eq!(shadow.output_latch(1), 0b1010_0000);

        shadow.store(Register::OutputLatch, 1, b);
        let b = shadow.with_bit(Register::OutputLatch, 1, 7, false);
        assert_eq!(b, 0b0010_0001);
        assert_eq!(shadow.output_latch(0), 0xff);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut shadow = ShadowRegisters::new();
        shadow.store(Register::PullUp, 0, 0x55);
        shadow.store(Register::Direction, 1, 0x00);
        shadow.reset();
        assert_eq!(shadow, ShadowRegisters::new());
    }
}
