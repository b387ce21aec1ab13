//! Support for the `MCP23008` "8-Bit I/O Expander with Serial Interface"
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/DeviceDoc/21919e.pdf
//!
//! The MCP23008 offers a single eight-bit GPIO port.  It has three
//! address pins, so eight devices can coexist on an I2C bus.
use super::{Descriptor, PortRegisters};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    // For all registers, the reset value is 0x00, except for
    // IODIR which is 0xFF (making all pins inputs) at reset.
    //
    // IODIR: input/output direction: 0=output; 1=input
    // IPOL: input polarity: 0=register values match input pins; 1=opposite
    // GPINTEN: interrupt-on-change: 0=disable; 1=enable
    // DEFVAL: default values for interrupt-on-change
    // INTCON: interrupt-on-change config
    // IOCON: configuration register
    // GPPU: GPIO pull-ups: enables weak internal pull-ups on each pin (when configured
    //   as an input)
    // INTF: interrupt flags
    // INTCAP: interrupt captured value
    // GPIO: reflects logic level on pins; writing modifies OLAT
    // OLAT: output latches: sets state for pins configured as outputs
    IODIR = 0x00,
    IPOL = 0x01,
    GPINTEN = 0x02,
    DEFVAL = 0x03,
    INTCON = 0x04,
    IOCON = 0x05,
    GPPU = 0x06,
    INTF = 0x07,
    INTCAP = 0x08,
    GPIO = 0x09,
    OLAT = 0x0a,
}

const PORTS: [PortRegisters; 1] = [PortRegisters {
    iodir: Regs::IODIR as u8,
    gppu: Regs::GPPU as u8,
    gpio: Regs::GPIO as u8,
    olat: Regs::OLAT as u8,
}];

/// `MCP23008` with all address pins low.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "MCP23008",
    default_address: 0x20,
    ports: &PORTS,
};
