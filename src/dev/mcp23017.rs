//! Support for the `MCP23017` "16-Bit I/O Expander with Serial Interface"
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/devicedoc/20001952c.pdf
//!
//! The MCP23017 offers two eight-bit GPIO ports.  It has three
//! address pins, so eight devices can coexist on an I2C bus.
//!
//! Flat pin indices 0..7 map to port A (GPA0..GPA7) and 8..15 to port B (GPB0..GPB7).
use super::{Descriptor, PortRegisters};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    // N.B.: These values are for BANK=0, which is the reset state of
    // the chip (and this driver does not change).
    //
    // For all registers, the reset value is 0x00, except for
    // IODIR{A,B} which are 0xFF (making all pins inputs) at reset.
    //
    // IODIR: input/output direction: 0=output; 1=input
    // IPOL: input polarity: 0=register values match input pins; 1=opposite
    // GPINTEN: interrupt-on-change: 0=disable; 1=enable
    // DEFVAL: default values for interrupt-on-change
    // INTCON: interrupt-on-change config: 0=compare to previous pin value;
    //   1=compare to corresponding bit in DEFVAL
    // IOCON: configuration register, shared by both ports
    // GPPU: GPIO pull-ups: enables weak internal pull-ups on each pin (when configured
    //   as an input)
    // INTF: interrupt flags: 0=no interrupt pending; 1=corresponding pin caused interrupt
    // INTCAP: interrupt captured value: reflects value of each pin at the time that they
    //   caused an interrupt
    // GPIO: reflects logic level on pins; writing modifies OLAT
    // OLAT: output latches: sets state for pins configured as outputs
    IODIRA = 0x00,
    IPOLA = 0x02,
    GPINTENA = 0x04,
    DEFVALA = 0x06,
    INTCONA = 0x08,
    IOCONA = 0x0a,
    GPPUA = 0x0c,
    INTFA = 0x0e,
    INTCAPA = 0x10,
    GPIOA = 0x12,
    OLATA = 0x14,
    IODIRB = 0x01,
    IPOLB = 0x03,
    GPINTENB = 0x05,
    DEFVALB = 0x07,
    INTCONB = 0x09,
    IOCONB = 0x0b,
    GPPUB = 0x0d,
    INTFB = 0x0f,
    INTCAPB = 0x11,
    GPIOB = 0x13,
    OLATB = 0x15,
}

const PORTS: [PortRegisters; 2] = [
    PortRegisters {
        iodir: Regs::IODIRA as u8,
        gppu: Regs::GPPUA as u8,
        gpio: Regs::GPIOA as u8,
        olat: Regs::OLATA as u8,
    },
    PortRegisters {
        iodir: Regs::IODIRB as u8,
        gppu: Regs::GPPUB as u8,
        gpio: Regs::GPIOB as u8,
        olat: Regs::OLATB as u8,
    },
];

/// `MCP23017` with all address pins low.
pub const DESCRIPTOR: Descriptor = Descriptor {
    name: "MCP23017",
    default_address: 0x20,
    ports: &PORTS,
};
