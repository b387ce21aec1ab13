//! The device module contains the register maps of the supported port expanders.
//!
//! In most cases you will not need anything from here explicitly; naming the chip family in
//! [`ExpanderOptions`][crate::ExpanderOptions] is enough.

use core::str::FromStr;

use crate::ConfigError;

pub mod mcp23008;
pub mod mcp23017;

/// Upper bound on ports of any descriptor.
pub const MAX_PORTS: usize = 2;
/// Upper bound on pins of any descriptor.
pub const MAX_PINS: usize = MAX_PORTS * 8;

/// Register addresses of one 8-bit port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRegisters {
    /// I/O direction: 0=output; 1=input
    pub iodir: u8,
    /// Pull-up enable
    pub gppu: u8,
    /// Port register; reading samples the pins, writing drives the latch
    pub gpio: u8,
    /// Output latch
    pub olat: u8,
}

/// Static description of a chip family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub name: &'static str,
    pub default_address: u8,
    pub ports: &'static [PortRegisters],
}

impl Descriptor {
    pub const fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub const fn pin_count(&self) -> usize {
        self.ports.len() * 8
    }

    /// Map a flat pin index to `(port, bit)`.
    pub fn split(&self, pin: u8) -> Option<(usize, u8)> {
        if (pin as usize) < self.pin_count() {
            Some((pin as usize / 8, pin % 8))
        } else {
            None
        }
    }

    /// Inverse of [`split()`][Self::split].
    pub fn join(&self, port: usize, bit: u8) -> Option<u8> {
        if port < self.port_count() && bit < 8 {
            Some(port as u8 * 8 + bit)
        } else {
            None
        }
    }

    pub fn registers(&self, port: usize) -> Option<&PortRegisters> {
        self.ports.get(port)
    }

    /// Pick the descriptor for `controller`.
    pub fn resolve(controller: Option<Controller<'_>>) -> Result<Descriptor, ConfigError> {
        let descriptor = match controller {
            Some(Controller::Name(name)) => name.parse::<ControllerKind>()?.descriptor(),
            Some(Controller::Kind(kind)) => kind.descriptor(),
            Some(Controller::Descriptor(d)) => d,
            None => return Err(ConfigError::InvalidController),
        };
        if descriptor.ports.is_empty() || descriptor.ports.len() > MAX_PORTS {
            return Err(ConfigError::InvalidDescriptor);
        }
        Ok(descriptor)
    }
}

/// The shipped chip families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    Mcp23008,
    Mcp23017,
}

impl ControllerKind {
    pub fn descriptor(self) -> Descriptor {
        match self {
            ControllerKind::Mcp23008 => mcp23008::DESCRIPTOR,
            ControllerKind::Mcp23017 => mcp23017::DESCRIPTOR,
        }
    }
}

impl FromStr for ControllerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("MCP23008") {
            Ok(ControllerKind::Mcp23008)
        } else if s.eq_ignore_ascii_case("MCP23017") {
            Ok(ControllerKind::Mcp23017)
        } else {
            Err(ConfigError::InvalidController)
        }
    }
}

/// How the chip family is selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller<'a> {
    /// Family name, matched case-insensitively.
    Name(&'a str),
    Kind(ControllerKind),
    Descriptor(Descriptor),
}

impl<'a> From<&'a str> for Controller<'a> {
    fn from(name: &'a str) -> Self {
        Controller::Name(name)
    }
}

impl From<ControllerKind> for Controller<'_> {
    fn from(kind: ControllerKind) -> Self {
        Controller::Kind(kind)
    }
}

impl From<Descriptor> for Controller<'_> {
    fn from(d: Descriptor) -> Self {
        Controller::Descriptor(d)
    }
}
