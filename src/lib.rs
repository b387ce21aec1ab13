//! Virtual pin I/O backend for I2C GPIO-expanders.
//!
//! An [`Expander`] turns an MCP23008 (8 pins) or MCP23017 (16 pins) into something device code can
//! treat like a board's own pins, through the [`IoBackend`] contract.  Register state is shadowed,
//! so every write is a single register write without a read-modify-write on the bus.
//!
//! ```no_run
//! use expander_io::{Expander, ExpanderOptions, HalTransport, IoBackend};
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//!
//! let mut mcp = Expander::new(
//!     HalTransport::new(i2c),
//!     ExpanderOptions::new().controller("MCP23017"),
//! )
//! .unwrap();
//! mcp.initialize().unwrap();
//!
//! mcp.digital_write(9, 1).unwrap();
//! mcp.digital_read(3, Box::new(|level| log::info!("pin 3 is {}", level)))
//!     .unwrap();
//! ```
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

mod bus;
mod common;
pub mod dev;
mod error;
mod expander;
mod mutex;
mod pin;
#[cfg(feature = "async")]
mod pin_async;
pub mod shadow;

pub use bus::{HalTransport, ReadRequest, ReadStatus, Transport};
pub use common::mode;
pub use common::{AnalogListener, Direction, IoBackend, Modes, ReadListener, Subscription};
pub use dev::{Controller, ControllerKind, Descriptor, PortRegisters};
pub use error::{ConfigError, Error, Operation};
pub use expander::{
    EventListener, Expander, ExpanderEvent, ExpanderOptions, PinEntry, MAX_EVENT_LISTENERS,
    MAX_LISTENERS_PER_PIN, NO_ANALOG_CHANNEL,
};
pub use mutex::PortMutex;
pub use pin::{Pin, SharedExpander};
#[cfg(feature = "async")]
pub use pin_async::{ReadFuture, MAX_WAITERS_PER_PIN};
pub use shadow::{Register, ShadowRegisters};
