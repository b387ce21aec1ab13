use alloc::boxed::Box;

/// Callback receiving the logic level (0 or 1) of a completed digital read.
pub type ReadListener = Box<dyn FnMut(u8) + Send>;

/// Callback receiving an analog sample.  No expander produces these.
pub type AnalogListener = Box<dyn FnMut(u16) + Send>;

/// Mode and level constants of a transport's vocabulary.
///
/// Pin modes are passed around as the transport's raw values, so a board and the expanders hanging
/// off it agree on what `INPUT` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    pub input: u8,
    pub output: u8,
    pub high: u8,
    pub low: u8,
}

impl Modes {
    /// Constants used by the Firmata protocol.
    pub const FIRMATA: Modes = Modes {
        input: 0x00,
        output: 0x01,
        high: 1,
        low: 0,
    };

    pub fn direction(&self, mode: u8) -> Option<Direction> {
        if mode == self.input {
            Some(Direction::Input)
        } else if mode == self.output {
            Some(Direction::Output)
        } else {
            None
        }
    }
}

impl Default for Modes {
    fn default() -> Self {
        Self::FIRMATA
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Handle to a read listener registered by `digital_read()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub(crate) pin: u8,
    pub(crate) id: u32,
}

impl Subscription {
    pub fn pin(&self) -> u8 {
        self.pin
    }
}

/// The pin-capability contract.
///
/// Anything that can act as the I/O layer of a board implements this, so device components (LEDs,
/// buttons, ...) can be attached to a native board or to an expander without knowing which one
/// backs them.
pub trait IoBackend {
    type Error;

    /// Name used in diagnostics, e.g. `"MCP23017"`.
    fn name(&self) -> &'static str;

    fn pin_count(&self) -> usize;

    /// Modes supported by `pin`.  Empty if the pin does not exist.
    fn supported_modes(&self, pin: u8) -> &[u8];

    fn modes(&self) -> Modes;

    fn is_ready(&self) -> bool;

    fn pin_mode(&mut self, pin: u8, mode: u8) -> Result<(), Self::Error>;

    /// Drive `pin` HIGH for any nonzero `value`, LOW otherwise.
    fn digital_write(&mut self, pin: u8, value: u8) -> Result<(), Self::Error>;

    /// Register `listener` on `pin` and request a fresh sample.
    ///
    /// The listener stays registered and is called on every later read of the same pin until it is
    /// removed again.
    fn digital_read(&mut self, pin: u8, listener: ReadListener)
        -> Result<Subscription, Self::Error>;

    /// Request a fresh sample of `pin` for the listeners already registered on it.
    ///
    /// This is how a consumer polls: register once with `digital_read()`, then call this for every
    /// further reading.
    fn digital_resample(&mut self, pin: u8) -> Result<(), Self::Error>;

    /// Enable (nonzero `value`) or disable the pull-up of `pin`.
    fn pull_up(&mut self, pin: u8, value: u8) -> Result<(), Self::Error>;

    fn analog_write(&mut self, pin: u8, value: u16) -> Result<(), Self::Error>;

    fn analog_read(&mut self, pin: u8, listener: AnalogListener)
        -> Result<Subscription, Self::Error>;

    fn servo_write(&mut self, pin: u8, value: u16) -> Result<(), Self::Error>;
}

/// Pin Modes
pub mod mode {
    /// Trait for pin-modes which can be used to set a logic level.
    pub trait HasOutput {}
    /// Trait for pin-modes which can be used to read a logic level.
    pub trait HasInput {}

    /// Pin whose mode was not chosen through this handle.
    pub struct Unconfigured;

    /// Pin configured as an input.
    pub struct Input;
    impl HasInput for Input {}

    /// Pin configured as an output.
    pub struct Output;
    impl HasOutput for Output {}
}
