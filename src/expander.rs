//! The expander core: a virtual pin I/O backend on top of a register-mapped GPIO-expander.
//!
//! Every mutating operation recomputes a full register byte from the [`ShadowRegisters`], writes
//! it, and only commits the new byte once the transport accepted the write.  Reads are submitted
//! to the transport and their results fanned out to the listeners registered on the pin.
use alloc::boxed::Box;

use crate::bus::{ReadRequest, ReadStatus, Transport, TransportExt};
use crate::dev::{Controller, Descriptor, PortRegisters, MAX_PINS};
use crate::shadow::{Register, ShadowRegisters};
use crate::{
    AnalogListener, Direction, Error, IoBackend, Modes, Operation, ReadListener, Subscription,
};

/// Maximum number of read listeners on a single pin.
pub const MAX_LISTENERS_PER_PIN: usize = 4;
/// Maximum number of lifecycle event listeners.
pub const MAX_EVENT_LISTENERS: usize = 4;
/// Analog channel of pins which are not analog inputs.
pub const NO_ANALOG_CHANNEL: u8 = 127;

/// Lifecycle notifications.  `Connect` is always delivered right before `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpanderEvent {
    Connect,
    Ready,
}

pub type EventListener = Box<dyn FnMut(ExpanderEvent) + Send>;

/// Per-pin bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEntry {
    pub supported_modes: [u8; 2],
    /// `None` until a mode was set.
    pub mode: Option<u8>,
    /// Last level written or read.
    pub value: u8,
    /// A read listener was registered since the last write.
    pub report: bool,
    pub analog_channel: u8,
}

impl PinEntry {
    fn new(modes: Modes) -> Self {
        Self {
            supported_modes: [modes.input, modes.output],
            mode: None,
            value: 0,
            report: false,
            analog_channel: NO_ANALOG_CHANNEL,
        }
    }
}

/// Construction parameters.
///
/// ```
/// let opts = expander_io::ExpanderOptions::new()
///     .controller("mcp23017")
///     .address(0x21);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpanderOptions<'a> {
    controller: Option<Controller<'a>>,
    address: Option<u8>,
}

impl<'a> ExpanderOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(mut self, controller: impl Into<Controller<'a>>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    /// 7-bit bus address.  Defaults to the chip family's default address.
    pub fn address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }
}

struct Listener {
    id: u32,
    callback: ReadListener,
}

/// A GPIO-expander presented as a pin I/O backend.
///
/// Create with [`Expander::new()`], then call [`initialize()`][Expander::initialize] once the
/// transport is up.  All pins start out as outputs driven LOW.
pub struct Expander<T> {
    transport: T,
    descriptor: Descriptor,
    address: u8,
    modes: Modes,
    shadow: ShadowRegisters,
    pins: heapless::Vec<PinEntry, MAX_PINS>,
    listeners: [heapless::Vec<Listener, MAX_LISTENERS_PER_PIN>; MAX_PINS],
    #[cfg(feature = "async")]
    pub(crate) waiters:
        [heapless::Vec<crate::pin_async::Waiter, { crate::pin_async::MAX_WAITERS_PER_PIN }>;
            MAX_PINS],
    events: heapless::Vec<EventListener, MAX_EVENT_LISTENERS>,
    next_id: u32,
    ready: bool,
}

impl<T: Transport> Expander<T> {
    /// Resolve the chip family.  No bus traffic happens here.
    pub fn new(transport: T, options: ExpanderOptions<'_>) -> Result<Self, Error<T::Error>> {
        let descriptor = Descriptor::resolve(options.controller)?;
        let address = options.address.unwrap_or(descriptor.default_address);
        let modes = transport.modes();
        Ok(Self {
            transport,
            descriptor,
            address,
            modes,
            shadow: ShadowRegisters::new(),
            pins: heapless::Vec::new(),
            listeners: Default::default(),
            #[cfg(feature = "async")]
            waiters: Default::default(),
            events: heapless::Vec::new(),
            next_id: 0,
            ready: false,
        })
    }

    /// Bring the chip into a known state: all pins outputs, driven LOW.
    ///
    /// On success, `Connect` and then `Ready` are delivered to the event listeners.  If any bus
    /// operation fails the expander stays not ready.
    pub fn initialize(&mut self) -> Result<(), Error<T::Error>> {
        self.ready = false;
        self.pins.clear();
        self.shadow.reset();

        log::debug!(
            "Expander:{} at {:#04x}: initializing {} pins",
            self.descriptor.name,
            self.address,
            self.descriptor.pin_count()
        );
        if let Err(e) = self.reset_sequence() {
            log::warn!(
                "Expander:{} at {:#04x}: initialization failed",
                self.descriptor.name,
                self.address
            );
            self.pins.clear();
            return Err(e);
        }

        self.ready = true;
        log::debug!("Expander:{} at {:#04x}: ready", self.descriptor.name, self.address);
        self.emit(ExpanderEvent::Connect);
        self.emit(ExpanderEvent::Ready);
        Ok(())
    }

    fn reset_sequence(&mut self) -> Result<(), Error<T::Error>> {
        self.transport.configure().map_err(Error::Transport)?;

        // The chip's own power-on state is not trusted.
        for port in 0..self.descriptor.port_count() {
            let iodir = self.descriptor.ports[port].iodir;
            self.write_register(iodir, self.shadow.direction(port))?;
        }

        self.modes = self.transport.modes();
        for pin in 0..self.descriptor.pin_count() as u8 {
            self.pins
                .push(PinEntry::new(self.modes))
                .map_err(|_| Error::InvalidPin(pin))?;
            self.set_direction(pin, Direction::Output, self.modes.output)?;
            self.write_level(pin, self.modes.low)?;
        }
        Ok(())
    }

    /// Register a lifecycle listener.
    pub fn on_event(&mut self, listener: EventListener) -> Result<(), Error<T::Error>> {
        self.events
            .push(listener)
            .map_err(|_| Error::EventCapacity)
    }

    fn emit(&mut self, event: ExpanderEvent) {
        for listener in self.events.iter_mut() {
            listener(event);
        }
    }

    /// Deliver the result of a read the transport reported as [`ReadStatus::Pending`].
    ///
    /// Returns the level of the requested pin after notifying its listeners.
    pub fn complete_read(
        &mut self,
        request: ReadRequest,
        data: &[u8],
    ) -> Result<u8, Error<T::Error>> {
        let (port, bit) = self
            .descriptor
            .split(request.pin)
            .filter(|&(port, bit)| port == request.port as usize && bit == request.bit)
            .ok_or(Error::InvalidPin(request.pin))?;
        let byte = *data.first().ok_or(Error::ShortRead(request.pin))?;
        let value = (byte >> bit) & 0x01;
        log::trace!(
            "Expander:{} at {:#04x}: pin {} reads {}",
            self.descriptor.name,
            self.address,
            request.pin,
            value
        );

        self.shadow.store(Register::InputSnapshot, port, byte);
        match self.pins.get_mut(request.pin as usize) {
            Some(entry) => entry.value = value,
            None => log::warn!(
                "Expander:{}: read completion for pin {} while not initialized",
                self.descriptor.name,
                request.pin
            ),
        }

        for listener in self.listeners[request.pin as usize].iter_mut() {
            (listener.callback)(value);
        }
        #[cfg(feature = "async")]
        self.wake_waiters(request.pin, value);

        Ok(value)
    }

    /// Remove a listener registered by `digital_read()`.  Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let Some(listeners) = self.listeners.get_mut(subscription.pin as usize) else {
            return false;
        };
        match listeners.iter().position(|l| l.id == subscription.id) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn shadow(&self) -> &ShadowRegisters {
        &self.shadow
    }

    pub fn pin(&self, pin: u8) -> Option<&PinEntry> {
        self.pins.get(pin as usize)
    }

    pub fn pins(&self) -> &[PinEntry] {
        &self.pins
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Submit a read of `pin`'s port.  Returns the level if the transport completed it right away.
    pub(crate) fn request_read(&mut self, pin: u8) -> Result<Option<u8>, Error<T::Error>> {
        let (port, bit, regs) = self.locate(pin)?;
        let request = ReadRequest {
            pin,
            port: port as u8,
            bit,
        };
        let mut buf = [0x00];
        log::trace!("i2c {:#04x}: read reg {:#04x}", self.address, regs.gpio);
        match self
            .transport
            .read(self.address, regs.gpio, &mut buf, request)
        {
            Ok(ReadStatus::Complete) => self.complete_read(request, &buf).map(Some),
            Ok(ReadStatus::Pending) => Ok(None),
            Err(e) => {
                log::warn!(
                    "Expander:{} at {:#04x}: read of reg {:#04x} failed",
                    self.descriptor.name,
                    self.address,
                    regs.gpio
                );
                Err(Error::Transport(e))
            }
        }
    }

    /// A fresh id for a registration on `pin`.  Ids still registered on the pin are skipped, so a
    /// wrapped counter never hands out a live one.
    pub(crate) fn next_id(&mut self, pin: u8) -> u32 {
        loop {
            self.next_id = self.next_id.wrapping_add(1);
            let id = self.next_id;
            if !self.id_in_use(pin, id) {
                return id;
            }
        }
    }

    fn id_in_use(&self, pin: u8, id: u32) -> bool {
        let listening = self.listeners[pin as usize].iter().any(|l| l.id == id);
        #[cfg(feature = "async")]
        let listening = listening || self.waiters[pin as usize].iter().any(|w| w.id == id);
        listening
    }

    pub(crate) fn checked(&self, pin: u8) -> Result<(usize, u8, PortRegisters), Error<T::Error>> {
        if !self.ready {
            return Err(Error::NotReady);
        }
        self.locate(pin)
    }

    fn locate(&self, pin: u8) -> Result<(usize, u8, PortRegisters), Error<T::Error>> {
        let (port, bit) = self.descriptor.split(pin).ok_or(Error::InvalidPin(pin))?;
        Ok((port, bit, self.descriptor.ports[port]))
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<T::Error>> {
        self.transport
            .write_reg(self.address, reg, value)
            .map_err(|e| {
                log::warn!(
                    "Expander:{} at {:#04x}: write to reg {:#04x} failed",
                    self.descriptor.name,
                    self.address,
                    reg
                );
                Error::Transport(e)
            })
    }

    fn set_direction(&mut self, pin: u8, dir: Direction, mode: u8) -> Result<(), Error<T::Error>> {
        let (port, bit, regs) = self.locate(pin)?;
        let byte = self
            .shadow
            .with_bit(Register::Direction, port, bit, dir == Direction::Input);
        self.write_register(regs.iodir, byte)?;

        self.shadow.store(Register::Direction, port, byte);
        if let Some(entry) = self.pins.get_mut(pin as usize) {
            entry.mode = Some(mode);
        }
        Ok(())
    }

    fn write_level(&mut self, pin: u8, value: u8) -> Result<(), Error<T::Error>> {
        let (port, bit, regs) = self.locate(pin)?;
        let high = value != 0;
        let byte = self
            .shadow
            .with_bit(Register::OutputLatch, port, bit, high);
        self.write_register(regs.gpio, byte)?;

        self.shadow.store(Register::OutputLatch, port, byte);
        // Assume the chip now reads back what was written.
        self.shadow.store(Register::InputSnapshot, port, byte);
        if let Some(entry) = self.pins.get_mut(pin as usize) {
            entry.report = false;
            entry.value = u8::from(high);
        }
        Ok(())
    }

    fn unsupported(&self, operation: Operation) -> Error<T::Error> {
        Error::Unsupported {
            operation,
            controller: self.descriptor.name,
        }
    }
}

impl<T: Transport> IoBackend for Expander<T> {
    type Error = Error<T::Error>;

    fn name(&self) -> &'static str {
        self.descriptor.name
    }

    fn pin_count(&self) -> usize {
        self.descriptor.pin_count()
    }

    fn supported_modes(&self, pin: u8) -> &[u8] {
        match self.pins.get(pin as usize) {
            Some(entry) => &entry.supported_modes[..],
            None => &[],
        }
    }

    fn modes(&self) -> Modes {
        self.modes
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn pin_mode(&mut self, pin: u8, mode: u8) -> Result<(), Self::Error> {
        self.checked(pin)?;
        let dir = self.modes.direction(mode).ok_or(Error::InvalidMode(mode))?;
        self.set_direction(pin, dir, mode)
    }

    fn digital_write(&mut self, pin: u8, value: u8) -> Result<(), Self::Error> {
        self.checked(pin)?;
        self.write_level(pin, value)
    }

    fn digital_read(
        &mut self,
        pin: u8,
        listener: ReadListener,
    ) -> Result<Subscription, Self::Error> {
        self.checked(pin)?;
        let id = self.next_id(pin);
        self.listeners[pin as usize]
            .push(Listener {
                id,
                callback: listener,
            })
            .map_err(|_| Error::ListenerCapacity(pin))?;

        let subscription = Subscription { pin, id };
        if let Err(e) = self.request_read(pin) {
            self.unsubscribe(subscription);
            return Err(e);
        }
        self.pins[pin as usize].report = true;
        Ok(subscription)
    }

    fn digital_resample(&mut self, pin: u8) -> Result<(), Self::Error> {
        self.checked(pin)?;
        self.request_read(pin)?;
        if !self.listeners[pin as usize].is_empty() {
            self.pins[pin as usize].report = true;
        }
        Ok(())
    }

    fn pull_up(&mut self, pin: u8, value: u8) -> Result<(), Self::Error> {
        let (port, bit, regs) = self.checked(pin)?;
        let byte = self.shadow.with_bit(Register::PullUp, port, bit, value != 0);
        self.write_register(regs.gppu, byte)?;
        self.shadow.store(Register::PullUp, port, byte);
        Ok(())
    }

    fn analog_write(&mut self, _pin: u8, _value: u16) -> Result<(), Self::Error> {
        Err(self.unsupported(Operation::AnalogWrite))
    }

    fn analog_read(
        &mut self,
        _pin: u8,
        _listener: AnalogListener,
    ) -> Result<Subscription, Self::Error> {
        Err(self.unsupported(Operation::AnalogRead))
    }

    fn servo_write(&mut self, _pin: u8, _value: u16) -> Result<(), Self::Error> {
        Err(self.unsupported(Operation::ServoWrite))
    }
}
