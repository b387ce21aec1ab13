use core::marker::PhantomData;
use embedded_hal::digital as hal_digital;

use crate::bus::Transport;
use crate::shadow::Register;
use crate::{Error, Expander, IoBackend, PortMutex, ReadListener, Subscription};

/// An initialized expander behind a mutex, handing out typed [`Pin`]s.
pub struct SharedExpander<M>(M);

impl<T: Transport> SharedExpander<core::cell::RefCell<Expander<T>>> {
    pub fn new(expander: Expander<T>) -> Self {
        Self::with_mutex(expander)
    }
}

impl<T, M> SharedExpander<M>
where
    T: Transport,
    M: PortMutex<Port = Expander<T>>,
{
    pub fn with_mutex(expander: Expander<T>) -> Self {
        Self(PortMutex::create(expander))
    }

    /// Get a handle to `pin`.  The pin keeps whatever mode it currently has.
    pub fn pin(&self, pin: u8) -> Result<Pin<'_, crate::mode::Unconfigured, M>, Error<T::Error>> {
        self.0.lock(|drv| drv.checked(pin))?;
        Ok(Pin::new(pin, &self.0))
    }

    /// Run `f` with exclusive access to the expander.
    pub fn lock<R, F: FnOnce(&mut Expander<T>) -> R>(&self, f: F) -> R {
        self.0.lock(f)
    }
}

/// Representation of an expander pin.
///
/// `Pin` is not constructed directly, it is handed out by [`SharedExpander::pin()`].  The `MODE`
/// type parameter tracks what the pin was configured as through this handle.
pub struct Pin<'a, MODE, MUTEX> {
    pub(crate) pin: u8,
    pub(crate) expander: &'a MUTEX,
    _m: PhantomData<MODE>,
}

impl<'a, MODE, T, MUTEX> Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    fn new(pin: u8, expander: &'a MUTEX) -> Self {
        Self {
            pin,
            expander,
            _m: PhantomData,
        }
    }

    fn retype<NEW>(self) -> Pin<'a, NEW, MUTEX> {
        Pin {
            pin: self.pin,
            expander: self.expander,
            _m: PhantomData,
        }
    }

    pub fn pin_number(&self) -> u8 {
        self.pin
    }

    pub fn into_input(self) -> Result<Pin<'a, crate::mode::Input, MUTEX>, Error<T::Error>> {
        self.expander.lock(|drv| {
            let input = drv.modes().input;
            drv.pin_mode(self.pin, input)
        })?;
        Ok(self.retype())
    }

    /// Configure the pin as an input and enable its pull-up.
    pub fn into_pull_up_input(self) -> Result<Pin<'a, crate::mode::Input, MUTEX>, Error<T::Error>> {
        self.expander.lock(|drv| {
            let input = drv.modes().input;
            drv.pin_mode(self.pin, input)?;
            drv.pull_up(self.pin, 1)
        })?;
        Ok(self.retype())
    }

    pub fn into_output(self) -> Result<Pin<'a, crate::mode::Output, MUTEX>, Error<T::Error>> {
        self.expander.lock(|drv| {
            let output = drv.modes().output;
            drv.pin_mode(self.pin, output)
        })?;
        Ok(self.retype())
    }

    /// Configure the pin as an output, latching `state` first so it never glitches.
    pub fn into_output_with_state(
        self,
        state: bool,
    ) -> Result<Pin<'a, crate::mode::Output, MUTEX>, Error<T::Error>> {
        self.expander.lock(|drv| {
            let modes = drv.modes();
            drv.digital_write(self.pin, if state { modes.high } else { modes.low })?;
            drv.pin_mode(self.pin, modes.output)
        })?;
        Ok(self.retype())
    }
}

impl<'a, MODE: crate::mode::HasInput, T, MUTEX> Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    /// Sample the pin.  Fails with [`Error::ReadPending`] if the transport completes reads later.
    pub fn is_high(&self) -> Result<bool, Error<T::Error>> {
        self.expander
            .lock(|drv| {
                drv.checked(self.pin)?;
                drv.request_read(self.pin)
            })?
            .map(|v| v != 0)
            .ok_or(Error::ReadPending(self.pin))
    }

    pub fn is_low(&self) -> Result<bool, Error<T::Error>> {
        self.is_high().map(|b| !b)
    }

    /// Register `listener` for this pin's reads and request one.
    pub fn read_with(&self, listener: ReadListener) -> Result<Subscription, Error<T::Error>> {
        self.expander
            .lock(|drv| drv.digital_read(self.pin, listener))
    }
}

impl<'a, MODE: crate::mode::HasOutput, T, MUTEX> Pin<'a, MODE, MUTEX>
where
    T: Transport,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    pub fn set_high(&mut self) -> Result<(), Error<T::Error>> {
        self.expander.lock(|drv| {
            let high = drv.modes().high;
            drv.digital_write(self.pin, high)
        })
    }

    pub fn set_low(&mut self) -> Result<(), Error<T::Error>> {
        self.expander.lock(|drv| {
            let low = drv.modes().low;
            drv.digital_write(self.pin, low)
        })
    }

    /// Level last commanded for this pin, from the latch shadow.
    pub fn is_set_high(&self) -> Result<bool, Error<T::Error>> {
        self.expander.lock(|drv| {
            let (port, bit, _) = drv.checked(self.pin)?;
            Ok(drv.shadow().get(Register::OutputLatch, port) & (1 << bit) != 0)
        })
    }

    pub fn is_set_low(&self) -> Result<bool, Error<T::Error>> {
        self.is_set_high().map(|b| !b)
    }

    pub fn toggle(&mut self) -> Result<(), Error<T::Error>> {
        if self.is_set_high()? {
            self.set_low()
        } else {
            self.set_high()
        }
    }
}

impl<'a, MODE, T, MUTEX> hal_digital::ErrorType for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    T::Error: core::fmt::Debug,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    type Error = Error<T::Error>;
}

impl<'a, MODE: crate::mode::HasInput, T, MUTEX> hal_digital::InputPin for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    T::Error: core::fmt::Debug,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_low(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, T, MUTEX> hal_digital::OutputPin for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    T::Error: core::fmt::Debug,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}

impl<'a, MODE: crate::mode::HasOutput, T, MUTEX> hal_digital::StatefulOutputPin
    for Pin<'a, MODE, MUTEX>
where
    T: Transport,
    T::Error: core::fmt::Debug,
    MUTEX: PortMutex<Port = Expander<T>>,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_high(self)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_low(self)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Pin::toggle(self)
    }
}
