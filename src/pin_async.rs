//! Awaiting digital reads.
//!
//! This module is only built if the `"async"` feature is enabled.  It provides [`ReadFuture`],
//! which submits a read of a pin and resolves once the transport delivers the result, either right
//! away or through a later [`Expander::complete_read()`] from the host's event loop.
//!
//! **Concurrency caution**: The future and `complete_read()` both lock the expander's mutex.  If
//! completions are delivered from an interrupt, use a mutex that is safe to take there.

use core::future::Future;
use core::marker::PhantomData;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use crate::bus::Transport;
use crate::mode::HasInput;
use crate::pin::Pin as SyncPin;
use crate::{Error, Expander, PortMutex};

/// Maximum number of futures that can await a single pin at the same time.
pub const MAX_WAITERS_PER_PIN: usize = 4;

/// A registered future: its id, its waker and, once delivered, the pin level.
#[derive(Debug)]
pub(crate) struct Waiter {
    pub(crate) id: u32,
    waker: Waker,
    value: Option<u8>,
}

impl<T: Transport> Expander<T> {
    pub(crate) fn wake_waiters(&mut self, pin: u8, value: u8) {
        for waiter in self.waiters[pin as usize].iter_mut() {
            if waiter.value.is_none() {
                waiter.value = Some(value);
                waiter.waker.wake_by_ref();
            }
        }
    }

    fn add_waiter(&mut self, pin: u8, id: u32, waker: Waker) -> Result<(), Error<T::Error>> {
        self.waiters[pin as usize]
            .push(Waiter {
                id,
                waker,
                value: None,
            })
            .map_err(|_| Error::ListenerCapacity(pin))
    }

    /// Remove the waiter if its value arrived, otherwise refresh its waker.
    fn take_waiter(&mut self, pin: u8, id: u32, waker: &Waker) -> Option<u8> {
        let waiters = &mut self.waiters[pin as usize];
        let pos = waiters.iter().position(|w| w.id == id)?;
        match waiters[pos].value {
            Some(value) => {
                waiters.remove(pos);
                Some(value)
            }
            None => {
                if !waiters[pos].waker.will_wake(waker) {
                    waiters[pos].waker = waker.clone();
                }
                None
            }
        }
    }

    fn remove_waiter(&mut self, pin: u8, id: u32) {
        let waiters = &mut self.waiters[pin as usize];
        if let Some(pos) = waiters.iter().position(|w| w.id == id) {
            waiters.remove(pos);
        }
    }
}

impl<'a, MODE, T, M> SyncPin<'a, MODE, M>
where
    MODE: HasInput,
    T: Transport,
    M: PortMutex<Port = Expander<T>>,
{
    /// Read the pin, resolving when the transport delivers the result.
    pub fn read_async(&self) -> ReadFuture<'a, T, M> {
        ReadFuture {
            pin: self.pin,
            expander: self.expander,
            id: None,
            _t: PhantomData,
        }
    }
}

/// Future returned by [`Pin::read_async()`][crate::Pin::read_async].
///
/// The read is submitted on first poll.  Dropping the future before it resolves withdraws its
/// registration; the read itself cannot be cancelled.
pub struct ReadFuture<'a, T, M>
where
    T: Transport,
    M: PortMutex<Port = Expander<T>>,
{
    pin: u8,
    expander: &'a M,
    id: Option<u32>,
    _t: PhantomData<fn() -> T>,
}

impl<'a, T, M> Future for ReadFuture<'a, T, M>
where
    T: Transport,
    M: PortMutex<Port = Expander<T>>,
{
    type Output = Result<u8, Error<T::Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.get_mut();
        let pin = me.pin;

        me.expander.lock(|drv| {
            let id = match me.id {
                Some(id) => id,
                None => {
                    if let Err(e) = drv.checked(pin) {
                        return Poll::Ready(Err(e));
                    }
                    let id = drv.next_id(pin);
                    if let Err(e) = drv.add_waiter(pin, id, cx.waker().clone()) {
                        return Poll::Ready(Err(e));
                    }
                    me.id = Some(id);
                    if let Err(e) = drv.request_read(pin) {
                        drv.remove_waiter(pin, id);
                        me.id = None;
                        return Poll::Ready(Err(e));
                    }
                    id
                }
            };

            match drv.take_waiter(pin, id, cx.waker()) {
                Some(value) => {
                    me.id = None;
                    Poll::Ready(Ok(value))
                }
                None => Poll::Pending,
            }
        })
    }
}

impl<'a, T, M> Drop for ReadFuture<'a, T, M>
where
    T: Transport,
    M: PortMutex<Port = Expander<T>>,
{
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            let pin = self.pin;
            self.expander.lock(|drv| drv.remove_waiter(pin, id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{ReadRequest, ReadStatus};
    use crate::{ExpanderOptions, HalTransport, SharedExpander};
    use embedded_hal_mock::eh1::i2c as mock_i2c;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn waker() -> (Arc<CountingWaker>, Waker) {
        let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
        (counter.clone(), Waker::from(counter))
    }

    /// Transport that never completes reads on its own.
    #[derive(Default)]
    struct Deferred {
        reads: Vec<ReadRequest>,
    }

    impl Transport for Deferred {
        type Error = ();

        fn configure(&mut self) -> Result<(), ()> {
            Ok(())
        }

        fn write(&mut self, _address: u8, _bytes: &[u8]) -> Result<(), ()> {
            Ok(())
        }

        fn read(
            &mut self,
            _address: u8,
            _register: u8,
            _buf: &mut [u8],
            request: ReadRequest,
        ) -> Result<ReadStatus, ()> {
            self.reads.push(request);
            Ok(ReadStatus::Pending)
        }
    }

    fn deferred() -> SharedExpander<core::cell::RefCell<Expander<Deferred>>> {
        let mut exp = Expander::new(
            Deferred::default(),
            ExpanderOptions::new().controller("mcp23017"),
        )
        .unwrap();
        exp.initialize().unwrap();
        SharedExpander::new(exp)
    }

    #[test]
    fn resolves_on_completion() {
        let shared = deferred();
        let pin = shared.pin(12).unwrap().into_input().unwrap();
        let (counter, waker) = waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = pin.read_async();
        assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
        assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);

        let request = shared.lock(|drv| drv.transport().reads[0]);
        assert_eq!(request.pin, 12);
        shared
            .lock(|drv| drv.complete_read(request, &[0x10]))
            .unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(Ok(1)));
        assert!(shared.lock(|drv| drv.waiters[12].is_empty()));
        // exactly one read per future
        assert_eq!(shared.lock(|drv| drv.transport().reads.len()), 1);
    }

    #[test]
    fn dropping_withdraws_registration() {
        let shared = deferred();
        let pin = shared.pin(3).unwrap().into_input().unwrap();
        let (_counter, waker) = waker();
        let mut cx = Context::from_waker(&waker);

        let mut fut = pin.read_async();
        assert!(Pin::new(&mut fut).poll(&mut cx).is_pending());
        assert_eq!(shared.lock(|drv| drv.waiters[3].len()), 1);
        drop(fut);
        assert!(shared.lock(|drv| drv.waiters[3].is_empty()));

        // a late completion finds nobody waiting
        let request = shared.lock(|drv| drv.transport().reads[0]);
        assert_eq!(shared.lock(|drv| drv.complete_read(request, &[0x08])), Ok(1));
    }

    #[test]
    fn synchronous_transport_resolves_on_first_poll() {
        let mut expectations = vec![mock_i2c::Transaction::write(0x20, vec![0x00, 0xff])];
        for pin in 0..8u32 {
            let byte = (0xffu32 << (pin + 1)) as u8;
            expectations.push(mock_i2c::Transaction::write(0x20, vec![0x00, byte]));
            expectations.push(mock_i2c::Transaction::write(0x20, vec![0x09, byte]));
        }
        expectations.extend([
            mock_i2c::Transaction::write(0x20, vec![0x00, 0x20]),
            mock_i2c::Transaction::write_read(0x20, vec![0x09], vec![0xdf]),
        ]);
        let mut bus = mock_i2c::Mock::new(&expectations);

        let mut mcp = Expander::new(
            HalTransport::new(bus.clone()),
            ExpanderOptions::new().controller("mcp23008"),
        )
        .unwrap();
        mcp.initialize().unwrap();
        let shared = SharedExpander::new(mcp);
        let pin = shared.pin(5).unwrap().into_input().unwrap();

        let (_counter, waker) = waker();
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin.read_async();
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(Ok(0)));

        bus.done();
    }
}
