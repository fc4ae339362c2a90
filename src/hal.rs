//! Host capabilities the driver needs beyond `embedded-hal`.
//!
//! `embedded-hal` has no traits for switching a pin between output and
//! input, for reading a monotonic clock, for yielding to a cooperative
//! scheduler or for masking interrupts. The small traits here fill those
//! gaps and come with no-op implementations where doing nothing is valid.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// A bidirectional data line that can be handed over to the sensor.
pub trait DataLine: InputPin + OutputPin {
    /// Makes the host drive the line.
    fn set_output(&mut self) -> Result<(), <Self as ErrorType>::Error>;

    /// Releases the line to an input with the pull-up enabled, so the
    /// sensor can pull it low.
    fn set_input_pullup(&mut self) -> Result<(), <Self as ErrorType>::Error>;
}

/// Adapter for a pin already configured as open-drain output with a
/// pull-up, where writing high releases the line and reads see the bus.
///
/// Most HALs can hand out such a pin, and it needs no direction switch.
pub struct OpenDrain<P>(P);

impl<P> OpenDrain<P> {
    pub fn new(pin: P) -> Self {
        OpenDrain(pin)
    }

    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: ErrorType> ErrorType for OpenDrain<P> {
    type Error = P::Error;
}

impl<P: InputPin> InputPin for OpenDrain<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }
}

impl<P: OutputPin> OutputPin for OpenDrain<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

impl<P: InputPin + OutputPin> DataLine for OpenDrain<P> {
    fn set_output(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_input_pullup(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

/// Monotonic time source. Both counters may wrap.
pub trait Clock {
    /// Milliseconds since some fixed point.
    fn now_ms(&self) -> u32;

    /// Microseconds since some fixed point.
    fn now_us(&self) -> u32;
}

/// Lets pending host work run while the driver waits.
pub trait Scheduler {
    fn yield_now(&mut self);
}

/// Scheduler for hosts without cooperative tasks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoYield;

impl Scheduler for NoYield {
    fn yield_now(&mut self) {}
}

/// Runs the bit sampling with interrupts masked.
///
/// Interrupts are unmasked again when `f` returns, whatever it returns.
pub trait InterruptControl {
    fn masked<R>(&mut self, f: impl FnOnce() -> R) -> R;
}

/// Leaves interrupts alone. Fine when nothing preempts the caller for more
/// than a few microseconds.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInterruptControl;

impl InterruptControl for NoopInterruptControl {
    fn masked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

/// Masks interrupts through the global `critical-section` implementation.
#[cfg(feature = "critical-section")]
#[derive(Clone, Copy, Debug, Default)]
pub struct CriticalSectionInterrupts;

#[cfg(feature = "critical-section")]
impl InterruptControl for CriticalSectionInterrupts {
    fn masked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        critical_section::with(|_| f())
    }
}
