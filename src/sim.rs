//! Simulated sensor bus for driver tests.
//!
//! Line, clock, delay, scheduler and interrupt control share one virtual
//! time base. Every line read advances time by 1us, so the sampler's poll
//! budget maps directly to microseconds. After the host releases the line
//! the sensor plays back a scripted list of `(level, duration)` segments.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    convert::Infallible,
    rc::Rc,
    vec::Vec,
};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};

use crate::hal::{Clock, DataLine, InterruptControl, Scheduler};

pub(crate) const HIGH: bool = true;
pub(crate) const LOW: bool = false;

/// What the sensor sends after a wake-up pulse long enough for it.
pub(crate) type Script = Vec<(bool, u32)>;

/// Acknowledgement followed by `bytes`, MSB first, and the trailing pulse.
pub(crate) fn frame_script(bytes: [u8; 5]) -> Script {
    let mut script = vec![(HIGH, 20), (LOW, 80), (HIGH, 80)];
    for byte in bytes {
        for i in 0..8 {
            let high_us = if byte & (0x80 >> i) != 0 { 70 } else { 27 };
            script.push((LOW, 50));
            script.push((HIGH, high_us));
        }
    }
    script.push((LOW, 50));
    script
}

/// Appends a matching checksum to four data bytes.
pub(crate) fn with_checksum(data: [u8; 4]) -> [u8; 5] {
    let sum = data.iter().fold(0u8, |sum, v| sum.wrapping_add(*v));
    [data[0], data[1], data[2], data[3], sum]
}

#[derive(Default)]
struct Bus {
    now_us: Cell<u64>,
    /// `Some(level)` while the host drives the line.
    driven: Cell<Option<bool>>,
    output: Cell<bool>,
    low_since: Cell<u64>,
    released_at: Cell<u64>,
    script: RefCell<Script>,
    responses: RefCell<VecDeque<Script>>,
    min_wakeup_us: Cell<u32>,
    wakeups: RefCell<Vec<u32>>,
    masked: Cell<bool>,
    mask_count: Cell<u32>,
    unmasked_samples: Cell<u32>,
    yields: Cell<u32>,
}

impl Bus {
    fn advance(&self, us: u64) {
        self.now_us.set(self.now_us.get() + us);
    }

    fn drive(&self, level: bool) {
        if level == LOW && self.driven.get() != Some(LOW) {
            self.low_since.set(self.now_us.get());
        }
        self.driven.set(Some(level));
    }

    fn release(&self) {
        if self.driven.get() == Some(LOW) {
            let low_us = (self.now_us.get() - self.low_since.get()) as u32;
            self.wakeups.borrow_mut().push(low_us);
            let script = if low_us >= self.min_wakeup_us.get() {
                self.responses.borrow_mut().pop_front().unwrap_or_default()
            } else {
                Script::new()
            };
            *self.script.borrow_mut() = script;
        } else {
            self.script.borrow_mut().clear();
        }
        self.released_at.set(self.now_us.get());
        self.driven.set(None);
    }

    fn sample(&self) -> bool {
        let level = match self.driven.get() {
            Some(level) => level,
            None => {
                if !self.masked.get() {
                    self.unmasked_samples.set(self.unmasked_samples.get() + 1);
                }
                let mut elapsed = self.now_us.get() - self.released_at.get();
                let mut level = HIGH;
                for &(segment_level, duration) in self.script.borrow().iter() {
                    if elapsed < duration as u64 {
                        level = segment_level;
                        break;
                    }
                    elapsed -= duration as u64;
                }
                level
            }
        };
        self.advance(1);
        level
    }
}

/// Handle to the simulated bus. Hands out the individual capabilities and
/// inspects what the driver did.
#[derive(Clone, Default)]
pub(crate) struct SimBus(Rc<Bus>);

impl SimBus {
    /// A bus with a sensor that answers wake-up pulses of at least
    /// `min_wakeup_us`.
    pub(crate) fn with_sensor(min_wakeup_us: u32) -> Self {
        let bus = SimBus::default();
        bus.0.min_wakeup_us.set(min_wakeup_us);
        bus.0.now_us.set(10_000_000);
        bus
    }

    /// A DHT22 answers the 1ms pulse already.
    pub(crate) fn dht22() -> Self {
        SimBus::with_sensor(1_000)
    }

    /// A DHT11 needs at least 18ms.
    pub(crate) fn dht11() -> Self {
        SimBus::with_sensor(18_000)
    }

    pub(crate) fn respond(&self, script: Script) {
        self.0.responses.borrow_mut().push_back(script);
    }

    pub(crate) fn respond_frame(&self, bytes: [u8; 5]) {
        self.respond(frame_script(bytes));
    }

    pub(crate) fn line(&self) -> SimLine {
        SimLine(self.clone())
    }

    pub(crate) fn clock(&self) -> SimClock {
        SimClock(self.clone())
    }

    pub(crate) fn delay(&self) -> SimDelay {
        SimDelay(self.clone())
    }

    pub(crate) fn scheduler(&self) -> SimScheduler {
        SimScheduler(self.clone())
    }

    pub(crate) fn interrupts(&self) -> SimInterrupts {
        SimInterrupts(self.clone())
    }

    pub(crate) fn advance_ms(&self, ms: u64) {
        self.0.advance(ms * 1000);
    }

    pub(crate) fn now_ms(&self) -> u32 {
        (self.0.now_us.get() / 1000) as u32
    }

    /// Length of every wake-up pulse seen so far, in microseconds.
    pub(crate) fn wakeups(&self) -> Vec<u32> {
        self.0.wakeups.borrow().clone()
    }

    /// Level the host drives, or `None` while the line is released.
    pub(crate) fn driven(&self) -> Option<bool> {
        self.0.driven.get()
    }

    pub(crate) fn is_output(&self) -> bool {
        self.0.output.get()
    }

    pub(crate) fn is_masked(&self) -> bool {
        self.0.masked.get()
    }

    pub(crate) fn mask_count(&self) -> u32 {
        self.0.mask_count.get()
    }

    /// Reads of the released line taken with interrupts enabled.
    pub(crate) fn unmasked_samples(&self) -> u32 {
        self.0.unmasked_samples.get()
    }

    pub(crate) fn yields(&self) -> u32 {
        self.0.yields.get()
    }
}

pub(crate) struct SimLine(SimBus);

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.0.sample())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.0.sample())
    }
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.0.0.output.get() {
            self.0.0.drive(LOW);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.0.0.output.get() {
            self.0.0.drive(HIGH);
        }
        Ok(())
    }
}

impl DataLine for SimLine {
    fn set_output(&mut self) -> Result<(), Self::Error> {
        if !self.0.0.output.get() {
            self.0.0.output.set(true);
            self.0.0.drive(HIGH);
        }
        Ok(())
    }

    fn set_input_pullup(&mut self) -> Result<(), Self::Error> {
        self.0.0.output.set(false);
        self.0.0.release();
        Ok(())
    }
}

pub(crate) struct SimClock(SimBus);

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        (self.0.0.now_us.get() / 1000) as u32
    }

    fn now_us(&self) -> u32 {
        self.0.0.now_us.get() as u32
    }
}

pub(crate) struct SimDelay(SimBus);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.0.advance(ns.div_ceil(1000) as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.0.0.advance(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.0.advance(ms as u64 * 1000);
    }
}

/// Each yield lets 1ms of other work run.
pub(crate) struct SimScheduler(SimBus);

impl Scheduler for SimScheduler {
    fn yield_now(&mut self) {
        self.0.0.yields.set(self.0.0.yields.get() + 1);
        self.0.0.advance(1_000);
    }
}

pub(crate) struct SimInterrupts(SimBus);

impl InterruptControl for SimInterrupts {
    fn masked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let bus = &self.0.0;
        bus.masked.set(true);
        bus.mask_count.set(bus.mask_count.get() + 1);
        let result = f();
        bus.masked.set(false);
        result
    }
}
