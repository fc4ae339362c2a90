use embedded_hal::delay::DelayNs;

use crate::{
    config::Config,
    error::DhtError,
    frame::Frame,
    hal::{Clock, DataLine, InterruptControl, NoYield, NoopInterruptControl, Scheduler},
    transport::Sampler,
    variant::Variant,
};

/// Reading returned by the sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,
    /// Relative humidity in percent.
    pub relative_humidity: f32,
}

impl Reading {
    /// Adds calibration offsets. Humidity stays within 0-100%, temperature
    /// is not limited.
    pub fn calibrated(self, humidity_offset: f32, temperature_offset: f32) -> Self {
        Reading {
            temperature: self.temperature + temperature_offset,
            relative_humidity: (self.relative_humidity + humidity_offset).clamp(0.0, 100.0),
        }
    }
}

/// Driver for DHT11 and DHT22 class sensors on one data line.
///
/// The sensor family is detected on the first successful read and kept
/// afterwards. Reads closer together than the family's minimum interval
/// either return the previous values or wait, see
/// [`set_wait_for_read_interval`](Dht::set_wait_for_read_interval).
pub struct Dht<LINE, DELAY, CLOCK, SCHED = NoYield, IRQ = NoopInterruptControl> {
    line: LINE,
    delay: DELAY,
    clock: CLOCK,
    scheduler: SCHED,
    interrupts: IRQ,
    config: Config,
    variant: Variant,
    last_read_ms: Option<u32>,
    reading: Reading,
    frame: Frame,
}

impl<LINE, DELAY, CLOCK, E> Dht<LINE, DELAY, CLOCK>
where
    LINE: DataLine<Error = E>,
    DELAY: DelayNs,
    CLOCK: Clock,
{
    /// Creates a new instance of the driver with the default [`Config`].
    ///
    /// # Arguments
    ///
    /// * `line` - The data line connected to the sensor.
    /// * `delay` - A delay provider for the wake-up pulse.
    /// * `clock` - Monotonic millisecond and microsecond time source.
    ///
    /// The line is left driven high, which is the idle state of the bus.
    pub fn new(line: LINE, delay: DELAY, clock: CLOCK) -> Result<Self, DhtError<E>> {
        Self::with_config(line, delay, clock, Config::default())
    }

    /// Same as [`Dht::new`] with an explicit configuration.
    pub fn with_config(
        mut line: LINE,
        delay: DELAY,
        clock: CLOCK,
        config: Config,
    ) -> Result<Self, DhtError<E>> {
        line.set_output()?;
        line.set_high()?;

        let invalid = config.invalid_value;
        Ok(Dht {
            line,
            delay,
            clock,
            scheduler: NoYield,
            interrupts: NoopInterruptControl,
            config,
            variant: Variant::Unknown,
            last_read_ms: None,
            reading: Reading {
                temperature: invalid,
                relative_humidity: invalid,
            },
            frame: Frame::default(),
        })
    }
}

impl<LINE, DELAY, CLOCK, SCHED, IRQ> Dht<LINE, DELAY, CLOCK, SCHED, IRQ> {
    /// Yields to `scheduler` before every transfer and while waiting for the
    /// read interval.
    pub fn with_scheduler<S: Scheduler>(self, scheduler: S) -> Dht<LINE, DELAY, CLOCK, S, IRQ> {
        Dht {
            line: self.line,
            delay: self.delay,
            clock: self.clock,
            scheduler,
            interrupts: self.interrupts,
            config: self.config,
            variant: self.variant,
            last_read_ms: self.last_read_ms,
            reading: self.reading,
            frame: self.frame,
        }
    }

    /// Masks interrupts through `interrupts` while bits are clocked in.
    pub fn with_interrupt_control<I: InterruptControl>(
        self,
        interrupts: I,
    ) -> Dht<LINE, DELAY, CLOCK, SCHED, I> {
        Dht {
            line: self.line,
            delay: self.delay,
            clock: self.clock,
            scheduler: self.scheduler,
            interrupts,
            config: self.config,
            variant: self.variant,
            last_read_ms: self.last_read_ms,
            reading: self.reading,
            frame: self.frame,
        }
    }

    /// Gives back the resources the driver was built from.
    pub fn release(self) -> (LINE, DELAY, CLOCK, SCHED, IRQ) {
        (
            self.line,
            self.delay,
            self.clock,
            self.scheduler,
            self.interrupts,
        )
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Fixes the sensor family, or forces detection with
    /// [`Variant::Unknown`].
    ///
    /// This is an explicit override and may switch straight from one
    /// family to the other. Detection never does that on its own: it only
    /// leaves [`Variant::Unknown`] after a successful read.
    pub fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
    }

    /// Relative humidity from the last read, in percent.
    pub fn humidity(&self) -> f32 {
        self.reading.relative_humidity
    }

    /// Temperature from the last read, in degrees Celsius.
    pub fn temperature(&self) -> f32 {
        self.reading.temperature
    }

    pub fn reading(&self) -> Reading {
        self.reading
    }

    pub fn humidity_offset(&self) -> f32 {
        self.config.humidity_offset
    }

    pub fn set_humidity_offset(&mut self, offset: f32) {
        self.config.humidity_offset = offset;
    }

    pub fn temperature_offset(&self) -> f32 {
        self.config.temperature_offset
    }

    pub fn set_temperature_offset(&mut self, offset: f32) {
        self.config.temperature_offset = offset;
    }

    /// Minimum time between two physical reads in milliseconds.
    ///
    /// Defaults to the datasheet value of the detected family, and to the
    /// DHT22 value while the family is unknown.
    pub fn read_delay(&self) -> u32 {
        self.config
            .read_delay_ms
            .unwrap_or(self.variant.default_read_delay_ms())
    }

    /// Overrides the minimum read interval. `0` restores the default.
    ///
    /// Individual sensors often tolerate faster reads than their datasheet
    /// promises; going below it is at your own risk.
    pub fn set_read_delay(&mut self, ms: u32) {
        self.config = self.config.with_read_delay_ms(ms);
    }

    pub fn suppress_error(&self) -> bool {
        self.config.suppress_error
    }

    /// Keeps the previous humidity and temperature when a read fails
    /// instead of overwriting them with the invalid value.
    pub fn set_suppress_error(&mut self, suppress: bool) {
        self.config.suppress_error = suppress;
    }

    pub fn wait_for_read_interval(&self) -> bool {
        self.config.wait_for_read_interval
    }

    /// When set, a read issued too early waits for the interval to pass
    /// instead of returning the previous values.
    pub fn set_wait_for_read_interval(&mut self, wait: bool) {
        self.config.wait_for_read_interval = wait;
    }

    /// Time of the last transfer attempt, successful or not.
    pub fn last_read_ms(&self) -> Option<u32> {
        self.last_read_ms
    }

    /// Raw bytes of the last transfer.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<LINE, DELAY, CLOCK, SCHED, IRQ, E> Dht<LINE, DELAY, CLOCK, SCHED, IRQ>
where
    LINE: DataLine<Error = E>,
    DELAY: DelayNs,
    CLOCK: Clock,
    SCHED: Scheduler,
    IRQ: InterruptControl,
{
    /// Reads temperature and humidity from the sensor.
    ///
    /// While the family is unknown the DHT22 timing is tried first, then
    /// the DHT11 timing; the first one that yields a valid frame is kept.
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the read is successful and the checksum is valid,
    ///   or the previous reading if the read interval has not elapsed.
    /// * `Err(DhtError)` otherwise. After a checksum mismatch the decoded
    ///   values are still available through [`Dht::reading`].
    pub fn read(&mut self) -> Result<Reading, DhtError<E>> {
        if self.variant == Variant::Unknown {
            return self.detect();
        }

        if self.is_throttled() {
            if !self.config.wait_for_read_interval {
                trace!("read interval not elapsed, returning previous reading");
                return Ok(self.reading);
            }
            while self.is_throttled() {
                self.scheduler.yield_now();
            }
        }

        self.measure(self.variant)
    }

    /// Releases the line high and reads once to resynchronise the sensor.
    pub fn power_up(&mut self) -> Result<Reading, DhtError<E>> {
        self.line.set_output()?;
        self.line.set_high()?;
        self.read()
    }

    /// Pulls the line low, which powers a sensor fed from the data line
    /// down. Do not read until [`Dht::power_up`].
    pub fn power_down(&mut self) -> Result<(), DhtError<E>> {
        self.line.set_output()?;
        self.line.set_low()?;
        Ok(())
    }

    fn is_throttled(&self) -> bool {
        self.last_read_ms
            .is_some_and(|last| self.clock.now_ms().wrapping_sub(last) < self.read_delay())
    }

    fn detect(&mut self) -> Result<Reading, DhtError<E>> {
        if let Ok(reading) = self.measure(Variant::Dht22) {
            return Ok(self.lock(Variant::Dht22, reading));
        }

        debug!("no valid DHT22 frame, retrying with DHT11 timing");
        let reading = self.measure(Variant::Dht11)?;
        Ok(self.lock(Variant::Dht11, reading))
    }

    fn lock(&mut self, variant: Variant, reading: Reading) -> Reading {
        debug!("detected {}", variant);
        self.variant = variant;
        reading
    }

    /// One transfer with `variant` timing, then decoding and validation.
    fn measure(&mut self, variant: Variant) -> Result<Reading, DhtError<E>> {
        if let Err(err) = self.transport(variant) {
            if err.is_timeout() {
                warn!("sensor timed out: {=str}", err.as_str());
            } else {
                warn!("read failed: {=str}", err.as_str());
            }
            if !self.config.suppress_error {
                let invalid = self.config.invalid_value;
                self.reading = Reading {
                    temperature: invalid,
                    relative_humidity: invalid,
                };
            }
            return Err(err);
        }

        self.reading = self.frame.decode(variant).calibrated(
            self.config.humidity_offset,
            self.config.temperature_offset,
        );

        if !self.frame.is_checksum_valid() {
            warn!(
                "checksum mismatch: computed {=u8:#x}, received {=u8:#x}",
                self.frame.checksum(),
                self.frame.bytes()[4]
            );
            return Err(DhtError::ChecksumMismatch);
        }
        Ok(self.reading)
    }

    /// Wakes the sensor and clocks in a frame. The line always ends up
    /// driven high and the attempt is timestamped, whatever the outcome.
    fn transport(&mut self, variant: Variant) -> Result<(), DhtError<E>> {
        self.frame = Frame::default();
        self.scheduler.yield_now();

        let mut sampled = self.wake(variant);
        if sampled.is_ok() {
            let Self {
                line,
                clock,
                interrupts,
                config,
                frame,
                ..
            } = &mut *self;
            sampled = interrupts.masked(|| Sampler::new(line, clock, config).read_frame(frame));
        }

        let restored = self.idle();
        self.last_read_ms = Some(self.clock.now_ms());
        sampled?;
        restored?;

        if self.frame.has_bit_shift() {
            return Err(DhtError::BitShift);
        }
        Ok(())
    }

    /// Sends the start signal and hands the line to the sensor.
    fn wake(&mut self, variant: Variant) -> Result<(), DhtError<E>> {
        let pulse_us = variant.wakeup_pulse_us();
        trace!("wake-up pulse of {=u32} us", pulse_us);

        self.line.set_output()?;
        self.line.set_low()?;
        self.delay.delay_us(pulse_us);
        self.line.set_input_pullup()?;
        Ok(())
    }

    fn idle(&mut self) -> Result<(), E> {
        self.line.set_output()?;
        self.line.set_high()
    }
}
