use crate::{
    config::Config,
    error::DhtError,
    frame::{FRAME_LEN, Frame},
    hal::{Clock, DataLine},
};

const FRAME_BITS: usize = FRAME_LEN * 8;

/// Clocks a frame in from a line the sensor already owns.
///
/// Every wait is a bounded poll of `timeout_loops` iterations, so a stuck
/// line costs about 100 us whatever the CPU speed.
pub(crate) struct Sampler<'a, LINE, CLOCK> {
    line: &'a mut LINE,
    clock: &'a CLOCK,
    timeout_loops: u32,
    bit_threshold_us: u32,
}

impl<'a, LINE, CLOCK, E> Sampler<'a, LINE, CLOCK>
where
    LINE: DataLine<Error = E>,
    CLOCK: Clock,
{
    pub(crate) fn new(line: &'a mut LINE, clock: &'a CLOCK, config: &Config) -> Self {
        Sampler {
            line,
            clock,
            timeout_loops: config.timeout_loops,
            bit_threshold_us: config.bit_threshold_us,
        }
    }

    /// Reads the acknowledgement and all 40 bits into `frame`.
    pub(crate) fn read_frame(&mut self, frame: &mut Frame) -> Result<(), DhtError<E>> {
        self.acknowledge()?;

        for index in 0..FRAME_BITS {
            if self.read_bit()? {
                frame.set_bit(index);
            }
        }

        // After the last bit the sensor holds the line low for ~50us.
        // Missing the end of that pulse does not spoil the frame.
        if let Err(DhtError::PinError(err)) = self.wait_while(false, DhtError::BitStartTimeout) {
            return Err(DhtError::PinError(err));
        }
        Ok(())
    }

    /// Waits for the sensor response: the line goes low within 20-40us,
    /// stays low for ~80us, then high for ~80us.
    fn acknowledge(&mut self) -> Result<(), DhtError<E>> {
        self.wait_while(true, DhtError::SensorNotReady)?;
        self.wait_while(false, DhtError::AckLowTimeout)?;
        self.wait_while(true, DhtError::AckHighTimeout)?;
        Ok(())
    }

    /// Reads one bit: ~50us low, then 26-28us high for `0` or ~70us high
    /// for `1`.
    fn read_bit(&mut self) -> Result<bool, DhtError<E>> {
        self.wait_while(false, DhtError::BitStartTimeout)?;

        let started = self.clock.now_us();
        self.wait_while(true, DhtError::BitEndTimeout)?;
        let high_us = self.clock.now_us().wrapping_sub(started);

        Ok(high_us > self.bit_threshold_us)
    }

    /// Polls until the line leaves the `high` level or the loop budget is
    /// spent, in which case `on_timeout` is returned.
    fn wait_while(&mut self, high: bool, on_timeout: DhtError<E>) -> Result<(), DhtError<E>> {
        let mut loops = self.timeout_loops;
        while self.line.is_high()? == high {
            loops = loops.saturating_sub(1);
            if loops == 0 {
                return Err(on_timeout);
            }
        }
        Ok(())
    }
}
