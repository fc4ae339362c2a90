/// CPU frequency assumed by [`Config::default`] (an 8-bit AVR at 16 MHz).
pub const DEFAULT_CPU_HZ: u32 = 16_000_000;

/// Value stored in humidity and temperature after a failed read.
pub const INVALID_VALUE: f32 = -999.0;

/// High phases longer than this many microseconds are a `1` bit.
///
/// A `0` is sent as 26-28 us high, a `1` as ~70 us high.
pub const BIT_THRESHOLD_US: u32 = 50;

/// Driver settings.
///
/// Every runtime setter on [`Dht`](crate::Dht) writes into this struct, so a
/// configuration can also be prepared up front and handed to
/// [`Dht::with_config`](crate::Dht::with_config).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Poll iterations before a wait on the line gives up.
    ///
    /// Derive it with [`Config::for_cpu_hz`] so the timeout stays near
    /// 100 us whatever the clock speed.
    pub timeout_loops: u32,
    /// See [`BIT_THRESHOLD_US`].
    pub bit_threshold_us: u32,
    /// Sentinel written to the readings after a failure.
    pub invalid_value: f32,
    /// Overrides the minimum read interval of the detected variant.
    pub read_delay_ms: Option<u32>,
    /// Keep the previous readings when a read fails.
    pub suppress_error: bool,
    /// Block until the read interval has elapsed instead of returning the
    /// cached reading.
    pub wait_for_read_interval: bool,
    /// Added to every decoded humidity before clamping.
    pub humidity_offset: f32,
    /// Added to every decoded temperature.
    pub temperature_offset: f32,
}

impl Config {
    /// Configuration for a host running at `cpu_hz`.
    ///
    /// One poll iteration costs at least four cycles (read, compare, compare
    /// counter, decrement), so `cpu_hz / 40_000` iterations fail after about
    /// 100 us.
    pub const fn for_cpu_hz(cpu_hz: u32) -> Self {
        let loops = cpu_hz / 40_000;
        Config {
            timeout_loops: if loops == 0 { 1 } else { loops },
            bit_threshold_us: BIT_THRESHOLD_US,
            invalid_value: INVALID_VALUE,
            read_delay_ms: None,
            suppress_error: false,
            wait_for_read_interval: false,
            humidity_offset: 0.0,
            temperature_offset: 0.0,
        }
    }

    pub const fn with_timeout_loops(mut self, loops: u32) -> Self {
        self.timeout_loops = loops;
        self
    }

    pub const fn with_bit_threshold_us(mut self, us: u32) -> Self {
        self.bit_threshold_us = us;
        self
    }

    pub const fn with_invalid_value(mut self, value: f32) -> Self {
        self.invalid_value = value;
        self
    }

    pub const fn with_read_delay_ms(mut self, ms: u32) -> Self {
        self.read_delay_ms = if ms == 0 { None } else { Some(ms) };
        self
    }

    pub const fn with_suppress_error(mut self, suppress: bool) -> Self {
        self.suppress_error = suppress;
        self
    }

    pub const fn with_wait_for_read_interval(mut self, wait: bool) -> Self {
        self.wait_for_read_interval = wait;
        self
    }

    pub const fn with_humidity_offset(mut self, offset: f32) -> Self {
        self.humidity_offset = offset;
        self
    }

    pub const fn with_temperature_offset(mut self, offset: f32) -> Self {
        self.temperature_offset = offset;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::for_cpu_hz(DEFAULT_CPU_HZ)
    }
}
