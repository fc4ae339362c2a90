use core::fmt;

/// Possible errors from a DHT reading.
///
/// The timeout variants name the protocol phase that stalled, which is
/// usually enough to tell a wiring fault from a wrong wake-up length or a
/// noisy line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor never pulled the line low after the wake-up pulse.
    SensorNotReady,
    /// The low half of the sensor acknowledgement lasted too long.
    AckLowTimeout,
    /// The high half of the sensor acknowledgement lasted too long.
    AckHighTimeout,
    /// The low lead-in of a data bit lasted too long.
    BitStartTimeout,
    /// The high phase of a data bit lasted too long.
    BitEndTimeout,
    /// The first byte had its most significant bit set, which no valid
    /// humidity can produce. The frame was sampled one bit out of step.
    BitShift,
    /// Checksum did not match the received data.
    ChecksumMismatch,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> DhtError<E> {
    /// Short description without the wrapped pin error.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DhtError::SensorNotReady => "sensor not ready",
            DhtError::AckLowTimeout => "timeout in acknowledge low phase",
            DhtError::AckHighTimeout => "timeout in acknowledge high phase",
            DhtError::BitStartTimeout => "timeout waiting for bit start",
            DhtError::BitEndTimeout => "timeout waiting for bit end",
            DhtError::BitShift => "frame is shifted by one bit",
            DhtError::ChecksumMismatch => "checksum mismatch",
            DhtError::PinError(_) => "pin error",
        }
    }

    /// Returns true for every failure that happened before a full frame
    /// was received.
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            DhtError::SensorNotReady
                | DhtError::AckLowTimeout
                | DhtError::AckHighTimeout
                | DhtError::BitStartTimeout
                | DhtError::BitEndTimeout
        )
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtError::PinError(err) => write!(f, "pin error: {err:?}"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}
