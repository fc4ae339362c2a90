/// Sensor family, which decides the wake-up pulse, the minimum read
/// interval and how the frame is scaled.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Not detected yet. The next read tries both families.
    #[default]
    Unknown,
    /// DHT11, DHT12 and compatibles.
    Dht11,
    /// DHT22, AM2302, DHT33, DHT44 and compatibles.
    Dht22,
}

impl Variant {
    /// Nominal length of the host wake-up pulse in microseconds.
    pub const fn wakeup_us(self) -> u32 {
        match self {
            Variant::Dht11 => 18_000,
            Variant::Dht22 | Variant::Unknown => 1_000,
        }
    }

    /// Wake-up pulse actually driven: nominal plus 10% for sensor slack.
    pub const fn wakeup_pulse_us(self) -> u32 {
        let nominal = self.wakeup_us();
        nominal + nominal / 10
    }

    /// Minimum interval between two physical reads, from the datasheets.
    pub const fn default_read_delay_ms(self) -> u32 {
        match self {
            Variant::Dht11 => 1_000,
            Variant::Dht22 | Variant::Unknown => 2_000,
        }
    }

    /// Numeric type code: 0, 11 or 22.
    pub const fn code(self) -> u8 {
        match self {
            Variant::Unknown => 0,
            Variant::Dht11 => 11,
            Variant::Dht22 => 22,
        }
    }
}

impl TryFrom<u8> for Variant {
    type Error = u8;

    /// Accepts the type codes 0, 11 and 22 and hands back anything else.
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Variant::Unknown),
            11 => Ok(Variant::Dht11),
            22 => Ok(Variant::Dht22),
            other => Err(other),
        }
    }
}
