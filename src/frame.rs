use crate::{dht::Reading, variant::Variant};

/// Number of bytes in one transmission.
pub const FRAME_LEN: usize = 5;

/// Raw 40-bit transmission: humidity (2 bytes), temperature (2 bytes, sign
/// in the top bit) and an 8-bit checksum.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Frame(bytes)
    }

    pub const fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Sets bit `index` of the frame, counting from the most significant bit
    /// of the first byte.
    pub(crate) fn set_bit(&mut self, index: usize) {
        self.0[index / 8] |= 0x80 >> (index % 8);
    }

    /// Sum of the four data bytes, truncated to eight bits.
    pub fn checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    pub fn is_checksum_valid(&self) -> bool {
        self.checksum() == self.0[4]
    }

    /// Humidity never sets the top bit of the first byte; when it is set
    /// the sampler slipped by one bit.
    pub fn has_bit_shift(&self) -> bool {
        self.0[0] & 0x80 != 0
    }

    /// Scales the raw bytes for `variant`, without offsets.
    ///
    /// `Unknown` decodes like [`Variant::Dht22`]. The sign bit negates the
    /// temperature for both families; DHT11 keeps it in the integer part.
    pub fn decode(&self, variant: Variant) -> Reading {
        let [hum_hi, hum_lo, temp_hi, temp_lo, _] = self.0;

        let (relative_humidity, mut temperature) = match variant {
            Variant::Dht11 => (
                hum_hi as f32 + hum_lo as f32 / 10.0,
                temp_hi as f32 + temp_lo as f32 / 10.0,
            ),
            Variant::Dht22 | Variant::Unknown => (
                u16::from_be_bytes([hum_hi, hum_lo]) as f32 / 10.0,
                u16::from_be_bytes([temp_hi & 0x7F, temp_lo]) as f32 / 10.0,
            ),
        };

        if temp_hi & 0x80 != 0 {
            temperature = -temperature;
        }

        Reading {
            temperature,
            relative_humidity,
        }
    }
}
