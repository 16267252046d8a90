use std::fmt;
use std::str::FromStr;

use palette::Srgb;

/// Distance between two neighbouring quantization levels (0x33).
pub const LEVEL_STEP: u8 = 0x33;

/// A quantized color, keyed by its uppercase `RRGGBB` representation.
///
/// Buckets only come out of [`quantize`] or out of a persisted artifact whose
/// channels are already on the quantization grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColorBucket([u8; 3]);

impl ColorBucket {
    pub fn red(&self) -> u8 {
        self.0[0]
    }

    pub fn green(&self) -> u8 {
        self.0[1]
    }

    pub fn blue(&self) -> u8 {
        self.0[2]
    }

    pub fn to_srgb(self) -> Srgb<u8> {
        Srgb::new(self.0[0], self.0[1], self.0[2])
    }
}

impl fmt::Display for ColorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBucketError(String);

impl fmt::Display for ParseBucketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color bucket '{}'", self.0)
    }
}

impl std::error::Error for ParseBucketError {}

impl FromStr for ColorBucket {
    type Err = ParseBucketError;

    /// Accepts only canonical keys: six uppercase hex digits, every channel a
    /// multiple of [`LEVEL_STEP`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBucketError(s.to_string());
        let canonical = s.len() == 6
            && s
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b));
        if !canonical {
            return Err(err());
        }
        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            let value = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).map_err(|_| err())?;
            if value % LEVEL_STEP != 0 {
                return Err(err());
            }
            *channel = value;
        }
        Ok(ColorBucket(channels))
    }
}

/// Snap one channel to the nearest multiple of 51.
#[inline(always)]
fn quantize_channel(value: u8) -> u8 {
    let step = LEVEL_STEP as u16;
    // value / 51 never lands exactly on .5, so integer half-up rounding is exact
    let level = (value as u16 + step / 2) / step;
    (level * step).min(255) as u8
}

/// Reduce an RGB triplet to its bucket.
pub fn quantize(r: u8, g: u8, b: u8) -> ColorBucket {
    ColorBucket([quantize_channel(r), quantize_channel(g), quantize_channel(b)])
}

pub fn quantize_srgb(color: Srgb<u8>) -> ColorBucket {
    quantize(color.red, color.green, color.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_levels_round_to_nearest() {
        assert_eq!(quantize_channel(0), 0);
        assert_eq!(quantize_channel(25), 0);
        assert_eq!(quantize_channel(26), 51);
        assert_eq!(quantize_channel(76), 51);
        assert_eq!(quantize_channel(77), 102);
        assert_eq!(quantize_channel(229), 204);
        assert_eq!(quantize_channel(230), 255);
        assert_eq!(quantize_channel(255), 255);
    }

    #[test]
    fn channel_matches_float_rounding() {
        for v in 0..=255u8 {
            let expected = ((v as f64 / 51.0).round() * 51.0).min(255.0) as u8;
            assert_eq!(quantize_channel(v), expected, "channel {v}");
        }
    }

    #[test]
    fn known_buckets() {
        assert_eq!(quantize(0, 0, 0).to_string(), "000000");
        assert_eq!(quantize(200, 50, 50).to_string(), "CC3333");
        assert_eq!(quantize(255, 255, 255).to_string(), "FFFFFF");
        assert_eq!(quantize_srgb(Srgb::new(10, 130, 240)).to_string(), "0099FF");
    }

    #[test]
    fn parse_accepts_canonical_keys() {
        let bucket: ColorBucket = "CC3333".parse().unwrap();
        assert_eq!(bucket, quantize(200, 50, 50));
        assert_eq!(bucket.to_srgb(), Srgb::new(0xCC, 0x33, 0x33));
    }

    #[test]
    fn parse_rejects_non_canonical_keys() {
        for key in ["cc3333", "#CC3333", "CC333", "CC33333", "CC3334", "GG0000", ""] {
            assert!(key.parse::<ColorBucket>().is_err(), "{key} should be rejected");
        }
    }
}
