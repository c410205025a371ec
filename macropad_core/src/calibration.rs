//! Raw slider range used to clamp and rescale samples.

use crate::error::BuildError;

/// Inclusive `[min, max]` calibration bounds in raw ADC counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRange {
    min: i32,
    max: i32,
}

impl RawRange {
    /// Build a range; `max` must be strictly greater than `min`.
    pub fn new(min: i32, max: i32) -> Result<Self, BuildError> {
        if max <= min {
            return Err(BuildError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[inline]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Clamp a sample into the range; out-of-range input is never an error.
    #[inline]
    pub fn clamp(&self, raw: i32) -> i32 {
        raw.clamp(self.min, self.max)
    }

    /// Map a sample onto `[0, levels]`, rounding to nearest.
    #[inline]
    pub fn to_level(&self, raw: i32, levels: u32) -> u32 {
        crate::fixed_point::raw_to_level(self.clamp(raw), self.min, self.max, levels)
    }
}

impl Default for RawRange {
    /// Full 12-bit ADC range.
    fn default() -> Self {
        Self { min: 0, max: 4095 }
    }
}
