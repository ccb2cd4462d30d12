/// Reasons a timer configuration is rejected at startup.
///
/// All of these are fatal: the sample clock must never be armed with a timing
/// that was not derived exactly as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigurationError {
    #[error("target frequency must be non-zero")]
    ZeroFrequency,
    #[error("prescale must be non-zero")]
    ZeroPrescale,
    #[error("{clock_hz} Hz / ({prescale} * {target_hz} Hz) is not an integral number of counts")]
    NonIntegralPeriod {
        clock_hz: u32,
        prescale: u32,
        target_hz: u32,
    },
    #[error("a period of {counts} counts does not fit a {counter_bits}-bit counter")]
    PeriodOutOfRange { counts: u64, counter_bits: u8 },
    #[error("{levels} duty levels do not fit a carrier period of {period_counts} counts")]
    ResolutionExceedsPeriod { levels: u32, period_counts: u32 },
    #[error("resolution of {0} bits is not supported")]
    InvalidResolution(u8),
    #[error("center value {center} exceeds maximum duty {max}")]
    CenterOutOfRange { center: u16, max: u16 },
}

/// A duty value outside `[0, 2^resolution_bits - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("duty value {value} exceeds maximum {max}")]
pub struct OutOfRange {
    pub value: u16,
    pub max: u16,
}
