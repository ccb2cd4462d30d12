//! Timer period derivation for the sample clock and the PWM carrier.
//!
//! Both timers count `clock / prescale` ticks and reload from a load value, so a
//! period of `n` counts is programmed as `n - 1`.

use fugit::HertzU32;
use fugit::NanosDurationU32;

use crate::error::ConfigurationError;

/// A carrier below this multiple (in permille) of the sample rate cannot
/// smooth out the staircase between two samples.
pub const MIN_CARRIER_RATIO_PERMILLE: u32 = 2000;

/// How a non-integral `clock / (prescale * target)` division is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rounding {
    /// Reject anything that is not an exact division.
    Exact,
    /// Round to the nearest whole count, ties away from zero.
    Nearest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alignment {
    /// Count up and wrap, one carrier period per `counts` ticks.
    Edge,
    /// Count up then down, one carrier period per `2 * counts` ticks.
    Center,
}

/// Clock feeding one hardware timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerClock {
    pub source: HertzU32,
    pub prescale: u32,
    pub counter_bits: u8,
}

impl TimerClock {
    pub const fn new(source: HertzU32, prescale: u32, counter_bits: u8) -> Self {
        Self {
            source,
            prescale,
            counter_bits,
        }
    }

    fn max_counts(&self) -> u64 {
        match self.counter_bits {
            1..=32 => 1u64 << self.counter_bits,
            _ => 0,
        }
    }
}

/// Number of counts per period for `target` on `clock`, before the `- 1`.
fn period_counts(
    clock: TimerClock,
    target: HertzU32,
    divisor_scale: u32,
    rounding: Rounding,
) -> Result<u64, ConfigurationError> {
    if target.to_Hz() == 0 {
        return Err(ConfigurationError::ZeroFrequency);
    }
    if clock.prescale == 0 {
        return Err(ConfigurationError::ZeroPrescale);
    }

    let source = clock.source.to_Hz() as u64;
    let divisor = clock.prescale as u64 * target.to_Hz() as u64 * divisor_scale as u64;
    let counts = match rounding {
        Rounding::Exact if source % divisor != 0 => {
            return Err(ConfigurationError::NonIntegralPeriod {
                clock_hz: clock.source.to_Hz(),
                prescale: clock.prescale,
                target_hz: target.to_Hz(),
            })
        }
        Rounding::Exact => source / divisor,
        Rounding::Nearest => (source + divisor / 2) / divisor,
    };

    if counts == 0 || counts > clock.max_counts() {
        return Err(ConfigurationError::PeriodOutOfRange {
            counts,
            counter_bits: clock.counter_bits,
        });
    }
    Ok(counts)
}

/// Load value reaching `target` on an edge-aligned timer driven by `clock`.
///
/// `(80 MHz, 1, 20 kHz)` gives 3999 exactly. `(80 MHz, 1, 19.5 kHz)` is 4102.56
/// counts: `Exact` rejects it, `Nearest` programs 4103 counts, i.e. 4102.
pub fn derive_load_value(
    clock: TimerClock,
    target: HertzU32,
    rounding: Rounding,
) -> Result<u32, ConfigurationError> {
    period_counts(clock, target, 1, rounding).map(|counts| (counts - 1) as u32)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleClockConfig {
    pub sample_rate: HertzU32,
    pub clock: TimerClock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarrierConfig {
    pub carrier_freq: HertzU32,
    pub clock: TimerClock,
    pub resolution_bits: u8,
    /// Duty value of the zero crossing, written before the carrier starts.
    pub center_value: u16,
    pub alignment: Alignment,
}

impl CarrierConfig {
    /// Largest duty value accepted by the carrier.
    pub const fn max_duty(&self) -> u16 {
        ((1u32 << self.resolution_bits) - 1) as u16
    }

    fn divisor_scale(&self) -> u32 {
        match self.alignment {
            Alignment::Edge => 1,
            Alignment::Center => 2,
        }
    }
}

/// Validated timer setup for both halves of the delivery path.
///
/// Constructing one is the fail-fast step of initialization: if this returns an
/// error, nothing may be armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioTiming {
    sample_clock: SampleClockConfig,
    carrier: CarrierConfig,
    sample_load: u32,
    carrier_load: u32,
}

impl AudioTiming {
    pub fn new(
        sample_clock: SampleClockConfig,
        carrier: CarrierConfig,
    ) -> Result<Self, ConfigurationError> {
        // The sample rate is the pitch reference, so it has to be exact. The
        // carrier only has to be close.
        let sample_load =
            derive_load_value(sample_clock.clock, sample_clock.sample_rate, Rounding::Exact)?;

        if !(1..=16).contains(&carrier.resolution_bits) {
            return Err(ConfigurationError::InvalidResolution(carrier.resolution_bits));
        }
        let carrier_counts = period_counts(
            carrier.clock,
            carrier.carrier_freq,
            carrier.divisor_scale(),
            Rounding::Nearest,
        )?;
        let levels = 1u32 << carrier.resolution_bits;
        if levels as u64 > carrier_counts {
            return Err(ConfigurationError::ResolutionExceedsPeriod {
                levels,
                period_counts: carrier_counts as u32,
            });
        }
        if carrier.center_value > carrier.max_duty() {
            return Err(ConfigurationError::CenterOutOfRange {
                center: carrier.center_value,
                max: carrier.max_duty(),
            });
        }

        Ok(Self {
            sample_clock,
            carrier,
            sample_load,
            carrier_load: (carrier_counts - 1) as u32,
        })
    }

    pub fn sample_clock(&self) -> &SampleClockConfig {
        &self.sample_clock
    }

    pub fn carrier(&self) -> &CarrierConfig {
        &self.carrier
    }

    pub fn sample_load(&self) -> u32 {
        self.sample_load
    }

    pub fn carrier_load(&self) -> u32 {
        self.carrier_load
    }

    /// Time between two sample clock ticks. Also the deadline of one tick.
    pub fn sample_period(&self) -> NanosDurationU32 {
        let clock = &self.sample_clock.clock;
        let ticks = (self.sample_load as u64 + 1) * clock.prescale as u64;
        NanosDurationU32::from_ticks((ticks * 1_000_000_000 / clock.source.to_Hz() as u64) as u32)
    }

    /// Carrier frequency the rounded load value actually produces.
    pub fn carrier_actual(&self) -> HertzU32 {
        let clock = &self.carrier.clock;
        let divisor = (self.carrier_load as u64 + 1)
            * clock.prescale as u64
            * self.carrier.divisor_scale() as u64;
        HertzU32::from_raw((clock.source.to_Hz() as u64 / divisor) as u32)
    }

    pub fn carrier_ratio_permille(&self) -> u32 {
        (self.carrier.carrier_freq.to_Hz() as u64 * 1000
            / self.sample_clock.sample_rate.to_Hz() as u64) as u32
    }

    /// Whether the carrier is too close to the sample rate to act as a
    /// reconstruction filter. The configuration is kept as is; callers report it.
    pub fn carrier_ratio_is_suspect(&self) -> bool {
        self.carrier_ratio_permille() < MIN_CARRIER_RATIO_PERMILLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUSCLK: TimerClock = TimerClock::new(HertzU32::from_raw(80_000_000), 1, 16);

    fn carrier(freq: u32) -> CarrierConfig {
        CarrierConfig {
            carrier_freq: HertzU32::from_raw(freq),
            clock: BUSCLK,
            resolution_bits: 12,
            center_value: 2047,
            alignment: Alignment::Edge,
        }
    }

    fn sample_clock(rate: u32) -> SampleClockConfig {
        SampleClockConfig {
            sample_rate: HertzU32::from_raw(rate),
            clock: BUSCLK,
        }
    }

    #[test]
    fn exact_sample_clock_load() {
        let load = derive_load_value(BUSCLK, HertzU32::from_raw(20_000), Rounding::Exact);
        assert_eq!(load, Ok(3999));
    }

    #[test]
    fn carrier_load_rounds_to_nearest() {
        let target = HertzU32::from_raw(19_500);
        assert_eq!(derive_load_value(BUSCLK, target, Rounding::Nearest), Ok(4102));
        assert_eq!(
            derive_load_value(BUSCLK, target, Rounding::Exact),
            Err(ConfigurationError::NonIntegralPeriod {
                clock_hz: 80_000_000,
                prescale: 1,
                target_hz: 19_500,
            })
        );
    }

    #[test]
    fn nearest_rounds_down_below_half() {
        // 80e6 / 22 kHz = 3636.36 -> 3636 counts
        let load = derive_load_value(BUSCLK, HertzU32::from_raw(22_000), Rounding::Nearest);
        assert_eq!(load, Ok(3635));
    }

    #[test]
    fn prescale_divides_the_clock() {
        let clock = TimerClock::new(HertzU32::from_raw(80_000_000), 4, 16);
        let load = derive_load_value(clock, HertzU32::from_raw(20_000), Rounding::Exact);
        assert_eq!(load, Ok(999));
    }

    #[test]
    fn rejects_periods_outside_counter() {
        // 80e6 / 1 kHz = 80000 counts, too many for 16 bits.
        assert_eq!(
            derive_load_value(BUSCLK, HertzU32::from_raw(1_000), Rounding::Exact),
            Err(ConfigurationError::PeriodOutOfRange {
                counts: 80_000,
                counter_bits: 16
            })
        );
        let wide = TimerClock::new(HertzU32::from_raw(80_000_000), 1, 24);
        assert_eq!(
            derive_load_value(wide, HertzU32::from_raw(1_000), Rounding::Exact),
            Ok(79_999)
        );
        // Faster than the clock itself.
        assert!(matches!(
            derive_load_value(BUSCLK, HertzU32::from_raw(200_000_000), Rounding::Nearest),
            Err(ConfigurationError::PeriodOutOfRange { counts: 0, .. })
        ));
    }

    #[test]
    fn rejects_zero_inputs() {
        assert_eq!(
            derive_load_value(BUSCLK, HertzU32::from_raw(0), Rounding::Exact),
            Err(ConfigurationError::ZeroFrequency)
        );
        let clock = TimerClock::new(HertzU32::from_raw(80_000_000), 0, 16);
        assert_eq!(
            derive_load_value(clock, HertzU32::from_raw(20_000), Rounding::Exact),
            Err(ConfigurationError::ZeroPrescale)
        );
    }

    #[test]
    fn audio_timing_matches_board_values() {
        let timing = AudioTiming::new(sample_clock(20_000), carrier(19_500)).unwrap();
        assert_eq!(timing.sample_load(), 3999);
        assert_eq!(timing.carrier_load(), 4102);
        assert_eq!(timing.sample_period(), NanosDurationU32::from_ticks(50_000));
        assert_eq!(timing.carrier_actual(), HertzU32::from_raw(19_497));
        assert_eq!(timing.carrier().max_duty(), 4095);
    }

    #[test]
    fn board_carrier_ratio_is_flagged() {
        let timing = AudioTiming::new(sample_clock(20_000), carrier(19_500)).unwrap();
        assert_eq!(timing.carrier_ratio_permille(), 975);
        assert!(timing.carrier_ratio_is_suspect());

        let oversampled = AudioTiming::new(
            sample_clock(20_000),
            CarrierConfig {
                resolution_bits: 8,
                center_value: 127,
                ..carrier(160_000)
            },
        )
        .unwrap();
        assert!(!oversampled.carrier_ratio_is_suspect());
    }

    #[test]
    fn sample_rate_must_divide_exactly() {
        assert!(matches!(
            AudioTiming::new(sample_clock(44_100), carrier(19_500)),
            Err(ConfigurationError::NonIntegralPeriod { .. })
        ));
    }

    #[test]
    fn duty_levels_must_fit_carrier_period() {
        // 80e6 / 40 kHz = 2000 counts, fewer than 4096 levels.
        assert_eq!(
            AudioTiming::new(sample_clock(20_000), carrier(40_000)),
            Err(ConfigurationError::ResolutionExceedsPeriod {
                levels: 4096,
                period_counts: 2000
            })
        );
    }

    #[test]
    fn center_alignment_halves_the_period() {
        let timing = AudioTiming::new(
            sample_clock(20_000),
            CarrierConfig {
                alignment: Alignment::Center,
                resolution_bits: 10,
                center_value: 511,
                ..carrier(19_500)
            },
        )
        .unwrap();
        // 80e6 / (2 * 19.5 kHz) = 2051.28 -> 2051 counts.
        assert_eq!(timing.carrier_load(), 2050);
        assert_eq!(timing.carrier_actual(), HertzU32::from_raw(19_502));
    }

    #[test]
    fn rejects_bad_resolution_and_center() {
        assert_eq!(
            AudioTiming::new(
                sample_clock(20_000),
                CarrierConfig {
                    resolution_bits: 0,
                    ..carrier(19_500)
                }
            ),
            Err(ConfigurationError::InvalidResolution(0))
        );
        assert_eq!(
            AudioTiming::new(
                sample_clock(20_000),
                CarrierConfig {
                    center_value: 4096,
                    ..carrier(19_500)
                }
            ),
            Err(ConfigurationError::CenterOutOfRange {
                center: 4096,
                max: 4095
            })
        );
    }
}
