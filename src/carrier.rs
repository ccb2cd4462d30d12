//! The PWM carrier: a free-running timer whose compare value is the current
//! output level.

use crate::error::OutOfRange;
use crate::timing::AudioTiming;
use crate::timing::CarrierConfig;
use crate::Sample;

/// A continuous waveform generator with a writable duty register.
///
/// Implementations must be callable from interrupt context: `write_duty` is a
/// single register store and may not block.
pub trait PwmOutput {
    /// Programs the counter period (`load + 1` counts) and the alignment.
    fn configure(&mut self, timing: &AudioTiming);
    fn write_duty(&mut self, duty: u16);
    fn enable(&mut self);
}

pub struct CarrierDriver<P> {
    pwm: P,
    config: CarrierConfig,
    duty: u16,
    running: bool,
}

impl<P: PwmOutput> CarrierDriver<P> {
    /// Configures `pwm` for the carrier and parks it at the center value. The
    /// carrier does not run until [`CarrierDriver::start`].
    pub fn new(mut pwm: P, timing: &AudioTiming) -> Self {
        let config = *timing.carrier();
        pwm.configure(timing);
        pwm.write_duty(config.center_value);
        Self {
            pwm,
            config,
            duty: config.center_value,
            running: false,
        }
    }

    /// Writes the center value, then lets the carrier free-run.
    pub fn start(&mut self) {
        self.pwm.write_duty(self.config.center_value);
        self.duty = self.config.center_value;
        self.pwm.enable();
        self.running = true;
    }

    pub fn set_duty(&mut self, duty: Sample) -> Result<(), OutOfRange> {
        let max = self.config.max_duty();
        if duty > max {
            return Err(OutOfRange { value: duty, max });
        }
        self.pwm.write_duty(duty);
        self.duty = duty;
        Ok(())
    }

    /// Like [`CarrierDriver::set_duty`], saturating instead of failing.
    pub fn set_duty_clamped(&mut self, duty: Sample) {
        let duty = duty.min(self.config.max_duty());
        self.pwm.write_duty(duty);
        self.duty = duty;
    }

    /// Returns the output to the zero crossing.
    pub fn silence(&mut self) {
        self.set_duty_clamped(self.config.center_value);
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

#[cfg(test)]
mod tests {
    use fugit::HertzU32;

    use super::*;
    use crate::timing::Alignment;
    use crate::timing::SampleClockConfig;
    use crate::timing::TimerClock;

    #[derive(Default)]
    struct Register {
        top: Option<u32>,
        writes: [u16; 8],
        n_writes: usize,
        enabled: bool,
    }

    impl PwmOutput for Register {
        fn configure(&mut self, timing: &AudioTiming) {
            self.top = Some(timing.carrier_load());
        }
        fn write_duty(&mut self, duty: u16) {
            self.writes[self.n_writes] = duty;
            self.n_writes += 1;
        }
        fn enable(&mut self) {
            assert!(self.n_writes > 0, "carrier enabled before a duty was written");
            self.enabled = true;
        }
    }

    fn timing() -> AudioTiming {
        let clock = TimerClock::new(HertzU32::from_raw(80_000_000), 1, 16);
        AudioTiming::new(
            SampleClockConfig {
                sample_rate: HertzU32::from_raw(20_000),
                clock,
            },
            CarrierConfig {
                carrier_freq: HertzU32::from_raw(19_500),
                clock,
                resolution_bits: 12,
                center_value: 2047,
                alignment: Alignment::Edge,
            },
        )
        .unwrap()
    }

    #[test]
    fn starts_at_center() {
        let mut carrier = CarrierDriver::new(Register::default(), &timing());
        assert_eq!(carrier.pwm().top, Some(4102));
        assert!(!carrier.pwm().enabled);
        carrier.start();
        assert!(carrier.is_running());
        assert!(carrier.pwm().enabled);
        assert_eq!(carrier.duty(), 2047);
        assert_eq!(carrier.pwm().writes[carrier.pwm().n_writes - 1], 2047);
    }

    #[test]
    fn duty_range_is_checked() {
        let mut carrier = CarrierDriver::new(Register::default(), &timing());
        carrier.start();
        assert_eq!(carrier.set_duty(2047), Ok(()));
        assert_eq!(carrier.set_duty(4095), Ok(()));
        assert_eq!(carrier.duty(), 4095);
        assert_eq!(
            carrier.set_duty(4096),
            Err(OutOfRange {
                value: 4096,
                max: 4095
            })
        );
        assert_eq!(carrier.duty(), 4095);
    }

    #[test]
    fn clamped_and_silence() {
        let mut carrier = CarrierDriver::new(Register::default(), &timing());
        carrier.start();
        carrier.set_duty_clamped(u16::MAX);
        assert_eq!(carrier.duty(), 4095);
        carrier.silence();
        assert_eq!(carrier.duty(), 2047);
        assert!(carrier.pwm().enabled);
    }
}
