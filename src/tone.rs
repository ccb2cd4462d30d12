//! A direct digital synthesis oscillator, used as the sample source on the
//! board. Not part of the real-time path: it runs in the producer's context.

use fugit::HertzU32;

use crate::synth::SampleSource;
use crate::timing::CarrierConfig;
use crate::Sample;

pub const TABLE_LEN: usize = 256;
/// Peak level of the sine table.
pub const SINE_AMPLITUDE: f32 = 974.0;
/// Plateau level of the square, sawtooth and triangle shapes.
pub const SHAPE_AMPLITUDE: i32 = 900;

pub const FREQ_MIN: HertzU32 = HertzU32::from_raw(20);
pub const FREQ_MAX: HertzU32 = HertzU32::from_raw(8_000);
pub const FREQ_DEFAULT: HertzU32 = HertzU32::from_raw(440);
pub const VOLUME_MAX: u8 = 100;
pub const VOLUME_DEFAULT: u8 = 75;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// The waveform after `self`, wrapping around.
    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Square,
            Waveform::Square => Waveform::Sawtooth,
            Waveform::Sawtooth => Waveform::Triangle,
            Waveform::Triangle => Waveform::Sine,
        }
    }
}

/// Maps a signed level around zero onto the carrier's duty range.
pub fn level_to_duty(level: i16, center: u16, max: u16) -> Sample {
    let duty = center as i32 + 2 * level as i32;
    duty.clamp(0, max as i32) as Sample
}

pub struct Tone {
    sine: [i16; TABLE_LEN],
    sample_rate: HertzU32,
    frequency: HertzU32,
    phase: u32,
    increment: u32,
    volume: u8,
    waveform: Waveform,
    center: u16,
    max: u16,
}

impl Tone {
    pub fn new(sample_rate: HertzU32, carrier: &CarrierConfig) -> Self {
        let sine = core::array::from_fn(|i| {
            let f = i as f32 * core::f32::consts::TAU / TABLE_LEN as f32;
            (micromath::F32Ext::sin(f) * SINE_AMPLITUDE) as i16
        });
        let mut tone = Self {
            sine,
            sample_rate,
            frequency: FREQ_DEFAULT,
            phase: 0,
            increment: 0,
            volume: VOLUME_DEFAULT,
            waveform: Waveform::Sine,
            center: carrier.center_value,
            max: carrier.max_duty(),
        };
        tone.set_frequency(FREQ_DEFAULT);
        tone
    }

    /// Clamped to [`FREQ_MIN`]..=[`FREQ_MAX`]. The phase carries on, so a change
    /// does not click.
    pub fn set_frequency(&mut self, frequency: HertzU32) {
        let hz = frequency.to_Hz().clamp(FREQ_MIN.to_Hz(), FREQ_MAX.to_Hz());
        self.frequency = HertzU32::from_raw(hz);
        self.increment = (((hz as u64) << 32) / self.sample_rate.to_Hz() as u64) as u32;
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(VOLUME_MAX);
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn frequency(&self) -> HertzU32 {
        self.frequency
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn phase_increment(&self) -> u32 {
        self.increment
    }

    fn level_at(&self, index: u8) -> i16 {
        let i = index as i32;
        let a = SHAPE_AMPLITUDE;
        let level = match self.waveform {
            Waveform::Sine => return self.sine[index as usize],
            // 20 steps of slope on the falling edge
            Waveform::Square if i < 118 => a,
            Waveform::Square if i < 138 => a - (i - 118) * 2 * a / 20,
            Waveform::Square => -a,
            Waveform::Sawtooth => i * 2 * a / 256 - a,
            Waveform::Triangle if i < 128 => i * 2 * a / 128 - a,
            Waveform::Triangle => a - (i - 128) * 2 * a / 128,
        };
        level as i16
    }

    /// Unscaled level of the current phase, then advances the phase.
    pub fn next_level(&mut self) -> i16 {
        let level = self.level_at((self.phase >> 24) as u8);
        self.phase = self.phase.wrapping_add(self.increment);
        level
    }
}

impl SampleSource for Tone {
    fn next_sample(&mut self) -> Sample {
        let level = (self.next_level() as i32 * self.volume as i32) >> 7;
        level_to_duty(level as i16, self.center, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Alignment;
    use crate::timing::TimerClock;

    fn tone() -> Tone {
        let carrier = CarrierConfig {
            carrier_freq: HertzU32::from_raw(19_500),
            clock: TimerClock::new(HertzU32::from_raw(80_000_000), 1, 16),
            resolution_bits: 12,
            center_value: 2047,
            alignment: Alignment::Edge,
        };
        Tone::new(HertzU32::from_raw(20_000), &carrier)
    }

    #[test]
    fn phase_increment() {
        let mut t = tone();
        // 440 * 2^32 / 20000
        assert_eq!(t.phase_increment(), 94_489_280);
        t.set_frequency(HertzU32::from_raw(5_000));
        assert_eq!(t.phase_increment(), 1 << 30);
    }

    #[test]
    fn frequency_and_volume_clamp() {
        let mut t = tone();
        t.set_frequency(HertzU32::from_raw(5));
        assert_eq!(t.frequency(), FREQ_MIN);
        t.set_frequency(HertzU32::from_raw(12_000));
        assert_eq!(t.frequency(), FREQ_MAX);
        t.set_volume(200);
        assert_eq!(t.volume(), 100);
    }

    #[test]
    fn sine_table_shape() {
        let t = tone();
        assert_eq!(t.sine[0], 0);
        assert!((970..=974).contains(&t.sine[64]), "{}", t.sine[64]);
        assert!((-974..=-970).contains(&t.sine[192]), "{}", t.sine[192]);
        assert!(t.sine[128].abs() <= 2);
    }

    #[test]
    fn shapes() {
        let mut t = tone();
        t.set_waveform(Waveform::Square);
        assert_eq!(t.level_at(0), 900);
        assert_eq!(t.level_at(128), 0);
        assert_eq!(t.level_at(200), -900);

        t.set_waveform(Waveform::Sawtooth);
        assert_eq!(t.level_at(0), -900);
        assert_eq!(t.level_at(128), 0);
        assert_eq!(t.level_at(255), 892);

        t.set_waveform(Waveform::Triangle);
        assert_eq!(t.level_at(0), -900);
        assert_eq!(t.level_at(64), 0);
        assert_eq!(t.level_at(128), 900);
        assert_eq!(t.level_at(192), 0);
    }

    #[test]
    fn quarter_rate_square_alternates() {
        let mut t = tone();
        t.set_waveform(Waveform::Square);
        t.set_volume(100);
        t.set_frequency(HertzU32::from_raw(5_000));
        // Phase indices 0, 64, 128, 192.
        let duties: [u16; 4] = core::array::from_fn(|_| t.next_sample());
        // 90000 >> 7 = 703, -90000 >> 7 = -704
        assert_eq!(duties, [2047 + 1406, 2047 + 1406, 2047, 2047 - 1408]);
    }

    #[test]
    fn silent_at_zero_volume() {
        let mut t = tone();
        t.set_volume(0);
        for _ in 0..100 {
            assert_eq!(t.next_sample(), 2047);
        }
    }

    #[test]
    fn duty_conversion_clamps() {
        assert_eq!(level_to_duty(0, 2047, 4095), 2047);
        assert_eq!(level_to_duty(1000, 2047, 4095), 4047);
        assert_eq!(level_to_duty(-1000, 2047, 4095), 47);
        assert_eq!(level_to_duty(2000, 2047, 4095), 4095);
        assert_eq!(level_to_duty(-1500, 2047, 4095), 0);
    }

    #[test]
    fn waveform_cycle() {
        let mut w = Waveform::Sine;
        for _ in 0..4 {
            w = w.next();
        }
        assert_eq!(w, Waveform::Sine);
        assert_eq!(Waveform::Sawtooth.next(), Waveform::Triangle);
    }
}
