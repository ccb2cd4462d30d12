#![no_std]

// ----------------------------------------------------------------------------
// Configurable
// ----------------------------------------------------------------------------
pub const SAMPLE_RATE_HZ: u32 = 20_000;
pub const CARRIER_FREQ_HZ: u32 = 19_500;
pub const RESOLUTION_BITS: u8 = 12;
pub const SAMPLE_QUEUE_LEN: usize = 1024; // ~51ms at 20kHz

// ----------------------------------------------------------------------------
// Should probably not be changed:
// ----------------------------------------------------------------------------
pub const SYSTEM_CLOCK_HZ: u32 = 125_000_000;
/// PWM slice divider, integer part and sixteenths. 1 + 9/16 turns the system
/// clock into the 80MHz both timers count at.
pub const PWM_DIV_INT: u8 = 1;
pub const PWM_DIV_FRAC: u8 = 9;
pub const PRESCALE: u32 = 1;
pub const COUNTER_BITS: u8 = 16;
pub const DIAGNOSTICS_LOG_PERIOD_MILLIS: u32 = 1000;

// ----------------------------------------------------------------------------
// Derived from other values:
// ----------------------------------------------------------------------------
pub const PWM_CLOCK_HZ: u32 =
    ((SYSTEM_CLOCK_HZ as u64 * 16) / (PWM_DIV_INT as u64 * 16 + PWM_DIV_FRAC as u64)) as u32;

pub const CENTER_VALUE: u16 = (1 << (RESOLUTION_BITS - 1)) - 1;

const _: () = assert!(PWM_CLOCK_HZ == 80_000_000);
const _: () = assert!(PWM_CLOCK_HZ % (PRESCALE * SAMPLE_RATE_HZ) == 0);
const _: () = assert!(SAMPLE_QUEUE_LEN.is_power_of_two());
