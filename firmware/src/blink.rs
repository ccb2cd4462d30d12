use embedded_hal::digital::v2::OutputPin;

// On for n units, 0 = off for one unit
pub const BLINK_ERR_CONFIG: [u8; 6] = [1u8, 0u8, 1u8, 0u8, 1u8, 0u8];
pub const BLINK_PANIC: [u8; 12] = [1u8, 0u8, 1u8, 0u8, 1u8, 0u8, 0u8, 3u8, 0u8, 3u8, 0u8, 0u8];

const UNIT_MILLIS: u32 = 200;

pub fn blink_signals(
    pin: &mut dyn OutputPin<Error = core::convert::Infallible>,
    delay: &mut cortex_m::delay::Delay,
    sig: &[u8],
) {
    for &units in sig {
        let _ = if units != 0 {
            pin.set_high()
        } else {
            pin.set_low()
        };
        delay.delay_ms(UNIT_MILLIS * units.max(1) as u32);
    }

    let _ = pin.set_low();
    delay.delay_ms(500);
}

/// Repeats `sig` forever. Used for faults the operator has to see.
pub fn blink_signals_loop(
    pin: &mut dyn OutputPin<Error = core::convert::Infallible>,
    delay: &mut cortex_m::delay::Delay,
    sig: &[u8],
) -> ! {
    loop {
        blink_signals(pin, delay, sig);
        delay.delay_ms(1000);
    }
}
