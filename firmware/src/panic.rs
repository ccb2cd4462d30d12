use rp_pico::hal;
use rp_pico::pac;

use crate::blink;
use crate::output;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    // Hold the speaker at the zero crossing before anything else.
    output::silence();

    defmt::error!("{}", defmt::Display2Format(info));

    let core = unsafe { pac::CorePeripherals::steal() };
    let mut pac = unsafe { pac::Peripherals::steal() };

    // The clocks are still configured unless the panic happened during setup,
    // in which case the blink code just runs slower.
    let mut delay = cortex_m::delay::Delay::new(core.SYST, config::SYSTEM_CLOCK_HZ);

    let sio = hal::Sio::new(pac.SIO);
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );
    let mut led_pin = pins.led.into_push_pull_output();

    blink::blink_signals_loop(&mut led_pin, &mut delay, &blink::BLINK_PANIC);
}
