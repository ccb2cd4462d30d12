#![no_std]
#![no_main]

mod blink;
mod button;
mod output;
mod panic;

use defmt_rtt as _;
use embedded_hal::digital::v2::OutputPin;
use fugit::RateExtU32;
use fugit::TimerDurationU64;

use button::Button;
use pwmsynth::queue;
use pwmsynth::timing::Alignment;
use pwmsynth::timing::TimerClock;
use pwmsynth::tone::Tone;
use pwmsynth::AudioTiming;
use pwmsynth::CarrierConfig;
use pwmsynth::ConfigurationError;
use pwmsynth::Diagnostics;
use pwmsynth::SampleClockConfig;
use pwmsynth::SampleQueue;
use pwmsynth::SynthesisAdapter;

// The macro for our start-up function
use rp_pico::entry;

use rp_pico::hal;
use rp_pico::hal::pac;
use rp_pico::hal::Clock;

/// Reset when the delivery path is (re)initialized, never while it runs.
static DIAGNOSTICS: Diagnostics = Diagnostics::new();

/// Entry point to our bare-metal application.
///
/// The `#[entry]` macro ensures the Cortex-M start-up code calls this function
/// as soon as all global variables are initialised.
#[entry]
fn main() -> ! {
    run()
}

/// Both timers run from the PWM clock: PERIODIC mode, counting up and
/// reloading, prescale 1.
fn board_timing() -> Result<AudioTiming, ConfigurationError> {
    let pwm_clock = TimerClock::new(
        config::PWM_CLOCK_HZ.Hz(),
        config::PRESCALE,
        config::COUNTER_BITS,
    );
    AudioTiming::new(
        SampleClockConfig {
            sample_rate: config::SAMPLE_RATE_HZ.Hz(),
            clock: pwm_clock,
        },
        CarrierConfig {
            carrier_freq: config::CARRIER_FREQ_HZ.Hz(),
            clock: pwm_clock,
            resolution_bits: config::RESOLUTION_BITS,
            center_value: config::CENTER_VALUE,
            alignment: Alignment::Edge,
        },
    )
}

fn run() -> ! {
    let mut core = pac::CorePeripherals::take().unwrap();
    let mut pac = pac::Peripherals::take().unwrap();

    // Set up the watchdog driver - needed by the clock setup code
    let mut watchdog = hal::Watchdog::new(pac.WATCHDOG);

    // The default is to generate a 125 MHz system clock
    let clocks = hal::clocks::init_clocks_and_plls(
        rp_pico::XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .unwrap();

    // The single-cycle I/O block controls our GPIO pins
    let sio = hal::Sio::new(pac.SIO);

    // Set the pins up according to their function on this particular board
    let pins = rp_pico::Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    let mut delay = cortex_m::delay::Delay::new(core.SYST, clocks.system_clock.freq().to_Hz());
    let mut led_pin = pins.led.into_push_pull_output();

    if clocks.system_clock.freq().to_Hz() != config::SYSTEM_CLOCK_HZ {
        defmt::error!(
            "system clock is {} Hz, PWM dividers assume {} Hz",
            clocks.system_clock.freq().to_Hz(),
            config::SYSTEM_CLOCK_HZ
        );
        blink::blink_signals_loop(&mut led_pin, &mut delay, &blink::BLINK_ERR_CONFIG);
    }

    let timing = match board_timing() {
        Ok(timing) => timing,
        Err(e) => {
            // Nothing is armed yet, and nothing will be.
            defmt::error!("invalid timer configuration: {}", e);
            blink::blink_signals_loop(&mut led_pin, &mut delay, &blink::BLINK_ERR_CONFIG);
        }
    };
    defmt::info!(
        "sample clock {} Hz (load {}), carrier {} Hz (load {}, actual {} Hz)",
        timing.sample_clock().sample_rate.to_Hz(),
        timing.sample_load(),
        timing.carrier().carrier_freq.to_Hz(),
        timing.carrier_load(),
        timing.carrier_actual().to_Hz(),
    );
    if timing.carrier_ratio_is_suspect() {
        defmt::warn!(
            "carrier is {}/1000 of the sample rate, expect audible carrier artifacts",
            timing.carrier_ratio_permille()
        );
    }

    let samples =
        cortex_m::singleton!(: SampleQueue<{ config::SAMPLE_QUEUE_LEN }> = SampleQueue::default())
            .unwrap();
    DIAGNOSTICS.reset();
    let (producer, consumer) = queue::split(samples, &DIAGNOSTICS);

    let mut synth = SynthesisAdapter::new(
        Tone::new(timing.sample_clock().sample_rate, timing.carrier()),
        producer,
    );
    // Start with a full queue so the first ticks do not underrun.
    synth.fill();

    output::set_interrupt_priorities(&mut core.NVIC);
    output::setup_output(pac.PWM, &mut pac.RESETS, pins.gpio16, consumer, &timing);

    let mut timer = hal::Timer::new(pac.TIMER, &mut pac.RESETS);
    button::setup_interrupt(
        &mut timer,
        pins.gpio5.into_pull_up_input(),
        pins.gpio6.into_pull_up_input(),
    );

    let mut playing = true;
    led_pin.set_high().unwrap();

    let report_period = TimerDurationU64::millis(config::DIAGNOSTICS_LOG_PERIOD_MILLIS as u64);
    let mut next_report = timer.get_counter() + report_period;

    // ----------------------------------------------------------------------------
    // Main loop! -----------------------------------------------------------------
    // ----------------------------------------------------------------------------
    loop {
        synth.fill();

        if button::take_press(Button::Play) {
            playing = !playing;
            output::set_playing(playing);
            if playing {
                led_pin.set_high().unwrap();
            } else {
                led_pin.set_low().unwrap();
            }
            defmt::info!("playback {}", if playing { "on" } else { "off" });
        }

        if button::take_press(Button::Waveform) {
            let waveform = synth.source().waveform().next();
            synth.source_mut().set_waveform(waveform);
            defmt::info!("waveform {}", waveform);
        }

        let now = timer.get_counter();
        if now >= next_report {
            next_report = now + report_period;
            defmt::info!("{}", DIAGNOSTICS.snapshot());
        }

        // Every sample tick wakes us up again.
        cortex_m::asm::wfi();
    }
}
