use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use embedded_hal::PwmPin;

use pwmsynth::timing::Alignment;
use pwmsynth::AudioTiming;
use pwmsynth::CarrierDriver;
use pwmsynth::PeriodicTrigger;
use pwmsynth::PwmOutput;
use pwmsynth::SampleClock;
use pwmsynth::SampleConsumer;
use rp_pico::hal;
use rp_pico::hal::pac;

use hal::gpio::bank0::Gpio16;
use hal::pwm::FreeRunning;
use hal::pwm::Pwm0;
use hal::pwm::Pwm1;
use hal::pwm::Slice;
use pac::interrupt;

/// Lower value is more urgent. Only the top two bits exist on the M0+.
pub const SAMPLE_CLOCK_PRIORITY: u8 = 0x00;
pub const DEFAULT_PRIORITY: u8 = 0x80;

const QUEUE_LEN: usize = config::SAMPLE_QUEUE_LEN;

fn set_divider<I: hal::pwm::SliceId>(slice: &mut Slice<I, FreeRunning>) {
    slice.set_div_int(config::PWM_DIV_INT);
    slice.set_div_frac(config::PWM_DIV_FRAC);
}

/// PWM slice 0, channel A on GPIO16: the audio carrier.
pub struct SliceCarrier {
    slice: Slice<Pwm0, FreeRunning>,
}

impl PwmOutput for SliceCarrier {
    fn configure(&mut self, timing: &AudioTiming) {
        set_divider(&mut self.slice);
        match timing.carrier().alignment {
            Alignment::Edge => self.slice.clr_ph_correct(),
            Alignment::Center => self.slice.set_ph_correct(),
        }
        // Validated against a 16 bit counter in `AudioTiming::new`.
        self.slice.set_top(timing.carrier_load() as u16);
        self.slice.channel_a.enable();
    }

    fn write_duty(&mut self, duty: u16) {
        // The compare register is double buffered and latches on wrap, so a
        // write never cuts a carrier period short.
        self.slice.channel_a.set_duty(duty);
    }

    fn enable(&mut self) {
        self.slice.enable();
    }
}

/// PWM slice 1 without an output pin: its wrap interrupt is the sample clock.
pub struct SliceTrigger {
    slice: Slice<Pwm1, FreeRunning>,
}

impl PeriodicTrigger for SliceTrigger {
    fn configure(&mut self, timing: &AudioTiming) {
        set_divider(&mut self.slice);
        self.slice.clr_ph_correct();
        self.slice.set_top(timing.sample_load() as u16);
    }

    fn arm(&mut self) {
        self.slice.set_counter(0);
        self.slice.clear_interrupt();
        self.slice.enable_interrupt();
        self.slice.enable();
    }

    fn disarm(&mut self) {
        self.slice.disable();
        self.slice.disable_interrupt();
        self.slice.clear_interrupt();
    }

    fn acknowledge(&mut self) {
        self.slice.clear_interrupt();
    }
}

type Clock = SampleClock<'static, SliceTrigger, SliceCarrier, QUEUE_LEN>;

static SAMPLE_CLOCK: Mutex<RefCell<Option<Clock>>> = Mutex::new(RefCell::new(None));

pub fn set_interrupt_priorities(nvic: &mut pac::NVIC) {
    unsafe {
        nvic.set_priority(pac::Interrupt::PWM_IRQ_WRAP, SAMPLE_CLOCK_PRIORITY);
        nvic.set_priority(pac::Interrupt::IO_IRQ_BANK0, DEFAULT_PRIORITY);
        nvic.set_priority(pac::Interrupt::TIMER_IRQ_2, DEFAULT_PRIORITY);
        nvic.set_priority(pac::Interrupt::TIMER_IRQ_3, DEFAULT_PRIORITY);
    }
}

/// Sets up both PWM slices, installs the sample clock for the interrupt and
/// starts playback. The carrier sits at its center value until the first
/// sample arrives.
pub fn setup_output<M: hal::gpio::PinMode + hal::gpio::ValidPinMode<Gpio16>>(
    pwm: pac::PWM,
    resets: &mut pac::RESETS,
    output_pin: hal::gpio::Pin<Gpio16, M>,
    queue: SampleConsumer<'static, QUEUE_LEN>,
    timing: &AudioTiming,
) {
    let mut slices = hal::pwm::Slices::new(pwm, resets);
    slices.pwm0.channel_a.output_to(output_pin);

    let carrier = CarrierDriver::new(SliceCarrier { slice: slices.pwm0 }, timing);
    let trigger = SliceTrigger {
        slice: slices.pwm1,
    };
    let clock = SampleClock::new(trigger, carrier, queue, timing);

    cortex_m::interrupt::free(|cs| {
        let mut slot = SAMPLE_CLOCK.borrow(cs).borrow_mut();
        let clock = slot.insert(clock);
        clock.start();
    });

    unsafe {
        pac::NVIC::unmask(pac::Interrupt::PWM_IRQ_WRAP);
    }
}

/// Starts the sample clock, or pauses it with the carrier at center. Runs in a
/// critical section, so it never overlaps with a tick.
pub fn set_playing(playing: bool) {
    cortex_m::interrupt::free(|cs| {
        let mut slot = SAMPLE_CLOCK.borrow(cs).borrow_mut();
        if let Some(clock) = slot.as_mut() {
            if playing {
                clock.start();
            } else {
                clock.pause();
            }
        }
    });
}

/// Stops the clock and parks the carrier at its center value. Used on the way
/// into a fault, so it tolerates the clock being borrowed by the interrupted
/// code.
pub fn silence() {
    cortex_m::interrupt::free(|cs| {
        if let Ok(mut slot) = SAMPLE_CLOCK.borrow(cs).try_borrow_mut() {
            if let Some(clock) = slot.as_mut() {
                clock.pause();
            }
        }
    });
}

#[interrupt]
fn PWM_IRQ_WRAP() {
    cortex_m::interrupt::free(|cs| {
        let mut slot = SAMPLE_CLOCK.borrow(cs).borrow_mut();
        if let Some(clock) = slot.as_mut() {
            clock.on_tick();
        }
    });
}
