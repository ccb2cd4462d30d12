//! Debounced front panel buttons.
//!
//! Edges on a pin start that button's one-shot alarm; the level is sampled
//! again when it fires and only then accepted. A completed press is latched
//! until the main loop takes it.

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use embedded_hal::digital::v2::InputPin;
use fugit::ExtU32;
use rp_pico::hal;
use rp_pico::hal::gpio;
use rp_pico::hal::gpio::Interrupt;
use rp_pico::hal::pac;
use rp_pico::hal::timer::Alarm;
use rp_pico::hal::timer::Alarm2;
use rp_pico::hal::timer::Alarm3;

use pac::interrupt;

pub type PlayPin = gpio::Pin<gpio::bank0::Gpio5, gpio::PullUpInput>;
pub type WaveformPin = gpio::Pin<gpio::bank0::Gpio6, gpio::PullUpInput>;

const DEBOUNCE_DURATION_MILLIS: u32 = 30;

#[derive(Copy, Clone, PartialEq, Eq)]
pub enum Button {
    /// Toggles playback.
    Play,
    /// Selects the next waveform.
    Waveform,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Level {
    Pressed,
    Released,
}

#[derive(Copy, Clone)]
enum Debounce {
    Settling(Level),
    Stable(Level),
}

struct Debouncer<I: gpio::PinId, A> {
    pin: gpio::Pin<I, gpio::PullUpInput>,
    alarm: A,
    state: Debounce,
    pressed: bool,
}

impl<I: gpio::PinId, A: Alarm> Debouncer<I, A> {
    fn new(mut pin: gpio::Pin<I, gpio::PullUpInput>, mut alarm: A) -> Self {
        alarm.enable_interrupt();
        pin.set_interrupt_enabled(Interrupt::EdgeHigh, true);
        pin.set_interrupt_enabled(Interrupt::EdgeLow, true);
        Self {
            pin,
            alarm,
            state: Debounce::Stable(Level::Released),
            pressed: false,
        }
    }

    fn on_edge(&mut self) {
        for (edge, target) in [
            (Interrupt::EdgeLow, Level::Pressed),
            (Interrupt::EdgeHigh, Level::Released),
        ] {
            if !self.pin.interrupt_status(edge) {
                continue;
            }
            if matches!(self.state, Debounce::Stable(level) if level != target) {
                let _ = self.alarm.schedule(DEBOUNCE_DURATION_MILLIS.millis());
                self.state = Debounce::Settling(target);
            }
            self.pin.clear_interrupt(edge);
        }
    }

    fn on_alarm(&mut self) {
        self.alarm.clear_interrupt();

        let Debounce::Settling(target) = self.state else {
            return;
        };
        let level = if self.pin.is_low().unwrap_or(false) {
            Level::Pressed
        } else {
            Level::Released
        };
        // A bounce that ends on the old level is not a press.
        if level == target && target == Level::Pressed {
            self.pressed = true;
        }
        self.state = Debounce::Stable(level);
    }
}

struct IrqData {
    play: Debouncer<gpio::bank0::Gpio5, Alarm2>,
    waveform: Debouncer<gpio::bank0::Gpio6, Alarm3>,
}

static IRQ_DATA: Mutex<RefCell<Option<IrqData>>> = Mutex::new(RefCell::new(None));

pub fn setup_interrupt(timer: &mut hal::Timer, play: PlayPin, waveform: WaveformPin) {
    let play = Debouncer::new(play, timer.alarm_2().unwrap());
    let waveform = Debouncer::new(waveform, timer.alarm_3().unwrap());

    cortex_m::interrupt::free(|cs| {
        IRQ_DATA
            .borrow(cs)
            .replace(Some(IrqData { play, waveform }));
    });

    unsafe {
        pac::NVIC::unmask(pac::Interrupt::IO_IRQ_BANK0);
        pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_2);
        pac::NVIC::unmask(pac::Interrupt::TIMER_IRQ_3);
    }
}

/// Returns whether a press of `button` completed since the last call, and
/// clears it.
pub fn take_press(button: Button) -> bool {
    cortex_m::interrupt::free(|cs| {
        let mut data = IRQ_DATA.borrow(cs).borrow_mut();
        match (data.as_mut(), button) {
            (Some(data), Button::Play) => core::mem::take(&mut data.play.pressed),
            (Some(data), Button::Waveform) => core::mem::take(&mut data.waveform.pressed),
            (None, _) => false,
        }
    })
}

#[interrupt]
fn IO_IRQ_BANK0() {
    cortex_m::interrupt::free(|cs| {
        if let Some(data) = IRQ_DATA.borrow(cs).borrow_mut().as_mut() {
            data.play.on_edge();
            data.waveform.on_edge();
        }
    });
}

#[interrupt]
fn TIMER_IRQ_2() {
    cortex_m::interrupt::free(|cs| {
        if let Some(data) = IRQ_DATA.borrow(cs).borrow_mut().as_mut() {
            data.play.on_alarm();
        }
    });
}

#[interrupt]
fn TIMER_IRQ_3() {
    cortex_m::interrupt::free(|cs| {
        if let Some(data) = IRQ_DATA.borrow(cs).borrow_mut().as_mut() {
            data.waveform.on_alarm();
        }
    });
}
