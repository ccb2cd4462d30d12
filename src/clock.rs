//! The sample clock: a periodic trigger that moves one sample from the queue
//! into the carrier per period.

use fugit::NanosDurationU32;

use crate::carrier::CarrierDriver;
use crate::carrier::PwmOutput;
use crate::queue::SampleConsumer;
use crate::timing::AudioTiming;

/// A hardware timer that raises an interrupt once per sample period.
pub trait PeriodicTrigger {
    /// Programs the reload value (`sample_load`) without starting the timer.
    fn configure(&mut self, timing: &AudioTiming);
    /// Starts counting and unmasks the period interrupt.
    fn arm(&mut self);
    /// Masks the period interrupt and stops counting.
    fn disarm(&mut self);
    /// Clears the pending period interrupt. Called first thing in every tick.
    fn acknowledge(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockState {
    Stopped,
    Running,
}

pub struct SampleClock<'a, T, P, const N: usize> {
    trigger: T,
    carrier: CarrierDriver<P>,
    queue: SampleConsumer<'a, N>,
    period: NanosDurationU32,
    state: ClockState,
}

impl<'a, T: PeriodicTrigger, P: PwmOutput, const N: usize> SampleClock<'a, T, P, N> {
    pub fn new(
        mut trigger: T,
        carrier: CarrierDriver<P>,
        queue: SampleConsumer<'a, N>,
        timing: &AudioTiming,
    ) -> Self {
        trigger.configure(timing);
        Self {
            trigger,
            carrier,
            queue,
            period: timing.sample_period(),
            state: ClockState::Stopped,
        }
    }

    /// Arms the trigger. The carrier is started first if it is not running yet,
    /// so the first tick always lands on a live carrier.
    pub fn start(&mut self) {
        if self.state == ClockState::Running {
            return;
        }
        if !self.carrier.is_running() {
            self.carrier.start();
        }
        self.trigger.arm();
        self.state = ClockState::Running;
    }

    /// Disarms the trigger. Queued samples and the current duty are kept.
    ///
    /// Must not be called from the tick interrupt; on hardware, callers hold a
    /// critical section so no tick can be in flight.
    pub fn stop(&mut self) {
        if self.state == ClockState::Stopped {
            return;
        }
        self.trigger.disarm();
        self.state = ClockState::Stopped;
    }

    /// Stops the clock and parks the carrier at its center value, so a paused
    /// output sits at the zero crossing. Queued samples are kept for the next
    /// [`SampleClock::start`].
    pub fn pause(&mut self) {
        self.stop();
        self.carrier.silence();
    }

    /// Handles one period interrupt.
    ///
    /// Never blocks: either one sample is forwarded to the carrier, or the
    /// carrier holds its last value and an underrun is counted.
    pub fn on_tick(&mut self) {
        self.trigger.acknowledge();
        if self.state != ClockState::Running {
            return;
        }

        let diagnostics = self.queue.diagnostics();
        match self.queue.pop() {
            Some(sample) => {
                // No way to report an error from here, so saturate.
                self.carrier.set_duty_clamped(sample);
                diagnostics.record_played();
            }
            None => diagnostics.record_underrun(),
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Time between ticks, which is also the deadline of a single tick.
    pub fn period(&self) -> NanosDurationU32 {
        self.period
    }

    pub fn carrier(&self) -> &CarrierDriver<P> {
        &self.carrier
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}
