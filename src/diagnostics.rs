use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering;

/// Delivery path counters.
///
/// Every counter has exactly one writer: the consumer side (sample clock tick)
/// owns `ticks`, `played` and `underruns`, the producer side owns `overruns`.
/// That makes a plain load/store increment sufficient, which matters on
/// Cortex-M0+ where there is no atomic read-modify-write.
pub struct Diagnostics {
    ticks: AtomicU32,
    played: AtomicU32,
    underruns: AtomicU32,
    overruns: AtomicU32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiagnosticsSnapshot {
    pub ticks: u32,
    pub played: u32,
    pub underruns: u32,
    pub overruns: u32,
}

fn bump(counter: &AtomicU32) {
    counter.store(counter.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
}

impl Diagnostics {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            played: AtomicU32::new(0),
            underruns: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    pub(crate) fn record_played(&self) {
        bump(&self.ticks);
        bump(&self.played);
    }

    pub(crate) fn record_underrun(&self) {
        bump(&self.ticks);
        bump(&self.underruns);
    }

    pub(crate) fn record_overrun(&self) {
        bump(&self.overruns);
    }

    pub fn underrun_count(&self) -> u32 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn overrun_count(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            played: self.played.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }

    /// Only valid while neither side is running, i.e. during re-initialization.
    pub fn reset(&self) {
        for counter in [&self.ticks, &self.played, &self.underruns, &self.overruns] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
