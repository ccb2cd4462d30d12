//! Real-time sample delivery for a PWM audio output.
//!
//! A producer fills a lock-free [`queue`] with duty values. A periodic
//! [`clock::PeriodicTrigger`] fires once per sample period and the
//! [`clock::SampleClock`] moves exactly one value into the
//! [`carrier::CarrierDriver`], whose PWM timer keeps running at the carrier
//! frequency on its own. Empty and full queues are absorbed locally and only
//! show up in [`diagnostics::Diagnostics`].
//!
//! Everything here is hardware independent; the firmware crate supplies the
//! trigger and PWM implementations.

#![cfg_attr(not(test), no_std)]

pub mod carrier;
pub mod clock;
pub mod diagnostics;
pub mod error;
pub mod queue;
pub mod synth;
pub mod timing;
pub mod tone;

/// A duty value in `[0, 2^resolution_bits - 1]`.
pub type Sample = u16;

pub use carrier::CarrierDriver;
pub use carrier::PwmOutput;
pub use clock::ClockState;
pub use clock::PeriodicTrigger;
pub use clock::SampleClock;
pub use diagnostics::Diagnostics;
pub use diagnostics::DiagnosticsSnapshot;
pub use error::ConfigurationError;
pub use error::OutOfRange;
pub use queue::SampleConsumer;
pub use queue::SampleProducer;
pub use queue::SampleQueue;
pub use synth::SampleSource;
pub use synth::SynthesisAdapter;
pub use timing::AudioTiming;
pub use timing::CarrierConfig;
pub use timing::SampleClockConfig;
