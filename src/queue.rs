//! Single-producer/single-consumer sample transfer between the synthesis side and
//! the sample clock interrupt.
//!
//! The ring buffer keeps a write cursor that only the producer advances and a
//! read cursor that only the consumer advances. Each cursor is published with
//! release ordering after its slot has been written or read, so neither side
//! ever waits for the other.

use ringbuf::consumer::Consumer;
use ringbuf::producer::Producer;

use crate::diagnostics::Diagnostics;
use crate::Sample;

pub type SampleQueue<const N: usize> = ringbuf::StaticRb<Sample, N>;

/// Splits `queue` into its two halves. Both report into `diagnostics`.
pub fn split<'a, const N: usize>(
    queue: &'a mut SampleQueue<N>,
    diagnostics: &'a Diagnostics,
) -> (SampleProducer<'a, N>, SampleConsumer<'a, N>) {
    let (producer, consumer) = queue.split_ref();
    (
        SampleProducer {
            inner: producer,
            diagnostics,
        },
        SampleConsumer {
            inner: consumer,
            diagnostics,
        },
    )
}

pub struct SampleProducer<'a, const N: usize> {
    inner: Producer<Sample, &'a SampleQueue<N>>,
    diagnostics: &'a Diagnostics,
}

impl<'a, const N: usize> SampleProducer<'a, N> {
    /// Enqueues `sample`, or drops it and counts an overrun if the queue is full.
    ///
    /// The samples already queued are never touched. A `false` return means the
    /// producer is ahead and should skip generation for a while rather than
    /// retry.
    pub fn push(&mut self, sample: Sample) -> bool {
        match self.inner.push(sample) {
            Ok(()) => true,
            Err(_) => {
                self.diagnostics.record_overrun();
                false
            }
        }
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn free_len(&self) -> usize {
        self.inner.free_len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

pub struct SampleConsumer<'a, const N: usize> {
    inner: Consumer<Sample, &'a SampleQueue<N>>,
    diagnostics: &'a Diagnostics,
}

impl<'a, const N: usize> SampleConsumer<'a, N> {
    pub fn pop(&mut self) -> Option<Sample> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn diagnostics(&self) -> &'a Diagnostics {
        self.diagnostics
    }
}
