//! Boundary between whatever decides sample values and the delivery path.

use crate::queue::SampleProducer;
use crate::Sample;

/// Something that produces duty values, one per sample period.
pub trait SampleSource {
    fn next_sample(&mut self) -> Sample;
}

impl<F: FnMut() -> Sample> SampleSource for F {
    fn next_sample(&mut self) -> Sample {
        self()
    }
}

/// Producer half of the queue together with the source feeding it.
pub struct SynthesisAdapter<'a, S, const N: usize> {
    source: S,
    queue: SampleProducer<'a, N>,
}

impl<'a, S: SampleSource, const N: usize> SynthesisAdapter<'a, S, N> {
    pub fn new(source: S, queue: SampleProducer<'a, N>) -> Self {
        Self { source, queue }
    }

    /// Hands one externally generated sample to the queue. See
    /// [`SampleProducer::push`].
    pub fn push(&mut self, sample: Sample) -> bool {
        self.queue.push(sample)
    }

    /// Tops the queue up from the source and returns how many samples were
    /// generated.
    ///
    /// Only as many samples as there is room for right now are generated, so
    /// this never overruns and never spins waiting for the consumer.
    pub fn fill(&mut self) -> usize {
        let room = self.queue.free_len();
        for _ in 0..room {
            let sample = self.source.next_sample();
            self.queue.push(sample);
        }
        room
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
