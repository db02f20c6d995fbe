use rtrb::{Consumer, Producer, RingBuffer};

use crate::graph::node::{GraphNode, RenderCtx};

/// Pass-through node that copies the bus signal to a visualizer.
///
/// Samples go over an rtrb ring; when the reader falls behind, the newest
/// samples are dropped rather than blocking the audio thread. An optional
/// external input (a microphone, say) can be summed into what the visualizer
/// sees without ever reaching the output.
pub struct AnalysisTap {
    tx: Producer<f32>,
    dropped: u64,
}

/// Reader end of an [`AnalysisTap`], keeping the most recent window.
pub struct ScopeReader {
    rx: Consumer<f32>,
    window: Vec<f32>,
    len: usize,
}

impl AnalysisTap {
    pub fn new(capacity: usize, window: usize) -> (Self, ScopeReader) {
        let (tx, rx) = RingBuffer::<f32>::new(capacity.max(1));
        let window = window.max(1);

        let tap = Self { tx, dropped: 0 };
        let reader = ScopeReader {
            rx,
            window: vec![0.0; window],
            len: window,
        };

        (tap, reader)
    }

    /// Publish `signal`, plus `external` frame by frame when present.
    pub fn observe(&mut self, signal: &[f32], external: Option<&[f32]>) {
        for (i, &sample) in signal.iter().enumerate() {
            let extra = external.and_then(|ext| ext.get(i)).copied().unwrap_or(0.0);
            if self.tx.push(sample + extra).is_err() {
                self.dropped += 1;
            }
        }
    }

    /// Samples discarded because the reader was not keeping up.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl GraphNode for AnalysisTap {
    fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
        self.observe(out, None);
    }

    fn is_active(&self) -> bool {
        false
    }
}

impl ScopeReader {
    /// Pull everything pending and keep the newest `window` samples.
    ///
    /// Returns the number of new samples read.
    pub fn poll(&mut self) -> usize {
        let mut read = 0;
        while let Ok(sample) = self.rx.pop() {
            self.window.push(sample);
            read += 1;
        }

        if self.window.len() > self.len {
            let excess = self.window.len() - self.len;
            self.window.drain(..excess);
        }
        read
    }

    /// Most recent samples, oldest first.
    pub fn samples(&self) -> &[f32] {
        &self.window
    }

    /// Peak absolute level across the window.
    pub fn peak(&self) -> f32 {
        self.window.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
    }
}
