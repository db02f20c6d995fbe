//! Spectrum of the scope window over the range a guitar actually covers
//!
//! The x axis is octaves above [`LOW_HZ`], so each fret is the same width
//! anywhere on the neck.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

const LOW_HZ: f64 = 40.0;
const HIGH_HZ: f64 = 8_000.0;
const POINTS: usize = 96;
const FLOOR_DB: f64 = -90.0;

pub struct Spectrum {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin read for each plotted point
    bins: Vec<usize>,
    /// (octaves above LOW_HZ, dB)
    points: Vec<(f64, f64)>,
}

impl Spectrum {
    pub fn new(size: usize, sample_rate: f32) -> Self {
        let size = size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(size);

        // Hann
        let denom = (size - 1) as f32;
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let nyquist = sample_rate as f64 / 2.0;
        let high = HIGH_HZ.min(nyquist).max(LOW_HZ * 2.0);
        let octaves = (high / LOW_HZ).log2();
        let last_bin = size / 2 - 1;

        let mut bins = Vec::with_capacity(POINTS);
        let mut points = Vec::with_capacity(POINTS);
        for i in 0..POINTS {
            let x = octaves * i as f64 / (POINTS - 1) as f64;
            let hz = LOW_HZ * x.exp2();
            let bin = (hz * size as f64 / sample_rate as f64).round() as usize;
            bins.push(bin.min(last_bin));
            points.push((x, FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
            bins,
            points,
        }
    }

    /// Recompute from the latest scope window. Windows of another length are
    /// ignored.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }

        for ((slot, &s), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Normalise so a full-scale sine sits near 0 dB
        let scale = 2.0 / self.window.iter().sum::<f32>().max(1.0);
        for (point, &bin) in self.points.iter_mut().zip(&self.bins) {
            let magnitude = (self.scratch[bin].norm() * scale).max(1e-9);
            point.1 = (20.0 * (magnitude as f64).log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.points
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, points: &[(f64, f64)]) {
    let span = points.last().map_or(1.0, |p| p.0).max(1.0);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(points);

    let x_labels = vec![
        format!("{:.0}", LOW_HZ),
        format!("{:.0}", LOW_HZ * (span / 2.0).exp2()),
        format!("{:.0}", LOW_HZ * span.exp2()),
    ];

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Spectrum (Hz) ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, span])
                .labels(x_labels)
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-90", "-45", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
