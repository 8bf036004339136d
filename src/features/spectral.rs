//! Spectral centroid
//!
//! The centroid is the magnitude-weighted mean frequency of a clip's spectrum,
//! a cheap proxy for brightness. It is computed from a single Hann-windowed
//! FFT over the whole clip, which suits the short fragments this engine
//! handles.

use std::f32::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Numerical stability epsilon
const EPSILON: f32 = 1e-10;

/// Compute the spectral centroid of mono samples
///
/// # Arguments
///
/// * `samples` - Mono samples
/// * `sample_rate` - Sample rate in Hz
/// * `min_len` - Inputs shorter than this many samples return 0.0
///
/// # Returns
///
/// Centroid in Hz, or 0.0 for short or silent input
///
/// # Example
///
/// ```
/// use stratum_splice::features::spectral::spectral_centroid_hz;
///
/// let tone: Vec<f32> = (0..8000)
///     .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 16_000.0).sin())
///     .collect();
/// let centroid = spectral_centroid_hz(&tone, 16_000, 256);
/// assert!((centroid - 1000.0).abs() < 50.0);
/// ```
pub fn spectral_centroid_hz(samples: &[f32], sample_rate: u32, min_len: usize) -> f32 {
    let n = samples.len();
    if n == 0 || n < min_len || sample_rate == 0 {
        return 0.0;
    }

    let denom = (n.max(2) - 1) as f32;
    let mut spectrum: Vec<Complex<f32>> = samples
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let window = 0.5 - 0.5 * (2.0 * PI * i as f32 / denom).cos();
            Complex::new(x * window, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut spectrum);

    let bin_hz = sample_rate as f64 / n as f64;
    let mut weighted = 0.0f64;
    let mut total = 0.0f64;
    for (k, bin) in spectrum.iter().take(n / 2 + 1).enumerate() {
        let magnitude = bin.norm() as f64;
        weighted += magnitude * k as f64 * bin_hz;
        total += magnitude;
    }

    if total < EPSILON as f64 {
        return 0.0;
    }
    (weighted / total) as f32
}
