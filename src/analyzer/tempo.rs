use super::spectral::{SpectralAnalyzer, FRAME_SIZE, HOP_SIZE};

/// Minimum BPM the lag search considers
const MIN_BPM: f64 = 60.0;

/// Maximum BPM the lag search considers
const MAX_BPM: f64 = 200.0;

/// Global tempo estimate in BPM from an onset-strength autocorrelation.
///
/// Returns `None` when the signal is too short for an onset envelope or the
/// envelope carries no periodicity (silence, constant tones); callers treat
/// that as the 0.0 fallback.
pub fn estimate_bpm(samples: &[f32], sample_rate: u32) -> Option<f64> {
    let onset = onset_strength(samples, sample_rate);
    if onset.is_empty() {
        return None;
    }

    let autocorr = autocorrelate(&onset)?;

    // One onset value per hop
    let onset_rate = sample_rate as f64 / HOP_SIZE as f64;
    let min_lag = ((60.0 / MAX_BPM * onset_rate) as usize).max(1);
    let max_lag = ((60.0 / MIN_BPM * onset_rate) as usize).min(autocorr.len());
    if min_lag >= max_lag {
        return None;
    }

    let mut best_lag = min_lag;
    let mut best_value = autocorr[min_lag];
    for (lag, &value) in autocorr.iter().enumerate().take(max_lag).skip(min_lag) {
        if value > best_value {
            best_value = value;
            best_lag = lag;
        }
    }

    if best_value <= 0.0 {
        return None;
    }

    Some((60.0 * onset_rate / best_lag as f64).clamp(MIN_BPM, MAX_BPM))
}

/// Spectral-flux onset envelope: positive frame-to-frame magnitude change,
/// smoothed with a short moving average.
fn onset_strength(samples: &[f32], sample_rate: u32) -> Vec<f32> {
    if samples.len() < FRAME_SIZE {
        return vec![];
    }

    let mut analyzer = SpectralAnalyzer::new(sample_rate);
    let num_frames = (samples.len() - FRAME_SIZE) / HOP_SIZE + 1;
    let mut onset = Vec::with_capacity(num_frames);
    let mut prev_magnitude: Vec<f32> = vec![0.0; FRAME_SIZE / 2 + 1];

    for frame_idx in 0..num_frames {
        let start = frame_idx * HOP_SIZE;
        let magnitude = analyzer.compute_spectrum(&samples[start..start + FRAME_SIZE]);

        let flux: f32 = magnitude
            .iter()
            .zip(prev_magnitude.iter())
            .map(|(&curr, &prev)| (curr - prev).max(0.0))
            .sum();
        onset.push(flux);
        prev_magnitude = magnitude;
    }

    moving_average(&onset, 5)
}

fn moving_average(signal: &[f32], window_size: usize) -> Vec<f32> {
    if signal.len() < window_size {
        return signal.to_vec();
    }
    let half = window_size / 2;
    (0..signal.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(signal.len());
            signal[start..end].iter().sum::<f32>() / (end - start) as f32
        })
        .collect()
}

/// Mean-removed autocorrelation normalized by variance.
/// `None` when the signal is flat (zero variance).
fn autocorrelate(signal: &[f32]) -> Option<Vec<f32>> {
    let n = signal.len();
    let mean: f32 = signal.iter().sum::<f32>() / n as f32;
    let centered: Vec<f32> = signal.iter().map(|&x| x - mean).collect();
    let variance: f32 = centered.iter().map(|&x| x * x).sum();
    if variance < f32::EPSILON {
        return None;
    }

    Some(
        (0..n)
            .map(|lag| {
                let sum: f32 = centered[..n - lag]
                    .iter()
                    .zip(&centered[lag..])
                    .map(|(&a, &b)| a * b)
                    .sum();
                sum / variance
            })
            .collect(),
    )
}
