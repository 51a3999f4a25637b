pub mod decode;
pub mod spectral;
pub mod tempo;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::config::GenreThresholds;
use crate::genre;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Decode error: {0}")]
    Decode(#[from] decode::DecodeError),
}

/// Fixed-size feature record for one track.
///
/// `energy` holds the raw mean RMS right after extraction; the catalog's
/// one-time rescale pass maps it onto a 0–100 scale. `genre` is derived from
/// the raw (pre-rescale) tempo/energy pair and never recomputed.
#[derive(Debug, Clone, Serialize)]
pub struct TrackDescriptor {
    /// Beats per minute estimate, 0.0 when estimation failed
    pub tempo: f64,
    /// Mean per-frame RMS; rescaled to [0, 100] catalog-wide
    pub energy: f64,
    /// Mean fraction of sign changes per frame, in [0, 1]
    pub zero_crossing_rate: f64,
    /// Mean frequency-domain centroid in Hz
    pub spectral_centroid: f64,
    /// Mean cepstral coefficients over time, zero vector on failure
    pub mfcc: [f64; spectral::NUM_MFCC],
    /// Coarse genre label from the rule table
    pub genre: String,
}

/// Extract the full descriptor for one audio file.
///
/// Each sub-feature is guarded independently: a failed tempo estimate must
/// not cost us the energy or timbre values, so every computation degrades to
/// its documented default (0.0 scalars, zero MFCC vector) on its own. Only a
/// file that cannot be decoded at all is an error.
pub fn extract(
    path: &Path,
    thresholds: &GenreThresholds,
) -> Result<TrackDescriptor, ExtractError> {
    let audio = decode::decode_audio(path)?;
    log::debug!(
        "Decoded {}: {:.1}s at {} Hz",
        path.file_name().and_then(|f| f.to_str()).unwrap_or("?"),
        audio.duration_secs(),
        audio.sample_rate
    );

    let tempo = tempo::estimate_bpm(&audio.samples, audio.sample_rate).unwrap_or(0.0);
    let energy = spectral::mean_rms(&audio.samples).unwrap_or(0.0);
    let zero_crossing_rate = spectral::mean_zcr(&audio.samples).unwrap_or(0.0);
    let spectral_centroid =
        spectral::mean_centroid(&audio.samples, audio.sample_rate).unwrap_or(0.0);
    let mfcc = spectral::mean_mfcc(&audio.samples, audio.sample_rate)
        .unwrap_or([0.0; spectral::NUM_MFCC]);

    let genre = genre::classify(tempo, energy, thresholds).to_string();

    Ok(TrackDescriptor {
        tempo,
        energy,
        zero_crossing_rate,
        spectral_centroid,
        mfcc,
        genre,
    })
}
