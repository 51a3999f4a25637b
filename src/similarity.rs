use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::analyzer::TrackDescriptor;
use crate::catalog::Catalog;

/// Which feature subset a ranking compares on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The 13 mean MFCCs (timbre)
    Timbre,
    /// [tempo, energy] ++ MFCCs, 15 dimensions
    Combined,
    /// [zero-crossing rate, spectral centroid] (rhythm/percussive character)
    Rhythm,
}

impl Mode {
    /// Assemble this mode's feature vector from a descriptor.
    fn vector(self, d: &TrackDescriptor) -> Vec<f64> {
        match self {
            Mode::Timbre => d.mfcc.to_vec(),
            Mode::Combined => {
                let mut v = Vec::with_capacity(2 + d.mfcc.len());
                v.push(d.tempo);
                v.push(d.energy);
                v.extend_from_slice(&d.mfcc);
                v
            }
            Mode::Rhythm => vec![d.zero_crossing_rate, d.spectral_centroid],
        }
    }
}

impl FromStr for Mode {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "timbre" | "mfcc" => Ok(Mode::Timbre),
            "combined" => Ok(Mode::Combined),
            "rhythm" | "percussive" => Ok(Mode::Rhythm),
            other => Err(RankError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Timbre => write!(f, "timbre"),
            Mode::Combined => write!(f, "combined"),
            Mode::Rhythm => write!(f, "rhythm"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RankError {
    #[error("Unknown comparison mode: {0}")]
    UnknownMode(String),
    #[error("Track not in catalog: {0}")]
    UnknownTrack(String),
}

/// Rank every non-reference track by cosine similarity to the reference in
/// the given mode's feature space. Scores are rescaled from [-1, 1] to
/// [0, 1]; results are sorted descending, ties keeping catalog order.
///
/// An empty catalog (after excluding the reference) is not an error — the
/// ranking is simply empty. A reference that isn't in the catalog is.
pub fn rank(
    catalog: &Catalog,
    reference: &str,
    mode: Mode,
) -> Result<Vec<(String, f64)>, RankError> {
    let base = catalog
        .get(reference)
        .ok_or_else(|| RankError::UnknownTrack(reference.to_string()))?;

    let mut names: Vec<String> = Vec::new();
    let mut matrix: Vec<Vec<f64>> = Vec::new();
    for (name, descriptor) in catalog.iter() {
        if name == reference {
            continue;
        }
        names.push(name.to_string());
        matrix.push(mode.vector(descriptor));
    }

    if matrix.is_empty() {
        return Ok(vec![]);
    }

    // Fit on the candidates only, then project the reference through the
    // same transform — refitting with the reference included would shift
    // every score as the reference changes.
    let scaler = Standardizer::fit(&matrix);
    let query = scaler.transform(&mode.vector(base));

    let mut scored: Vec<(String, f64)> = names
        .into_iter()
        .zip(matrix.iter().map(|row| {
            let row = scaler.transform(row);
            ((cosine_similarity(&query, &row) + 1.0) / 2.0).clamp(0.0, 1.0)
        }))
        .collect();

    // Vec::sort_by is stable, so exact ties keep catalog order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    Ok(scored)
}

/// Rank by ascending absolute raw tempo difference. The returned score is
/// the BPM delta itself — no normalization.
pub fn rank_by_tempo(
    catalog: &Catalog,
    reference: &str,
) -> Result<Vec<(String, f64)>, RankError> {
    let base = catalog
        .get(reference)
        .ok_or_else(|| RankError::UnknownTrack(reference.to_string()))?;
    let base_tempo = base.tempo;

    let mut scored: Vec<(String, f64)> = catalog
        .iter()
        .filter(|(name, _)| *name != reference)
        .map(|(name, d)| (name.to_string(), (d.tempo - base_tempo).abs()))
        .collect();

    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    Ok(scored)
}

/// Rank by descending `1 - |Δ energy| / 100` over the catalog-rescaled
/// 0–100 energy values.
pub fn rank_by_energy(
    catalog: &Catalog,
    reference: &str,
) -> Result<Vec<(String, f64)>, RankError> {
    let base = catalog
        .get(reference)
        .ok_or_else(|| RankError::UnknownTrack(reference.to_string()))?;
    let base_energy = base.energy;

    let mut scored: Vec<(String, f64)> = catalog
        .iter()
        .filter(|(name, _)| *name != reference)
        .map(|(name, d)| {
            (
                name.to_string(),
                1.0 - (d.energy - base_energy).abs() / 100.0,
            )
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    Ok(scored)
}

/// Per-dimension z-score transform fitted once and applied to both the
/// candidate matrix and the reference vector.
struct Standardizer {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl Standardizer {
    /// Fit mean and std per dimension. Std is floored at 1e-10 so a
    /// zero-variance dimension contributes (near) nothing instead of
    /// dividing by zero.
    fn fit(matrix: &[Vec<f64>]) -> Self {
        let n = matrix.len();
        let dim = matrix.first().map_or(0, |row| row.len());

        let mut means = vec![0.0_f64; dim];
        for row in matrix {
            for (d, &val) in row.iter().enumerate() {
                means[d] += val;
            }
        }
        for m in &mut means {
            *m /= n as f64;
        }

        let mut vars = vec![0.0_f64; dim];
        for row in matrix {
            for (d, &val) in row.iter().enumerate() {
                let diff = val - means[d];
                vars[d] += diff * diff;
            }
        }
        let stds: Vec<f64> = vars
            .iter()
            .map(|v| (v / n as f64).sqrt().max(1e-10))
            .collect();

        Self { means, stds }
    }

    fn transform(&self, vector: &[f64]) -> Vec<f64> {
        vector
            .iter()
            .enumerate()
            .map(|(d, &val)| (val - self.means[d]) / self.stds[d])
            .collect()
    }
}

/// Cosine similarity between two vectors, 0.0 when either is all-zero.
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(tempo: f64, energy: f64, zcr: f64, centroid: f64, mfcc0: f64) -> TrackDescriptor {
        let mut mfcc = [0.0; 13];
        mfcc[0] = mfcc0;
        mfcc[1] = mfcc0 / 2.0;
        TrackDescriptor {
            tempo,
            energy,
            zero_crossing_rate: zcr,
            spectral_centroid: centroid,
            mfcc,
            genre: String::new(),
        }
    }

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert("a.mp3".into(), descriptor(140.0, 0.05, 0.10, 3000.0, -120.0));
        catalog.insert("b.mp3".into(), descriptor(80.0, 0.01, 0.02, 800.0, -200.0));
        catalog.insert("c.mp3".into(), descriptor(100.0, 0.02, 0.05, 1500.0, -150.0));
        catalog.insert("d.mp3".into(), descriptor(120.0, 0.04, 0.08, 2500.0, -130.0));
        catalog
    }

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn standardizer_centers_and_scales() {
        let matrix = vec![
            vec![10.0, 100.0],
            vec![20.0, 200.0],
            vec![30.0, 300.0],
        ];
        let scaler = Standardizer::fit(&matrix);
        let rows: Vec<Vec<f64>> = matrix.iter().map(|r| scaler.transform(r)).collect();

        let mean_0: f64 = rows.iter().map(|v| v[0]).sum::<f64>() / 3.0;
        assert!(mean_0.abs() < 1e-10);
        // Both dimensions standardize to the same values despite scale
        assert!((rows[0][0] - rows[0][1]).abs() < 1e-10);
    }

    #[test]
    fn standardizer_zero_variance_dimension_is_guarded() {
        let matrix = vec![vec![5.0, 1.0], vec![5.0, 2.0], vec![5.0, 3.0]];
        let scaler = Standardizer::fit(&matrix);
        let rows: Vec<Vec<f64>> = matrix.iter().map(|r| scaler.transform(r)).collect();
        // Constant dimension maps to exactly zero for the fitted rows
        assert!(rows.iter().all(|r| r[0] == 0.0));
    }

    #[test]
    fn rank_excludes_reference_and_scores_in_unit_range() {
        let catalog = sample_catalog();
        for mode in [Mode::Timbre, Mode::Combined, Mode::Rhythm] {
            let ranked = rank(&catalog, "a.mp3", mode).unwrap();
            assert_eq!(ranked.len(), catalog.len() - 1);
            assert!(ranked.iter().all(|(name, _)| name != "a.mp3"));
            assert!(ranked.iter().all(|(_, score)| (0.0..=1.0).contains(score)));
            // Descending order
            assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }

    #[test]
    fn rank_identical_vectors_score_equally() {
        let mut catalog = Catalog::new();
        catalog.insert("ref.mp3".into(), descriptor(100.0, 0.02, 0.05, 1500.0, -150.0));
        catalog.insert("x.mp3".into(), descriptor(120.0, 0.04, 0.08, 2500.0, -130.0));
        catalog.insert("y.mp3".into(), descriptor(120.0, 0.04, 0.08, 2500.0, -130.0));
        catalog.insert("z.mp3".into(), descriptor(80.0, 0.01, 0.02, 800.0, -200.0));

        let ranked = rank(&catalog, "ref.mp3", Mode::Combined).unwrap();
        let x = ranked.iter().find(|(n, _)| n == "x.mp3").unwrap().1;
        let y = ranked.iter().find(|(n, _)| n == "y.mp3").unwrap().1;
        assert!((x - y).abs() < 1e-12);
    }

    #[test]
    fn rank_ties_keep_catalog_order() {
        let mut catalog = Catalog::new();
        catalog.insert("ref.mp3".into(), descriptor(100.0, 0.02, 0.05, 1500.0, -150.0));
        catalog.insert("second.mp3".into(), descriptor(120.0, 0.04, 0.08, 2500.0, -130.0));
        catalog.insert("first.mp3".into(), descriptor(120.0, 0.04, 0.08, 2500.0, -130.0));

        let ranked = rank(&catalog, "ref.mp3", Mode::Rhythm).unwrap();
        let pos_second = ranked.iter().position(|(n, _)| n == "second.mp3").unwrap();
        let pos_first = ranked.iter().position(|(n, _)| n == "first.mp3").unwrap();
        // "second.mp3" was inserted before "first.mp3"
        assert!(pos_second < pos_first);
    }

    #[test]
    fn rank_single_track_catalog_is_empty() {
        let mut catalog = Catalog::new();
        catalog.insert("only.mp3".into(), descriptor(100.0, 0.02, 0.05, 1500.0, -150.0));
        let ranked = rank(&catalog, "only.mp3", Mode::Timbre).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn rank_unknown_reference_is_error() {
        let catalog = sample_catalog();
        assert!(matches!(
            rank(&catalog, "missing.mp3", Mode::Timbre),
            Err(RankError::UnknownTrack(_))
        ));
    }

    #[test]
    fn mode_parsing_rejects_unknown_strings() {
        assert_eq!("timbre".parse::<Mode>().unwrap(), Mode::Timbre);
        assert_eq!("MFCC".parse::<Mode>().unwrap(), Mode::Timbre);
        assert_eq!("combined".parse::<Mode>().unwrap(), Mode::Combined);
        assert_eq!("percussive".parse::<Mode>().unwrap(), Mode::Rhythm);
        assert!(matches!(
            "vibes".parse::<Mode>(),
            Err(RankError::UnknownMode(_))
        ));
    }

    #[test]
    fn combined_mode_vector_is_15_dim() {
        let d = descriptor(120.0, 50.0, 0.1, 2000.0, -140.0);
        assert_eq!(Mode::Combined.vector(&d).len(), 15);
        assert_eq!(Mode::Timbre.vector(&d).len(), 13);
        assert_eq!(Mode::Rhythm.vector(&d).len(), 2);
    }

    #[test]
    fn tempo_ranking_orders_by_bpm_delta() {
        // tempos: a=140, b=80, c=100 → from a: c (Δ40) before b (Δ60)
        let mut catalog = Catalog::new();
        catalog.insert("a.mp3".into(), descriptor(140.0, 0.05, 0.1, 3000.0, 0.0));
        catalog.insert("b.mp3".into(), descriptor(80.0, 0.01, 0.02, 800.0, 0.0));
        catalog.insert("c.mp3".into(), descriptor(100.0, 0.02, 0.05, 1500.0, 0.0));

        let ranked = rank_by_tempo(&catalog, "a.mp3").unwrap();
        let names: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["c.mp3", "b.mp3"]);
        assert!((ranked[0].1 - 40.0).abs() < 1e-9);
        assert!((ranked[1].1 - 60.0).abs() < 1e-9);
    }

    #[test]
    fn energy_ranking_uses_rescaled_scale() {
        let mut catalog = Catalog::new();
        catalog.insert("ref.mp3".into(), descriptor(100.0, 0.01, 0.1, 1000.0, 0.0));
        catalog.insert("near.mp3".into(), descriptor(100.0, 0.02, 0.1, 1000.0, 0.0));
        catalog.insert("far.mp3".into(), descriptor(100.0, 0.03, 0.1, 1000.0, 0.0));
        catalog.rescale_energy(); // ref=0, near=50, far=100

        let ranked = rank_by_energy(&catalog, "ref.mp3").unwrap();
        assert_eq!(ranked[0].0, "near.mp3");
        assert!((ranked[0].1 - 0.5).abs() < 1e-9);
        assert_eq!(ranked[1].0, "far.mp3");
        assert!((ranked[1].1 - 0.0).abs() < 1e-9);
    }

    #[test]
    fn tempo_ranking_unknown_reference_is_error() {
        let catalog = sample_catalog();
        assert!(rank_by_tempo(&catalog, "nope.mp3").is_err());
        assert!(rank_by_energy(&catalog, "nope.mp3").is_err());
    }
}
