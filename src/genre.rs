use crate::config::GenreThresholds;

/// Classify a track's coarse genre from its raw tempo/energy pair.
///
/// The heuristic is an ordered rule table — first match wins, "Other" when
/// nothing fires. It must see the raw (pre-rescale) energy: the catalog's
/// 0–100 rescale would blow past the fixed thresholds.
pub fn classify(tempo: f64, energy: f64, t: &GenreThresholds) -> &'static str {
    let rules: [(&dyn Fn(f64, f64) -> bool, &'static str); 3] = [
        (
            &|tempo, energy| tempo > t.club_tempo && energy > t.club_energy,
            "Electronic/Club",
        ),
        (
            &|tempo, energy| tempo < t.chill_tempo && energy < t.chill_energy,
            "Chill/Hip-hop",
        ),
        (
            &|tempo, _| (t.pop_tempo_low..=t.pop_tempo_high).contains(&tempo),
            "Pop/Indie",
        ),
    ];

    rules
        .iter()
        .find(|(predicate, _)| predicate(tempo, energy))
        .map(|&(_, label)| label)
        .unwrap_or("Other")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> GenreThresholds {
        GenreThresholds::default()
    }

    #[test]
    fn fast_loud_is_electronic_club() {
        assert_eq!(classify(140.0, 0.05, &t()), "Electronic/Club");
    }

    #[test]
    fn slow_quiet_is_chill_hiphop() {
        assert_eq!(classify(80.0, 0.01, &t()), "Chill/Hip-hop");
    }

    #[test]
    fn mid_tempo_is_pop_indie() {
        assert_eq!(classify(100.0, 0.02, &t()), "Pop/Indie");
        // range is inclusive on both ends
        assert_eq!(classify(90.0, 0.05, &t()), "Pop/Indie");
        assert_eq!(classify(120.0, 0.05, &t()), "Pop/Indie");
    }

    #[test]
    fn no_rule_is_other() {
        // 125 BPM sits above the pop range but isn't loud enough for club
        assert_eq!(classify(125.0, 0.01, &t()), "Other");
        // fast but quiet
        assert_eq!(classify(140.0, 0.01, &t()), "Other");
        // slow but loud
        assert_eq!(classify(80.0, 0.05, &t()), "Other");
    }

    #[test]
    fn classification_is_deterministic() {
        assert_eq!(classify(140.0, 0.05, &t()), classify(140.0, 0.05, &t()));
    }

    #[test]
    fn failed_extraction_defaults_are_chill() {
        // tempo 0.0 / energy 0.0 fall through to rule 2
        assert_eq!(classify(0.0, 0.0, &t()), "Chill/Hip-hop");
    }

    #[test]
    fn custom_thresholds_shift_the_rules() {
        let custom = GenreThresholds {
            club_tempo: 100.0,
            club_energy: 0.01,
            ..GenreThresholds::default()
        };
        // 110 BPM / 0.02 would be Pop/Indie with defaults, but rule 1 now fires first
        assert_eq!(classify(110.0, 0.02, &custom), "Electronic/Club");
        assert_eq!(classify(110.0, 0.02, &t()), "Pop/Indie");
    }
}
