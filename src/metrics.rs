//! Derived per-player ratios.
//!
//! Everything here is a pure function of a record's final counters, so
//! running the pass twice yields identical metrics.

use crate::registry::PlayerRegistry;
use crate::types::*;

/// Kills per death; a deathless player's ratio is their kill count
pub fn kd_ratio(kills: u32, deaths: u32) -> f64 {
    if deaths > 0 {
        kills as f64 / deaths as f64
    } else {
        kills as f64
    }
}

/// Headshots as a percentage of kills
pub fn headshot_percent(headshots: u32, kills: u32) -> f64 {
    if kills == 0 {
        return 0.0;
    }
    (100.0 * headshots as f64 / kills as f64).clamp(0.0, 100.0)
}

/// Floor-clamped composite score
pub fn rating(kills: u32, assists: u32, deaths: u32, config: &AnalyzerConfig) -> f64 {
    let raw = (config.rating_kill_weight * kills as f64
        + config.rating_assist_weight * assists as f64
        - config.rating_death_weight * deaths as f64)
        / config.rating_divisor;
    raw.max(config.rating_floor)
}

/// Rough hit-rate proxy in [0, 1] from damage dealt and an assumed
/// damage-per-shot constant
pub fn estimated_accuracy(kills: u32, damage_dealt: u32, config: &AnalyzerConfig) -> f64 {
    if kills == 0 || damage_dealt == 0 || config.damage_per_shot == 0 {
        return 0.0;
    }
    let estimated_shots = damage_dealt / config.damage_per_shot;
    if estimated_shots == 0 {
        return 0.0;
    }
    (100.0 * kills as f64 / estimated_shots as f64).clamp(0.0, 100.0) / 100.0
}

pub fn derive(record: &PlayerRecord, config: &AnalyzerConfig) -> DerivedMetrics {
    DerivedMetrics {
        kd_ratio: kd_ratio(record.kills, record.deaths),
        headshot_percent: headshot_percent(record.headshots, record.kills),
        accuracy: estimated_accuracy(record.kills, record.damage_dealt, config),
        rating: rating(record.kills, record.assists, record.deaths, config),
    }
}

/// Populate `metrics` on every record
pub fn apply_all(registry: &mut PlayerRegistry, config: &AnalyzerConfig) {
    for record in registry.records_mut() {
        record.metrics = Some(derive(record, config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kills: u32, deaths: u32, assists: u32, headshots: u32, damage: u32) -> PlayerRecord {
        let mut record = PlayerRecord::new(1, "p", TeamSide::Terrorist);
        record.kills = kills;
        record.deaths = deaths;
        record.assists = assists;
        record.headshots = headshots;
        record.damage_dealt = damage;
        record
    }

    #[test]
    fn test_kd_ratio_zero_deaths_uses_kills() {
        assert_eq!(kd_ratio(7, 0), 7.0);
        assert_eq!(kd_ratio(0, 0), 0.0);
        assert_eq!(kd_ratio(20, 2), 10.0);
    }

    #[test]
    fn test_headshot_percent() {
        assert_eq!(headshot_percent(18, 20), 90.0);
        assert_eq!(headshot_percent(0, 0), 0.0);
    }

    #[test]
    fn test_rating_has_floor() {
        let config = AnalyzerConfig::default();
        assert_eq!(rating(0, 0, 20, &config), 0.5);
        // (0.5*20 + 0.15*5 - 0.3*10) / 5 = 1.55
        assert!((rating(20, 5, 10, &config) - 1.55).abs() < 1e-9);
    }

    #[test]
    fn test_accuracy_estimate() {
        let config = AnalyzerConfig::default();
        // 2000 damage -> 80 shots; 20 kills -> 25%
        assert!((estimated_accuracy(20, 2000, &config) - 0.25).abs() < 1e-9);
        // Fewer shots than kills clamps to 1.0
        assert_eq!(estimated_accuracy(10, 100, &config), 1.0);
        // Under one estimated shot stays at zero
        assert_eq!(estimated_accuracy(1, 24, &config), 0.0);
        assert_eq!(estimated_accuracy(0, 500, &config), 0.0);
    }

    #[test]
    fn test_derive_is_idempotent() {
        let config = AnalyzerConfig::default();
        let mut registry = PlayerRegistry::new();
        *registry.get_or_create(1, "p", TeamSide::Terrorist) = record(20, 2, 3, 18, 2600);

        apply_all(&mut registry, &config);
        let first = registry.get(1).unwrap().metrics.unwrap();
        apply_all(&mut registry, &config);
        let second = registry.get(1).unwrap().metrics.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.kd_ratio, 10.0);
        assert_eq!(first.headshot_percent, 90.0);
    }
}
