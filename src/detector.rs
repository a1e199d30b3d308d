use crate::registry::PlayerRegistry;
use crate::types::*;
use tracing::debug;

/// Per-player heuristic scan over final metrics and offense history.
///
/// Players are scanned independently; nothing here compares one player
/// against another.
pub struct AnomalyDetector {
    config: AnalyzerConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Scan every player and return the ranked, truncated findings
    pub fn scan(&self, registry: &PlayerRegistry) -> Vec<SuspiciousMoment> {
        let mut moments: Vec<SuspiciousMoment> = registry
            .players()
            .flat_map(|(record, history)| self.scan_player(record, history))
            .collect();

        rank(&mut moments, self.config.max_findings);
        moments
    }

    /// All findings for a single player, in heuristic order
    pub fn scan_player(&self, record: &PlayerRecord, history: &PlayerHistory) -> Vec<SuspiciousMoment> {
        let mut found = Vec::new();
        found.extend(self.detect_damage_burst(record, &history.damage));
        found.extend(self.detect_headshot_rate(record, &history.kills));

        match record.metrics {
            Some(metrics) => {
                found.extend(self.detect_extreme_kd(record, &metrics));
                found.extend(self.detect_unusual_accuracy(record, &metrics));
            }
            None => debug!(steam_id = record.steam_id, "metrics not derived; skipping ratio checks"),
        }
        found
    }

    /// First window (earliest start index) whose damage crosses the
    /// threshold over a long enough span
    pub fn detect_damage_burst(&self, record: &PlayerRecord, damage: &[DamageEntry]) -> Option<SuspiciousMoment> {
        let config = &self.config;

        for (i, first) in damage.iter().enumerate() {
            let start = first.tick;
            let mut end = start;
            let mut burst_damage = 0u32;

            for entry in &damage[i..] {
                if entry.tick.saturating_sub(start) >= config.burst_window_ticks {
                    break;
                }
                burst_damage = burst_damage.saturating_add(entry.amount);
                end = entry.tick.max(end);
            }

            let span = end - start;
            if burst_damage > config.burst_damage_threshold && span > config.burst_min_span_ticks {
                return Some(SuspiciousMoment {
                    player_name: record.name.clone(),
                    team: record.team.label().to_string(),
                    suspicion_type: SuspicionType::DamageBurst,
                    description: format!(
                        "High damage burst: {} damage in {} ticks",
                        burst_damage, span
                    ),
                    confidence: (burst_damage as f64 / config.burst_confidence_divisor)
                        .min(config.burst_confidence_cap),
                    tick_start: start,
                    tick_end: end,
                    estimated_duration: config.ticks_to_seconds(span),
                });
            }
        }
        None
    }

    pub fn detect_headshot_rate(&self, record: &PlayerRecord, kills: &[KillEntry]) -> Option<SuspiciousMoment> {
        let config = &self.config;
        if kills.len() < config.headshot_min_kills || kills.is_empty() {
            return None;
        }

        let headshots = kills.iter().filter(|k| k.headshot).count();
        let rate = headshots as f64 / kills.len() as f64;
        if rate <= config.headshot_rate_threshold {
            return None;
        }

        Some(SuspiciousMoment {
            player_name: record.name.clone(),
            team: record.team.label().to_string(),
            suspicion_type: SuspicionType::UnusualHeadshotRate,
            description: format!(
                "Unusual headshot rate: {:.1}% ({}/{})",
                rate * 100.0,
                headshots,
                kills.len()
            ),
            confidence: rate.min(config.headshot_confidence_cap),
            tick_start: kills[0].tick,
            tick_end: kills[kills.len() - 1].tick,
            estimated_duration: config.headshot_estimated_duration,
        })
    }

    pub fn detect_extreme_kd(&self, record: &PlayerRecord, metrics: &DerivedMetrics) -> Option<SuspiciousMoment> {
        let config = &self.config;
        if record.kills <= config.kd_min_kills
            || record.deaths >= config.kd_max_deaths
            || metrics.kd_ratio <= config.kd_ratio_threshold
        {
            return None;
        }

        Some(SuspiciousMoment {
            player_name: record.name.clone(),
            team: record.team.label().to_string(),
            suspicion_type: SuspicionType::ExtremeKdRatio,
            description: format!(
                "Extreme K/D ratio: {:.2} ({} kills, {} deaths)",
                metrics.kd_ratio, record.kills, record.deaths
            ),
            confidence: (metrics.kd_ratio / config.kd_confidence_divisor).min(config.kd_confidence_cap),
            tick_start: 0,
            tick_end: config.placeholder_window_end,
            estimated_duration: config.kd_estimated_duration,
        })
    }

    pub fn detect_unusual_accuracy(&self, record: &PlayerRecord, metrics: &DerivedMetrics) -> Option<SuspiciousMoment> {
        let config = &self.config;
        if record.kills <= config.accuracy_min_kills || metrics.accuracy <= config.accuracy_threshold {
            return None;
        }

        Some(SuspiciousMoment {
            player_name: record.name.clone(),
            team: record.team.label().to_string(),
            suspicion_type: SuspicionType::UnusualAccuracy,
            description: format!(
                "Unusually high accuracy: {:.1}% (from {} kills)",
                metrics.accuracy * 100.0,
                record.kills
            ),
            confidence: (metrics.accuracy / config.accuracy_confidence_divisor)
                .min(config.accuracy_confidence_cap),
            tick_start: 0,
            tick_end: config.placeholder_window_end,
            estimated_duration: config.accuracy_estimated_duration,
        })
    }
}

/// Confidence-descending, stable for ties, capped at `max`
pub fn rank(moments: &mut Vec<SuspiciousMoment>, max: usize) {
    moments.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    moments.truncate(max);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(AnalyzerConfig::default())
    }

    fn player(kills: u32, deaths: u32, headshots: u32, damage: u32) -> PlayerRecord {
        let mut record = PlayerRecord::new(1, "suspect", TeamSide::CounterTerrorist);
        record.kills = kills;
        record.deaths = deaths;
        record.headshots = headshots;
        record.damage_dealt = damage;
        record.metrics = Some(metrics::derive(&record, &AnalyzerConfig::default()));
        record
    }

    fn hits(ticks_and_damage: &[(u32, u32)]) -> Vec<DamageEntry> {
        ticks_and_damage
            .iter()
            .map(|&(tick, amount)| DamageEntry {
                tick,
                victim: "target".to_string(),
                amount,
            })
            .collect()
    }

    fn kills(count: usize, headshots: usize) -> Vec<KillEntry> {
        (0..count)
            .map(|i| KillEntry {
                tick: 1000 + i as u32 * 500,
                victim: format!("v{}", i),
                weapon: "ak47".to_string(),
                headshot: i < headshots,
            })
            .collect()
    }

    #[test]
    fn test_damage_burst_fires_on_first_qualifying_window() {
        let record = player(3, 1, 0, 400);
        let damage = hits(&[(0, 20), (1000, 100), (1040, 100), (1100, 27), (1120, 100)]);

        let moment = detector().detect_damage_burst(&record, &damage).unwrap();
        assert_eq!(moment.suspicion_type, SuspicionType::DamageBurst);
        assert_eq!(moment.tick_start, 1000);
        assert_eq!(moment.tick_end, 1120);
        assert_eq!(moment.description, "High damage burst: 327 damage in 120 ticks");
        assert_eq!(moment.confidence, 0.95);
        assert!((moment.estimated_duration - 120.0 / 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_damage_burst_requires_span_and_window() {
        let record = player(3, 1, 0, 400);

        // Enough damage but all on the same few ticks
        let instant = hits(&[(500, 100), (502, 100)]);
        assert!(detector().detect_damage_burst(&record, &instant).is_none());

        // Spread just outside the window
        let spread = hits(&[(0, 100), (128, 100), (256, 100)]);
        assert!(detector().detect_damage_burst(&record, &spread).is_none());

        // Exactly at the threshold does not exceed it
        let threshold = hits(&[(0, 75), (20, 75)]);
        assert!(detector().detect_damage_burst(&record, &threshold).is_none());
    }

    #[test]
    fn test_damage_burst_confidence_scales_below_cap() {
        let record = player(3, 1, 0, 180);
        let damage = hits(&[(0, 90), (64, 90)]);
        let moment = detector().detect_damage_burst(&record, &damage).unwrap();
        assert!((moment.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_headshot_rate_scenario() {
        let record = player(20, 2, 18, 2600);
        let history = kills(20, 18);

        let moment = detector().detect_headshot_rate(&record, &history).unwrap();
        assert!((moment.confidence - 0.9).abs() < 1e-9);
        assert_eq!(moment.tick_start, 1000);
        assert_eq!(moment.tick_end, 1000 + 19 * 500);
        assert_eq!(moment.description, "Unusual headshot rate: 90.0% (18/20)");
    }

    #[test]
    fn test_headshot_rate_needs_five_kills_and_majority() {
        let record = player(4, 0, 4, 400);
        assert!(detector().detect_headshot_rate(&record, &kills(4, 4)).is_none());
        assert!(detector().detect_headshot_rate(&record, &kills(10, 5)).is_none());

        let capped = detector().detect_headshot_rate(&record, &kills(6, 6)).unwrap();
        assert_eq!(capped.confidence, 0.92);
    }

    #[test]
    fn test_extreme_kd() {
        let record = player(20, 2, 0, 0);
        let metrics = record.metrics.unwrap();
        let moment = detector().detect_extreme_kd(&record, &metrics).unwrap();
        assert_eq!(moment.confidence, 0.88);
        assert_eq!((moment.tick_start, moment.tick_end), (0, 1000));

        let modest = player(16, 4, 0, 0);
        let moment = detector().detect_extreme_kd(&modest, &modest.metrics.unwrap()).unwrap();
        assert!((moment.confidence - 0.8).abs() < 1e-9);

        let too_many_deaths = player(30, 5, 0, 0);
        assert!(detector()
            .detect_extreme_kd(&too_many_deaths, &too_many_deaths.metrics.unwrap())
            .is_none());

        let fifteen = player(15, 0, 0, 0);
        assert!(detector().detect_extreme_kd(&fifteen, &fifteen.metrics.unwrap()).is_none());
    }

    #[test]
    fn test_unusual_accuracy() {
        // 11 kills over 450 damage -> 18 shots -> 61.1%
        let record = player(11, 5, 0, 450);
        let metrics = record.metrics.unwrap();
        let moment = detector().detect_unusual_accuracy(&record, &metrics).unwrap();
        assert!((moment.confidence - (11.0 / 18.0) / 0.75).abs() < 1e-9);

        let sharp = player(12, 5, 0, 300);
        let moment = detector().detect_unusual_accuracy(&sharp, &sharp.metrics.unwrap()).unwrap();
        assert_eq!(moment.confidence, 0.85);

        let few_kills = player(10, 0, 0, 100);
        assert!(detector()
            .detect_unusual_accuracy(&few_kills, &few_kills.metrics.unwrap())
            .is_none());
    }

    #[test]
    fn test_missing_metrics_skips_ratio_checks() {
        let mut record = player(20, 0, 0, 300);
        record.metrics = None;
        let found = detector().scan_player(&record, &PlayerHistory::default());
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_ranks_and_truncates() {
        let config = AnalyzerConfig::default();
        let mut registry = PlayerRegistry::new();
        for id in 0..20u64 {
            let (record, history) = registry.entry(id, &format!("p{}", id), TeamSide::Terrorist);
            record.kills = 20;
            record.deaths = 1;
            record.headshots = 15;
            history.kills = kills(20, 15);
        }
        metrics::apply_all(&mut registry, &config);

        let moments = AnomalyDetector::new(config).scan(&registry);
        assert_eq!(moments.len(), 15);
        assert!(moments.windows(2).all(|w| w[0].confidence >= w[1].confidence));

        // K/D findings (0.88) outrank headshot findings (0.75); ties keep
        // registry order
        assert_eq!(moments[0].suspicion_type, SuspicionType::ExtremeKdRatio);
        assert_eq!(moments[0].player_name, "p0");
        assert_eq!(moments[1].player_name, "p1");
    }

    #[test]
    fn test_rank_is_stable_for_equal_confidence() {
        let make = |name: &str, confidence: f64| SuspiciousMoment {
            player_name: name.to_string(),
            team: "Terrorists".to_string(),
            suspicion_type: SuspicionType::UnusualAccuracy,
            description: String::new(),
            confidence,
            tick_start: 0,
            tick_end: 1000,
            estimated_duration: 4.0,
        };
        let mut moments = vec![make("a", 0.7), make("b", 0.9), make("c", 0.7), make("d", 0.9)];
        rank(&mut moments, 3);

        let names: Vec<&str> = moments.iter().map(|m| m.player_name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a"]);
    }
}
