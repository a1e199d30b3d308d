use crate::types::*;
use serde::{Deserialize, Serialize};

/// A finding picked for manual video review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewClip {
    pub player_name: String,
    pub suspicion_type: SuspicionType,
    pub confidence: f64,
    pub description: String,
    /// Seconds
    pub duration: u32,
    #[serde(rename = "tick_start")]
    pub tick_start: u32,
    #[serde(rename = "tick_end")]
    pub tick_end: u32,
}

/// Review order: lower comes first
fn type_priority(kind: SuspicionType) -> u8 {
    match kind {
        SuspicionType::DamageBurst => 1,
        SuspicionType::ExtremeKdRatio => 2,
        SuspicionType::UnusualAccuracy => 3,
        SuspicionType::UnusualHeadshotRate => 4,
    }
}

fn base_duration(kind: SuspicionType) -> u32 {
    match kind {
        SuspicionType::DamageBurst => 6,
        SuspicionType::ExtremeKdRatio => 8,
        SuspicionType::UnusualAccuracy => 5,
        SuspicionType::UnusualHeadshotRate => 7,
    }
}

/// Clip length in seconds; obvious findings get tighter clips, borderline
/// ones get extra context
pub fn clip_duration(moment: &SuspiciousMoment) -> u32 {
    let base = base_duration(moment.suspicion_type);
    if moment.confidence > 0.85 {
        base.saturating_sub(2).max(2)
    } else if moment.confidence > 0.75 {
        base
    } else {
        base + 2
    }
}

/// Clip window of `duration` seconds centred on the finding's tick range
fn clip_window(moment: &SuspiciousMoment, duration: u32, config: &AnalyzerConfig) -> (u32, u32) {
    let center = moment.tick_start / 2 + moment.tick_end / 2 + (moment.tick_start % 2 + moment.tick_end % 2) / 2;
    let half = duration.saturating_mul(config.ticks_per_second) / 2;
    (center.saturating_sub(half), center.saturating_add(half))
}

/// Pick findings for review at a sensitivity level (1 = only the most
/// obvious, 5 = nearly everything)
pub fn select_for_review(
    moments: &[SuspiciousMoment],
    sensitivity: u8,
    max_clips: usize,
    config: &AnalyzerConfig,
) -> Vec<ReviewClip> {
    let threshold = config.clip_threshold(sensitivity);

    let mut selected: Vec<&SuspiciousMoment> = moments
        .iter()
        .filter(|m| m.confidence >= threshold)
        .collect();
    selected.sort_by(|a, b| {
        type_priority(a.suspicion_type)
            .cmp(&type_priority(b.suspicion_type))
            .then(b.confidence.total_cmp(&a.confidence))
    });

    selected
        .into_iter()
        .take(max_clips.min(config.max_clip_count))
        .map(|moment| {
            let duration = clip_duration(moment);
            let (tick_start, tick_end) = clip_window(moment, duration, config);
            ReviewClip {
                player_name: moment.player_name.clone(),
                suspicion_type: moment.suspicion_type,
                confidence: moment.confidence,
                description: moment.description.clone(),
                duration,
                tick_start,
                tick_end,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moment(kind: SuspicionType, confidence: f64, start: u32, end: u32) -> SuspiciousMoment {
        SuspiciousMoment {
            player_name: "p".to_string(),
            team: "Terrorists".to_string(),
            suspicion_type: kind,
            description: String::new(),
            confidence,
            tick_start: start,
            tick_end: end,
            estimated_duration: 1.0,
        }
    }

    #[test]
    fn test_clip_duration_by_confidence() {
        assert_eq!(clip_duration(&moment(SuspicionType::DamageBurst, 0.95, 0, 0)), 4);
        assert_eq!(clip_duration(&moment(SuspicionType::ExtremeKdRatio, 0.8, 0, 0)), 8);
        assert_eq!(clip_duration(&moment(SuspicionType::UnusualAccuracy, 0.6, 0, 0)), 7);
        assert_eq!(clip_duration(&moment(SuspicionType::UnusualHeadshotRate, 0.9, 0, 0)), 5);
    }

    #[test]
    fn test_selection_filters_and_orders() {
        let moments = vec![
            moment(SuspicionType::UnusualHeadshotRate, 0.92, 0, 0),
            moment(SuspicionType::UnusualAccuracy, 0.85, 0, 1000),
            moment(SuspicionType::DamageBurst, 0.7, 0, 100),
            moment(SuspicionType::DamageBurst, 0.95, 0, 100),
            moment(SuspicionType::DamageBurst, 0.82, 0, 100),
        ];
        let config = AnalyzerConfig::default();

        let clips = select_for_review(&moments, 3, 10, &config);
        let picked: Vec<(SuspicionType, f64)> = clips.iter().map(|c| (c.suspicion_type, c.confidence)).collect();
        assert_eq!(
            picked,
            vec![
                (SuspicionType::DamageBurst, 0.95),
                (SuspicionType::DamageBurst, 0.82),
                (SuspicionType::UnusualAccuracy, 0.85),
                (SuspicionType::UnusualHeadshotRate, 0.92),
            ]
        );

        assert_eq!(select_for_review(&moments, 1, 10, &config).len(), 2);
        assert_eq!(select_for_review(&moments, 5, 2, &config).len(), 2);
        assert!(select_for_review(&[], 5, 2, &config).is_empty());
    }

    #[test]
    fn test_clip_window_is_centred() {
        let config = AnalyzerConfig::default();
        let clips = select_for_review(&[moment(SuspicionType::DamageBurst, 0.95, 1000, 1200)], 1, 1, &config);
        // 4 s at 64 ticks/s around tick 1100
        assert_eq!((clips[0].tick_start, clips[0].tick_end), (972, 1228));

        let early = select_for_review(&[moment(SuspicionType::ExtremeKdRatio, 0.88, 0, 10)], 3, 1, &config);
        assert_eq!(early[0].tick_start, 0);
    }

    #[test]
    fn test_clip_count_is_capped() {
        let moments: Vec<SuspiciousMoment> = (0..40u32)
            .map(|i| moment(SuspicionType::DamageBurst, 0.95, i * 1000, i * 1000 + 100))
            .collect();
        let config = AnalyzerConfig::default();
        assert_eq!(select_for_review(&moments, 5, 100, &config).len(), 15);
        assert_eq!(select_for_review(&moments, 5, 3, &config).len(), 3);

        let tight = AnalyzerConfig {
            max_clip_count: 2,
            ..AnalyzerConfig::default()
        };
        assert_eq!(select_for_review(&moments, 5, 10, &tight).len(), 2);
    }

    #[test]
    fn test_huge_tick_rate_does_not_overflow() {
        let config = AnalyzerConfig {
            ticks_per_second: u32::MAX,
            ..AnalyzerConfig::default()
        };
        let clips = select_for_review(&[moment(SuspicionType::DamageBurst, 0.95, 5000, 5000)], 1, 1, &config);
        assert_eq!(clips[0].tick_start, 0);
        assert_eq!(clips[0].tick_end, 5000 + u32::MAX / 2);
    }
}
