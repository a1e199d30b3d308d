use crate::error::{AnalysisError, Result};
use crate::reducer::ReducedMatch;
use crate::types::*;
use serde::Serialize;

const MAP_PREFIXES: [&str; 4] = ["de_", "cs_", "aim_", "fy_"];
const UNKNOWN_MAP: &str = "Unknown";

/// Display name for a raw map identifier, e.g. `de_dust2` -> `Dust2`.
/// Only the first matching prefix is stripped.
pub fn normalize_map_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = MAP_PREFIXES
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);

    let mut chars = stripped.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => UNKNOWN_MAP.to_string(),
    }
}

/// Final side scores, falling back to a kill-share estimate when the
/// decoder reports 0-0.
///
/// The fallback lifts the trailing side to 13 whenever the other side's
/// estimate is higher, which can yield lines like 12-13 that no real match
/// ends on. Kept as-is for output compatibility.
pub fn resolve_scores(state: &GameState, players: &[PlayerResult]) -> (u32, u32) {
    if state.ct_score != 0 || state.t_score != 0 {
        return (state.ct_score, state.t_score);
    }

    // Everyone not on the CT side counts for team B, unknown teams included
    let (team_a_kills, team_b_kills) = players.iter().fold((0u32, 0u32), |(a, b), p| {
        if p.team == TeamSide::CounterTerrorist.label() {
            (a + p.kills, b)
        } else {
            (a, b + p.kills)
        }
    });
    let total = team_a_kills + team_b_kills;
    if total == 0 {
        return (0, 0);
    }

    let mut score_a = 16 * team_a_kills / total;
    let mut score_b = 16 * team_b_kills / total;
    if score_a > score_b {
        score_b = score_b.max(13);
    } else if score_b > score_a {
        score_a = score_a.max(13);
    }
    (score_a, score_b)
}

pub fn player_result(record: &PlayerRecord) -> PlayerResult {
    let metrics = record.metrics.unwrap_or_default();
    PlayerResult {
        name: record.name.clone(),
        steam_id: record.steam_id,
        team: record.team.label().to_string(),
        kills: record.kills,
        deaths: record.deaths,
        assists: record.assists,
        headshots: record.headshots,
        damage: record.damage_dealt,
        damage_taken: record.damage_taken,
        utility: record.utility.iter().map(|u| u.label().to_string()).collect(),
        plants: record.bomb_plants,
        defuses: record.bomb_defuses,
        weapons: record.weapons.clone(),
        accuracy: metrics.accuracy,
        hs_percent: metrics.headshot_percent,
        kd_ratio: metrics.kd_ratio,
        rating: metrics.rating,
    }
}

/// Assemble the output document from a finished reduction
pub fn build(reduced: &ReducedMatch, state: &GameState, moments: Vec<SuspiciousMoment>) -> MatchSummary {
    let mut players: Vec<PlayerResult> = reduced.registry.records().map(player_result).collect();
    // Stable: equal kill counts keep first-seen order
    players.sort_by(|a, b| b.kills.cmp(&a.kills));

    let (team_a_score, team_b_score) = resolve_scores(state, &players);

    MatchSummary {
        success: true,
        map: normalize_map_name(&state.map_name),
        game_mode: GameMode::from_player_count(players.len()),
        team_a_name: TeamSide::CounterTerrorist.label().to_string(),
        team_b_name: TeamSide::Terrorist.label().to_string(),
        team_a_score,
        team_b_score,
        duration: state.ticks,
        rounds: reduced.rounds,
        total_kills: reduced.total_kills,
        players,
        suspicious_moments: moments,
    }
}

impl MatchSummary {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| AnalysisError::Serialization(e.to_string()))
    }
}

#[derive(Serialize)]
struct FailureDocument<'a> {
    success: bool,
    error: &'a str,
}

/// `{"success": false, "error": ...}` for a fatal failure
pub fn failure_json(error: &AnalysisError) -> String {
    let message = error.to_string();
    serde_json::to_string(&FailureDocument {
        success: false,
        error: &message,
    })
    .unwrap_or_else(|_| r#"{"success":false,"error":"unknown error"}"#.to_string())
}
