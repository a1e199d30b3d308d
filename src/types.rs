use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

pub type SteamId = u64;

/// Canonical side labels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    CounterTerrorist,
    Terrorist,
    Unknown,
}

impl TeamSide {
    /// Classify a raw team identifier from the replay.
    ///
    /// Enumerated side codes are matched exactly first (the engine's numeric
    /// codes `3`/`2` and the short/long names). Only then does substring
    /// matching apply, and the counter-terrorist check always runs before the
    /// terrorist one since "counter-terrorists" contains "terrorist".
    pub fn from_raw(raw: &str) -> Self {
        let team = raw.trim().to_ascii_lowercase();
        match team.as_str() {
            "3" | "ct" | "counter-terrorist" | "counter-terrorists" | "counterterrorist" => {
                return TeamSide::CounterTerrorist
            }
            "2" | "t" | "terrorist" | "terrorists" => return TeamSide::Terrorist,
            "0" | "1" | "unassigned" | "spectator" | "spectators" => return TeamSide::Unknown,
            _ => {}
        }

        if team.contains("spectator") || team.contains("unassigned") {
            return TeamSide::Unknown;
        }

        // "ct" only as a whole token, so labels like "victory" stay unknown
        let ct_token = team.split(|c: char| !c.is_ascii_alphanumeric()).any(|token| token == "ct");
        if team.contains("counter") || ct_token {
            TeamSide::CounterTerrorist
        } else if team.contains("terrorist") {
            TeamSide::Terrorist
        } else {
            TeamSide::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamSide::CounterTerrorist => "Counter-Terrorists",
            TeamSide::Terrorist => "Terrorists",
            TeamSide::Unknown => "Unknown",
        }
    }
}

/// The six recognized grenade categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UtilityKind {
    Decoy,
    Flash,
    HeGrenade,
    Incendiary,
    Molotov,
    Smoke,
}

impl UtilityKind {
    /// Map an equipment name from the replay to a utility category
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "decoy" | "decoy grenade" => Some(UtilityKind::Decoy),
            "flash" | "flashbang" => Some(UtilityKind::Flash),
            "he" | "hegrenade" | "he grenade" => Some(UtilityKind::HeGrenade),
            "incendiary" | "incgrenade" | "incendiary grenade" => Some(UtilityKind::Incendiary),
            "molotov" => Some(UtilityKind::Molotov),
            "smoke" | "smokegrenade" | "smoke grenade" => Some(UtilityKind::Smoke),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UtilityKind::Decoy => "Decoy",
            UtilityKind::Flash => "Flash",
            UtilityKind::HeGrenade => "HE Grenade",
            UtilityKind::Incendiary => "Incendiary",
            UtilityKind::Molotov => "Molotov",
            UtilityKind::Smoke => "Smoke",
        }
    }
}

/// A player as referenced by a single event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(alias = "steamId")]
    pub steam_id: SteamId,
    #[serde(default)]
    pub name: String,
    /// Raw team identifier; empty when the decoder did not report one
    #[serde(default)]
    pub team: String,
}

impl PlayerRef {
    pub fn new(steam_id: SteamId, name: &str, team: &str) -> Self {
        Self {
            steam_id,
            name: name.to_string(),
            team: team.to_string(),
        }
    }

    pub fn side(&self) -> TeamSide {
        TeamSide::from_raw(&self.team)
    }
}

/// Game phases reported by the replay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Init,
    Pregame,
    StartGamePhase,
    TeamSideSwitch,
    GameHalfEnded,
    GameEnded,
    #[serde(other)]
    Other,
}

/// One decoded replay event, in delivery order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    PlayerConnect {
        tick: u32,
        player: PlayerRef,
    },
    Kill {
        tick: u32,
        #[serde(default)]
        killer: Option<PlayerRef>,
        #[serde(default)]
        victim: Option<PlayerRef>,
        #[serde(default)]
        assister: Option<PlayerRef>,
        #[serde(default)]
        weapon: Option<String>,
        #[serde(default)]
        headshot: bool,
    },
    PlayerHurt {
        tick: u32,
        victim: PlayerRef,
        #[serde(default)]
        attacker: Option<PlayerRef>,
        #[serde(default)]
        health_damage: i32,
        #[serde(default)]
        armor_damage: i32,
    },
    RoundStart {
        tick: u32,
    },
    PhaseChanged {
        tick: u32,
        phase: GamePhase,
    },
    GrenadeThrown {
        tick: u32,
        #[serde(default)]
        thrower: Option<PlayerRef>,
        grenade: String,
    },
    BombPlanted {
        tick: u32,
        #[serde(default)]
        player: Option<PlayerRef>,
    },
    BombDefused {
        tick: u32,
        #[serde(default)]
        player: Option<PlayerRef>,
    },
}

impl MatchEvent {
    pub fn tick(&self) -> u32 {
        match self {
            MatchEvent::PlayerConnect { tick, .. }
            | MatchEvent::Kill { tick, .. }
            | MatchEvent::PlayerHurt { tick, .. }
            | MatchEvent::RoundStart { tick }
            | MatchEvent::PhaseChanged { tick, .. }
            | MatchEvent::GrenadeThrown { tick, .. }
            | MatchEvent::BombPlanted { tick, .. }
            | MatchEvent::BombDefused { tick, .. } => *tick,
        }
    }
}

/// End-of-match state exposed by the decoder once the stream is exhausted
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    #[serde(rename = "map")]
    pub map_name: String,
    pub ct_score: u32,
    pub t_score: u32,
    pub ticks: u32,
}

/// Weapon name -> kill count, kept in first-kill order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeaponTally {
    entries: Vec<(String, u32)>,
}

impl WeaponTally {
    pub fn record(&mut self, weapon: &str) {
        match self.entries.iter_mut().find(|(name, _)| name == weapon) {
            Some((_, count)) => *count += 1,
            None => self.entries.push((weapon.to_string(), 1)),
        }
    }

    pub fn get(&self, weapon: &str) -> u32 {
        self.entries
            .iter()
            .find(|(name, _)| name == weapon)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for WeaponTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// Ratios derived once reduction has finished
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub kd_ratio: f64,
    /// 0-100
    pub headshot_percent: f64,
    /// Fraction in [0, 1]
    pub accuracy: f64,
    pub rating: f64,
}

/// Running totals for one player
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerRecord {
    pub steam_id: SteamId,
    pub name: String,
    pub team: TeamSide,

    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshots: u32,
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub bomb_plants: u32,
    pub bomb_defuses: u32,

    pub weapons: WeaponTally,
    /// Distinct utility categories, in first-use order
    pub utility: Vec<UtilityKind>,

    /// `None` until the metric pass has run
    pub metrics: Option<DerivedMetrics>,
}

impl PlayerRecord {
    pub fn new(steam_id: SteamId, name: &str, team: TeamSide) -> Self {
        Self {
            steam_id,
            name: name.to_string(),
            team,
            kills: 0,
            deaths: 0,
            assists: 0,
            headshots: 0,
            damage_dealt: 0,
            damage_taken: 0,
            bomb_plants: 0,
            bomb_defuses: 0,
            weapons: WeaponTally::default(),
            utility: Vec::new(),
            metrics: None,
        }
    }

    /// Returns false if the category was already recorded
    pub fn add_utility(&mut self, kind: UtilityKind) -> bool {
        if self.utility.contains(&kind) {
            return false;
        }
        self.utility.push(kind);
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KillEntry {
    pub tick: u32,
    pub victim: String,
    pub weapon: String,
    pub headshot: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DamageEntry {
    pub tick: u32,
    pub victim: String,
    pub amount: u32,
}

/// Chronological offense history, read only by the anomaly detector
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerHistory {
    pub kills: Vec<KillEntry>,
    /// Damage dealt to other players only
    pub damage: Vec<DamageEntry>,
}

impl PlayerHistory {
    pub fn headshot_kills(&self) -> usize {
        self.kills.iter().filter(|k| k.headshot).count()
    }
}

/// Heuristic categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspicionType {
    DamageBurst,
    UnusualHeadshotRate,
    ExtremeKdRatio,
    UnusualAccuracy,
}

impl SuspicionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuspicionType::DamageBurst => "damage_burst",
            SuspicionType::UnusualHeadshotRate => "unusual_headshot_rate",
            SuspicionType::ExtremeKdRatio => "extreme_kd_ratio",
            SuspicionType::UnusualAccuracy => "unusual_accuracy",
        }
    }
}

/// An advisory, heuristically scored finding
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspiciousMoment {
    pub player_name: String,
    pub team: String,
    pub suspicion_type: SuspicionType,
    pub description: String,
    /// In [0, 1]
    pub confidence: f64,
    #[serde(rename = "tick_start")]
    pub tick_start: u32,
    #[serde(rename = "tick_end")]
    pub tick_end: u32,
    /// Seconds
    pub estimated_duration: f64,
}

/// Coarse mode label inferred from the player count
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "wingman")]
    Wingman,
    #[serde(rename = "deathmatch")]
    Deathmatch,
    #[serde(rename = "5v5")]
    Competitive,
}

impl GameMode {
    pub fn from_player_count(count: usize) -> Self {
        if count <= 4 {
            GameMode::Wingman
        } else if count <= 8 {
            GameMode::Deathmatch
        } else {
            GameMode::Competitive
        }
    }
}

/// Per-player entry of the output document
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub name: String,
    pub steam_id: SteamId,
    pub team: String,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub headshots: u32,
    pub damage: u32,
    pub damage_taken: u32,
    pub utility: Vec<String>,
    pub plants: u32,
    pub defuses: u32,
    pub weapons: WeaponTally,
    pub accuracy: f64,
    pub hs_percent: f64,
    pub kd_ratio: f64,
    pub rating: f64,
}

/// The single document produced per analysis
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub success: bool,
    pub map: String,
    pub game_mode: GameMode,
    pub team_a_name: String,
    pub team_b_name: String,
    pub team_a_score: u32,
    pub team_b_score: u32,
    /// Ticks
    pub duration: u32,
    pub rounds: u32,
    pub total_kills: u32,
    pub players: Vec<PlayerResult>,
    pub suspicious_moments: Vec<SuspiciousMoment>,
}

/// Analyzer tuning parameters
///
/// Defaults reproduce the stock heuristic thresholds. None of these form a
/// statistical model; they are knobs for an advisory signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Replay tick rate used for tick -> second conversions
    pub ticks_per_second: u32,
    /// Assumed damage per landed shot for the accuracy estimate
    pub damage_per_shot: u32,

    /// Rating floor
    pub rating_floor: f64,
    pub rating_kill_weight: f64,
    pub rating_assist_weight: f64,
    pub rating_death_weight: f64,
    pub rating_divisor: f64,

    /// Damage burst window length (ticks)
    pub burst_window_ticks: u32,
    /// Burst fires when windowed damage exceeds this
    pub burst_damage_threshold: u32,
    /// Burst fires only when the window spans more than this many ticks
    pub burst_min_span_ticks: u32,
    pub burst_confidence_divisor: f64,
    pub burst_confidence_cap: f64,

    pub headshot_min_kills: usize,
    pub headshot_rate_threshold: f64,
    pub headshot_confidence_cap: f64,
    pub headshot_estimated_duration: f64,

    pub kd_min_kills: u32,
    pub kd_max_deaths: u32,
    pub kd_ratio_threshold: f64,
    pub kd_confidence_divisor: f64,
    pub kd_confidence_cap: f64,
    pub kd_estimated_duration: f64,

    pub accuracy_min_kills: u32,
    pub accuracy_threshold: f64,
    pub accuracy_confidence_divisor: f64,
    pub accuracy_confidence_cap: f64,
    pub accuracy_estimated_duration: f64,

    /// End tick of the placeholder range used by match-wide findings
    pub placeholder_window_end: u32,
    /// Findings kept after ranking
    pub max_findings: usize,

    /// Minimum confidence per review sensitivity level 1..=5
    pub clip_sensitivity_thresholds: [f64; 5],
    /// Threshold used for an out-of-range sensitivity level
    pub clip_default_threshold: f64,
    /// Upper bound on review clips per match
    pub max_clip_count: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 64,
            damage_per_shot: 25,
            rating_floor: 0.5,
            rating_kill_weight: 0.5,
            rating_assist_weight: 0.15,
            rating_death_weight: 0.3,
            rating_divisor: 5.0,
            burst_window_ticks: 128,
            burst_damage_threshold: 150,
            burst_min_span_ticks: 10,
            burst_confidence_divisor: 300.0,
            burst_confidence_cap: 0.95,
            headshot_min_kills: 5,
            headshot_rate_threshold: 0.5,
            headshot_confidence_cap: 0.92,
            headshot_estimated_duration: 5.0,
            kd_min_kills: 15,
            kd_max_deaths: 5,
            kd_ratio_threshold: 3.0,
            kd_confidence_divisor: 5.0,
            kd_confidence_cap: 0.88,
            kd_estimated_duration: 5.0,
            accuracy_min_kills: 10,
            accuracy_threshold: 0.55,
            accuracy_confidence_divisor: 0.75,
            accuracy_confidence_cap: 0.85,
            accuracy_estimated_duration: 4.0,
            placeholder_window_end: 1000,
            max_findings: 15,
            clip_sensitivity_thresholds: [0.90, 0.85, 0.80, 0.75, 0.50],
            clip_default_threshold: 0.80,
            max_clip_count: 15,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::error::AnalysisError::Config(e.to_string()))
    }

    /// Convert a tick span to seconds
    pub fn ticks_to_seconds(&self, ticks: u32) -> f64 {
        ticks as f64 / self.ticks_per_second.max(1) as f64
    }

    /// Minimum confidence for a review sensitivity level
    pub fn clip_threshold(&self, sensitivity: u8) -> f64 {
        match sensitivity {
            1..=5 => self.clip_sensitivity_thresholds[(sensitivity - 1) as usize],
            _ => self.clip_default_threshold,
        }
    }
}
