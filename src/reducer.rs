use crate::registry::PlayerRegistry;
use crate::types::*;
use tracing::{debug, warn};

/// Kinds of event that signal a new round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryKind {
    RoundStart,
    SideSwitch,
}

/// Output of a completed reduction pass
#[derive(Debug)]
pub struct ReducedMatch {
    pub registry: PlayerRegistry,
    pub total_kills: u32,
    pub rounds: u32,
}

/// Single-pass fold over the ordered event stream
#[derive(Debug, Default)]
pub struct EventReducer {
    registry: PlayerRegistry,
    total_kills: u32,
    round_starts: u32,
    side_switches: u32,
    last_tick: Option<u32>,
    events_applied: usize,
}

impl EventReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event. Never fails; missing references are skipped.
    pub fn apply(&mut self, event: &MatchEvent) {
        let tick = event.tick();
        if let Some(last) = self.last_tick {
            if tick < last {
                warn!(tick, last, "event tick went backwards; applying anyway");
            }
        }
        self.last_tick = Some(self.last_tick.map_or(tick, |last| last.max(tick)));
        self.events_applied += 1;

        match event {
            MatchEvent::PlayerConnect { player, .. } => {
                self.registry
                    .get_or_create(player.steam_id, &player.name, player.side());
            }
            MatchEvent::Kill {
                tick,
                killer,
                victim,
                assister,
                weapon,
                headshot,
            } => self.on_kill(
                *tick,
                killer.as_ref(),
                victim.as_ref(),
                assister.as_ref(),
                weapon.as_deref(),
                *headshot,
            ),
            MatchEvent::PlayerHurt {
                tick,
                victim,
                attacker,
                health_damage,
                armor_damage,
            } => self.on_damage(*tick, victim, attacker.as_ref(), *health_damage, *armor_damage),
            MatchEvent::RoundStart { .. } => self.on_boundary(BoundaryKind::RoundStart),
            MatchEvent::PhaseChanged { phase, .. } => {
                if *phase == GamePhase::TeamSideSwitch {
                    self.on_boundary(BoundaryKind::SideSwitch);
                }
            }
            MatchEvent::GrenadeThrown { thrower, grenade, .. } => {
                let Some(thrower) = thrower else {
                    debug!(grenade = grenade.as_str(), "grenade without thrower");
                    return;
                };
                let record = self.touch(thrower);
                match UtilityKind::from_raw(grenade) {
                    Some(kind) => {
                        record.add_utility(kind);
                    }
                    None => debug!(grenade = grenade.as_str(), "unrecognized grenade type"),
                }
            }
            MatchEvent::BombPlanted { player, .. } => {
                if let Some(player) = player {
                    self.touch(player).bomb_plants += 1;
                }
            }
            MatchEvent::BombDefused { player, .. } => {
                if let Some(player) = player {
                    self.touch(player).bomb_defuses += 1;
                }
            }
        }
    }

    /// Resolve a reference to its record; a non-empty name overwrites the
    /// stored one so renames are last-write-wins
    fn touch(&mut self, player: &PlayerRef) -> &mut PlayerRecord {
        let record = self
            .registry
            .get_or_create(player.steam_id, &player.name, player.side());
        if !player.name.is_empty() && record.name != player.name {
            record.name = player.name.clone();
        }
        record
    }

    fn on_kill(
        &mut self,
        tick: u32,
        killer: Option<&PlayerRef>,
        victim: Option<&PlayerRef>,
        assister: Option<&PlayerRef>,
        weapon: Option<&str>,
        headshot: bool,
    ) {
        // Counted even when neither side resolves
        self.total_kills += 1;

        let weapon = weapon.filter(|w| !w.is_empty());

        if let Some(killer) = killer {
            self.touch(killer);
            let (record, history) =
                self.registry
                    .entry(killer.steam_id, &killer.name, killer.side());
            record.kills += 1;
            if !killer.team.is_empty() {
                record.team = killer.side();
            }
            if headshot {
                record.headshots += 1;
            }
            if let Some(weapon) = weapon {
                record.weapons.record(weapon);
            }
            history.kills.push(KillEntry {
                tick,
                victim: victim
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                weapon: weapon.unwrap_or("Unknown").to_string(),
                headshot,
            });
        } else {
            debug!(tick, "kill without killer");
        }

        if let Some(assister) = assister {
            let is_killer = killer.map_or(false, |k| k.steam_id == assister.steam_id);
            if is_killer {
                debug!(tick, steam_id = assister.steam_id, "killer listed as own assister");
            } else {
                self.touch(assister).assists += 1;
            }
        }

        if let Some(victim) = victim {
            let record = self.touch(victim);
            record.deaths += 1;
            if !victim.team.is_empty() {
                record.team = victim.side();
            }
        }
    }

    fn on_damage(
        &mut self,
        tick: u32,
        victim: &PlayerRef,
        attacker: Option<&PlayerRef>,
        health_damage: i32,
        armor_damage: i32,
    ) {
        let total = health_damage.max(0) as u32 + armor_damage.max(0) as u32;

        let taken = &mut self.touch(victim).damage_taken;
        *taken = taken.saturating_add(total);

        let Some(attacker) = attacker else {
            return;
        };
        if attacker.steam_id == victim.steam_id {
            return;
        }

        self.touch(attacker);
        let (record, history) =
            self.registry
                .entry(attacker.steam_id, &attacker.name, attacker.side());
        record.damage_dealt = record.damage_dealt.saturating_add(total);
        history.damage.push(DamageEntry {
            tick,
            victim: victim.name.clone(),
            amount: total,
        });
    }

    fn on_boundary(&mut self, kind: BoundaryKind) {
        match kind {
            BoundaryKind::RoundStart => self.round_starts += 1,
            BoundaryKind::SideSwitch => self.side_switches += 1,
        }
    }

    /// High-water mark across boundary kinds; never their sum
    pub fn rounds(&self) -> u32 {
        self.round_starts.max(self.side_switches)
    }

    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    pub fn events_applied(&self) -> usize {
        self.events_applied
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn finish(self) -> ReducedMatch {
        let rounds = self.rounds();
        ReducedMatch {
            registry: self.registry,
            total_kills: self.total_kills,
            rounds,
        }
    }
}
