use crate::types::*;
use std::collections::HashMap;

/// Owns every player's record and history for one analysis.
///
/// Records are created lazily on first reference and never removed. The
/// slot order is the order players were first seen, which is the fallback
/// ordering wherever no other ordering applies.
#[derive(Clone, Debug, Default)]
pub struct PlayerRegistry {
    slots: HashMap<SteamId, usize>,
    records: Vec<PlayerRecord>,
    histories: Vec<PlayerHistory>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, steam_id: SteamId, default_name: &str, default_team: TeamSide) -> usize {
        if let Some(&slot) = self.slots.get(&steam_id) {
            return slot;
        }

        let slot = self.records.len();
        self.records.push(PlayerRecord::new(steam_id, default_name, default_team));
        self.histories.push(PlayerHistory::default());
        self.slots.insert(steam_id, slot);
        slot
    }

    /// Existing record for `steam_id`, or a fresh zeroed one with the given
    /// name and team
    pub fn get_or_create(
        &mut self,
        steam_id: SteamId,
        default_name: &str,
        default_team: TeamSide,
    ) -> &mut PlayerRecord {
        let slot = self.slot(steam_id, default_name, default_team);
        &mut self.records[slot]
    }

    /// Record and history together, creating both if needed
    pub fn entry(
        &mut self,
        steam_id: SteamId,
        default_name: &str,
        default_team: TeamSide,
    ) -> (&mut PlayerRecord, &mut PlayerHistory) {
        let slot = self.slot(steam_id, default_name, default_team);
        (&mut self.records[slot], &mut self.histories[slot])
    }

    pub fn get(&self, steam_id: SteamId) -> Option<&PlayerRecord> {
        self.slots.get(&steam_id).map(|&slot| &self.records[slot])
    }

    pub fn history(&self, steam_id: SteamId) -> Option<&PlayerHistory> {
        self.slots.get(&steam_id).map(|&slot| &self.histories[slot])
    }

    pub fn contains(&self, steam_id: SteamId) -> bool {
        self.slots.contains_key(&steam_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in first-seen order
    pub fn records(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.records.iter()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut PlayerRecord> {
        self.records.iter_mut()
    }

    /// (record, history) pairs in first-seen order
    pub fn players(&self) -> impl Iterator<Item = (&PlayerRecord, &PlayerHistory)> {
        self.records.iter().zip(self.histories.iter())
    }
}
