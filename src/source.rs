//! Decoder side of the pipeline.
//!
//! The analyzer only needs an ordered stream of [`MatchEvent`]s and the
//! end-of-match [`GameState`]. `JsonReplay` reads both from a JSON replay
//! export; anything else that can produce them plugs in through
//! [`EventSource`].

use crate::error::{AnalysisError, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;

/// Pull-style ordered event stream.
///
/// `Ok(None)` means the stream ended normally; `Err` means it could not be
/// decoded and the run must stop.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<MatchEvent>>;

    /// Valid once `next_event` has returned `Ok(None)`
    fn final_state(&self) -> GameState;
}

/// In-memory source
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    events: VecDeque<MatchEvent>,
    state: GameState,
}

impl VecSource {
    pub fn new(events: Vec<MatchEvent>, state: GameState) -> Self {
        Self {
            events: events.into(),
            state,
        }
    }
}

impl EventSource for VecSource {
    fn next_event(&mut self) -> Result<Option<MatchEvent>> {
        Ok(self.events.pop_front())
    }

    fn final_state(&self) -> GameState {
        self.state.clone()
    }
}

#[derive(Deserialize)]
struct ReplayDocument {
    #[serde(flatten)]
    state: GameState,
    #[serde(default)]
    events: Vec<MatchEvent>,
}

enum Pending {
    Decoded(VecDeque<MatchEvent>),
    /// JSON-lines: (1-based line number, raw line), decoded on demand
    Lines(VecDeque<(usize, String)>),
}

/// Decoder for JSON replay exports.
///
/// Accepts either a single document
/// `{"map": .., "ctScore": .., "tScore": .., "ticks": .., "events": [..]}`
/// or JSON-lines where the first line is the header and each following
/// non-blank line is one event.
pub struct JsonReplay {
    state: GameState,
    pending: Pending,
}

impl JsonReplay {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let document_err = match serde_json::from_str::<ReplayDocument>(text) {
            Ok(doc) => {
                return Ok(Self {
                    state: doc.state,
                    pending: Pending::Decoded(doc.events.into()),
                })
            }
            Err(e) => e,
        };

        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let Some((header_line, header)) = lines.next() else {
            return Err(AnalysisError::Decode("empty replay".to_string()));
        };
        // A header carrying "events" is a whole document that failed to
        // decode, not the first line of JSON-lines
        let header: serde_json::Value = match serde_json::from_str(header) {
            Ok(value) => value,
            Err(_) => return Err(document_err.into()),
        };
        if header.get("events").is_some() {
            return Err(document_err.into());
        }
        let state: GameState = serde_json::from_value(header).map_err(|_| AnalysisError::from(document_err))?;
        tracing::debug!(header_line, "reading replay as JSON lines");

        Ok(Self {
            state,
            pending: Pending::Lines(lines.map(|(n, line)| (n, line.to_string())).collect()),
        })
    }
}

impl EventSource for JsonReplay {
    fn next_event(&mut self) -> Result<Option<MatchEvent>> {
        match &mut self.pending {
            Pending::Decoded(events) => Ok(events.pop_front()),
            Pending::Lines(lines) => match lines.pop_front() {
                Some((line_no, line)) => serde_json::from_str(&line)
                    .map(Some)
                    .map_err(|e| AnalysisError::decode_at_line(line_no, e)),
                None => Ok(None),
            },
        }
    }

    fn final_state(&self) -> GameState {
        self.state.clone()
    }
}
