pub mod clips;
pub mod detector;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod reducer;
pub mod registry;
pub mod source;
pub mod summary;
pub mod types;

pub use engine::{analyze, MatchAnalyzer};
pub use error::{AnalysisError, Result};
pub use source::{EventSource, JsonReplay, VecSource};
pub use types::*;

use serde::Deserialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&format!("{}: {}", context, err)).into()
}

/// Report a fatal failure to the browser console
fn console_error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    tracing::error!("{}", message);
}

/// WASM-exposed incremental analyzer: push events one at a time, then
/// finish with the end-of-match state
#[wasm_bindgen]
pub struct ReplayAnalyzer {
    analyzer: MatchAnalyzer,
}

#[wasm_bindgen]
impl ReplayAnalyzer {
    /// Create an analyzer with default thresholds
    #[wasm_bindgen(constructor)]
    pub fn new() -> ReplayAnalyzer {
        ReplayAnalyzer {
            analyzer: MatchAnalyzer::new(AnalyzerConfig::default()),
        }
    }

    /// Create with custom config
    pub fn new_with_config(config_json: &str) -> std::result::Result<ReplayAnalyzer, JsValue> {
        let config = AnalyzerConfig::from_json(config_json).map_err(|e| js_error("Config", e))?;
        Ok(ReplayAnalyzer {
            analyzer: MatchAnalyzer::new(config),
        })
    }

    /// Feed one event (JSON object)
    pub fn push_event(&mut self, event_json: &str) -> std::result::Result<(), JsValue> {
        let event: MatchEvent =
            serde_json::from_str(event_json).map_err(|e| js_error("Event parse error", e))?;
        self.analyzer.ingest(&event);
        Ok(())
    }

    /// Feed a JSON array of events
    pub fn push_events(&mut self, events_json: &str) -> std::result::Result<usize, JsValue> {
        let events: Vec<MatchEvent> =
            serde_json::from_str(events_json).map_err(|e| js_error("Events parse error", e))?;
        for event in &events {
            self.analyzer.ingest(event);
        }
        Ok(events.len())
    }

    /// Number of events ingested so far
    pub fn event_count(&self) -> usize {
        self.analyzer.events_ingested()
    }

    /// Close the stream and return the summary JSON. The analyzer is reset
    /// (same config) so it can be reused for another match.
    pub fn finish(&mut self, final_state_json: &str) -> std::result::Result<String, JsValue> {
        let state: GameState = serde_json::from_str(final_state_json)
            .map_err(|e| js_error("Final state parse error", e))?;

        let fresh = MatchAnalyzer::new(self.analyzer.config().clone());
        let analyzer = std::mem::replace(&mut self.analyzer, fresh);
        analyzer
            .finish(&state)
            .to_json(false)
            .map_err(|e| js_error("Serialization", e))
    }

    /// Get default config as JSON
    pub fn get_default_config() -> String {
        serde_json::to_string(&AnalyzerConfig::default()).unwrap_or_default()
    }
}

impl Default for ReplayAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze a full JSON replay export. Always returns a JSON document:
/// the summary on success, `{"success": false, "error": ..}` otherwise.
#[wasm_bindgen]
pub fn analyze_replay(replay_json: &str) -> String {
    let result = JsonReplay::parse(replay_json)
        .and_then(|mut replay| analyze(&mut replay, AnalyzerConfig::default()))
        .and_then(|summary| summary.to_json(false));

    match result {
        Ok(json) => json,
        Err(err) => {
            console_error(&err.to_string());
            summary::failure_json(&err)
        }
    }
}

#[derive(Deserialize)]
struct SummaryFindings {
    #[serde(rename = "suspiciousMoments", default)]
    suspicious_moments: Vec<SuspiciousMoment>,
}

/// Pick review clips from a summary document produced by this crate
#[wasm_bindgen]
pub fn select_clips(summary_json: &str, sensitivity: u8, max_clips: usize) -> std::result::Result<String, JsValue> {
    let summary: SummaryFindings =
        serde_json::from_str(summary_json).map_err(|e| js_error("Summary parse error", e))?;

    let clips = clips::select_for_review(
        &summary.suspicious_moments,
        sensitivity,
        max_clips,
        &AnalyzerConfig::default(),
    );
    serde_json::to_string(&clips).map_err(|e| js_error("Serialization", e))
}
