//! Browser-side checks for the exported wasm surface.
#![cfg(target_arch = "wasm32")]

use replay_insight::{analyze_replay, select_clips, ReplayAnalyzer};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const KILL: &str = r#"{"type":"kill","tick":100,
    "killer":{"steamId":1,"name":"a","team":"CT"},
    "victim":{"steamId":2,"name":"b","team":"T"},
    "weapon":"awp","headshot":false}"#;

#[wasm_bindgen_test]
fn analyzer_round_trip() {
    let mut analyzer = ReplayAnalyzer::new();
    analyzer.push_event(KILL).unwrap();
    assert_eq!(analyzer.event_count(), 1);

    let json = analyzer.finish(r#"{"map":"de_overpass","ctScore":9,"tScore":4}"#).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["map"], "Overpass");
    assert_eq!(value["teamAScore"], 9);
    assert_eq!(value["players"][0]["weapons"]["awp"], 1);
}

#[wasm_bindgen_test]
fn bad_event_is_rejected() {
    let mut analyzer = ReplayAnalyzer::new();
    assert!(analyzer.push_event(r#"{"type":"kill","tick":"soon"}"#).is_err());
    assert_eq!(analyzer.event_count(), 0);
}

#[wasm_bindgen_test]
fn bad_config_is_rejected() {
    assert!(ReplayAnalyzer::new_with_config("{").is_err());
    assert!(ReplayAnalyzer::new_with_config(r#"{"max_findings":2}"#).is_ok());
}

#[wasm_bindgen_test]
fn analyze_replay_reports_failure_as_json() {
    let value: serde_json::Value = serde_json::from_str(&analyze_replay("nope")).unwrap();
    assert_eq!(value["success"], false);
}

#[wasm_bindgen_test]
fn select_clips_on_empty_summary() {
    assert_eq!(select_clips("{}", 3, 5).unwrap(), "[]");
}
