use crate::detector::AnomalyDetector;
use crate::error::Result;
use crate::metrics;
use crate::reducer::EventReducer;
use crate::source::EventSource;
use crate::summary;
use crate::types::*;
use tracing::info;

/// Drives one analysis: reduce the stream, derive metrics, detect
/// anomalies, then assemble the summary. Stages run strictly in that order.
pub struct MatchAnalyzer {
    config: AnalyzerConfig,
    reducer: EventReducer,
}

impl MatchAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            reducer: EventReducer::new(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fold a single event into the running state
    pub fn ingest(&mut self, event: &MatchEvent) {
        self.reducer.apply(event);
    }

    pub fn events_ingested(&self) -> usize {
        self.reducer.events_applied()
    }

    /// Pull every event from `source`. Stops at the first decode failure.
    pub fn consume<S: EventSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        while let Some(event) = source.next_event()? {
            self.ingest(&event);
        }
        Ok(())
    }

    /// Run the post-stream stages and build the summary
    pub fn finish(self, state: &GameState) -> MatchSummary {
        let mut reduced = self.reducer.finish();
        metrics::apply_all(&mut reduced.registry, &self.config);

        let detector = AnomalyDetector::new(self.config);
        let moments = detector.scan(&reduced.registry);

        let summary = summary::build(&reduced, state, moments);
        info!(
            players = summary.players.len(),
            rounds = summary.rounds,
            total_kills = summary.total_kills,
            findings = summary.suspicious_moments.len(),
            "analysis complete"
        );
        summary
    }
}

/// Analyze a whole replay from `source`
pub fn analyze<S: EventSource + ?Sized>(source: &mut S, config: AnalyzerConfig) -> Result<MatchSummary> {
    let mut analyzer = MatchAnalyzer::new(config);
    analyzer.consume(source)?;
    info!(events = analyzer.events_ingested(), "event stream exhausted");
    Ok(analyzer.finish(&source.final_state()))
}
