use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::batch::GenerationBatch;
use super::emotion::Emotion;

/// Aggregate result of a run. Counters only ever grow.
///
/// `successful + failed <= total_scripts`, and the emotion distribution always
/// sums to `successful`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub total_scripts: usize,
    pub successful: usize,
    pub failed: usize,
    pub emotion_distribution: BTreeMap<Emotion, usize>,
}

impl GenerationSummary {
    pub fn new(total_scripts: usize) -> Self {
        Self {
            total_scripts,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self, batch: &GenerationBatch) {
        self.successful += batch.len();
        for script in &batch.scripts {
            *self.emotion_distribution.entry(script.emotion).or_insert(0) += 1;
        }
    }

    pub fn record_failure(&mut self, batch: &GenerationBatch) {
        self.failed += batch.len();
    }

    /// Scripts whose batch reached a terminal state.
    pub fn processed(&self) -> usize {
        self.successful + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.processed() == self.total_scripts
    }
}

/// Batch-level progress of the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub completed_batches: usize,
    pub total_batches: usize,
    pub processed_scripts: usize,
    pub total_scripts: usize,
}

impl RunProgress {
    pub fn percent(&self) -> f64 {
        if self.total_batches == 0 {
            return 0.0;
        }
        (self.completed_batches as f64 / self.total_batches as f64) * 100.0
    }
}
