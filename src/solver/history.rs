use instant::Instant;

use crate::models::FloatType;

/// Tracks the best cost found and the time of every improvement, which
/// becomes one row each in the exported progress CSV.
#[derive(Debug)]
pub struct SearchHistory {
    pub start_time: Instant,
    pub best_cost: FloatType,
    progress: Vec<(FloatType, FloatType)>,
}

impl SearchHistory {
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            best_cost: FloatType::INFINITY,
            progress: Vec::new(),
        }
    }

    pub fn record_best(&mut self, cost: FloatType) {
        self.best_cost = cost;
        let timestamp = self.start_time.elapsed().as_secs_f64();
        log::info!("Time {:.2}s, new best: {:.2}", timestamp, cost);
        self.progress.push((cost, timestamp));
    }

    pub fn progress(&self) -> &[(FloatType, FloatType)] {
        &self.progress
    }
}
