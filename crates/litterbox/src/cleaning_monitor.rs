//! CleaningMonitor - periodic, never forced, cleaning checks

use crate::litter_box::{CleaningOutcome, LitterBox};
use crate::shutdown::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct CleaningMonitor {
    litter_box: Arc<LitterBox>,
    interval: Duration,
    max_rounds: Option<usize>,
    shutdown: Shutdown,
}

impl CleaningMonitor {
    pub fn new(litter_box: Arc<LitterBox>, interval: Duration, shutdown: Shutdown) -> Self {
        Self {
            litter_box,
            interval,
            max_rounds: None,
            shutdown,
        }
    }

    /// Builder: stop after this many checks
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn spawn(self) -> JoinHandle<usize> {
        tokio::spawn(self.run())
    }

    /// Check, then wait the interval, until shutdown or the round cap.
    /// Returns the number of checks that cleaned.
    pub async fn run(self) -> usize {
        let mut rounds = 0;
        let mut cleanings = 0;

        loop {
            match self.litter_box.reclaim(false).await {
                Ok(CleaningOutcome::Cleaned { previous }) => {
                    cleanings += 1;
                    info!(previous_dirtiness = previous, "Cleaning system cleaned the litter box");
                }
                Ok(CleaningOutcome::Skipped { dirtiness }) => {
                    debug!(dirtiness, "Cleaning system: dirtiness at normal level");
                }
                Err(e) if e.is_interrupted() => break,
                Err(e) => warn!(error = %e, "Cleaning system check failed"),
            }

            rounds += 1;
            if self.max_rounds.is_some_and(|max| rounds >= max) {
                break;
            }
            if self.shutdown.sleep(self.interval).await.is_err() {
                break;
            }
        }

        debug!(rounds, cleanings, "Cleaning system stopped");
        cleanings
    }
}
