//! CatSimulator - one long-running task per cat

use crate::data_bank::DataBank;
use crate::litter_box::LitterBox;
use crate::shutdown::Shutdown;
use sensors::HealthStatus;
use shared::{Cat, RandomSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Drives cats to the litter box and files what the sensors saw
#[derive(Clone)]
pub struct CatSimulator {
    litter_box: Arc<LitterBox>,
    data_bank: Arc<DataBank>,
    random: Arc<dyn RandomSource>,
    max_idle_ms: u64,
    max_visits: Option<usize>,
    shutdown: Shutdown,
}

impl CatSimulator {
    pub fn new(
        litter_box: Arc<LitterBox>,
        data_bank: Arc<DataBank>,
        random: Arc<dyn RandomSource>,
        max_idle_ms: u64,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            litter_box,
            data_bank,
            random,
            max_idle_ms,
            max_visits: None,
            shutdown,
        }
    }

    /// Builder: each cat stops after this many visits
    pub fn with_max_visits(mut self, visits: usize) -> Self {
        self.max_visits = Some(visits);
        self
    }

    /// Start one task per cat
    pub fn spawn(&self, cats: Vec<Cat>) -> Vec<JoinHandle<usize>> {
        cats.into_iter()
            .map(|cat| {
                let simulator = self.clone();
                tokio::spawn(async move { simulator.run_cat(cat).await })
            })
            .collect()
    }

    /// Visit, record, idle; until shutdown or the visit cap.
    /// Returns the number of visits recorded.
    pub async fn run_cat(&self, cat: Cat) -> usize {
        let mut visits = 0;
        info!(cat = cat.name(), gender = %cat.gender(), "Cat is awake");

        loop {
            match self.litter_box.acquire_and_use(&cat).await {
                Ok(record) => {
                    if HealthStatus::from_reading(record.health()) == Some(HealthStatus::Ill) {
                        if let Err(e) = self.data_bank.append_illness(cat.name(), record.date()) {
                            warn!(cat = cat.name(), error = %e, "Failed to record illness");
                        }
                    }
                    match self.data_bank.append(record) {
                        Ok(()) => visits += 1,
                        Err(e) => warn!(cat = cat.name(), error = %e, "Failed to update history"),
                    }
                }
                Err(e) if e.is_interrupted() => break,
                Err(e) => warn!(cat = cat.name(), error = %e, "Error while using litter box"),
            }

            if self.max_visits.is_some_and(|max| visits >= max) {
                break;
            }

            let idle = Duration::from_millis(self.random.below(self.max_idle_ms));
            if self.shutdown.sleep(idle).await.is_err() {
                break;
            }
        }

        debug!(cat = cat.name(), visits, "Cat has gone to sleep");
        visits
    }
}

impl std::fmt::Debug for CatSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatSimulator")
            .field("max_idle_ms", &self.max_idle_ms)
            .field("max_visits", &self.max_visits)
            .finish()
    }
}
