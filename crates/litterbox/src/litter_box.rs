//! LitterBox - the single resource every cat contends for
//!
//! Use and cleaning take the same gate, a FIFO-fair `tokio::sync::Mutex`,
//! and hold it for the whole simulated visit or cleaning, sleep included,
//! so a cleaning never starts while a cat is inside.

use crate::data_bank::UsageRecord;
use crate::shutdown::Shutdown;
use sensors::SensorSuite;
use shared::{Cat, RandomSource, Result, SimulationConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Mutable state guarded by the gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxState {
    pub dirtiness: u32,
    pub occupied: bool,
}

/// Result of a cleaning attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningOutcome {
    /// Dirtiness was reset from `previous` to zero
    Cleaned { previous: u32 },
    /// Below threshold and not forced; nothing changed
    Skipped { dirtiness: u32 },
}

impl CleaningOutcome {
    pub fn is_cleaned(&self) -> bool {
        matches!(self, CleaningOutcome::Cleaned { .. })
    }
}

/// Bounds of the randomized waits and the cleaning threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxTimings {
    pub dirtiness_threshold: u32,
    pub max_use_ms: u64,
    pub max_cleaning_ms: u64,
}

impl From<&SimulationConfig> for BoxTimings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            dirtiness_threshold: config.dirtiness_threshold,
            max_use_ms: config.max_use_ms,
            max_cleaning_ms: config.max_cleaning_ms,
        }
    }
}

impl Default for BoxTimings {
    fn default() -> Self {
        BoxTimings::from(&SimulationConfig::default())
    }
}

pub struct LitterBox {
    state: Mutex<BoxState>,
    sensors: SensorSuite,
    random: Arc<dyn RandomSource>,
    timings: BoxTimings,
    shutdown: Shutdown,
}

impl LitterBox {
    pub fn new(
        sensors: SensorSuite,
        random: Arc<dyn RandomSource>,
        timings: BoxTimings,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            state: Mutex::new(BoxState::default()),
            sensors,
            random,
            timings,
            shutdown,
        }
    }

    pub fn timings(&self) -> BoxTimings {
        self.timings
    }

    /// Let one cat use the box
    ///
    /// Waits until the box is free, keeps it for a random visit time and
    /// leaves 1 or 2 units of dirt behind. The sensors examine the cat
    /// before it queues.
    pub async fn acquire_and_use(&self, cat: &Cat) -> Result<UsageRecord> {
        let reading = self.sensors.examine(cat);
        let visit = Duration::from_millis(self.random.below(self.timings.max_use_ms));

        let mut state = self.state.lock().await;
        state.occupied = true;
        let entered = Instant::now();
        debug!(cat = %reading.name, "Cat has entered the litter box");

        let slept = self.shutdown.sleep(visit).await;
        let spent = entered.elapsed();
        state.occupied = false;
        slept?;

        let soil = self.random.below(2) as u32 + 1;
        state.dirtiness += soil;
        let dirtiness = state.dirtiness;
        drop(state);

        debug!(cat = %reading.name, soil, dirtiness, "Cat has exited the litter box");
        Ok(UsageRecord::new(reading, spent.as_millis() as u64))
    }

    /// Clean if forced or if dirtiness reached the threshold
    ///
    /// Waits for a cat inside to leave first. An interrupted cleaning has
    /// already reset the counter; the gate is released either way.
    pub async fn reclaim(&self, forced: bool) -> Result<CleaningOutcome> {
        let mut state = self.state.lock().await;
        let previous = state.dirtiness;

        if !forced && previous < self.timings.dirtiness_threshold {
            debug!(dirtiness = previous, "Dirtiness at normal level, not cleaning");
            return Ok(CleaningOutcome::Skipped { dirtiness: previous });
        }

        if forced {
            info!("Cleaning is forced by user");
        }
        info!(dirtiness = previous, "Cleaning process is running");
        state.dirtiness = 0;

        let cleaning = Duration::from_millis(self.random.below(self.timings.max_cleaning_ms));
        self.shutdown.sleep(cleaning).await?;

        Ok(CleaningOutcome::Cleaned { previous })
    }

    /// Current dirtiness, read under the gate
    pub async fn dirtiness(&self) -> u32 {
        self.state.lock().await.dirtiness
    }

    /// Snapshot of the guarded state, read under the gate
    pub async fn state(&self) -> BoxState {
        *self.state.lock().await
    }
}

impl std::fmt::Debug for LitterBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LitterBox")
            .field("timings", &self.timings)
            .field("sensors", &self.sensors)
            .finish()
    }
}
