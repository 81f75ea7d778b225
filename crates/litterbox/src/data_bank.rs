//! DataBank - append-only history of litter box visits and illnesses

use chrono::{DateTime, Utc};
use sensors::CatReading;
use shared::{KuwetexError, RandomSource, Result};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Advice handed to the owner of an ill cat
pub const PRESCRIPTIONS: [&str; 4] = [
    "Go to doctor.",
    "Dig the grave.",
    "Do not do anything, cat will recover soon.",
    "Cat needs to stress out. Give him/her Prozac.",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One completed visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    cat_name: String,
    eyes: String,
    weight: String,
    time_spent_ms: u64,
    health: String,
    recorded_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(reading: CatReading, time_spent_ms: u64) -> Self {
        Self {
            cat_name: reading.name,
            eyes: reading.eyes,
            weight: reading.weight,
            time_spent_ms,
            health: reading.health,
            recorded_at: Utc::now(),
        }
    }

    pub fn cat_name(&self) -> &str {
        &self.cat_name
    }

    pub fn eyes(&self) -> &str {
        &self.eyes
    }

    pub fn weight(&self) -> &str {
        &self.weight
    }

    pub fn time_spent_ms(&self) -> u64 {
        self.time_spent_ms
    }

    pub fn health(&self) -> &str {
        &self.health
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Visit date as shown in reports
    pub fn date(&self) -> String {
        self.recorded_at.format(DATE_FORMAT).to_string()
    }
}

impl fmt::Display for UsageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "* {}; {} eyes; weight: {};  {}ms, on day: {};\n{}",
            self.cat_name,
            self.eyes,
            self.weight,
            self.time_spent_ms,
            self.date(),
            self.health
        )
    }
}

/// One diagnosed illness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllnessRecord {
    cat_name: String,
    date: String,
    recommendation: &'static str,
}

impl IllnessRecord {
    pub fn cat_name(&self) -> &str {
        &self.cat_name
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn recommendation(&self) -> &str {
        self.recommendation
    }
}

impl fmt::Display for IllnessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "* {} was ill on {}. Recommendation:\n{}",
            self.cat_name, self.date, self.recommendation
        )
    }
}

/// Visit and illness history
///
/// Both lists sit behind their own `RwLock`: reports render concurrently,
/// appends are serialized, and a record is fully built before the write
/// lock is taken.
pub struct DataBank {
    records: RwLock<Vec<UsageRecord>>,
    illnesses: RwLock<Vec<IllnessRecord>>,
    random: Arc<dyn RandomSource>,
}

impl DataBank {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            illnesses: RwLock::new(Vec::new()),
            random,
        }
    }

    pub fn append(&self, record: UsageRecord) -> Result<()> {
        let mut records = self.records.write().map_err(|_| {
            KuwetexError::LockPoisoned("Failed to acquire usage write lock".to_string())
        })?;
        records.push(record);
        Ok(())
    }

    /// Record an illness with a randomly chosen prescription
    pub fn append_illness(&self, cat_name: impl Into<String>, date: impl Into<String>) -> Result<()> {
        let index = self.random.below(PRESCRIPTIONS.len() as u64) as usize;
        let illness = IllnessRecord {
            cat_name: cat_name.into(),
            date: date.into(),
            recommendation: PRESCRIPTIONS[index],
        };

        let mut illnesses = self.illnesses.write().map_err(|_| {
            KuwetexError::LockPoisoned("Failed to acquire illness write lock".to_string())
        })?;
        illnesses.push(illness);
        Ok(())
    }

    /// All visits in append order, one per entry
    pub fn report(&self) -> Result<String> {
        let records = self.records.read().map_err(|_| {
            KuwetexError::LockPoisoned("Failed to acquire usage read lock".to_string())
        })?;
        Ok(render(records.iter()))
    }

    /// All illnesses with their prescriptions, in append order
    pub fn prescriptions(&self) -> Result<String> {
        let illnesses = self.illnesses.read().map_err(|_| {
            KuwetexError::LockPoisoned("Failed to acquire illness read lock".to_string())
        })?;
        Ok(render(illnesses.iter()))
    }

    pub fn record_count(&self) -> Result<usize> {
        let records = self.records.read().map_err(|_| {
            KuwetexError::LockPoisoned("Failed to acquire usage read lock".to_string())
        })?;
        Ok(records.len())
    }

    pub fn illness_count(&self) -> Result<usize> {
        let illnesses = self.illnesses.read().map_err(|_| {
            KuwetexError::LockPoisoned("Failed to acquire illness read lock".to_string())
        })?;
        Ok(illnesses.len())
    }
}

impl fmt::Debug for DataBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBank")
            .field("records", &self.record_count().ok())
            .field("illnesses", &self.illness_count().ok())
            .finish()
    }
}

fn render<T: fmt::Display>(entries: impl Iterator<Item = T>) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}
