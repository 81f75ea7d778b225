//! Attribute probes

use shared::{Cat, RandomSource};
use std::sync::Arc;

/// Reads one attribute of a cat
pub trait AttributeProbe: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// Examine the cat and report the observed value
    fn examine(&self, cat: &Cat) -> String;
}

/// Reports eye colour
#[derive(Debug, Clone, Copy, Default)]
pub struct EyeProbe;

impl AttributeProbe for EyeProbe {
    fn name(&self) -> &'static str {
        "eyes"
    }

    fn examine(&self, cat: &Cat) -> String {
        cat.eyes().to_string()
    }
}

/// Recognizes the cat by name
#[derive(Debug, Clone, Copy, Default)]
pub struct NameProbe;

impl AttributeProbe for NameProbe {
    fn name(&self) -> &'static str {
        "name"
    }

    fn examine(&self, cat: &Cat) -> String {
        cat.name().to_string()
    }
}

/// Scale under the box: 2 to 6 kg
pub struct WeightProbe {
    random: Arc<dyn RandomSource>,
}

impl WeightProbe {
    const MIN_KG: u64 = 2;
    const SPREAD_KG: u64 = 5;

    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl AttributeProbe for WeightProbe {
    fn name(&self) -> &'static str {
        "weight"
    }

    fn examine(&self, _cat: &Cat) -> String {
        let kg = self.random.below(Self::SPREAD_KG) + Self::MIN_KG;
        format!("{} kg", kg)
    }
}

/// Outcome of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Ill,
}

impl HealthStatus {
    pub fn reading(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Health: fine.",
            HealthStatus::Ill => "Health: ill.",
        }
    }

    /// Parse a reading produced by [`HealthProbe`]
    pub fn from_reading(reading: &str) -> Option<Self> {
        [HealthStatus::Healthy, HealthStatus::Ill]
            .into_iter()
            .find(|status| status.reading() == reading)
    }
}

/// Health check; one cat in eight comes out ill
pub struct HealthProbe {
    random: Arc<dyn RandomSource>,
}

impl HealthProbe {
    const ILLNESS_ODDS: u64 = 8;

    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }
}

impl AttributeProbe for HealthProbe {
    fn name(&self) -> &'static str {
        "health"
    }

    fn examine(&self, _cat: &Cat) -> String {
        let status = if self.random.below(Self::ILLNESS_ODDS) == 0 {
            HealthStatus::Ill
        } else {
            HealthStatus::Healthy
        };
        status.reading().to_string()
    }
}
