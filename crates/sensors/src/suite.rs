//! SensorSuite - one probe per attribute slot

use crate::probes::{AttributeProbe, EyeProbe, HealthProbe, NameProbe, WeightProbe};
use shared::{Cat, RandomSource};
use std::sync::Arc;

/// Everything the sensors saw during one examination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatReading {
    pub name: String,
    pub eyes: String,
    pub weight: String,
    pub health: String,
}

/// The probes mounted on the litter box
pub struct SensorSuite {
    eyes: Box<dyn AttributeProbe>,
    weight: Box<dyn AttributeProbe>,
    name: Box<dyn AttributeProbe>,
    health: Box<dyn AttributeProbe>,
}

impl SensorSuite {
    pub fn new(
        eyes: Box<dyn AttributeProbe>,
        weight: Box<dyn AttributeProbe>,
        name: Box<dyn AttributeProbe>,
        health: Box<dyn AttributeProbe>,
    ) -> Self {
        Self {
            eyes,
            weight,
            name,
            health,
        }
    }

    /// Standard probe set sharing one random source
    pub fn standard(random: Arc<dyn RandomSource>) -> Self {
        Self::new(
            Box::new(EyeProbe),
            Box::new(WeightProbe::new(random.clone())),
            Box::new(NameProbe),
            Box::new(HealthProbe::new(random)),
        )
    }

    pub fn examine(&self, cat: &Cat) -> CatReading {
        CatReading {
            name: self.name.examine(cat),
            eyes: self.eyes.examine(cat),
            weight: self.weight.examine(cat),
            health: self.health.examine(cat),
        }
    }
}

impl std::fmt::Debug for SensorSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSuite")
            .field("eyes", &self.eyes.name())
            .field("weight", &self.weight.name())
            .field("name", &self.name.name())
            .field("health", &self.health.name())
            .finish()
    }
}
